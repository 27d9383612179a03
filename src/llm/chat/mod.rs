pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use super::{ CompletionOptions, LlmConfig };
use self::openai::OpenAIChatClient;
use crate::models::chat::ChatMessage;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("completion endpoint returned {status}: {body}")]
    Transport {
        status: u16,
        body: String,
    },
    #[error("network error talking to completion endpoint: {0}")]
    Network(#[source] reqwest::Error),
    #[error("could not decode completion response: {0}")]
    Decode(String),
    #[error("completion response contained no choices")]
    EmptyChoices,
    #[error("refusing to send an empty conversation")]
    EmptyConversation,
    #[error("invalid chat client configuration: {0}")]
    Config(String),
}

impl ChatError {
    /// Rate limits, upstream 5xx and connection failures may succeed on a second try.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Transport { status, .. } => *status == 429 || *status >= 500,
            ChatError::Network(_) => true,
            _ => false,
        }
    }
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends the ordered conversation and returns the first choice's text.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions
    ) -> Result<String, ChatError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, ChatError> {
    let client: Arc<dyn ChatClient> = Arc::new(OpenAIChatClient::from_config(config)?);
    Ok(client)
}
