use async_trait::async_trait;
use log::debug;
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };

use super::{ ChatClient, ChatError };
use crate::llm::retry::RetryPolicy;
use crate::llm::{ CompletionOptions, LlmConfig, DEFAULT_CHAT_MODEL, DEFAULT_CHAT_URL };
use crate::models::chat::ChatMessage;

pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    base_url: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAIChatClient {
    pub fn new(api_key: String, model: Option<String>, base_url: Option<String>) -> Result<Self, ChatError> {
        Self::from_config(&LlmConfig {
            api_key: Some(api_key),
            completion_model: model,
            base_url,
            ..LlmConfig::default()
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatError> {
        let api_key = config.api_key
            .clone()
            .ok_or_else(|| ChatError::Config("OpenAI API key is required".to_string()))?;
        let chat_model = config.completion_model
            .clone()
            .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string());
        let api_url = config.base_url.clone().unwrap_or_else(|| DEFAULT_CHAT_URL.to_string());
        url::Url
            ::parse(&api_url)
            .map_err(|e| ChatError::Config(format!("Invalid completion URL '{}': {}", api_url, e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
            ChatError::Config(format!("Invalid API key format: {}", e))
        )?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let mut builder = HttpClient::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| ChatError::Config(e.to_string()))?;

        Ok(Self {
            http,
            model: chat_model,
            base_url: api_url,
            retry: config.retry.clone(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn send_once(&self, req: &OpenAIChatRequest<'_>) -> Result<String, ChatError> {
        let resp = self.http.post(&self.base_url).json(req).send().await.map_err(ChatError::Network)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChatError::Transport { status: status.as_u16(), body });
        }

        let parsed = resp
            .json::<OpenAIResponse>().await
            .map_err(|e| ChatError::Decode(e.to_string()))?;

        let choice = parsed.choices.into_iter().next().ok_or(ChatError::EmptyChoices)?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions
    ) -> Result<String, ChatError> {
        if messages.is_empty() {
            return Err(ChatError::EmptyConversation);
        }

        let model = if options.model.is_empty() { self.model.as_str() } else { options.model.as_str() };
        let req = OpenAIChatRequest {
            model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };
        debug!("Sending {} messages to {} (model {})", messages.len(), self.base_url, model);

        self.retry.execute(|| self.send_once(&req)).await
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_base_url(&self) -> Option<String> {
        Some(self.base_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{ body_json, header, method, path };
    use wiremock::{ Mock, MockServer, ResponseTemplate };

    fn client_for(server: &MockServer, attempts: u32) -> OpenAIChatClient {
        OpenAIChatClient::new(
            "test-key".to_string(),
            None,
            Some(format!("{}/v1/chat/completions", server.uri()))
        )
            .unwrap()
            .with_retry_policy(RetryPolicy {
                max_attempts: attempts,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(1),
                multiplier: 1.0,
            })
    }

    fn options() -> CompletionOptions {
        CompletionOptions::default()
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(
                body_json(
                    json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "persona"},
                    {"role": "user", "content": "Hallo"}
                ],
                "temperature": 0.7
            })
                )
            )
            .respond_with(
                ResponseTemplate::new(200).set_body_json(
                    json!({
                "choices": [
                    {"message": {"role": "assistant", "content": "Wohin soll es gehen?"}},
                    {"message": {"role": "assistant", "content": "second"}}
                ]
            })
                )
            )
            .expect(1)
            .mount(&server).await;

        let reply = client_for(&server, 1)
            .complete(&[ChatMessage::system("persona"), ChatMessage::user("Hallo")], &options()).await
            .unwrap();
        assert_eq!(reply, "Wohin soll es gehen?");
    }

    #[tokio::test]
    async fn max_tokens_is_sent_only_when_set() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(wiremock::matchers::body_string_contains("\"max_tokens\":1024"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"choices": [{"message": {"content": "ok"}}]}))
            )
            .expect(1)
            .mount(&server).await;

        let opts = CompletionOptions { max_tokens: Some(1024), ..options() };
        let reply = client_for(&server, 1).complete(&[ChatMessage::user("x")], &opts).await.unwrap();
        assert_eq!(reply, "ok");
    }

    #[tokio::test]
    async fn non_success_status_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server).await;

        let err = client_for(&server, 3)
            .complete(&[ChatMessage::user("x")], &options()).await
            .unwrap_err();
        match err {
            ChatError::Transport { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn upstream_5xx_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .expect(2)
            .mount(&server).await;

        let err = client_for(&server, 2)
            .complete(&[ChatMessage::user("x")], &options()).await
            .unwrap_err();
        assert!(matches!(err, ChatError::Transport { status: 502, .. }));
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server).await;

        let err = client_for(&server, 1)
            .complete(&[ChatMessage::user("x")], &options()).await
            .unwrap_err();
        assert!(matches!(err, ChatError::EmptyChoices));
    }

    #[tokio::test]
    async fn empty_conversation_never_hits_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server).await;

        let err = client_for(&server, 1).complete(&[], &options()).await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyConversation));
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let err = OpenAIChatClient::from_config(&LlmConfig::default()).err().unwrap();
        assert!(matches!(err, ChatError::Config(_)));
    }
}
