use log::error;
use reqwest::Client as HttpClient;
use std::time::Duration;
use thiserror::Error;

use crate::models::chat::ChatMessage;
use crate::models::http::{ AgentRequest, AgentResponse };

pub const DEFAULT_ENDPOINT: &str = "/api/agent";

#[derive(Debug, Error)]
pub enum TurnError {
    /// The server answered but reported a failure.
    #[error("server reported an error: {0}")]
    Server(String),
    /// No usable answer arrived.
    #[error("request failed: {0}")]
    Network(String),
}

/// Posts a conversation to an agent endpoint and hands back the reply text.
#[derive(Clone)]
pub struct AgentApi {
    http: HttpClient,
    url: String,
}

impl AgentApi {
    pub fn new(base_url: &str, endpoint: &str, timeout: Option<Duration>) -> Result<Self, TurnError> {
        let url = url::Url
            ::parse(base_url)
            .and_then(|base| base.join(endpoint))
            .map_err(|e| TurnError::Network(format!("invalid agent URL '{}{}': {}", base_url, endpoint, e)))?;

        let mut builder = HttpClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| TurnError::Network(e.to_string()))?;

        Ok(Self { http, url: url.to_string() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn send(&self, messages: &[ChatMessage]) -> Result<String, TurnError> {
        let resp = self.http
            .post(&self.url)
            .json(&(AgentRequest { messages }))
            .send().await
            .map_err(|e| {
                error!("Request to {} failed: {}", self.url, e);
                TurnError::Network(e.to_string())
            })?;

        let status = resp.status();
        let body = resp.json::<AgentResponse>().await.map_err(|e| {
            error!("Unreadable response from {} ({}): {}", self.url, status, e);
            TurnError::Network(e.to_string())
        })?;

        if let Some(err) = body.error {
            return Err(TurnError::Server(err));
        }
        if !status.is_success() {
            return Err(TurnError::Server(format!("HTTP {}", status)));
        }
        body.content().ok_or_else(|| TurnError::Server("response carried no reply".to_string()))
    }
}
