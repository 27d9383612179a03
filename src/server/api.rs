use axum::{
    body::Bytes,
    extract::{ Request, State },
    http::{ header::ALLOW, HeaderValue, Method, StatusCode },
    middleware::Next,
    response::{ IntoResponse, Response },
    Json,
};
use log::{ debug, error, warn };
use serde_json::Value;
use thiserror::Error;

use super::AppState;
use crate::config::prompt::PromptVariant;
use crate::models::chat::IncomingMessage;
use crate::models::http::{ reply_body, ErrorBody, IncomingConversation };

pub const GENERATION_FAILED: &str = "Failed to generate assistant message";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("invalid request body: {0}")]
    InvalidRequest(String),
    #[error("rate limit exceeded")]
    TooManyRequests,
    #[error("internal error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "Invalid request body"),
            ApiError::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, "Too many requests"),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, GENERATION_FAILED),
        };

        let mut response = (status, Json(ErrorBody::new(message))).into_response();
        if matches!(self, ApiError::MethodNotAllowed) {
            response.headers_mut().insert(ALLOW, HeaderValue::from_static("POST"));
        }
        response
    }
}

/// Where the message list lives in the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    /// `{ "messages": [...] }`
    Wrapped,
    /// `[...]`
    Bare,
}

impl BodyShape {
    pub fn parse(&self, body: &[u8]) -> Result<IncomingConversation, ApiError> {
        let value: Value = serde_json
            ::from_slice(body)
            .map_err(|e| ApiError::InvalidRequest(format!("malformed JSON: {}", e)))?;

        let messages = match (self, value) {
            (BodyShape::Wrapped, Value::Object(mut fields)) => fields.remove("messages"),
            (BodyShape::Bare, value) => Some(value),
            _ => None,
        };

        match messages {
            Some(list @ Value::Array(_)) =>
                serde_json
                    ::from_value::<Vec<IncomingMessage>>(list)
                    .map_err(|e| ApiError::InvalidRequest(format!("malformed message: {}", e))),
            _ => Err(ApiError::InvalidRequest("expected an array of messages".to_string())),
        }
    }
}

/// Everything that distinguishes one agent endpoint from another.
#[derive(Debug, Clone, Copy)]
pub struct EndpointProfile {
    pub path: &'static str,
    pub prompt: PromptVariant,
    pub body_shape: BodyShape,
    pub reply_field: &'static str,
    pub max_tokens: Option<u32>,
}

pub const AGENT: EndpointProfile = EndpointProfile {
    path: "/api/agent",
    prompt: PromptVariant::Classic,
    body_shape: BodyShape::Wrapped,
    reply_field: "assistantMessage",
    max_tokens: None,
};

pub const AGENT_BARE: EndpointProfile = EndpointProfile {
    path: "/api/agent2",
    prompt: PromptVariant::Bundled,
    body_shape: BodyShape::Bare,
    reply_field: "assistantMessage",
    max_tokens: None,
};

pub const CHAT: EndpointProfile = EndpointProfile {
    path: "/api/chat",
    prompt: PromptVariant::Classic,
    body_shape: BodyShape::Wrapped,
    reply_field: "reply",
    max_tokens: Some(1024),
};

pub async fn handle(
    profile: &EndpointProfile,
    method: Method,
    state: &AppState,
    body: &[u8]
) -> Result<Response, ApiError> {
    if method != Method::POST {
        debug!("{} {} rejected", method, profile.path);
        return Err(ApiError::MethodNotAllowed);
    }

    let messages = profile.body_shape.parse(body).map_err(|e| {
        warn!("{}: {}", profile.path, e);
        e
    })?;
    debug!("{}: {} client message(s)", profile.path, messages.len());

    match state.agent.reply(profile.prompt, messages, profile.max_tokens).await {
        Ok(content) => Ok((StatusCode::OK, Json(reply_body(profile.reply_field, content))).into_response()),
        Err(e) => {
            error!("Error handling {} request: {}", profile.path, e);
            Err(ApiError::Internal)
        }
    }
}

pub async fn agent_handler(method: Method, State(state): State<AppState>, body: Bytes) -> Response {
    handle(&AGENT, method, &state, &body).await.unwrap_or_else(|e| e.into_response())
}

pub async fn agent_bare_handler(method: Method, State(state): State<AppState>, body: Bytes) -> Response {
    handle(&AGENT_BARE, method, &state, &body).await.unwrap_or_else(|e| e.into_response())
}

pub async fn chat_handler(method: Method, State(state): State<AppState>, body: Bytes) -> Response {
    handle(&CHAT, method, &state, &body).await.unwrap_or_else(|e| e.into_response())
}

pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            warn!("Rate limit exceeded for {}. Rejecting request.", request.uri().path());
            return ApiError::TooManyRequests.into_response();
        }
    }
    next.run(request).await
}
