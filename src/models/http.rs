use serde::{ Deserialize, Serialize };
use serde_json::{ Map, Value };

use super::chat::{ ChatMessage, IncomingMessage };

/// Body sent by the chat front-ends to `/api/agent` and `/api/chat`.
#[derive(Serialize, Debug)]
pub struct AgentRequest<'a> {
    pub messages: &'a [ChatMessage],
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

/// Reply body. The field name differs per endpoint, so it is built as a map.
pub fn reply_body(field: &str, content: String) -> Value {
    let mut body = Map::new();
    body.insert(field.to_string(), Value::String(content));
    Value::Object(body)
}

/// What the agent endpoints answer, seen from the client side.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    #[serde(default)]
    pub assistant_message: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AgentResponse {
    pub fn content(self) -> Option<String> {
        self.assistant_message.or(self.reply)
    }
}

pub type IncomingConversation = Vec<IncomingMessage>;
