use uuid::Uuid;

use super::client::TurnError;
use crate::models::chat::{ ChatMessage, Role };

/// Shown when the server answered, but with an error.
pub const SERVER_ERROR_MESSAGE: &str = "Entschuldige, es gab ein Problem bei der Anfrage.";
/// Shown when the request never produced an answer.
pub const NETWORK_ERROR_MESSAGE: &str = "Es ist ein Fehler aufgetreten.";

pub const USER_LABEL: &str = "Du";
pub const AGENT_LABEL: &str = "Agent";
pub const LOADING_PLACEHOLDER: &str = "…";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub label: &'static str,
    pub content: String,
    pub alignment: Alignment,
}

/// A submitted turn waiting for its reply. `messages` is the history to send.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub id: Uuid,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    conversation: Vec<ChatMessage>,
    input: String,
    outstanding: Option<Uuid>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation(&self) -> &[ChatMessage] {
        &self.conversation
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn is_loading(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Blank input and submissions while a turn is in flight are no-ops.
    pub fn submit(&mut self) -> Option<PendingTurn> {
        if self.is_loading() {
            return None;
        }
        let content = self.input.trim();
        if content.is_empty() {
            return None;
        }

        self.conversation.push(ChatMessage::user(content));
        self.input.clear();

        let id = Uuid::new_v4();
        self.outstanding = Some(id);
        Some(PendingTurn { id, messages: self.conversation.clone() })
    }

    /// Applies the outcome of turn `id`. Returns false, changing nothing, for
    /// a turn that is not the outstanding one.
    pub fn resolve(&mut self, id: Uuid, outcome: Result<String, TurnError>) -> bool {
        if self.outstanding != Some(id) {
            return false;
        }

        let content = match outcome {
            Ok(reply) => reply,
            Err(TurnError::Server(_)) => SERVER_ERROR_MESSAGE.to_string(),
            Err(TurnError::Network(_)) => NETWORK_ERROR_MESSAGE.to_string(),
        };
        self.conversation.push(ChatMessage::assistant(content));
        self.outstanding = None;
        true
    }

    pub fn render(&self) -> Vec<RenderedRow> {
        let mut rows: Vec<RenderedRow> = self.conversation
            .iter()
            .map(|msg| {
                let (label, alignment) = match msg.role {
                    Role::User => (USER_LABEL, Alignment::Right),
                    _ => (AGENT_LABEL, Alignment::Left),
                };
                RenderedRow { label, content: msg.content.clone(), alignment }
            })
            .collect();

        if self.is_loading() {
            rows.push(RenderedRow {
                label: AGENT_LABEL,
                content: LOADING_PLACEHOLDER.to_string(),
                alignment: Alignment::Left,
            });
        }
        rows
    }
}
