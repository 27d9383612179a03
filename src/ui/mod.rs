//! Client side of the travel agent: the conversation state machine shared by the
//! terminal front-end, and the HTTP client it talks through.

pub mod client;
pub mod session;
pub mod terminal;

pub use client::{ AgentApi, TurnError };
pub use session::{ ChatSession, PendingTurn, RenderedRow };
