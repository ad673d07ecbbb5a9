//! # Event Schema
//!
//! Shared data model for the chat backend and its live clients.
//!
//! ## Modules
//! - `conversation`: conversation, member and message summaries as sent over the wire
//! - `events`: live channel event names and the publish envelope

pub mod conversation;
pub mod events;

pub use conversation::{ConversationSummary, MessageSummary, UserProfile};
pub use events::{
    EventEnvelope, EventError, LiveEvent, CONVERSATION_NEW, CONVERSATION_REMOVE, CONVERSATION_UPDATE,
};
