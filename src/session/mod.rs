//! Session state machine and conversation engine.
//!
//! The controller owns the `Session`, the current result, and one
//! conversation per active region selection; retrieval completions come
//! back to it as events over a channel.

pub mod controller;
pub mod conversation;

pub use controller::{SessionController, SessionEvent};
pub use conversation::ConversationEngine;
