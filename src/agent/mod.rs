//! Agent module - conversation log and remote responder

pub mod conversation;
pub mod responder;

pub use conversation::ConversationLog;
pub use responder::{HttpResponder, Responder};
