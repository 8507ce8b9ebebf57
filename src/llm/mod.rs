//! Model service integration
//!
//! Everything between the repair loop and the language model: the wire
//! client, the repair prompts, and the response validator.

pub mod client;
pub mod prompts;
pub mod validate;

pub use client::{Conversation, Message, ModelBackend, ModelClient};
pub use validate::Validation;
