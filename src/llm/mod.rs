pub mod chat;

pub use chat::{ChatOrchestrator, Message, Role};

use thiserror::Error;

/// Request-level failure taxonomy for the chat endpoint.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("Stream error: {0}")]
    Stream(String),
}
