use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::llm::chat::Message;

/// Ordered fragments of assistant text as the service emits them.
pub type CompletionStream = BoxStream<'static, Result<String>>;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>>;

    /// Start a streamed completion over a full message list.
    async fn stream_complete(&self, messages: &[Message]) -> Result<CompletionStream>;
}
