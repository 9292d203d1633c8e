use std::env;
use std::time::Duration;

/// Number of nearest neighbours spliced into the prompt.
pub const TOP_K: usize = 3;

#[derive(Debug, Clone)]
pub struct RagConfig {
    pub index_name: String,
    pub namespace: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub top_k: usize,
    pub upstream_timeout: Duration,
}

impl RagConfig {
    pub fn from_env() -> Self {
        let index_name = env::var("PINECONE_INDEX")
            .unwrap_or_else(|_| "rag".to_string());

        let namespace = env::var("PINECONE_NAMESPACE")
            .unwrap_or_else(|_| "ns1".to_string());

        let chat_model = env::var("OPENAI_CHAT_MODEL")
            .unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let embedding_model = env::var("OPENAI_EMBEDDING_MODEL")
            .unwrap_or_else(|_| "text-embedding-3-small".to_string());

        // Applied to the embedding, vector query and stream-start calls
        let upstream_timeout = env::var("UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(30));

        Self {
            index_name,
            namespace,
            chat_model,
            embedding_model,
            top_k: TOP_K,
            upstream_timeout,
        }
    }
}
