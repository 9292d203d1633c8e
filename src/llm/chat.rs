use futures::future;
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use validator::Validate;

use crate::config::RagConfig;
use crate::database::vector_db::{RetrievalMatch, VectorSearch};
use crate::llm::ChatError;
use crate::providers::traits::{CompletionProvider, CompletionStream};

const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

pub const SYSTEM_PROMPT: &str = "\
You are a helpful and knowledgeable agent designed to assist students in finding the best professors based on their specific queries. Using Retrieval-Augmented Generation (RAG), your role is to understand the student's question and provide detailed information on the top 3 professors that best match their needs.

When responding:

Consider the student's preferences and the context of their query, such as course difficulty, teaching style, and overall rating.
Provide a brief summary for each professor, including key strengths, common student feedback, and any relevant course information.
Always prioritize accuracy, clarity, and usefulness of the information.
Example User Query: \"Which professors are best for an easy A in Calculus?\"

Example Response:

Professor Jane Smith - Highly rated for her clear explanations and generous grading. Students often mention that she provides ample resources for practice and her exams are straightforward.
Professor John Doe - Known for being approachable and providing extra help outside of class. His classes are well-organized, and many students find his grading to be fair and lenient.
Professor Emily Davis - Frequently praised for her engaging lectures and understanding nature. Her exams are manageable if you attend classes regularly and participate in discussions.
Make sure to tailor each response to the student's needs and provide a balanced view of each professor's strengths and areas for improvement.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Message {
    pub role: Role,
    #[validate(length(min = 1, max = 8000))]
    pub content: String,
}

/// Sequences the embedding, retrieval and completion calls for one request.
pub struct ChatOrchestrator {
    provider: Arc<dyn CompletionProvider>,
    index: Arc<dyn VectorSearch>,
    config: RagConfig,
}

impl ChatOrchestrator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        index: Arc<dyn VectorSearch>,
        config: RagConfig,
    ) -> Self {
        Self {
            provider,
            index,
            config,
        }
    }

    /// Answer a conversation with a stream of assistant text fragments.
    pub async fn respond(
        &self,
        conversation: Vec<Message>,
    ) -> Result<BoxStream<'static, Result<String, ChatError>>, ChatError> {
        let last = conversation
            .last()
            .ok_or_else(|| ChatError::InvalidInput("conversation is empty".to_string()))?;

        for message in &conversation {
            message
                .validate()
                .map_err(|e| ChatError::InvalidInput(e.to_string()))?;
        }

        let query_text = last.content.clone();

        let embedding = self.embed_with_retry(&query_text).await?;
        let mut matches = self.query_with_retry(&embedding).await?;
        matches.truncate(self.config.top_k);

        let outbound = build_outbound_messages(&conversation, &matches);

        let upstream = timeout(
            self.config.upstream_timeout,
            self.provider.stream_complete(&outbound),
        )
        .await
        .map_err(|_| ChatError::Upstream("chat completion request timed out".to_string()))?
        .map_err(|e| ChatError::Upstream(e.to_string()))?;

        Ok(relay(upstream))
    }

    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>, ChatError> {
        let mut last_err = String::new();

        for attempt in 0..RETRY_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            }

            match timeout(
                self.config.upstream_timeout,
                self.provider.generate_embedding(text),
            )
            .await
            {
                Ok(Ok(vector)) => {
                    if vector.is_empty() {
                        return Err(ChatError::Upstream(
                            "embedding service returned an empty vector".to_string(),
                        ));
                    }
                    return Ok(vector);
                }
                Ok(Err(e)) => last_err = e.to_string(),
                Err(_) => last_err = "request timed out".to_string(),
            }

            log::warn!("Embedding attempt {} failed: {}", attempt + 1, last_err);
        }

        Err(ChatError::Upstream(format!(
            "embedding request failed after {} attempts: {}",
            RETRY_ATTEMPTS, last_err
        )))
    }

    async fn query_with_retry(&self, embedding: &[f32]) -> Result<Vec<RetrievalMatch>, ChatError> {
        let mut last_err = String::new();

        for attempt in 0..RETRY_ATTEMPTS {
            if attempt > 0 {
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            }

            match timeout(
                self.config.upstream_timeout,
                self.index.query(embedding, self.config.top_k),
            )
            .await
            {
                Ok(Ok(matches)) => return Ok(matches),
                Ok(Err(e)) => last_err = e.to_string(),
                Err(_) => last_err = "request timed out".to_string(),
            }

            log::warn!("Vector query attempt {} failed: {}", attempt + 1, last_err);
        }

        Err(ChatError::Upstream(format!(
            "vector query failed after {} attempts: {}",
            RETRY_ATTEMPTS, last_err
        )))
    }
}

/// System prompt first, history minus the last message, then the augmented
/// last message. Client-supplied system messages are not forwarded.
fn build_outbound_messages(conversation: &[Message], matches: &[RetrievalMatch]) -> Vec<Message> {
    let mut outbound = vec![Message {
        role: Role::System,
        content: SYSTEM_PROMPT.to_string(),
    }];

    if let Some((last, history)) = conversation.split_last() {
        outbound.extend(
            history
                .iter()
                .filter(|message| message.role != Role::System)
                .cloned(),
        );
        outbound.push(Message {
            role: Role::User,
            content: format!("{}{}", last.content, render_matches(matches)),
        });
    }

    outbound
}

fn render_matches(matches: &[RetrievalMatch]) -> String {
    let mut block = String::from("\n\nReturned results from vector db (done automatically): ");

    for item in matches {
        let metadata = item.metadata.clone().unwrap_or_default();
        let subject = metadata.subject.unwrap_or_default();
        let stars = metadata
            .stars
            .map(|value| value.to_string())
            .unwrap_or_default();
        // The seed data carries no review text; the rating stands in for it
        let review = metadata.review.unwrap_or_else(|| stars.clone());

        block.push_str(&format!(
            "\nProfessor: {}\nReview: {}\nSubject: {}\nStars: {}\n",
            item.id, review, subject, stars
        ));
    }

    block
}

/// Pass-through relay: preserves order, fuses after the first error so
/// nothing is emitted after the stream has failed.
fn relay(upstream: CompletionStream) -> BoxStream<'static, Result<String, ChatError>> {
    upstream
        .map(|fragment| fragment.map_err(|e| ChatError::Stream(e.to_string())))
        .scan(false, |failed, item| {
            if *failed {
                return future::ready(None);
            }
            *failed = item.is_err();
            future::ready(Some(item))
        })
        .boxed()
}
