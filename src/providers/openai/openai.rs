use anyhow::{anyhow, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, CreateEmbeddingRequestArgs, EmbeddingInput,
    },
    Client,
};
use async_trait::async_trait;
use futures::StreamExt;

use crate::llm::chat::{Message, Role};
use crate::providers::traits::{CompletionProvider, CompletionStream};

#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client<OpenAIConfig>,
    chat_model: String,
    embedding_model: String,
}

impl OpenAIProvider {
    pub fn new(api_key: String, chat_model: String, embedding_model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        let client = Client::with_config(config);

        Self {
            client,
            chat_model,
            embedding_model,
        }
    }
}

fn to_request_messages(messages: &[Message]) -> Result<Vec<ChatCompletionRequestMessage>> {
    messages
        .iter()
        .map(|message| {
            let converted = match message.role {
                Role::System => ChatCompletionRequestSystemMessageArgs::default()
                    .content(message.content.clone())
                    .build()?
                    .into(),
                Role::User => ChatCompletionRequestUserMessageArgs::default()
                    .content(message.content.clone())
                    .build()?
                    .into(),
                Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                    .content(message.content.clone())
                    .build()?
                    .into(),
            };
            Ok(converted)
        })
        .collect()
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.embedding_model)
            .input(EmbeddingInput::String(text.to_string()))
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        response
            .data
            .into_iter()
            .next()
            .map(|embedding| embedding.embedding)
            .ok_or_else(|| anyhow!("No embedding returned from OpenAI"))
    }

    async fn stream_complete(&self, messages: &[Message]) -> Result<CompletionStream> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.chat_model)
            .messages(to_request_messages(messages)?)
            .stream(true)
            .build()?;

        let stream = self.client.chat().create_stream(request).await?;

        // Empty deltas (role-only frames) carry no text and are skipped
        let fragments = stream
            .filter_map(|part| async move {
                match part {
                    Ok(chunk) => chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|choice| choice.delta.content)
                        .filter(|piece| !piece.is_empty())
                        .map(Ok),
                    Err(e) => Some(Err(anyhow::Error::from(e))),
                }
            })
            .boxed();

        Ok(fragments)
    }
}
