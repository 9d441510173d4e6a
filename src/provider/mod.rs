//! Upstream model transport.

pub mod http;
pub mod openai;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::WarbotError;
use crate::types::{Message, StreamChunk};

pub use openai::OpenAiProvider;

/// Ordered chunk stream for one round.
pub type ChunkStream = BoxStream<'static, Result<StreamChunk, WarbotError>>;

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
}

/// Tool definition advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Chat-completions `tools` entry.
    pub fn to_function_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Streaming chat transport.
///
/// Implementations must yield chunks in arrival order and must not yield
/// anything for a round after a chunk carrying a terminal reason.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Open a streaming request for the given history and tools.
    async fn stream_chat(&self, request: &ProviderRequest) -> Result<ChunkStream, WarbotError>;
}

/// Build the provider described by a config.
pub fn create_provider(config: &crate::config::WarbotConfig) -> Result<OpenAiProvider, WarbotError> {
    let api_key = config.require_api_key()?;
    Ok(OpenAiProvider::new(
        config.model.clone(),
        api_key.to_string(),
        config.base_url.clone(),
    ))
}
