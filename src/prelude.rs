//! Convenience re-exports for common use.

pub use crate::agent::{
    Conversation, ConversationOptions, DisplaySink, NullSink, RecordingSink, DEFAULT_SYSTEM_PROMPT,
};
pub use crate::aggregator::{AggregatorEvent, DeltaAggregator};
pub use crate::config::WarbotConfig;
pub use crate::error::WarbotError;
pub use crate::provider::{ModelProvider, OpenAiProvider, ProviderRequest, ToolDefinition};
pub use crate::tools::{AgentTool, Tool, ToolArguments, ToolParameters, ToolRegistry};
pub use crate::types::{FinishReason, Message, Role, StreamChunk, ToolCallRequest};
