//! Streaming protocol fragments.
//!
//! These mirror the chat-completions chunk shape closely but keep every
//! unknown field in a flattened `extra` map, so vendor-specific carriers
//! (reasoning text in particular) stay reachable for probing.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// One unit of a streaming response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StreamChunk {
    #[serde(default, deserialize_with = "lenient_vec")]
    pub choices: Vec<StreamChoice>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StreamChunk {
    /// A chunk with a single choice.
    pub fn from_delta(delta: ChoiceDelta, finish_reason: Option<&str>) -> Self {
        Self {
            choices: vec![StreamChoice {
                delta,
                finish_reason: finish_reason.map(str::to_string),
                extra: Map::new(),
            }],
            extra: Map::new(),
        }
    }
}

/// Per-choice portion of a chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StreamChoice {
    #[serde(default, deserialize_with = "lenient")]
    pub delta: ChoiceDelta,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StreamChoice {
    /// Parsed terminal reason, if this choice carries one.
    pub fn finish(&self) -> Option<FinishReason> {
        self.finish_reason
            .as_deref()
            .filter(|reason| !reason.is_empty())
            .map(FinishReason::parse)
    }
}

/// Incremental message content carried by a choice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChoiceDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<TextCarrier>,
    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallFragment>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChoiceDelta {
    /// Delta carrying only answer text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Some(TextCarrier::Text(text.into())),
            ..Default::default()
        }
    }

    /// Delta carrying only tool-call fragments.
    pub fn tool_calls(fragments: Vec<ToolCallFragment>) -> Self {
        Self {
            tool_calls: Some(fragments),
            ..Default::default()
        }
    }

    /// Attach a vendor field, e.g. `reasoning_content`.
    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }
}

/// Text that may arrive as a flat string or as a list of parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TextCarrier {
    Text(String),
    Parts(Vec<Value>),
    Other(Value),
}

impl TextCarrier {
    /// Interpret an arbitrary JSON value as a text carrier.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(parts) => Self::Parts(parts.clone()),
            other => Self::Other(other.clone()),
        }
    }

    /// Flatten to plain text. Empty results are treated as absent.
    pub fn normalize(&self) -> Option<String> {
        let text = match self {
            Self::Text(s) => s.clone(),
            Self::Parts(parts) => parts.iter().filter_map(part_text).collect(),
            Self::Other(value) => part_text(value).unwrap_or_default(),
        };
        (!text.is_empty()).then_some(text)
    }
}

fn part_text(part: &Value) -> Option<String> {
    match part {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => obj.get("text").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

/// A partial tool-call update. Every field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolCallFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionFragment>,
}

impl ToolCallFragment {
    pub fn new(id: Option<&str>, index: Option<u32>) -> Self {
        Self {
            id: id.map(str::to_string),
            index,
            ..Default::default()
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.function.get_or_insert_with(Default::default).name = Some(name.to_string());
        self
    }

    pub fn arguments(mut self, arguments: &str) -> Self {
        self.function.get_or_insert_with(Default::default).arguments =
            Some(arguments.to_string());
        self
    }

    /// Non-empty identifier, if any.
    pub fn call_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn function_name(&self) -> Option<&str> {
        self.function
            .as_ref()
            .and_then(|f| f.name.as_deref())
            .filter(|name| !name.is_empty())
    }

    pub fn argument_text(&self) -> Option<&str> {
        self.function
            .as_ref()
            .and_then(|f| f.arguments.as_deref())
            .filter(|args| !args.is_empty())
    }
}

/// Function portion of a tool-call fragment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FunctionFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// Why a round's stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "tool_calls" => Self::ToolCalls,
            "content_filter" => Self::ContentFilter,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ToolCalls => "tool_calls",
            Self::ContentFilter => "content_filter",
            Self::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Malformed fields decode to their default so the rest of the chunk
// (content, terminal reason) survives.

fn decode_or_skip<T: DeserializeOwned>(value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            debug!(error = %err, "skipping malformed stream field");
            None
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(decode_or_skip).unwrap_or_default())
}

/// Decodes each list element on its own, dropping the ones that fail.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Ok(Some(items.into_iter().filter_map(decode_or_skip).collect())),
        Some(Value::Null) | None => Ok(None),
        Some(other) => {
            debug!(value = %other, "expected a list in stream field");
            Ok(None)
        }
    }
}

fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(lenient_list(deserializer)?.unwrap_or_default())
}
