//! Typed access to tool call arguments.

use serde_json::{Map, Value};

use crate::error::WarbotError;

/// Keyword arguments handed to a capability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    value: Value,
}

impl ToolArguments {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// No arguments at all.
    pub fn empty() -> Self {
        Self::from_map(Map::new())
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self {
            value: Value::Object(map),
        }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, WarbotError> {
        self.get_str_opt(key)
            .ok_or_else(|| WarbotError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Get an integer argument.
    pub fn get_i64(&self, key: &str) -> Result<i64, WarbotError> {
        self.value
            .get(key)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| WarbotError::InvalidArgument(format!("Missing integer argument: {key}")))
    }

    /// Get a boolean argument.
    pub fn get_bool(&self, key: &str) -> Result<bool, WarbotError> {
        self.value
            .get(key)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| WarbotError::InvalidArgument(format!("Missing boolean argument: {key}")))
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, WarbotError> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            WarbotError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
