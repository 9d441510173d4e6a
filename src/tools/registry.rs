//! Name-keyed tool catalog.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::arguments::ToolArguments;
use super::tool::Tool;
use super::validation::validate_descriptor;
use crate::error::WarbotError;
use crate::provider::ToolDefinition;

/// Registry of tools, kept in registration order.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// Registering a name that already exists replaces the earlier tool in
    /// place. Descriptors with an empty name or a malformed parameter
    /// schema are rejected.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), WarbotError> {
        validate_descriptor(tool.name(), &tool.parameters().schema).map_err(|reason| {
            WarbotError::InvalidDescriptor {
                name: tool.name().to_string(),
                reason,
            }
        })?;

        let name = tool.name().to_string();
        match self.by_name.get(&name) {
            Some(&slot) => {
                debug!(tool = %name, "replacing registered tool");
                self.tools[slot] = tool;
            }
            None => {
                self.by_name.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.by_name.get(name).map(|&slot| &self.tools[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Tool definitions for every registered tool, in registration order.
    pub fn export(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters().schema.clone(),
            })
            .collect()
    }

    /// Invoke a tool by name. Handler errors are returned unchanged.
    pub async fn dispatch(
        &self,
        name: &str,
        args: &ToolArguments,
    ) -> Result<serde_json::Value, WarbotError> {
        let tool = self
            .get(name)
            .ok_or_else(|| WarbotError::UnknownCapability(name.to_string()))?;
        tool.execute(args).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|t| t.name()))
            .finish()
    }
}
