//! In-flight tool-call reconstruction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{ToolCallFragment, ToolCallRequest};

/// Mutable build state for one tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallAccumulator {
    key: String,
    id: Option<String>,
    index: Option<u32>,
    name: Option<String>,
    arguments: Vec<String>,
}

impl ToolCallAccumulator {
    fn new(key: String, index: Option<u32>) -> Self {
        Self {
            key,
            id: None,
            index,
            name: None,
            arguments: Vec::new(),
        }
    }

    fn merge(&mut self, fragment: &ToolCallFragment) {
        if self.id.is_none() {
            self.id = fragment.call_id().map(str::to_string);
        }
        if self.index.is_none() {
            self.index = fragment.index;
        }
        if self.name.is_none() {
            self.name = fragment.function_name().map(str::to_string);
        }
        if let Some(args) = fragment.argument_text() {
            self.arguments.push(args.to_string());
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn index(&self) -> Option<u32> {
        self.index
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Concatenated argument fragments.
    pub fn arguments(&self) -> String {
        self.arguments.concat()
    }

    fn finalize(self) -> Result<ToolCallRequest, ToolCallAnomaly> {
        let arguments = self.arguments();
        let id = self.id.unwrap_or_else(|| self.key.clone());
        match self.name {
            Some(name) => Ok(ToolCallRequest { id, name, arguments }),
            None => Err(ToolCallAnomaly::MissingName {
                id,
                index: self.index,
                arguments,
            }),
        }
    }
}

/// A tool call that could not be finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolCallAnomaly {
    /// No fragment ever carried a capability name.
    MissingName {
        id: String,
        index: Option<u32>,
        arguments: String,
    },
}

/// Arena of accumulators for one streaming response.
///
/// Accumulators live in creation order; every key that has been used to
/// address one (identifier or synthesized) maps to its slot.
#[derive(Debug, Default)]
pub struct ToolCallArena {
    slots: Vec<ToolCallAccumulator>,
    keys: HashMap<String, usize>,
}

impl ToolCallArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[ToolCallAccumulator] {
        &self.slots
    }

    /// Merge one fragment. `ordinal` is its position within its chunk's
    /// tool-call list.
    pub fn apply(&mut self, fragment: &ToolCallFragment, ordinal: usize) {
        let slot = self.resolve(fragment, ordinal);
        self.slots[slot].merge(fragment);
    }

    /// Key resolution: identifier, then a live accumulator with the same
    /// index, then a key synthesized from the index, then one synthesized
    /// from the ordinal.
    fn resolve(&mut self, fragment: &ToolCallFragment, ordinal: usize) -> usize {
        if let Some(id) = fragment.call_id() {
            if let Some(&slot) = self.keys.get(id) {
                return slot;
            }
            // An identifier arriving after index-only fragments binds to
            // the accumulator already collecting that index.
            if let Some(slot) = fragment.index.and_then(|index| self.unbound_slot_for(index)) {
                self.keys.insert(id.to_string(), slot);
                return slot;
            }
            return self.create(id.to_string(), fragment.index);
        }

        if let Some(index) = fragment.index {
            if let Some(slot) = self.slot_for_index(index) {
                return slot;
            }
            let key = format!("idx_{index}");
            return match self.keys.get(&key) {
                Some(&slot) => slot,
                None => self.create(key, Some(index)),
            };
        }

        let key = format!("call_{ordinal}");
        match self.keys.get(&key) {
            Some(&slot) => slot,
            None => self.create(key, None),
        }
    }

    fn slot_for_index(&self, index: u32) -> Option<usize> {
        self.slots.iter().position(|acc| acc.index == Some(index))
    }

    fn unbound_slot_for(&self, index: u32) -> Option<usize> {
        self.slots
            .iter()
            .position(|acc| acc.index == Some(index) && acc.id.is_none())
    }

    fn create(&mut self, key: String, index: Option<u32>) -> usize {
        let slot = self.slots.len();
        self.slots.push(ToolCallAccumulator::new(key.clone(), index));
        self.keys.insert(key, slot);
        slot
    }

    /// Finalize every accumulator in creation order and empty the arena.
    pub fn drain(&mut self) -> (Vec<ToolCallRequest>, Vec<ToolCallAnomaly>) {
        self.keys.clear();
        let mut requests = Vec::with_capacity(self.slots.len());
        let mut anomalies = Vec::new();
        for acc in self.slots.drain(..) {
            match acc.finalize() {
                Ok(request) => requests.push(request),
                Err(anomaly) => anomalies.push(anomaly),
            }
        }
        (requests, anomalies)
    }

    /// Drop all in-flight state.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.keys.clear();
    }
}
