//! Reasoning-text probing.
//!
//! Providers disagree on where reasoning text lives. The extractor walks an
//! ordered list of `(level, field)` probes and takes the first one that
//! yields non-empty text.

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::types::{StreamChoice, StreamChunk, TextCarrier};

/// Field names known to carry reasoning text, in priority order.
pub const REASONING_FIELDS: &[&str] = &[
    "thinking",
    "reasoning",
    "reasoning_content",
    "internal_monologue",
];

/// Structural level a probe looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeLevel {
    /// `choices[0].delta`
    Delta,
    /// `choices[0]`
    Choice,
    /// The whole chunk.
    Chunk,
}

/// A single named field at a single level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningProbe {
    pub level: ProbeLevel,
    pub field: Cow<'static, str>,
}

impl ReasoningProbe {
    pub fn new(level: ProbeLevel, field: impl Into<Cow<'static, str>>) -> Self {
        Self {
            level,
            field: field.into(),
        }
    }

    fn probe(&self, chunk: &StreamChunk, choice: &StreamChoice) -> Option<String> {
        let fields: &Map<String, Value> = match self.level {
            ProbeLevel::Delta => &choice.delta.extra,
            ProbeLevel::Choice => &choice.extra,
            ProbeLevel::Chunk => &chunk.extra,
        };
        fields
            .get(self.field.as_ref())
            .and_then(|value| TextCarrier::from_value(value).normalize())
    }
}

/// Ordered list of reasoning probes.
#[derive(Debug, Clone)]
pub struct ReasoningExtractor {
    probes: Vec<ReasoningProbe>,
}

impl Default for ReasoningExtractor {
    /// Every known field at the delta level, then the choice level, then
    /// the chunk level.
    fn default() -> Self {
        let probes = [ProbeLevel::Delta, ProbeLevel::Choice, ProbeLevel::Chunk]
            .into_iter()
            .flat_map(|level| {
                REASONING_FIELDS
                    .iter()
                    .map(move |field| ReasoningProbe::new(level, *field))
            })
            .collect();
        Self { probes }
    }
}

impl ReasoningExtractor {
    /// An extractor with no probes.
    pub fn empty() -> Self {
        Self { probes: Vec::new() }
    }

    /// Append a probe with the lowest priority.
    pub fn with_probe(mut self, probe: ReasoningProbe) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn probes(&self) -> &[ReasoningProbe] {
        &self.probes
    }

    /// First non-empty reasoning text in probe order.
    pub fn extract(&self, chunk: &StreamChunk, choice: &StreamChoice) -> Option<String> {
        self.probes.iter().find_map(|probe| probe.probe(chunk, choice))
    }
}
