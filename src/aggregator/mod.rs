//! Delta aggregation.
//!
//! [`DeltaAggregator`] turns the ordered chunks of one streaming response
//! into semantic events: reasoning text, answer text, completed tool-call
//! batches, and a final completion signal. It is synchronous and owns all
//! per-round state; one instance serves one round at a time.
//!
//! ```
//! use warbot::aggregator::{AggregatorEvent, DeltaAggregator};
//! use warbot::types::{ChoiceDelta, StreamChunk, FinishReason};
//!
//! let mut aggregator = DeltaAggregator::new();
//! let events = aggregator.feed(&StreamChunk::from_delta(ChoiceDelta::text("hi"), Some("stop")));
//! assert_eq!(
//!     events,
//!     vec![
//!         AggregatorEvent::Answer("hi".into()),
//!         AggregatorEvent::Finished(FinishReason::Stop),
//!     ]
//! );
//! ```

pub mod accumulator;
pub mod reasoning;

use tracing::{debug, warn};

use crate::types::{FinishReason, StreamChunk, ToolCallRequest};

pub use accumulator::{ToolCallAccumulator, ToolCallAnomaly, ToolCallArena};
pub use reasoning::{ProbeLevel, ReasoningExtractor, ReasoningProbe, REASONING_FIELDS};

/// Semantic events produced from chunks.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregatorEvent {
    /// Reasoning text increment.
    Reasoning(String),
    /// Answer text increment.
    Answer(String),
    /// Every tool call of the round, in creation order.
    ToolCalls(Vec<ToolCallRequest>),
    /// A tool call that was dropped at finalization.
    Anomaly(ToolCallAnomaly),
    /// The round ended with this terminal reason.
    Finished(FinishReason),
}

/// Streaming chunk aggregator.
#[derive(Debug, Default)]
pub struct DeltaAggregator {
    reasoning: ReasoningExtractor,
    tool_calls: ToolCallArena,
}

impl DeltaAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom reasoning extractor.
    pub fn with_reasoning_extractor(mut self, extractor: ReasoningExtractor) -> Self {
        self.reasoning = extractor;
        self
    }

    /// Accumulators still waiting for a terminal reason.
    pub fn pending_tool_calls(&self) -> &[ToolCallAccumulator] {
        self.tool_calls.slots()
    }

    /// Inspect one chunk and emit its events, in order, through `emit`.
    pub fn consume<F>(&mut self, chunk: &StreamChunk, mut emit: F)
    where
        F: FnMut(AggregatorEvent),
    {
        let Some(choice) = chunk.choices.first() else {
            debug!("received chunk with no choices");
            return;
        };

        if let Some(text) = self.reasoning.extract(chunk, choice) {
            debug!(len = text.len(), "reasoning delta");
            emit(AggregatorEvent::Reasoning(text));
        }

        if let Some(text) = choice.delta.content.as_ref().and_then(|c| c.normalize()) {
            emit(AggregatorEvent::Answer(text));
        }

        if let Some(fragments) = choice.delta.tool_calls.as_deref() {
            if !fragments.is_empty() {
                debug!(count = fragments.len(), "tool call deltas");
            }
            for (ordinal, fragment) in fragments.iter().enumerate() {
                self.tool_calls.apply(fragment, ordinal);
            }
        }

        let Some(reason) = choice.finish() else {
            return;
        };
        debug!(finish_reason = %reason, "finish reason");

        if reason == FinishReason::ToolCalls {
            let (requests, anomalies) = self.tool_calls.drain();
            for anomaly in anomalies {
                warn!(?anomaly, "dropping tool call without a name");
                emit(AggregatorEvent::Anomaly(anomaly));
            }
            if !requests.is_empty() {
                emit(AggregatorEvent::ToolCalls(requests));
            }
        } else if !self.tool_calls.is_empty() {
            debug!(
                discarded = self.tool_calls.len(),
                "discarding unfinished tool calls"
            );
        }
        self.tool_calls.clear();

        emit(AggregatorEvent::Finished(reason));
    }

    /// Like [`consume`](Self::consume), collecting the events.
    pub fn feed(&mut self, chunk: &StreamChunk) -> Vec<AggregatorEvent> {
        let mut events = Vec::new();
        self.consume(chunk, |event| events.push(event));
        events
    }
}
