//! Live display hooks for a conversation round.

use crate::types::ToolCallRequest;

/// Receives streamed output synchronously, in chunk-arrival order.
///
/// Every hook has a no-op default so sinks only implement what they show.
pub trait DisplaySink: Send {
    /// A reasoning-text increment.
    fn on_reasoning(&mut self, _text: &str) {}

    /// An answer-text increment. Not called for text that arrives after a
    /// tool call has been finalized in the same round.
    fn on_answer(&mut self, _text: &str) {}

    /// A tool call was finalized and is about to be dispatched.
    fn on_tool_call(&mut self, _call: &ToolCallRequest) {}

    /// A tool call finished; `result` is what will be sent back to the model.
    fn on_tool_result(&mut self, _call: &ToolCallRequest, _result: &serde_json::Value, _is_error: bool) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DisplaySink for NullSink {}

/// Records everything it is shown.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub reasoning: String,
    pub answer: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub tool_results: Vec<(String, serde_json::Value, bool)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for RecordingSink {
    fn on_reasoning(&mut self, text: &str) {
        self.reasoning.push_str(text);
    }

    fn on_answer(&mut self, text: &str) {
        self.answer.push_str(text);
    }

    fn on_tool_call(&mut self, call: &ToolCallRequest) {
        self.tool_calls.push(call.clone());
    }

    fn on_tool_result(&mut self, call: &ToolCallRequest, result: &serde_json::Value, is_error: bool) {
        self.tool_results.push((call.id.clone(), result.clone(), is_error));
    }
}
