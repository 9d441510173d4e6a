//! The tool-calling conversation loop.
//!
//! A [`Conversation`] owns an append-only history. Each call to
//! [`Conversation::send_message`] drives one user request through as many
//! model rounds as it takes for the model to stop asking for tools:
//!
//! ```text
//! AwaitingModel --(tool calls)--> ExecutingTools --> AwaitingModel
//!       \--(no tool calls)--> Done
//! ```

use std::sync::Arc;

use bon::Builder;
use futures::StreamExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::aggregator::{AggregatorEvent, DeltaAggregator};
use crate::error::WarbotError;
use crate::provider::{ModelProvider, ProviderRequest};
use crate::tools::{ToolArguments, ToolRegistry};
use crate::types::{FinishReason, Message, ToolCallRequest};

use super::sink::DisplaySink;

/// System prompt used by the CLI.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an assistant that helps users understand major world conflicts, \
assess risks for specific locations, and prepare for emergency scenarios such as utilities interruption, \
internet loss, and armed conflict. Be concise, clear, and prioritize actionable guidance.\n\n\
CRITICAL RULES FOR TOOL USAGE:\n\
1. When you receive tool results, interpret the JSON data and present it in a clear, human-readable format. \
Do NOT dump raw JSON.\n\
2. You MUST ONLY use information from the tool results. NEVER supplement with your own knowledge or add \
information not present in the tool results.\n\
3. If the tool returns limited data, present ONLY what the tool returned in a formatted way.\n\
4. Format the tool data nicely (use bullet points, clear structure, etc.) but only include the exact data \
from the tool results.";

/// Per-conversation settings.
#[derive(Debug, Clone, Default, Builder)]
pub struct ConversationOptions {
    /// Seeded as the first history entry of a new conversation.
    #[builder(into)]
    pub system_prompt: Option<String>,
    /// Maximum model rounds per user message. `None` means unbounded.
    pub max_rounds: Option<usize>,
}

/// Loop state for one user message.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    AwaitingModel,
    ExecutingTools(Vec<ToolCallRequest>),
    Done(String),
}

/// What a single streamed round produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    pub answer: String,
    pub tool_calls: Vec<ToolCallRequest>,
    pub finish_reason: FinishReason,
}

/// A conversation with a model, backed by a tool registry.
pub struct Conversation {
    id: Uuid,
    provider: Arc<dyn ModelProvider>,
    registry: ToolRegistry,
    options: ConversationOptions,
    history: Vec<Message>,
}

impl Conversation {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        registry: ToolRegistry,
        options: ConversationOptions,
    ) -> Self {
        let history = options
            .system_prompt
            .as_ref()
            .map(|prompt| vec![Message::system(prompt.clone())])
            .unwrap_or_default();
        Self::from_history(provider, registry, options, history)
    }

    /// Resume from an existing history. The system prompt option is ignored.
    pub fn from_history(
        provider: Arc<dyn ModelProvider>,
        registry: ToolRegistry,
        options: ConversationOptions,
        history: Vec<Message>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider,
            registry,
            options,
            history,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Send a user message and drive the loop to a final answer.
    ///
    /// Transport failures are returned as errors; the history then holds
    /// the user message plus every round that completed before the failure.
    pub async fn send_message(
        &mut self,
        input: &str,
        sink: &mut dyn DisplaySink,
    ) -> Result<String, WarbotError> {
        self.history.push(Message::user(input));

        let mut state = LoopState::AwaitingModel;
        let mut rounds = 0usize;

        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    if let Some(limit) = self.options.max_rounds {
                        if rounds >= limit {
                            warn!(conversation = %self.id, limit, "round limit reached");
                            return Err(WarbotError::RoundLimitExceeded(limit));
                        }
                    }
                    rounds += 1;

                    let outcome = self.stream_round(rounds, sink).await?;
                    if outcome.tool_calls.is_empty() {
                        if outcome.finish_reason == FinishReason::ToolCalls {
                            warn!(
                                conversation = %self.id,
                                round = rounds,
                                "tool_calls finish without usable tool calls"
                            );
                        }
                        self.history.push(Message::assistant(outcome.answer.clone()));
                        LoopState::Done(outcome.answer)
                    } else {
                        debug!(
                            conversation = %self.id,
                            round = rounds,
                            tool_calls = outcome.tool_calls.len(),
                            "tool calls detected"
                        );
                        LoopState::ExecutingTools(outcome.tool_calls)
                    }
                }
                LoopState::ExecutingTools(calls) => {
                    self.history.push(Message::assistant_tool_calls(calls.clone()));
                    for call in &calls {
                        let result = self.execute_tool(call, sink).await;
                        self.history
                            .push(Message::tool_result(&call.id, &call.name, &result));
                    }
                    LoopState::AwaitingModel
                }
                LoopState::Done(answer) => return Ok(answer),
            };
        }
    }

    /// Stream one round and aggregate it. Does not touch the history.
    async fn stream_round(
        &self,
        round: usize,
        sink: &mut dyn DisplaySink,
    ) -> Result<RoundOutcome, WarbotError> {
        let request = ProviderRequest {
            messages: self.history.clone(),
            tools: self.registry.export(),
        };
        debug!(
            conversation = %self.id,
            round,
            model = self.provider.model_id(),
            "sending request to model"
        );

        let mut stream = self.provider.stream_chat(&request).await?;
        let mut aggregator = DeltaAggregator::new();
        let mut answer = String::new();
        let mut tool_calls: Vec<ToolCallRequest> = Vec::new();
        let mut finish_reason = None;
        let mut tool_call_seen = false;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            aggregator.consume(&chunk, |event| match event {
                AggregatorEvent::Reasoning(text) => sink.on_reasoning(&text),
                AggregatorEvent::Answer(text) => {
                    if !tool_call_seen {
                        sink.on_answer(&text);
                    }
                    answer.push_str(&text);
                }
                AggregatorEvent::ToolCalls(calls) => {
                    tool_call_seen = true;
                    for call in &calls {
                        sink.on_tool_call(call);
                    }
                    tool_calls.extend(calls);
                }
                AggregatorEvent::Anomaly(_) => {}
                AggregatorEvent::Finished(reason) => finish_reason = Some(reason),
            });

            if finish_reason.is_some() {
                break;
            }
        }

        let finish_reason = finish_reason.ok_or_else(|| {
            WarbotError::Stream("stream ended before a finish reason".to_string())
        })?;

        Ok(RoundOutcome {
            answer,
            tool_calls,
            finish_reason,
        })
    }

    /// Run one tool call. Failures become a structured error payload.
    async fn execute_tool(&self, call: &ToolCallRequest, sink: &mut dyn DisplaySink) -> serde_json::Value {
        let args = match call.decode_arguments() {
            Ok(map) => ToolArguments::from_map(map),
            Err(err) => {
                warn!(tool = %call.name, error = %err, "undecodable tool arguments, using none");
                ToolArguments::empty()
            }
        };
        debug!(tool = %call.name, args = %args.raw(), "executing tool");

        let (result, is_error) = match self.registry.dispatch(&call.name, &args).await {
            Ok(value) => (value, false),
            Err(err) => {
                warn!(tool = %call.name, error = %err, "tool failed");
                (err.to_tool_payload(), true)
            }
        };
        debug!(tool = %call.name, %result, "tool returned");

        sink.on_tool_result(call, &result, is_error);
        result
    }
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("id", &self.id)
            .field("model", &self.provider.model_id())
            .field("registry", &self.registry)
            .field("history", &self.history.len())
            .finish()
    }
}
