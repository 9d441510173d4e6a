//! Conversation loop and display hooks.

pub mod conversation;
pub mod sink;

pub use conversation::{
    Conversation, ConversationOptions, LoopState, RoundOutcome, DEFAULT_SYSTEM_PROMPT,
};
pub use sink::{DisplaySink, NullSink, RecordingSink};
