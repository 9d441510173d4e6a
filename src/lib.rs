//! Warbot — a streaming, tool-calling chat agent.
//!
//! The crate has two cores. [`aggregator`] turns the incremental deltas of a
//! streamed chat completion into reasoning text, answer text and complete
//! tool calls. [`agent`] drives a conversation through as many model rounds
//! as it takes for the model to stop asking for tools, dispatching each call
//! through a [`tools::ToolRegistry`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use warbot::prelude::*;
//!
//! # async fn example() -> Result<(), warbot::error::WarbotError> {
//! let config = WarbotConfig::from_env();
//! let provider = warbot::provider::create_provider(&config)?;
//!
//! let mut registry = ToolRegistry::new();
//! for tool in warbot::tools::builtin::all_tools() {
//!     registry.register(tool)?;
//! }
//!
//! let options = ConversationOptions::builder()
//!     .system_prompt(DEFAULT_SYSTEM_PROMPT)
//!     .build();
//! let mut conversation = Conversation::new(Arc::new(provider), registry, options);
//! let answer = conversation.send_message("How do I prepare for a blackout?", &mut NullSink).await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod aggregator;
pub mod config;
pub mod error;
pub mod prelude;
pub mod provider;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
