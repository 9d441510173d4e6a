//! Core types for Warbot.

pub mod message;
pub mod stream;

pub use message::*;
pub use stream::*;
