// src/llm/mod.rs

pub mod client;
pub mod payload;
pub mod streaming;

pub use client::{GeminiClient, GeminiConfig, LlmError};
pub use payload::{build_payload, ConversationMessage, Role, UpstreamPayload};
pub use streaming::{translate_stream, StreamEvent, StreamOutcome};
