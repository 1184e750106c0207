//! LLM integration for rewriting extracted text.

mod client;

pub use client::{LlmClient, LlmConfig, LlmError, API_KEY_VARS, DEFAULT_ENDPOINT, DEFAULT_MODEL};
