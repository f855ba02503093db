//! LLM integration - OpenAI-compatible chat completions
//!
//! This module provides:
//! - `TextCompletion`, the seam the reconciliation step talks to
//! - `LlmClient`, an HTTP implementation for local model hosts
//! - Request/response types matching the OpenAI-compatible API

mod client;
mod types;

pub use client::{LlmClient, LlmClientBuilder, TextCompletion};
pub use types::{ChatRequest, ChatResponse, Choice, LlmResponse, Message, MessageRole, Usage};
