//! # handoff-openai
//!
//! A [`CompletionService`](handoff_core::CompletionService) for any endpoint
//! that speaks the OpenAI chat-completions protocol (OpenAI itself, Ollama,
//! vLLM, OpenRouter and similar).
//!
//! Each completion is a single `system` + `user` exchange. HTTP failures are
//! mapped onto `CompletionError` kinds: 429 is `Quota`, any other non-success
//! status is `Api`, an elapsed deadline is `Timeout`, and a reply without text
//! is `Malformed`.

pub mod client;

pub use client::{OpenAiCompletion, OpenAiConfig};
