//! opq-providers: Completion provider implementations for opq
//!
//! This crate provides implementations of the CompletionProvider trait for
//! OpenAI-compatible and Anthropic HTTP APIs.

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAIProvider;
