//! Reasoning-oracle client implementations for Colloquy.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
