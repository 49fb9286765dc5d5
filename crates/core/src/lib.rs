//! # Colloquy Core
//!
//! Domain types, traits, and error definitions for the Colloquy
//! conversational agent. This crate has **zero framework dependencies** —
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here: the reasoning
//! oracle ([`Provider`]), the document index ([`DocumentIndex`]), the
//! checkpoint store ([`CheckpointStore`]), and agent capabilities
//! ([`Tool`]). Implementations live in their respective crates. This
//! enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod checkpoint;
pub mod error;
pub mod message;
pub mod provider;
pub mod search;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use checkpoint::CheckpointStore;
pub use error::{AgentError, Error, ProviderError, Result, StoreError, ToolError};
pub use message::{Message, StateDelta, ThreadId, ThreadState, ToolInvocation};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use search::{Document, DocumentIndex, SearchHit, SearchRequest};
pub use tool::{Tool, ToolCall, ToolOutput, ToolRegistry};
