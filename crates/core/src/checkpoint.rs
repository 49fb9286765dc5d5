//! Checkpoint store — durable cross-invocation memory.
//!
//! The orchestrator reads a thread's state before running and writes it
//! back after, making multi-call conversations resumable: a second call
//! with the same thread id continues from the prior transcript instead of
//! starting over. Durability and atomicity of `save` are the backend's
//! concern; the loop treats load/save as the authoritative boundary of
//! "what happened before this invocation". Concurrent invocations against
//! one thread id are not coordinated — last save wins.

use crate::error::StoreError;
use crate::message::{ThreadId, ThreadState};
use async_trait::async_trait;

/// The checkpoint boundary, keyed by thread id.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Load the persisted state for a thread, if any.
    async fn load(
        &self,
        thread: &ThreadId,
    ) -> std::result::Result<Option<ThreadState>, StoreError>;

    /// Persist the full state for a thread, replacing any prior snapshot.
    async fn save(
        &self,
        thread: &ThreadId,
        state: &ThreadState,
    ) -> std::result::Result<(), StoreError>;
}
