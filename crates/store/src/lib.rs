//! Checkpoint-store and document-index backends for Colloquy.

pub mod in_memory;
pub mod vector;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::{InMemoryCheckpointStore, InMemoryDocumentIndex};
pub use vector::{cosine_similarity, rank_by_similarity};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteCheckpointStore, SqliteDocumentIndex, connect};
