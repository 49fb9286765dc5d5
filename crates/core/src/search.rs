//! Document similarity-search boundary.
//!
//! The agent treats the document database as a black box behind this
//! trait: give it a collection, a named index, query text, and a result
//! count; get back the top matches with similarity scores, best first.

use crate::error::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A stored document as returned by a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document id
    pub id: String,

    /// The document text
    pub content: String,

    /// Arbitrary metadata (department, source file, …)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// A similarity-search request, scoped to one collection and one index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The logical collection to search
    pub collection: String,

    /// The named index within the collection
    pub index: String,

    /// The query text
    pub query: String,

    /// Maximum number of results
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

/// One search result: a document and its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub document: Document,
    pub score: f32,
}

/// The document-index boundary.
///
/// Implementations: SQLite with stored embeddings, in-memory keyword
/// scoring (for tests). Searches are read-only and independent, so
/// callers may issue them concurrently.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Return the top matches for the request, ordered by descending
    /// score. Backend failures propagate — no internal retries.
    async fn similarity_search(
        &self,
        request: SearchRequest,
    ) -> std::result::Result<Vec<SearchHit>, StoreError>;
}
