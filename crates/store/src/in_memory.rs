//! In-memory backends — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use colloquy_core::checkpoint::CheckpointStore;
use colloquy_core::error::StoreError;
use colloquy_core::message::{ThreadId, ThreadState};
use colloquy_core::search::{Document, DocumentIndex, SearchHit, SearchRequest};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory checkpoint store backed by a map.
pub struct InMemoryCheckpointStore {
    threads: Arc<RwLock<HashMap<ThreadId, ThreadState>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self {
            threads: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of threads with a persisted snapshot.
    pub async fn thread_count(&self) -> usize {
        self.threads.read().await.len()
    }
}

impl Default for InMemoryCheckpointStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self, thread: &ThreadId) -> Result<Option<ThreadState>, StoreError> {
        Ok(self.threads.read().await.get(thread).cloned())
    }

    async fn save(&self, thread: &ThreadId, state: &ThreadState) -> Result<(), StoreError> {
        self.threads
            .write()
            .await
            .insert(thread.clone(), state.clone());
        Ok(())
    }
}

/// An in-memory document index using keyword-occurrence scoring.
///
/// No embeddings involved — relevance is the number of query occurrences
/// normalized by document length. Good enough to exercise the search
/// boundary in tests.
pub struct InMemoryDocumentIndex {
    documents: Arc<RwLock<Vec<ScopedDocument>>>,
}

struct ScopedDocument {
    collection: String,
    index: String,
    document: Document,
}

impl InMemoryDocumentIndex {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add a document under a (collection, index) scope.
    pub async fn insert(&self, collection: &str, index: &str, document: Document) {
        self.documents.write().await.push(ScopedDocument {
            collection: collection.to_string(),
            index: index.to_string(),
            document,
        });
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

impl Default for InMemoryDocumentIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentIndex for InMemoryDocumentIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn similarity_search(
        &self,
        request: SearchRequest,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let documents = self.documents.read().await;
        let query_lower = request.query.to_lowercase();

        let mut hits: Vec<SearchHit> = documents
            .iter()
            .filter(|d| d.collection == request.collection && d.index == request.index)
            .filter_map(|d| {
                let content_lower = d.document.content.to_lowercase();
                let occurrences = content_lower.matches(&query_lower).count();
                if occurrences == 0 {
                    return None;
                }
                let score =
                    occurrences as f32 / (d.document.content.len() as f32 / 100.0).max(1.0);
                Some(SearchHit {
                    document: d.document.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(request.limit);
        Ok(hits)
    }
}
