//! SQLite backends for checkpoints and the document index.
//!
//! A single database file holds two independent tables:
//! - `threads`   — one row per conversation thread, state as opaque JSON
//! - `documents` — embedded documents scoped by (collection, index_name)
//!
//! The document index stores embedding vectors as little-endian f32
//! blobs; queries are embedded through the configured provider and ranked
//! in-process by cosine similarity.

use crate::vector;
use async_trait::async_trait;
use colloquy_core::checkpoint::CheckpointStore;
use colloquy_core::error::StoreError;
use colloquy_core::message::{ThreadId, ThreadState};
use colloquy_core::provider::{EmbeddingRequest, Provider};
use colloquy_core::search::{Document, DocumentIndex, SearchHit, SearchRequest};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Open a SQLite pool with the settings both backends expect.
///
/// The database file is created if missing. Pass `"sqlite::memory:"` for
/// an ephemeral database (tests should cap the pool at one connection —
/// each in-memory connection is its own database).
pub async fn connect(url: &str) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| StoreError::Storage(format!("Invalid SQLite URL: {e}")))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .pragma("foreign_keys", "ON");

    SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await
        .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))
}

/// A SQLite checkpoint store — one row per thread, last save wins.
pub struct SqliteCheckpointStore {
    pool: SqlitePool,
}

impl SqliteCheckpointStore {
    /// Create a new store from a connection URL, running migrations.
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let pool = connect(url).await?;
        let store = Self::from_pool(pool).await?;
        info!("SQLite checkpoint store initialized at {url}");
        Ok(store)
    }

    /// Create from an existing pool (useful for sharing one database).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS threads (
                thread_id  TEXT PRIMARY KEY,
                state      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("threads table: {e}")))?;

        debug!("Checkpoint migrations complete");
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn load(&self, thread: &ThreadId) -> Result<Option<ThreadState>, StoreError> {
        let row = sqlx::query("SELECT state FROM threads WHERE thread_id = ?1")
            .bind(thread.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("thread load: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let state_json: String = row
            .try_get("state")
            .map_err(|e| StoreError::QueryFailed(format!("state column: {e}")))?;

        let state: ThreadState = serde_json::from_str(&state_json)
            .map_err(|e| StoreError::Serialization(format!("thread {thread}: {e}")))?;

        Ok(Some(state))
    }

    async fn save(&self, thread: &ThreadId, state: &ThreadState) -> Result<(), StoreError> {
        let state_json = serde_json::to_string(state)
            .map_err(|e| StoreError::Serialization(format!("thread {thread}: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO threads (thread_id, state, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(thread_id) DO UPDATE SET
                state = excluded.state,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(thread.as_str())
        .bind(&state_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("thread save: {e}")))?;

        debug!(thread = %thread, messages = state.len(), "Checkpoint saved");
        Ok(())
    }
}

/// A SQLite document index with stored embeddings.
///
/// Query text is embedded through the provider at search time; candidate
/// documents in the requested (collection, index) scope are ranked by
/// cosine similarity in-process.
pub struct SqliteDocumentIndex {
    pool: SqlitePool,
    embedder: Arc<dyn Provider>,
    embedding_model: String,
}

impl SqliteDocumentIndex {
    /// Create a new index from a connection URL, running migrations.
    pub async fn new(
        url: &str,
        embedder: Arc<dyn Provider>,
        embedding_model: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let pool = connect(url).await?;
        Self::from_pool(pool, embedder, embedding_model).await
    }

    /// Create from an existing pool (useful for sharing one database).
    pub async fn from_pool(
        pool: SqlitePool,
        embedder: Arc<dyn Provider>,
        embedding_model: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let index = Self {
            pool,
            embedder,
            embedding_model: embedding_model.into(),
        };
        index.run_migrations().await?;
        Ok(index)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id         TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                index_name TEXT NOT NULL,
                content    TEXT NOT NULL,
                metadata   TEXT NOT NULL DEFAULT '{}',
                embedding  BLOB,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("documents table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_scope ON documents(collection, index_name)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("scope index: {e}")))?;

        debug!("Document index migrations complete");
        Ok(())
    }

    /// Embed and insert documents under a (collection, index) scope.
    ///
    /// All contents go to the embedding endpoint in one batch; documents
    /// without an id get one assigned. Returns the number of documents
    /// inserted.
    pub async fn insert_documents(
        &self,
        collection: &str,
        index_name: &str,
        documents: Vec<Document>,
    ) -> Result<usize, StoreError> {
        if documents.is_empty() {
            return Ok(0);
        }

        let inputs: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs,
            })
            .await
            .map_err(|e| StoreError::EmbeddingFailed(e.to_string()))?;

        if response.embeddings.len() != documents.len() {
            return Err(StoreError::EmbeddingFailed(format!(
                "expected {} embeddings, got {}",
                documents.len(),
                response.embeddings.len()
            )));
        }

        let count = documents.len();
        for (mut document, embedding) in documents.into_iter().zip(response.embeddings) {
            if document.id.is_empty() {
                document.id = Uuid::new_v4().to_string();
            }

            let metadata_json = serde_json::to_string(&document.metadata)
                .map_err(|e| StoreError::Serialization(format!("metadata: {e}")))?;

            sqlx::query(
                r#"
                INSERT INTO documents (id, collection, index_name, content, metadata, embedding, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    collection = excluded.collection,
                    index_name = excluded.index_name,
                    content = excluded.content,
                    metadata = excluded.metadata,
                    embedding = excluded.embedding
                "#,
            )
            .bind(&document.id)
            .bind(collection)
            .bind(index_name)
            .bind(&document.content)
            .bind(&metadata_json)
            .bind(embedding_to_blob(&embedding))
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("document insert: {e}")))?;
        }

        debug!(collection, index_name, count, "Documents inserted");
        Ok(count)
    }

    fn row_to_candidate(row: &sqlx::sqlite::SqliteRow) -> Result<(Document, Vec<f32>), StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?;
        let metadata_json: String = row
            .try_get("metadata")
            .map_err(|e| StoreError::QueryFailed(format!("metadata column: {e}")))?;
        let blob: Vec<u8> = row
            .try_get("embedding")
            .map_err(|e| StoreError::QueryFailed(format!("embedding column: {e}")))?;

        let metadata = serde_json::from_str(&metadata_json).unwrap_or_default();

        Ok((
            Document {
                id,
                content,
                metadata,
            },
            blob_to_embedding(&blob),
        ))
    }
}

/// Serialize an embedding vector to little-endian bytes.
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[async_trait]
impl DocumentIndex for SqliteDocumentIndex {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn similarity_search(
        &self,
        request: SearchRequest,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![request.query.clone()],
            })
            .await
            .map_err(|e| StoreError::EmbeddingFailed(e.to_string()))?;

        let query_embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::EmbeddingFailed("no embedding returned".into()))?;

        let rows = sqlx::query(
            r#"
            SELECT id, content, metadata, embedding
            FROM documents
            WHERE collection = ?1 AND index_name = ?2 AND embedding IS NOT NULL
            "#,
        )
        .bind(&request.collection)
        .bind(&request.index)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::QueryFailed(format!("candidate scan: {e}")))?;

        let candidates: Vec<(Document, Vec<f32>)> = rows
            .iter()
            .map(Self::row_to_candidate)
            .collect::<Result<_, _>>()?;

        Ok(vector::rank_by_similarity(
            candidates,
            &query_embedding,
            request.limit,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::error::ProviderError;
    use colloquy_core::message::{Message, StateDelta};
    use colloquy_core::provider::{EmbeddingResponse, ProviderRequest, ProviderResponse};

    /// Deterministic embedder: maps text to a 3-dim vector keyed on which
    /// marker words it contains.
    struct FakeEmbedder;

    #[async_trait]
    impl Provider for FakeEmbedder {
        fn name(&self) -> &str {
            "fake_embedder"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("embeddings only".into()))
        }

        async fn embed(
            &self,
            request: EmbeddingRequest,
        ) -> Result<EmbeddingResponse, ProviderError> {
            let embeddings = request
                .inputs
                .iter()
                .map(|text| {
                    if text.contains("Maria") {
                        vec![1.0, 0.0, 0.0]
                    } else if text.contains("John") {
                        vec![0.0, 1.0, 0.0]
                    } else {
                        vec![0.0, 0.0, 1.0]
                    }
                })
                .collect();
            Ok(EmbeddingResponse {
                embeddings,
                model: request.model,
                usage: None,
            })
        }
    }

    /// One-connection in-memory pool — each sqlite::memory: connection is
    /// its own database, so the pool must not grow.
    async fn memory_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    fn doc(id: &str, content: &str) -> Document {
        Document {
            id: id.into(),
            content: content.into(),
            metadata: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn checkpoint_roundtrip() {
        let store = SqliteCheckpointStore::from_pool(memory_pool().await)
            .await
            .unwrap();
        let thread = ThreadId::from("t1");

        assert!(store.load(&thread).await.unwrap().is_none());

        let state = ThreadState::new()
            .merge(StateDelta::from(Message::human("q")))
            .merge(StateDelta::from(Message::ai("a")));
        store.save(&thread, &state).await.unwrap();

        let loaded = store.load(&thread).await.unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.messages[0].content(), "q");
        assert_eq!(loaded.messages[1].content(), "a");
    }

    #[tokio::test]
    async fn checkpoint_save_is_upsert() {
        let store = SqliteCheckpointStore::from_pool(memory_pool().await)
            .await
            .unwrap();
        let thread = ThreadId::from("t1");

        let first = ThreadState::new().merge(StateDelta::from(Message::human("one")));
        store.save(&thread, &first).await.unwrap();

        let second = first.merge(StateDelta::from(Message::ai("two")));
        store.save(&thread, &second).await.unwrap();

        let loaded = store.load(&thread).await.unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[tokio::test]
    async fn checkpoint_preserves_tool_messages() {
        let store = SqliteCheckpointStore::from_pool(memory_pool().await)
            .await
            .unwrap();
        let thread = ThreadId::from("t1");

        let state = ThreadState::new().merge(StateDelta::from(Message::tool_error(
            "call_1",
            "employee_lookup",
            "Error: index unreachable",
        )));
        store.save(&thread, &state).await.unwrap();

        let loaded = store.load(&thread).await.unwrap().unwrap();
        match &loaded.messages[0] {
            Message::ToolResult {
                call_id, is_error, ..
            } => {
                assert_eq!(call_id, "call_1");
                assert!(is_error);
            }
            other => panic!("expected ToolResult, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn index_insert_and_search() {
        let index = SqliteDocumentIndex::from_pool(
            memory_pool().await,
            Arc::new(FakeEmbedder),
            "fake-model",
        )
        .await
        .unwrap();

        index
            .insert_documents(
                "employees",
                "vector_index",
                vec![
                    doc("1", "Maria Santos, HR generalist"),
                    doc("2", "John Doe, accountant"),
                ],
            )
            .await
            .unwrap();

        let hits = index
            .similarity_search(SearchRequest {
                collection: "employees".into(),
                index: "vector_index".into(),
                query: "Maria".into(),
                limit: 10,
            })
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document.id, "1");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert!(hits[1].score < hits[0].score);
    }

    #[tokio::test]
    async fn index_search_respects_scope_and_limit() {
        let index = SqliteDocumentIndex::from_pool(
            memory_pool().await,
            Arc::new(FakeEmbedder),
            "fake-model",
        )
        .await
        .unwrap();

        index
            .insert_documents(
                "employees",
                "vector_index",
                vec![
                    doc("1", "Maria one"),
                    doc("2", "Maria two"),
                    doc("3", "Maria three"),
                ],
            )
            .await
            .unwrap();
        index
            .insert_documents("contracts", "vector_index", vec![doc("4", "Maria contract")])
            .await
            .unwrap();

        let hits = index
            .similarity_search(SearchRequest {
                collection: "employees".into(),
                index: "vector_index".into(),
                query: "Maria".into(),
                limit: 2,
            })
            .await
            .unwrap();

        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.document.id != "4"));
    }

    #[tokio::test]
    async fn index_assigns_missing_ids() {
        let index = SqliteDocumentIndex::from_pool(
            memory_pool().await,
            Arc::new(FakeEmbedder),
            "fake-model",
        )
        .await
        .unwrap();

        let inserted = index
            .insert_documents("employees", "vector_index", vec![doc("", "Maria")])
            .await
            .unwrap();
        assert_eq!(inserted, 1);

        let hits = index
            .similarity_search(SearchRequest {
                collection: "employees".into(),
                index: "vector_index".into(),
                query: "Maria".into(),
                limit: 10,
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(!hits[0].document.id.is_empty());
    }

    #[test]
    fn embedding_blob_roundtrip() {
        let original = vec![0.25f32, -1.5, 3.0];
        let blob = embedding_to_blob(&original);
        assert_eq!(blob.len(), 12);
        assert_eq!(blob_to_embedding(&blob), original);
    }
}
