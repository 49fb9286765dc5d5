//! `colloquy ingest` — Load documents into the similarity-search index.
//!
//! Input is a JSON array of objects:
//! `[{"id": "emp_001", "content": "...", "metadata": {...}}, ...]`
//! `id` and `metadata` are optional.

use colloquy_config::AppConfig;
use colloquy_core::search::Document;
use colloquy_store::SqliteDocumentIndex;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
struct IngestRecord {
    #[serde(default)]
    id: String,
    content: String,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

pub async fn run(
    file: &Path,
    collection: Option<String>,
    index_name: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let provider = super::provider_from_config(&config)?;

    let content = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    let records: Vec<IngestRecord> = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse {}: {e}", file.display()))?;

    if records.is_empty() {
        println!("Nothing to ingest.");
        return Ok(());
    }

    let documents: Vec<Document> = records
        .into_iter()
        .map(|r| Document {
            id: r.id,
            content: r.content,
            metadata: r.metadata,
        })
        .collect();

    let index =
        SqliteDocumentIndex::new(&config.database.url, provider, &config.embedding_model).await?;

    let collection = collection.unwrap_or_else(|| config.lookup.collection.clone());
    let index_name = index_name.unwrap_or_else(|| config.lookup.index.clone());

    let count = index
        .insert_documents(&collection, &index_name, documents)
        .await?;

    println!("Ingested {count} documents into {collection}/{index_name}.");
    Ok(())
}
