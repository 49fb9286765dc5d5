//! `colloquy ask` — Run a query on a conversation thread.

use colloquy_agent::AgentLoop;
use colloquy_config::AppConfig;
use colloquy_core::message::ThreadId;
use colloquy_core::tool::ToolRegistry;
use colloquy_store::{SqliteCheckpointStore, SqliteDocumentIndex, connect};
use colloquy_tools::LookupTool;
use std::sync::Arc;

pub async fn run(query: &str, thread: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let provider = super::provider_from_config(&config)?;

    // One pool, shared by the checkpoint store and the document index.
    let pool = connect(&config.database.url).await?;
    let checkpoints = Arc::new(SqliteCheckpointStore::from_pool(pool.clone()).await?);
    let index = Arc::new(
        SqliteDocumentIndex::from_pool(pool, provider.clone(), &config.embedding_model).await?,
    );

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(LookupTool::new(
        index,
        &config.lookup.name,
        &config.lookup.description,
        &config.lookup.collection,
        &config.lookup.index,
    )));

    let agent = AgentLoop::new(provider, &config.model, Arc::new(registry), checkpoints)
        .with_temperature(config.temperature)
        .with_recursion_limit(config.recursion_limit);

    let answer = agent.run(query, &ThreadId::from(thread)).await?;
    println!("{answer}");

    Ok(())
}
