//! Colloquy CLI — the main entry point.
//!
//! Commands:
//! - `ask`    — Run a query on a conversation thread
//! - `ingest` — Load documents into the similarity-search index

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "colloquy",
    about = "Colloquy — a conversational lookup agent with resumable threads",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the agent a question on a conversation thread
    Ask {
        /// The question to ask
        query: String,

        /// Thread id — reuse one to continue a prior conversation
        #[arg(short, long, default_value = "default")]
        thread: String,
    },

    /// Ingest documents from a JSON file into the document index
    Ingest {
        /// Path to a JSON array of {id?, content, metadata?} objects
        file: std::path::PathBuf,

        /// Target collection (defaults to the configured lookup scope)
        #[arg(long)]
        collection: Option<String>,

        /// Target index name (defaults to the configured lookup scope)
        #[arg(long)]
        index: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Ask { query, thread } => commands::ask::run(&query, &thread).await?,
        Commands::Ingest {
            file,
            collection,
            index,
        } => commands::ingest::run(&file, collection, index).await?,
    }

    Ok(())
}
