pub mod ask;
pub mod ingest;

use colloquy_config::AppConfig;
use colloquy_providers::OpenAiCompatProvider;
use std::sync::Arc;

/// Load config and build the oracle client, with a clear error when no
/// API key is available.
pub fn provider_from_config(config: &AppConfig) -> Result<Arc<OpenAiCompatProvider>, Box<dyn std::error::Error>> {
    let Some(api_key) = config.api_key.clone() else {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    COLLOQUY_API_KEY = 'sk-...'");
        eprintln!("    OPENAI_API_KEY   = 'sk-...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    };

    let provider = OpenAiCompatProvider::new("openai", &config.api_url, api_key)?;
    Ok(Arc::new(provider))
}
