use std::path::{Path, PathBuf};

use rolescope_common::config::SystemConfig;

use super::validation;

/// Complete engine configuration: the file-backed `SystemConfig` plus the
/// secrets layered in from the environment at load time (§6.3, §10.3).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub system: SystemConfig,
    pub api_key: String,
    pub database_url: String,
    /// Provider API key for the LLM client. Required: scoring is core
    /// functionality, unlike the embedding client which degrades gracefully.
    pub llm_api_key: String,
    /// Optional provider API key for the embedding client. Its absence
    /// disables embeddings without affecting ingestion/scoring correctness
    /// (§9 — embeddings are an optional remote call).
    pub embedding_api_key: Option<String>,
    /// Base config directory path (kept for future config reload).
    #[allow(dead_code)]
    pub config_dir: PathBuf,
}

/// Load all configuration from the given config directory.
///
/// Fails loudly with clear error messages if anything is misconfigured.
/// The engine refuses to start on validation failure (§10.3).
pub fn load_config(config_dir: &Path) -> Result<EngineConfig, ConfigError> {
    tracing::info!(config_dir = %config_dir.display(), "Loading configuration");

    let system_path = config_dir.join("system.toml");
    let system = load_system_config(&system_path)?;

    let api_key = std::env::var("API_KEY").map_err(|_| ConfigError::MissingEnv("API_KEY".into()))?;
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| ConfigError::MissingEnv("DATABASE_URL".into()))?;
    let llm_api_key = std::env::var("LLM_API_KEY")
        .map_err(|_| ConfigError::MissingEnv("LLM_API_KEY".into()))?;
    let embedding_api_key = std::env::var("EMBEDDING_API_KEY").ok();

    let config = EngineConfig {
        system,
        api_key,
        database_url,
        llm_api_key,
        embedding_api_key,
        config_dir: config_dir.to_path_buf(),
    };

    validation::validate(&config)?;

    tracing::info!("Configuration loaded successfully");

    Ok(config)
}

fn load_system_config(path: &Path) -> Result<SystemConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {detail}")]
    Parse { path: PathBuf, detail: String },

    #[error("Missing required environment variable {0}")]
    MissingEnv(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
