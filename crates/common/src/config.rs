use serde::{Deserialize, Serialize};

/// Top-level system configuration, deserialized from `system.toml` (§6.3,
/// §10.3). Secrets (API_KEY, DATABASE_URL, provider keys) are layered in
/// from the environment at load time, never committed to the file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemConfig {
    pub scraper: ScraperConfig,
    pub database: DatabaseConfig,
    pub vector: VectorConfig,
    pub rate_limit: RateLimitConfig,
    pub feature_flags: FeatureFlags,
    pub llm: LlmConfig,
    pub retry: RetryDefaults,
    pub embedding: EmbeddingConfig,
    pub scoring_worker: ScoringWorkerConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScraperConfig {
    pub profile_url: String,
    pub company_url: String,
    /// Total per-call time budget in seconds (§4.8).
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub backoff_factor: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VectorConfig {
    pub dimension: u32,
    pub similarity_threshold: f64,
    pub enable_vector_search: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    /// Max scraper calls per minute, independent of the per-ingestion 1s
    /// inter-company guard (§4.1 step 5).
    pub scraper_rate_limit: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub enable_company_ingestion: bool,
    pub enable_vector_search: bool,
    pub enable_async_processing: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    pub default_model: String,
    pub stage2_model: String,
    pub stage3_model: String,
    pub max_retries: u32,
    pub retry_base_seconds: u64,
    pub retry_cap_seconds: u64,
    pub call_timeout_seconds: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryDefaults {
    pub scraper: RetryConfig,
    pub llm: RetryConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

/// Optional remote text-embedding call (§9 — absence never affects
/// correctness of ingestion or scoring, only whether profiles carry a vector).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimensions: u32,
    pub batch_size: u32,
}

/// Sizing for the background scoring job worker pool (§4.5, §5).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoringWorkerConfig {
    pub pool_size: u32,
    /// How often an idle worker re-polls for a pending job.
    pub poll_interval_ms: u64,
}
