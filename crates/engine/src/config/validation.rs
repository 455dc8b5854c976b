use super::loader::{ConfigError, EngineConfig};

/// Validate the complete engine configuration.
///
/// Checks sane ranges on every numeric parameter named in §6.3. The engine
/// refuses to start on validation failure (§10.3).
pub fn validate(config: &EngineConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_scraper(config, &mut errors);
    validate_database(config, &mut errors);
    validate_vector(config, &mut errors);
    validate_rate_limit(config, &mut errors);
    validate_llm(config, &mut errors);
    validate_retry(config, &mut errors);
    validate_embedding(config, &mut errors);
    validate_scoring_worker(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

fn validate_scraper(config: &EngineConfig, errors: &mut Vec<String>) {
    let s = &config.system.scraper;

    if s.profile_url.is_empty() {
        errors.push("scraper.profile_url must not be empty".into());
    }
    if s.company_url.is_empty() {
        errors.push("scraper.company_url must not be empty".into());
    }
    if s.timeout_seconds == 0 {
        errors.push("scraper.timeout_seconds must be > 0".into());
    }
    if s.max_retries == 0 {
        errors.push("scraper.max_retries must be > 0".into());
    }
    if s.backoff_factor < 1.0 {
        errors.push("scraper.backoff_factor must be >= 1.0".into());
    }
}

fn validate_database(config: &EngineConfig, errors: &mut Vec<String>) {
    if config.database_url.is_empty() {
        errors.push("DATABASE_URL must not be empty".into());
    }
    if config.system.database.max_connections == 0 {
        errors.push("database.max_connections must be > 0".into());
    }
    if config.api_key.is_empty() {
        errors.push("API_KEY must not be empty".into());
    }
}

fn validate_vector(config: &EngineConfig, errors: &mut Vec<String>) {
    let v = &config.system.vector;

    if v.dimension == 0 {
        errors.push("vector.dimension must be > 0".into());
    }
    if !(0.0..=1.0).contains(&v.similarity_threshold) {
        errors.push("vector.similarity_threshold must be between 0.0 and 1.0".into());
    }
}

fn validate_rate_limit(config: &EngineConfig, errors: &mut Vec<String>) {
    let r = &config.system.rate_limit;

    if r.requests_per_minute == 0 {
        errors.push("rate_limit.requests_per_minute must be > 0".into());
    }
    if r.scraper_rate_limit == 0 {
        errors.push("rate_limit.scraper_rate_limit must be > 0".into());
    }
}

fn validate_llm(config: &EngineConfig, errors: &mut Vec<String>) {
    let l = &config.system.llm;

    if l.default_model.is_empty() {
        errors.push("llm.default_model must not be empty".into());
    }
    if l.stage2_model.is_empty() {
        errors.push("llm.stage2_model must not be empty".into());
    }
    if l.stage3_model.is_empty() {
        errors.push("llm.stage3_model must not be empty".into());
    }
    if l.max_retries == 0 {
        errors.push("llm.max_retries must be > 0".into());
    }
    if l.call_timeout_seconds == 0 {
        errors.push("llm.call_timeout_seconds must be > 0".into());
    }
    if l.retry_cap_seconds < l.retry_base_seconds {
        errors.push("llm.retry_cap_seconds must be >= llm.retry_base_seconds".into());
    }
    if config.llm_api_key.is_empty() {
        errors.push("LLM_API_KEY must not be empty".into());
    }
}

fn validate_retry(config: &EngineConfig, errors: &mut Vec<String>) {
    let validate_one =
        |rc: &rolescope_common::config::RetryConfig, name: &str, errors: &mut Vec<String>| {
            if rc.max_attempts == 0 {
                errors.push(format!("retry.{}.max_attempts must be > 0", name));
            }
            if rc.initial_backoff_ms == 0 {
                errors.push(format!("retry.{}.initial_backoff_ms must be > 0", name));
            }
            if rc.max_backoff_ms < rc.initial_backoff_ms {
                errors.push(format!(
                    "retry.{}.max_backoff_ms must be >= initial_backoff_ms",
                    name
                ));
            }
            if rc.backoff_multiplier < 1.0 {
                errors.push(format!("retry.{}.backoff_multiplier must be >= 1.0", name));
            }
        };

    validate_one(&config.system.retry.scraper, "scraper", errors);
    validate_one(&config.system.retry.llm, "llm", errors);
}

fn validate_embedding(config: &EngineConfig, errors: &mut Vec<String>) {
    let e = &config.system.embedding;

    if e.model.is_empty() {
        errors.push("embedding.model must not be empty".into());
    }
    if e.dimensions == 0 {
        errors.push("embedding.dimensions must be > 0".into());
    }
    if e.batch_size == 0 {
        errors.push("embedding.batch_size must be > 0".into());
    }
}

fn validate_scoring_worker(config: &EngineConfig, errors: &mut Vec<String>) {
    let w = &config.system.scoring_worker;

    if w.pool_size == 0 {
        errors.push("scoring_worker.pool_size must be > 0".into());
    }
    if w.poll_interval_ms == 0 {
        errors.push("scoring_worker.poll_interval_ms must be > 0".into());
    }
}
