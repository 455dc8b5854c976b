pub mod adapter;

use std::sync::Arc;

use rolescope_common::config::{RetryConfig, ScraperConfig};
use rolescope_common::types::company::Company;
use rolescope_common::types::profile::Profile;

use crate::circuit_breaker::CircuitBreaker;

pub use adapter::IncompleteDataError;

/// HTTP client for the external LinkedIn scraping provider (§4.3).
pub struct ScraperClient {
    http: reqwest::Client,
    config: ScraperConfig,
    retry_config: RetryConfig,
    health_cache: tokio::sync::Mutex<Option<(std::time::Instant, bool)>>,
    circuit_breaker: Arc<CircuitBreaker>,
}

const HEALTH_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(30);
const HEALTH_CHECK_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("scraper HTTP error: {0}")]
    Http(String),

    #[error("scraper request timed out")]
    Timeout,

    #[error("remote profile or company not found")]
    NotFound,

    #[error("scraper returned incomplete data: {0}")]
    IncompleteData(#[from] IncompleteDataError),

    #[error("scraper unavailable after retries: {0}")]
    Unavailable(String),

    #[error("scraper circuit breaker is open")]
    CircuitOpen,
}

impl From<ScraperError> for rolescope_common::RolescopeError {
    fn from(e: ScraperError) -> Self {
        match e {
            ScraperError::NotFound => rolescope_common::RolescopeError::ProfileNotFound(e.to_string()),
            ScraperError::IncompleteData(_) => rolescope_common::RolescopeError::IncompleteData(e.to_string()),
            ScraperError::CircuitOpen => rolescope_common::RolescopeError::CircuitOpen("scraper".to_string()),
            other => rolescope_common::RolescopeError::ScraperUnavailable(other.to_string()),
        }
    }
}

impl ScraperClient {
    pub fn new(
        config: ScraperConfig,
        retry_config: RetryConfig,
        circuit_breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            retry_config,
            health_cache: tokio::sync::Mutex::new(None),
            circuit_breaker,
        }
    }

    /// Best-effort reachability probe against the scraper provider, cached
    /// for `HEALTH_CACHE_TTL` so frequent health polling doesn't itself
    /// become load on the provider. Never waits longer than
    /// `HEALTH_CHECK_TIMEOUT` regardless of the provider's own behavior.
    pub async fn health_check(&self) -> bool {
        {
            let cache = self.health_cache.lock().await;
            if let Some((checked_at, healthy)) = *cache {
                if checked_at.elapsed() < HEALTH_CACHE_TTL {
                    return healthy;
                }
            }
        }

        let healthy = tokio::time::timeout(
            HEALTH_CHECK_TIMEOUT,
            self.http.head(&self.config.profile_url).send(),
        )
        .await
        .map(|r| r.is_ok())
        .unwrap_or(false);

        *self.health_cache.lock().await = Some((std::time::Instant::now(), healthy));
        healthy
    }

    /// Fetch and adapt a single profile by its canonical LinkedIn URL.
    pub async fn fetch_profile(&self, linkedin_url: &str) -> Result<Profile, ScraperError> {
        let payload = self
            .call_with_retry(&self.config.profile_url, linkedin_url)
            .await?;
        Ok(adapter::adapt_profile(linkedin_url, &payload)?)
    }

    /// Fetch and adapt a single company by its LinkedIn URL.
    pub async fn fetch_company(&self, linkedin_url: &str) -> Result<Company, ScraperError> {
        let payload = self
            .call_with_retry(&self.config.company_url, linkedin_url)
            .await?;
        Ok(adapter::adapt_company(&payload)?)
    }

    async fn call_with_retry(
        &self,
        base_url: &str,
        target_url: &str,
    ) -> Result<serde_json::Value, ScraperError> {
        if !self.circuit_breaker.allow() {
            return Err(ScraperError::CircuitOpen);
        }

        let mut attempt = 0u32;
        let mut backoff_ms = self.retry_config.initial_backoff_ms;
        let timeout = std::time::Duration::from_secs(self.config.timeout_seconds);

        loop {
            attempt += 1;
            let start = std::time::Instant::now();

            let result = self
                .http
                .get(base_url)
                .query(&[("url", target_url)])
                .timeout(timeout)
                .send()
                .await;

            let elapsed_ms = start.elapsed().as_millis();
            metrics::histogram!("scraper.call.latency", "url" => base_url.to_string())
                .record(start.elapsed().as_secs_f64());

            match result {
                Ok(response) => {
                    let status = response.status();
                    tracing::info!(
                        url = target_url,
                        attempt,
                        status = status.as_u16(),
                        elapsed_ms,
                        "Scraper call completed"
                    );

                    if status == reqwest::StatusCode::NOT_FOUND {
                        self.circuit_breaker.record_success();
                        return Err(ScraperError::NotFound);
                    }

                    if status.is_server_error() {
                        self.circuit_breaker.record_failure();
                        if attempt >= self.retry_config.max_attempts {
                            return Err(ScraperError::Unavailable(format!(
                                "status {} after {} attempts",
                                status, attempt
                            )));
                        }
                        self.backoff(attempt, &mut backoff_ms).await;
                        continue;
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_success();
                        let body = response.text().await.unwrap_or_default();
                        return Err(ScraperError::Http(format!("{}: {}", status, body)));
                    }

                    self.circuit_breaker.record_success();
                    return response
                        .json()
                        .await
                        .map_err(|e| ScraperError::Http(format!("invalid JSON body: {}", e)));
                }
                Err(e) => {
                    tracing::warn!(url = target_url, attempt, error = %e, elapsed_ms, "Scraper call failed");
                    self.circuit_breaker.record_failure();
                    if attempt >= self.retry_config.max_attempts {
                        return Err(if e.is_timeout() {
                            ScraperError::Timeout
                        } else {
                            ScraperError::Unavailable(e.to_string())
                        });
                    }
                    self.backoff(attempt, &mut backoff_ms).await;
                }
            }
        }
    }

    async fn backoff(&self, attempt: u32, backoff_ms: &mut u64) {
        let jitter = if self.retry_config.jitter {
            compute_jitter(attempt, *backoff_ms)
        } else {
            0
        };
        let wait = *backoff_ms + jitter;
        tokio::time::sleep(std::time::Duration::from_millis(wait)).await;
        *backoff_ms = ((*backoff_ms as f64) * self.retry_config.backoff_multiplier) as u64;
        *backoff_ms = (*backoff_ms).min(self.retry_config.max_backoff_ms);
    }
}

fn compute_jitter(attempt: u32, backoff_ms: u64) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::hash::DefaultHasher::new();
    attempt.hash(&mut hasher);
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos()
        .hash(&mut hasher);
    hasher.finish() % (backoff_ms / 2 + 1)
}
