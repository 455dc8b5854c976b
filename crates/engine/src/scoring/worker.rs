use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use rolescope_common::types::scoring_job::ScoringJob;

use crate::llm::LlmCaller;
use crate::store::StoreClient;

pub struct ScoringWorkerPoolConfig {
    pub pool_size: u32,
    pub poll_interval_ms: u64,
    pub max_retries: i32,
    pub retry_base_seconds: u64,
    pub retry_cap_seconds: u64,
}

/// Pool of background tasks advancing `scoring_jobs` rows. Workers poll the
/// database rather than consume a push queue — a job is claimed atomically
/// with `FOR UPDATE SKIP LOCKED` so two workers never race on the same row
/// (§4.5, §5).
pub struct ScoringWorkerPool {
    workers: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl ScoringWorkerPool {
    pub fn start(
        config: ScoringWorkerPoolConfig,
        store: Arc<StoreClient>,
        llm: Arc<dyn LlmCaller>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut workers = Vec::with_capacity(config.pool_size as usize);
        for i in 0..config.pool_size {
            let worker_name = format!("scoring-worker-{}", i);
            let worker = worker_loop(
                worker_name,
                shutdown_rx.clone(),
                Arc::clone(&store),
                Arc::clone(&llm),
                config.poll_interval_ms,
                config.max_retries,
                config.retry_base_seconds,
                config.retry_cap_seconds,
            );
            workers.push(tokio::spawn(worker));
        }

        tracing::info!(pool_size = config.pool_size, "Scoring worker pool started");

        Self {
            workers,
            shutdown_tx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        tracing::info!("Scoring worker pool shutdown signaled");
    }

    pub async fn join(self) {
        for handle in self.workers {
            let _ = handle.await;
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn worker_loop(
    worker_name: String,
    mut shutdown_rx: watch::Receiver<bool>,
    store: Arc<StoreClient>,
    llm: Arc<dyn LlmCaller>,
    poll_interval_ms: u64,
    max_retries: i32,
    retry_base_seconds: u64,
    retry_cap_seconds: u64,
) {
    tracing::info!(worker = %worker_name, "Scoring worker started");
    let poll_interval = std::time::Duration::from_millis(poll_interval_ms);

    loop {
        if *shutdown_rx.borrow() {
            tracing::info!(worker = %worker_name, "Scoring worker shutting down");
            break;
        }

        let job = match store.claim_next_pending_scoring_job().await {
            Ok(Some(job)) => job,
            Ok(None) => {
                tokio::select! {
                    _ = tokio::time::sleep(poll_interval) => {}
                    _ = shutdown_rx.changed() => {}
                }
                continue;
            }
            Err(e) => {
                tracing::error!(worker = %worker_name, error = %e, "Failed to claim scoring job");
                tokio::time::sleep(poll_interval).await;
                continue;
            }
        };

        metrics::gauge!("scoring.worker.active").increment(1.0);
        run_one_job(&worker_name, &store, llm.as_ref(), &job, max_retries, retry_base_seconds, retry_cap_seconds)
            .await;
        metrics::gauge!("scoring.worker.active").decrement(1.0);
    }
}

/// A single attempt against one claimed job: call the LLM once, then record
/// success, a retryable failure (back to `pending`), or a terminal failure.
/// The retry delay itself happens here as a sleep before the loop reclaims
/// the row, rather than scheduling a separate timer (§4.5 step 4, §4.8).
async fn run_one_job(
    worker_name: &str,
    store: &StoreClient,
    llm: &dyn LlmCaller,
    job: &ScoringJob,
    max_retries: i32,
    retry_base_seconds: u64,
    retry_cap_seconds: u64,
) {
    tracing::info!(worker = worker_name, job_id = %job.id, model = %job.model_name, "Scoring job claimed");

    match llm.call(&job.model_name, &job.prompt).await {
        Ok(response) => match extract_json_object(&response.text) {
            Some(parsed) => {
                let raw = serde_json::json!({
                    "text": response.text,
                    "usage": {
                        "input_tokens": response.usage.input_tokens,
                        "output_tokens": response.usage.output_tokens,
                    },
                });
                if let Err(e) = store.complete_scoring_job(job.id, raw, parsed).await {
                    tracing::error!(job_id = %job.id, error = %e, "Failed to record completed scoring job");
                }
                metrics::counter!("scoring.jobs.completed").increment(1);
            }
            None => {
                record_failure(
                    store,
                    job,
                    "LLM reply did not contain a parseable JSON object",
                    max_retries,
                )
                .await;
            }
        },
        Err(e) => {
            let cap = if e.is_non_retryable() { 0 } else { max_retries };
            record_failure(store, job, &e.to_string(), cap).await;
        }
    }

    // Apply backoff before this worker claims another job, so a transient
    // failure on a re-queued job doesn't get retried instantly (§4.8).
    if job.retry_count < max_retries {
        let delay = retry_after_seconds(job.retry_count as u32, retry_base_seconds, retry_cap_seconds);
        tokio::time::sleep(std::time::Duration::from_secs(delay)).await;
    }
}

/// `max_retries = 0` forces a terminal failure regardless of the configured
/// retry budget (used for non-retryable LLM errors).
async fn record_failure(store: &StoreClient, job: &ScoringJob, error_message: &str, max_retries: i32) {
    let effective_max = if max_retries == 0 { job.retry_count } else { max_retries };
    match store
        .fail_scoring_job(job.id, error_message, effective_max)
        .await
    {
        Ok(rolescope_common::types::scoring_job::ScoringJobStatus::Failed) => {
            tracing::warn!(job_id = %job.id, error = error_message, "Scoring job failed terminally");
            metrics::counter!("scoring.jobs.failed").increment(1);
        }
        Ok(_) => {
            tracing::warn!(job_id = %job.id, error = error_message, "Scoring job scheduled for retry");
            metrics::counter!("scoring.jobs.retried").increment(1);
        }
        Err(e) => {
            tracing::error!(job_id = %job.id, error = %e, "Failed to record scoring job failure");
        }
    }
}

/// Exponential backoff, base * 2^attempt, capped (§4.5, §4.8).
fn retry_after_seconds(attempt: u32, base_seconds: u64, cap_seconds: u64) -> u64 {
    let backoff = base_seconds.saturating_mul(1u64 << attempt.min(16));
    backoff.min(cap_seconds)
}

/// Find the first balanced `{...}` object in `text` and parse it as JSON.
/// LLM replies often wrap the object in prose or markdown fences; this
/// scans for the first `{` and tracks brace depth (respecting string
/// literals) to find its matching `}` (§4.5 step 3).
fn extract_json_object(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        let ch = byte as char;
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    return serde_json::from_str(&text[start..end]).ok();
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_surrounded_by_prose() {
        let text = "Here is my assessment:\n```json\n{\"score\": 8, \"notes\": \"strong fit\"}\n```\nThanks.";
        let parsed = extract_json_object(text).unwrap();
        assert_eq!(parsed["score"], 8);
    }

    #[test]
    fn handles_nested_braces() {
        let text = r#"{"score": 7, "breakdown": {"leadership": 8, "technical": 6}}"#;
        let parsed = extract_json_object(text).unwrap();
        assert_eq!(parsed["breakdown"]["leadership"], 8);
    }

    #[test]
    fn ignores_braces_inside_strings() {
        let text = r#"{"note": "uses { and } in free text", "score": 5}"#;
        let parsed = extract_json_object(text).unwrap();
        assert_eq!(parsed["score"], 5);
    }

    #[test]
    fn returns_none_when_no_object_present() {
        assert!(extract_json_object("no json here").is_none());
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(retry_after_seconds(0, 1, 60), 1);
        assert_eq!(retry_after_seconds(3, 1, 60), 8);
        assert_eq!(retry_after_seconds(10, 1, 60), 60);
    }
}
