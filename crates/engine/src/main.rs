use std::path::PathBuf;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;

use rolescope_engine::api::{self, AppState};
use rolescope_engine::circuit_breaker::CircuitBreakerRegistry;
use rolescope_engine::config;
use rolescope_engine::embeddings::EmbeddingClient;
use rolescope_engine::llm::LlmClient;
use rolescope_engine::scoring::{ScoringWorkerPool, ScoringWorkerPoolConfig};
use rolescope_engine::scraper::ScraperClient;
use rolescope_engine::store::StoreClient;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("rolescope engine starting");

    let config_dir = std::env::var("ROLESCOPE_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let engine_config = match config::load_config(&config_dir) {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration — refusing to start");
            std::process::exit(1);
        }
    };

    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    let store_client = match StoreClient::connect(
        &engine_config.database_url,
        engine_config.system.database.max_connections,
    )
    .await
    {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            std::process::exit(1);
        }
    };

    if let Err(e) = store_client.migrate().await {
        tracing::error!(error = %e, "Failed to run PostgreSQL migrations");
        std::process::exit(1);
    }

    let store_client = Arc::new(store_client);

    let requeued = store_client
        .requeue_stuck_scoring_jobs()
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to requeue stuck scoring jobs on startup");
            0
        });
    if requeued > 0 {
        tracing::warn!(count = requeued, "Requeued scoring jobs stuck in processing from a prior run");
    }

    tracing::info!("PostgreSQL connected and migrated");

    let circuit_breakers = Arc::new(CircuitBreakerRegistry::new());

    let scraper_client = Arc::new(ScraperClient::new(
        engine_config.system.scraper.clone(),
        engine_config.system.retry.scraper.clone(),
        Arc::clone(&circuit_breakers.scraper),
    ));

    let llm_client = LlmClient::new(
        Some(engine_config.llm_api_key.clone()),
        engine_config.system.llm.clone(),
        Arc::clone(&circuit_breakers.llm),
    )
    .map(Arc::new);

    if llm_client.is_none() {
        tracing::warn!("LLM client not configured — scoring jobs will fail until LLM_API_KEY is set");
    }

    let embedding_client = EmbeddingClient::new(
        engine_config.embedding_api_key.clone(),
        engine_config.system.embedding.clone(),
        engine_config.system.retry.llm.clone(),
    )
    .map(Arc::new);

    {
        let cbs = Arc::clone(&circuit_breakers);
        tokio::spawn(async move {
            let interval = std::time::Duration::from_secs(30);
            loop {
                tokio::time::sleep(interval).await;
                cbs.report_metrics();
            }
        });
    }

    let scoring_workers = Arc::new(match &llm_client {
        Some(llm) => ScoringWorkerPool::start(
            ScoringWorkerPoolConfig {
                pool_size: engine_config.system.scoring_worker.pool_size,
                poll_interval_ms: engine_config.system.scoring_worker.poll_interval_ms,
                max_retries: engine_config.system.llm.max_retries as i32,
                retry_base_seconds: engine_config.system.llm.retry_base_seconds,
                retry_cap_seconds: engine_config.system.llm.retry_cap_seconds,
            },
            Arc::clone(&store_client),
            Arc::clone(llm) as Arc<dyn rolescope_engine::llm::LlmCaller>,
        ),
        None => {
            tracing::warn!("Scoring worker pool not started — no LLM client configured");
            ScoringWorkerPool::start(
                ScoringWorkerPoolConfig {
                    pool_size: 0,
                    poll_interval_ms: engine_config.system.scoring_worker.poll_interval_ms,
                    max_retries: engine_config.system.llm.max_retries as i32,
                    retry_base_seconds: engine_config.system.llm.retry_base_seconds,
                    retry_cap_seconds: engine_config.system.llm.retry_cap_seconds,
                },
                Arc::clone(&store_client),
                Arc::new(NullLlmCaller) as Arc<dyn rolescope_engine::llm::LlmCaller>,
            )
        }
    });

    let engine_config = Arc::new(engine_config);

    let state = Arc::new(AppState {
        store: store_client,
        scraper: scraper_client,
        llm: llm_client,
        embeddings: embedding_client,
        scoring_workers,
        circuit_breakers,
        config: engine_config,
        metrics_handle,
    });

    let app = api::build_router(state);

    let port: u16 = std::env::var("ENGINE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .expect("Failed to bind TCP listener");

    tracing::info!(port = port, "rolescope engine listening");

    axum::serve(listener, app).await.expect("HTTP server error");
}

/// Stand-in caller used only when no LLM client is configured, so the
/// worker pool can still start (at zero workers) without an `Option`
/// threaded through its constructor.
struct NullLlmCaller;

impl rolescope_engine::llm::LlmCaller for NullLlmCaller {
    fn call<'a>(
        &'a self,
        _model: &'a str,
        _prompt: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<rolescope_engine::llm::LlmResponse, rolescope_engine::llm::LlmError>> + Send + 'a>,
    > {
        Box::pin(async { Err(rolescope_engine::llm::LlmError::NotConfigured) })
    }
}
