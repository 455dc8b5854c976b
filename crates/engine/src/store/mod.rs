mod companies;
mod edges;
mod profiles;
mod scoring_jobs;
mod template_diffs;
mod template_versions;
mod templates;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// PostgreSQL client wrapping the connection pool shared by every
/// repository submodule (§5 — the database pool is a bounded shared
/// resource).
pub struct StoreClient {
    pool: PgPool,
}

impl StoreClient {
    /// Connect to PostgreSQL and return a client with a connection pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let client = Self { pool };
        client.health_check().await?;
        tracing::info!("PostgreSQL connection established");

        Ok(client)
    }

    /// Verify the connection is alive.
    pub async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        tracing::info!("Running PostgreSQL migrations");

        sqlx::migrate!("migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        tracing::info!("PostgreSQL migrations complete");
        Ok(())
    }

    /// Begin a transaction. Callers that need several writes to succeed or
    /// fail together — most notably the template service's head-update +
    /// version-history insert (§4.6) — commit or roll back explicitly.
    pub async fn begin(&self) -> Result<sqlx::Transaction<'_, sqlx::Postgres>, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("PostgreSQL connection error: {0}")]
    Connection(String),

    #[error("PostgreSQL query error: {0}")]
    Query(String),

    #[error("PostgreSQL migration error: {0}")]
    Migration(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<StoreError> for rolescope_common::RolescopeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(msg) => rolescope_common::RolescopeError::NotFound(msg),
            other => rolescope_common::RolescopeError::Postgres(other.to_string()),
        }
    }
}
