use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use rolescope_common::ids::{ProfileId, ScoringJobId, TemplateId};
use rolescope_common::types::scoring_job::{parse_scoring_job_status, ScoringJobStatus};
use rolescope_common::types::ScoringJob;

use super::{StoreClient, StoreError};

impl StoreClient {
    pub async fn create_scoring_job(&self, job: &ScoringJob) -> Result<ScoringJob, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO scoring_jobs (
                id, profile_id, template_id, prompt, model_name, status,
                retry_count, created_at, started_at, completed_at, updated_at,
                llm_response, parsed_score, error_message
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(job.id.0)
        .bind(job.profile_id.0)
        .bind(job.template_id.map(|id| id.0))
        .bind(&job.prompt)
        .bind(&job.model_name)
        .bind(job.status.as_db_str())
        .bind(job.retry_count)
        .bind(job.created_at)
        .bind(job.started_at)
        .bind(job.completed_at)
        .bind(job.updated_at)
        .bind(&job.llm_response)
        .bind(&job.parsed_score)
        .bind(&job.error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(job.clone())
    }

    pub async fn get_scoring_job(&self, id: ScoringJobId) -> Result<ScoringJob, StoreError> {
        let row = sqlx::query_as::<_, ScoringJobRow>(SCORING_JOB_SELECT_WHERE_ID)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
            .ok_or_else(|| StoreError::NotFound(format!("ScoringJob {}", id)))?;

        Ok(row.into())
    }

    pub async fn list_scoring_jobs_for_profile(
        &self,
        profile_id: ProfileId,
    ) -> Result<Vec<ScoringJob>, StoreError> {
        let rows = sqlx::query_as::<_, ScoringJobRow>(
            r#"
            SELECT id, profile_id, template_id, prompt, model_name, status,
                   retry_count, created_at, started_at, completed_at, updated_at,
                   llm_response, parsed_score, error_message
            FROM scoring_jobs WHERE profile_id = $1 ORDER BY created_at DESC
            "#,
        )
        .bind(profile_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Atomically claim the oldest pending job, moving it to `processing`
    /// (§4.5, §5 — workers poll rather than push so this must be atomic).
    pub async fn claim_next_pending_scoring_job(
        &self,
    ) -> Result<Option<ScoringJob>, StoreError> {
        let row = sqlx::query_as::<_, ScoringJobRow>(
            r#"
            UPDATE scoring_jobs
            SET status = 'processing', started_at = COALESCE(started_at, $1), updated_at = $1
            WHERE id = (
                SELECT id FROM scoring_jobs
                WHERE status = 'pending'
                ORDER BY created_at
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING id, profile_id, template_id, prompt, model_name, status,
                      retry_count, created_at, started_at, completed_at, updated_at,
                      llm_response, parsed_score, error_message
            "#,
        )
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// Only applies while the job is still `processing` — a cancellation
    /// that raced ahead of this reply wins, and the reply is discarded (§4.5).
    pub async fn complete_scoring_job(
        &self,
        id: ScoringJobId,
        llm_response: Value,
        parsed_score: Value,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE scoring_jobs
            SET status = 'completed', llm_response = $2, parsed_score = $3,
                completed_at = $4, updated_at = $4, error_message = NULL
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id.0)
        .bind(llm_response)
        .bind(parsed_score)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    /// Record a failed attempt. If `retry_count` after increment is still
    /// below the configured max, the job is returned to `pending` so the
    /// worker pool picks it up again (§4.5, §4.8); otherwise it moves to the
    /// terminal `failed` state.
    pub async fn fail_scoring_job(
        &self,
        id: ScoringJobId,
        error_message: &str,
        max_retries: i32,
    ) -> Result<ScoringJobStatus, StoreError> {
        let row: (i32, String) =
            sqlx::query_as("SELECT retry_count, status FROM scoring_jobs WHERE id = $1")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?
                .ok_or_else(|| StoreError::NotFound(format!("ScoringJob {}", id)))?;

        if parse_scoring_job_status(&row.1) != ScoringJobStatus::Processing {
            // Already moved on (cancelled, or a racing retry) — nothing to record.
            return Ok(parse_scoring_job_status(&row.1));
        }

        let next_retry_count = row.0 + 1;
        let next_status = if next_retry_count >= max_retries {
            ScoringJobStatus::Failed
        } else {
            ScoringJobStatus::Pending
        };
        let completed_at = next_status.is_terminal().then(Utc::now);

        sqlx::query(
            r#"
            UPDATE scoring_jobs
            SET status = $2, retry_count = $3, error_message = $4,
                completed_at = $5, updated_at = $6
            WHERE id = $1 AND status = 'processing'
            "#,
        )
        .bind(id.0)
        .bind(next_status.as_db_str())
        .bind(next_retry_count)
        .bind(error_message)
        .bind(completed_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(next_status)
    }

    /// Move a job back to `pending` for the explicit retry endpoint.
    /// `retry_count` is left untouched — only the background worker's own
    /// exhaustion of the retry budget advances it (§4.5).
    pub async fn retry_scoring_job(&self, id: ScoringJobId) -> Result<ScoringJob, StoreError> {
        sqlx::query(
            r#"
            UPDATE scoring_jobs
            SET status = 'pending', error_message = NULL,
                started_at = NULL, completed_at = NULL, updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        self.get_scoring_job(id).await
    }

    /// Cancel a job that has not yet reached a terminal state.
    pub async fn cancel_scoring_job(&self, id: ScoringJobId) -> Result<ScoringJob, StoreError> {
        sqlx::query(
            r#"
            UPDATE scoring_jobs
            SET status = 'failed', error_message = 'canceled', completed_at = $2, updated_at = $2
            WHERE id = $1 AND status IN ('pending', 'processing')
            "#,
        )
        .bind(id.0)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        self.get_scoring_job(id).await
    }

    /// Requeue every job stuck in `processing` back to `pending` on startup
    /// — a prior instance crashed mid-job without completing it (§10.5).
    pub async fn requeue_stuck_scoring_jobs(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE scoring_jobs
            SET status = 'pending', started_at = NULL, updated_at = $1
            WHERE status = 'processing'
            "#,
        )
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

const SCORING_JOB_SELECT_WHERE_ID: &str = r#"
    SELECT id, profile_id, template_id, prompt, model_name, status,
           retry_count, created_at, started_at, completed_at, updated_at,
           llm_response, parsed_score, error_message
    FROM scoring_jobs WHERE id = $1
"#;

#[derive(sqlx::FromRow)]
struct ScoringJobRow {
    id: Uuid,
    profile_id: Uuid,
    template_id: Option<Uuid>,
    prompt: String,
    model_name: String,
    status: String,
    retry_count: i32,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
    llm_response: Option<Value>,
    parsed_score: Option<Value>,
    error_message: Option<String>,
}

impl From<ScoringJobRow> for ScoringJob {
    fn from(row: ScoringJobRow) -> Self {
        Self {
            id: ScoringJobId::from_uuid(row.id),
            profile_id: ProfileId::from_uuid(row.profile_id),
            template_id: row.template_id.map(TemplateId::from_uuid),
            prompt: row.prompt,
            model_name: row.model_name,
            status: parse_scoring_job_status(&row.status),
            retry_count: row.retry_count,
            created_at: row.created_at,
            started_at: row.started_at,
            completed_at: row.completed_at,
            updated_at: row.updated_at,
            llm_response: row.llm_response,
            parsed_score: row.parsed_score,
            error_message: row.error_message,
        }
    }
}
