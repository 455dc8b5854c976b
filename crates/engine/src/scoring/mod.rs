pub mod worker;

use std::sync::Arc;

use rolescope_common::config::LlmConfig;
use rolescope_common::ids::{ProfileId, ScoringJobId, TemplateId};
use rolescope_common::types::prompt_template::TemplateStage;
use rolescope_common::types::scoring_job::ScoringJob;
use rolescope_common::RolescopeError;

use crate::store::StoreClient;

pub use worker::{ScoringWorkerPool, ScoringWorkerPoolConfig};

#[derive(Debug, thiserror::Error)]
pub enum ScoringServiceError {
    #[error("either template_id or prompt must be supplied, not both or neither")]
    AmbiguousSource,

    #[error("template {0} not found")]
    TemplateNotFound(TemplateId),

    #[error("profile {0} not found")]
    ProfileNotFound(ProfileId),

    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}

impl From<ScoringServiceError> for RolescopeError {
    fn from(e: ScoringServiceError) -> Self {
        match e {
            ScoringServiceError::AmbiguousSource => RolescopeError::Validation(e.to_string()),
            ScoringServiceError::TemplateNotFound(_) => RolescopeError::TemplateNotFound(e.to_string()),
            ScoringServiceError::ProfileNotFound(_) => RolescopeError::ProfileNotFound(e.to_string()),
            ScoringServiceError::Store(store_err) => store_err.into(),
        }
    }
}

/// Caller-supplied fields for creating a scoring job. Exactly one of
/// `template_id`/`prompt` must be set (§4.5).
pub struct CreateScoringJobRequest {
    pub profile_id: ProfileId,
    pub template_id: Option<TemplateId>,
    pub prompt: Option<String>,
    pub model_name: Option<String>,
}

/// Create a new scoring job: resolve/freeze the prompt, pick a default
/// model by template stage, and persist the row as `pending`. Does not
/// start execution — callers hand the job id to the worker pool (via its
/// DB-polling loop) or it is picked up on the next poll.
pub async fn create_scoring_job(
    store: &StoreClient,
    llm_config: &LlmConfig,
    req: CreateScoringJobRequest,
) -> Result<ScoringJob, ScoringServiceError> {
    if req.template_id.is_some() == req.prompt.is_some() {
        return Err(ScoringServiceError::AmbiguousSource);
    }

    let profile = store.get_profile(req.profile_id).await.map_err(|e| match e {
        crate::store::StoreError::NotFound(_) => {
            ScoringServiceError::ProfileNotFound(req.profile_id)
        }
        other => ScoringServiceError::Store(other),
    })?;

    let (prompt_base, stage) = if let Some(template_id) = req.template_id {
        let template = store.get_template(template_id).await.map_err(|e| match e {
            crate::store::StoreError::NotFound(_) => {
                ScoringServiceError::TemplateNotFound(template_id)
            }
            other => ScoringServiceError::Store(other),
        })?;
        (template.prompt_text, template.stage)
    } else {
        (req.prompt.expect("checked above"), None)
    };

    let prompt = format!("{}\n\n{}", prompt_base, profile.canonical_projection());

    let model_name = req.model_name.unwrap_or_else(|| match stage {
        Some(TemplateStage::Stage2Screening) => llm_config.stage2_model.clone(),
        Some(TemplateStage::Stage3Analysis) => llm_config.stage3_model.clone(),
        None => llm_config.default_model.clone(),
    });

    let job = ScoringJob::new(req.profile_id, req.template_id, prompt, model_name);
    store.create_scoring_job(&job).await?;

    metrics::counter!("scoring.jobs.created").increment(1);

    Ok(job)
}

/// Move a `failed` job back to `pending` regardless of `retry_count`, so an
/// operator can force another attempt after fixing an underlying issue.
/// Does not reset `retry_count` (§4.5).
pub async fn retry_scoring_job(
    store: &StoreClient,
    job_id: ScoringJobId,
) -> Result<ScoringJob, ScoringServiceError> {
    let job = store.retry_scoring_job(job_id).await?;
    Ok(job)
}

/// Cancel a `pending` or `processing` job. No-op (returns the row unchanged)
/// if the job is already terminal.
pub async fn cancel_scoring_job(
    store: &StoreClient,
    job_id: ScoringJobId,
) -> Result<ScoringJob, ScoringServiceError> {
    let job = store.cancel_scoring_job(job_id).await?;
    Ok(job)
}

pub type SharedStore = Arc<StoreClient>;
