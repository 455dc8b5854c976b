use serde::{Deserialize, Serialize};

use crate::types::ScoringJob;

/// POST /api/v1/profiles/{id}/score
///
/// Exactly one of `template_id` / `prompt` must be set (§4.5, §9h).
#[derive(Clone, Debug, Deserialize)]
pub struct CreateScoringJobRequest {
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScoringJobResponse {
    #[serde(flatten)]
    pub job: ScoringJob,
}

/// POST /api/v1/scoring-jobs/{job_id}/retry and /cancel share this trivial
/// response shape — the updated job row.
pub type RetryScoringJobResponse = ScoringJobResponse;
pub type CancelScoringJobResponse = ScoringJobResponse;
