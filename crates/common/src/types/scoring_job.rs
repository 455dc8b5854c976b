use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{ProfileId, ScoringJobId, TemplateId};

/// Scoring job lifecycle states (§4.5, §8 invariants).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringJobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ScoringJobStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// A terminal state cannot transition further except via explicit retry
    /// (failed) or is simply final (completed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

pub fn parse_scoring_job_status(s: &str) -> ScoringJobStatus {
    match s {
        "pending" => ScoringJobStatus::Pending,
        "processing" => ScoringJobStatus::Processing,
        "completed" => ScoringJobStatus::Completed,
        "failed" => ScoringJobStatus::Failed,
        other => {
            tracing::warn!(status = other, "unknown scoring job status, defaulting to pending");
            ScoringJobStatus::Pending
        }
    }
}

/// A role-scoring job: created synchronously, advanced by a background
/// worker (§4.5).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoringJob {
    pub id: ScoringJobId,
    pub profile_id: ProfileId,
    #[serde(default)]
    pub template_id: Option<TemplateId>,
    /// The fully-expanded prompt actually sent to the model. Immutable once set.
    pub prompt: String,
    pub model_name: String,
    pub status: ScoringJobStatus,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub llm_response: Option<Value>,
    #[serde(default)]
    pub parsed_score: Option<Value>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ScoringJob {
    pub fn new(
        profile_id: ProfileId,
        template_id: Option<TemplateId>,
        prompt: String,
        model_name: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ScoringJobId::new(),
            profile_id,
            template_id,
            prompt,
            model_name,
            status: ScoringJobStatus::Pending,
            retry_count: 0,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
            llm_response: None,
            parsed_score: None,
            error_message: None,
        }
    }
}
