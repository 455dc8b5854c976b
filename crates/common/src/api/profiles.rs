use serde::{Deserialize, Serialize};

use crate::types::{CompanyResolutionOutcome, Profile};

/// POST /api/v1/profiles
#[derive(Clone, Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub linkedin_url: String,
    #[serde(default)]
    pub suggested_role: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub include_companies: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Serialize)]
pub struct CompanyProcessedEntry {
    pub company_id: String,
    pub name: String,
    pub outcome: CompanyResolutionOutcome,
}

#[derive(Clone, Debug, Serialize)]
pub struct PipelineMetadata {
    pub companies_found: usize,
    pub companies_fetched_from_cassidy: usize,
    pub pipeline_status: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CreateProfileResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub companies_processed: Vec<CompanyProcessedEntry>,
    pub pipeline_metadata: PipelineMetadata,
}

/// GET /api/v1/profiles?linkedin_url=
#[derive(Clone, Debug, Deserialize)]
pub struct ListProfilesQuery {
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ListProfilesResponse {
    pub profiles: Vec<Profile>,
    pub total: i64,
}
