use serde::{Deserialize, Serialize};

use crate::types::{Company, Profile};

/// GET /api/v1/companies?search=&industry=&employee_range=&limit=&offset=
#[derive(Clone, Debug, Deserialize)]
pub struct ListCompaniesQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub employee_range: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ListCompaniesResponse {
    pub companies: Vec<Company>,
    pub total: i64,
}

/// GET /api/v1/companies/{id}/profiles?current_only=&limit=&offset=
#[derive(Clone, Debug, Deserialize)]
pub struct ListCompanyProfilesQuery {
    #[serde(default)]
    pub current_only: Option<bool>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CompanyProfileEntry {
    pub profile: Profile,
    pub position_title: Option<String>,
    pub is_current_role: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct ListCompanyProfilesResponse {
    pub profiles: Vec<CompanyProfileEntry>,
    pub total: i64,
}
