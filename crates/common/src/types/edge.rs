use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CompanyId, ProfileCompanyEdgeId, ProfileId};

/// A single employment relationship between a profile and a company,
/// parsed from one entry in the profile's experience list. Additive:
/// the same profile/company pair can have multiple edges (different
/// roles, different tenures).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProfileCompanyEdge {
    pub id: ProfileCompanyEdgeId,
    pub profile_id: ProfileId,
    pub company_id: CompanyId,
    pub position_title: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub duration_text: Option<String>,
    pub is_current_role: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ProfileCompanyEdge {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        profile_id: ProfileId,
        company_id: CompanyId,
        position_title: Option<String>,
        start_date: Option<String>,
        end_date: Option<String>,
        duration_text: Option<String>,
        is_current_role: bool,
        description: Option<String>,
    ) -> Self {
        Self {
            id: ProfileCompanyEdgeId::new(),
            profile_id,
            company_id,
            position_title,
            start_date,
            end_date,
            duration_text,
            is_current_role,
            description,
            created_at: Utc::now(),
        }
    }
}
