use chrono::{DateTime, Utc};
use uuid::Uuid;

use rolescope_common::ids::{CompanyId, ProfileCompanyEdgeId, ProfileId};
use rolescope_common::types::ProfileCompanyEdge;

use super::{StoreClient, StoreError};

impl StoreClient {
    /// Insert an employment edge, ignoring a duplicate on the
    /// `(profile_id, company_id, position_title, start_date)` uniqueness
    /// constraint (§3, §4.1 step 6 — edges are additive, never merged).
    pub async fn insert_edge(&self, edge: &ProfileCompanyEdge) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO profile_companies (
                id, profile_id, company_id, position_title, start_date,
                end_date, duration_text, is_current_role, description, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (profile_id, company_id, position_title, start_date) DO NOTHING
            "#,
        )
        .bind(edge.id.0)
        .bind(edge.profile_id.0)
        .bind(edge.company_id.0)
        .bind(&edge.position_title)
        .bind(&edge.start_date)
        .bind(&edge.end_date)
        .bind(&edge.duration_text)
        .bind(edge.is_current_role)
        .bind(&edge.description)
        .bind(edge.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    pub async fn list_edges_for_profile(
        &self,
        profile_id: ProfileId,
    ) -> Result<Vec<ProfileCompanyEdge>, StoreError> {
        let rows = sqlx::query_as::<_, EdgeRow>(
            r#"SELECT id, profile_id, company_id, position_title, start_date,
                      end_date, duration_text, is_current_role, description, created_at
               FROM profile_companies WHERE profile_id = $1
               ORDER BY start_date DESC NULLS LAST"#,
        )
        .bind(profile_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_profiles_for_company(
        &self,
        company_id: CompanyId,
        current_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<(ProfileCompanyEdge, rolescope_common::types::Profile)>, i64), StoreError>
    {
        let rows = sqlx::query_as::<_, EdgeWithProfileRow>(&format!(
            r#"
            SELECT e.id, e.profile_id, e.company_id, e.position_title, e.start_date,
                   e.end_date, e.duration_text, e.is_current_role, e.description, e.created_at,
                   p.id as p_id, p.linkedin_url, p.full_name, p.headline, p.about,
                   p.current_position, p.current_company_name, p.current_company_linkedin_url, p.current_company_id,
                   p.country, p.city, p.profile_image_url, p.suggested_role,
                   p.experiences, p.education, p.certifications, p.honors,
                   p.languages, p.skills, p.contact_urls, p.raw_payload,
                   p.created_at as p_created_at, p.updated_at as p_updated_at
            FROM profile_companies e
            JOIN profiles p ON p.id = e.profile_id
            WHERE e.company_id = $1 {}
            ORDER BY e.start_date DESC NULLS LAST
            LIMIT $2 OFFSET $3
            "#,
            if current_only { "AND e.is_current_role = true" } else { "" }
        ))
        .bind(company_id.0)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let total: (i64,) = sqlx::query_as(&format!(
            r#"SELECT COUNT(*) FROM profile_companies e
               WHERE e.company_id = $1 {}"#,
            if current_only { "AND e.is_current_role = true" } else { "" }
        ))
        .bind(company_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }
}

#[derive(sqlx::FromRow)]
struct EdgeRow {
    id: Uuid,
    profile_id: Uuid,
    company_id: Uuid,
    position_title: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    duration_text: Option<String>,
    is_current_role: bool,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<EdgeRow> for ProfileCompanyEdge {
    fn from(row: EdgeRow) -> Self {
        Self {
            id: ProfileCompanyEdgeId::from_uuid(row.id),
            profile_id: ProfileId::from_uuid(row.profile_id),
            company_id: CompanyId::from_uuid(row.company_id),
            position_title: row.position_title,
            start_date: row.start_date,
            end_date: row.end_date,
            duration_text: row.duration_text,
            is_current_role: row.is_current_role,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EdgeWithProfileRow {
    id: Uuid,
    profile_id: Uuid,
    company_id: Uuid,
    position_title: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    duration_text: Option<String>,
    is_current_role: bool,
    description: Option<String>,
    created_at: DateTime<Utc>,
    p_id: Uuid,
    linkedin_url: String,
    full_name: String,
    headline: Option<String>,
    about: Option<String>,
    current_position: Option<String>,
    current_company_name: Option<String>,
    current_company_linkedin_url: Option<String>,
    current_company_id: Option<Uuid>,
    country: Option<String>,
    city: Option<String>,
    profile_image_url: Option<String>,
    suggested_role: Option<String>,
    experiences: sqlx::types::Json<Vec<rolescope_common::types::ExperienceEntry>>,
    education: sqlx::types::Json<Vec<rolescope_common::types::EducationEntry>>,
    certifications: Vec<String>,
    honors: Vec<String>,
    languages: Vec<String>,
    skills: Vec<String>,
    contact_urls: Vec<String>,
    raw_payload: serde_json::Value,
    p_created_at: DateTime<Utc>,
    p_updated_at: DateTime<Utc>,
}

impl From<EdgeWithProfileRow> for (ProfileCompanyEdge, rolescope_common::types::Profile) {
    fn from(row: EdgeWithProfileRow) -> Self {
        let edge = ProfileCompanyEdge {
            id: ProfileCompanyEdgeId::from_uuid(row.id),
            profile_id: ProfileId::from_uuid(row.profile_id),
            company_id: CompanyId::from_uuid(row.company_id),
            position_title: row.position_title,
            start_date: row.start_date,
            end_date: row.end_date,
            duration_text: row.duration_text,
            is_current_role: row.is_current_role,
            description: row.description,
            created_at: row.created_at,
        };
        let profile = rolescope_common::types::Profile {
            id: ProfileId::from_uuid(row.p_id),
            linkedin_url: row.linkedin_url,
            full_name: row.full_name,
            headline: row.headline,
            about: row.about,
            current_position: row.current_position,
            current_company_name: row.current_company_name,
            current_company_linkedin_url: row.current_company_linkedin_url,
            current_company_id: row.current_company_id.map(CompanyId::from_uuid),
            country: row.country,
            city: row.city,
            profile_image_url: row.profile_image_url,
            suggested_role: row
                .suggested_role
                .and_then(|s| rolescope_common::types::profile::SuggestedRole::parse(&s)),
            experiences: row.experiences.0,
            education: row.education.0,
            certifications: row.certifications,
            honors: row.honors,
            languages: row.languages,
            skills: row.skills,
            contact_urls: row.contact_urls,
            raw_payload: row.raw_payload,
            embedding: None,
            created_at: row.p_created_at,
            updated_at: row.p_updated_at,
        };
        (edge, profile)
    }
}
