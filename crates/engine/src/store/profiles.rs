use chrono::Utc;
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

use rolescope_common::ids::{CompanyId, ProfileId};
use rolescope_common::types::{
    profile::SuggestedRole, EducationEntry, ExperienceEntry, Profile,
};

use super::{StoreClient, StoreError};

impl StoreClient {
    /// Insert a new profile row. Fails hard on error (§4.1 step 7) — callers
    /// translate a failure into `PROFILE_CREATION_FAILED`.
    pub async fn insert_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (
                id, linkedin_url, full_name, headline, about, current_position,
                current_company_name, current_company_linkedin_url, current_company_id, country, city,
                profile_image_url, suggested_role, experiences, education,
                certifications, honors, languages, skills, contact_urls,
                raw_payload, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23
            )
            "#,
        )
        .bind(profile.id.0)
        .bind(&profile.linkedin_url)
        .bind(&profile.full_name)
        .bind(&profile.headline)
        .bind(&profile.about)
        .bind(&profile.current_position)
        .bind(&profile.current_company_name)
        .bind(&profile.current_company_linkedin_url)
        .bind(profile.current_company_id.map(|id| id.0))
        .bind(&profile.country)
        .bind(&profile.city)
        .bind(&profile.profile_image_url)
        .bind(profile.suggested_role.map(|r| r.as_db_str()))
        .bind(Json(&profile.experiences))
        .bind(Json(&profile.education))
        .bind(&profile.certifications)
        .bind(&profile.honors)
        .bind(&profile.languages)
        .bind(&profile.skills)
        .bind(&profile.contact_urls)
        .bind(&profile.raw_payload)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(profile.clone())
    }

    /// Delete a profile by canonical URL if one exists, first deleting its
    /// employment edges explicitly (§4.1 step 2, §9c — no DB-level cascade).
    /// Returns the deleted profile's id, if any.
    pub async fn delete_profile_by_url(
        &self,
        linkedin_url: &str,
    ) -> Result<Option<ProfileId>, StoreError> {
        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM profiles WHERE linkedin_url = $1")
                .bind(linkedin_url)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;

        let Some((id,)) = existing else {
            return Ok(None);
        };

        let edge_count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM profile_companies WHERE profile_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| StoreError::Query(e.to_string()))?;

        sqlx::query("DELETE FROM profile_companies WHERE profile_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        tracing::info!(
            profile_id = %id,
            edges_deleted = edge_count.0,
            "deleted existing profile-company edges before replacing profile"
        );

        sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        tracing::info!(profile_id = %id, linkedin_url, "deleted existing profile for replacement");

        Ok(Some(ProfileId::from_uuid(id)))
    }

    /// Delete a profile (and its edges) by id. Used by `DELETE /profiles/{id}`.
    pub async fn delete_profile(&self, id: ProfileId) -> Result<bool, StoreError> {
        let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM profiles WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        if existing.is_none() {
            return Ok(false);
        }

        sqlx::query("DELETE FROM profile_companies WHERE profile_id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        tracing::info!(profile_id = %id, "deleted profile-company edges");

        sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        tracing::info!(profile_id = %id, "deleted profile");

        Ok(true)
    }

    pub async fn get_profile(&self, id: ProfileId) -> Result<Profile, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(PROFILE_SELECT_COLUMNS_WHERE_ID)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
            .ok_or_else(|| StoreError::NotFound(format!("Profile {}", id)))?;

        Ok(row.into())
    }

    pub async fn get_profile_by_url(
        &self,
        linkedin_url: &str,
    ) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(PROFILE_SELECT_COLUMNS_WHERE_URL)
            .bind(linkedin_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    pub async fn list_profiles(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Profile>, i64), StoreError> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            &format!("{} ORDER BY created_at DESC LIMIT $1 OFFSET $2", PROFILE_SELECT_BASE),
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }

    /// Set `current_company_id` once the profile's current employer has been
    /// resolved to a persisted company (best-effort link, §4.1 step 8).
    pub async fn set_profile_current_company(
        &self,
        profile_id: ProfileId,
        company_id: CompanyId,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE profiles SET current_company_id = $2, updated_at = $3 WHERE id = $1")
            .bind(profile_id.0)
            .bind(company_id.0)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        Ok(())
    }
}

const PROFILE_SELECT_BASE: &str = r#"
    SELECT id, linkedin_url, full_name, headline, about, current_position,
           current_company_name, current_company_linkedin_url, current_company_id, country, city,
           profile_image_url, suggested_role, experiences, education,
           certifications, honors, languages, skills, contact_urls,
           raw_payload, created_at, updated_at
    FROM profiles
"#;

const PROFILE_SELECT_COLUMNS_WHERE_ID: &str = r#"
    SELECT id, linkedin_url, full_name, headline, about, current_position,
           current_company_name, current_company_linkedin_url, current_company_id, country, city,
           profile_image_url, suggested_role, experiences, education,
           certifications, honors, languages, skills, contact_urls,
           raw_payload, created_at, updated_at
    FROM profiles WHERE id = $1
"#;

const PROFILE_SELECT_COLUMNS_WHERE_URL: &str = r#"
    SELECT id, linkedin_url, full_name, headline, about, current_position,
           current_company_name, current_company_linkedin_url, current_company_id, country, city,
           profile_image_url, suggested_role, experiences, education,
           certifications, honors, languages, skills, contact_urls,
           raw_payload, created_at, updated_at
    FROM profiles WHERE linkedin_url = $1
"#;

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
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
    experiences: Json<Vec<ExperienceEntry>>,
    education: Json<Vec<EducationEntry>>,
    certifications: Vec<String>,
    honors: Vec<String>,
    languages: Vec<String>,
    skills: Vec<String>,
    contact_urls: Vec<String>,
    raw_payload: Value,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: ProfileId::from_uuid(row.id),
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
            suggested_role: row.suggested_role.and_then(|s| SuggestedRole::parse(&s)),
            experiences: row.experiences.0,
            education: row.education.0,
            certifications: row.certifications,
            honors: row.honors,
            languages: row.languages,
            skills: row.skills,
            contact_urls: row.contact_urls,
            raw_payload: row.raw_payload,
            embedding: None,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
