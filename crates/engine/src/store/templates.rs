use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use rolescope_common::ids::TemplateId;
use rolescope_common::types::prompt_template::TemplateStage;
use rolescope_common::types::PromptTemplate;

use super::{StoreClient, StoreError};

const TEMPLATE_SELECT_BASE: &str = r#"
    SELECT id, name, category, stage, prompt_text, description, version,
           is_active, parent_template_id, version_label, version_notes,
           metadata, created_by, created_at, updated_at
    FROM prompt_templates
"#;

impl StoreClient {
    /// Insert a template head row. Callers use `self.begin()` to pair this
    /// with the initial version-history row in one transaction (§4.6).
    pub async fn insert_template_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        template: &PromptTemplate,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO prompt_templates (
                id, name, category, stage, prompt_text, description, version,
                is_active, parent_template_id, version_label, version_notes,
                metadata, created_by, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(template.id.0)
        .bind(&template.name)
        .bind(&template.category)
        .bind(template.stage.as_ref().map(|s| s.as_db_str()))
        .bind(&template.prompt_text)
        .bind(&template.description)
        .bind(template.version)
        .bind(template.is_active)
        .bind(template.parent_template_id.map(|id| id.0))
        .bind(&template.version_label)
        .bind(&template.version_notes)
        .bind(&template.metadata)
        .bind(&template.created_by)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    /// Overwrite the mutable head row in place (§4.6 — history rows, not the
    /// head, carry prior states).
    pub async fn update_template_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        template: &PromptTemplate,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE prompt_templates SET
                name = $2, category = $3, stage = $4, prompt_text = $5,
                description = $6, version = $7, is_active = $8,
                version_label = $9, version_notes = $10, metadata = $11,
                updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(template.id.0)
        .bind(&template.name)
        .bind(&template.category)
        .bind(template.stage.as_ref().map(|s| s.as_db_str()))
        .bind(&template.prompt_text)
        .bind(&template.description)
        .bind(template.version)
        .bind(template.is_active)
        .bind(&template.version_label)
        .bind(&template.version_notes)
        .bind(&template.metadata)
        .bind(template.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    /// Delete a template head. Its version history rows are left in place —
    /// they are independent, immutable records, not owned by the head.
    pub async fn delete_template(&self, id: TemplateId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM prompt_templates WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get_template(&self, id: TemplateId) -> Result<PromptTemplate, StoreError> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!("{} WHERE id = $1", TEMPLATE_SELECT_BASE))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
            .ok_or_else(|| StoreError::NotFound(format!("Template {}", id)))?;

        Ok(row.into())
    }

    pub async fn list_templates(
        &self,
        category: Option<&str>,
        stage: Option<&str>,
        is_active: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<PromptTemplate>, i64), StoreError> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            r#"{}
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR stage = $2)
              AND ($3::bool IS NULL OR is_active = $3)
            ORDER BY created_at DESC LIMIT $4 OFFSET $5"#,
            TEMPLATE_SELECT_BASE
        ))
        .bind(category)
        .bind(stage)
        .bind(is_active)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let total: (i64,) = sqlx::query_as(
            r#"SELECT COUNT(*) FROM prompt_templates
               WHERE ($1::text IS NULL OR category = $1)
                 AND ($2::text IS NULL OR stage = $2)
                 AND ($3::bool IS NULL OR is_active = $3)"#,
        )
        .bind(category)
        .bind(stage)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }

    /// Find the single active template for a category, used to default a
    /// scoring job's template when the caller supplies an ad-hoc prompt is
    /// not requested (§4.5 step 1).
    pub async fn get_active_template_for_category(
        &self,
        category: &str,
    ) -> Result<Option<PromptTemplate>, StoreError> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "{} WHERE category = $1 AND is_active = true LIMIT 1",
            TEMPLATE_SELECT_BASE
        ))
        .bind(category)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.map(Into::into))
    }
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    name: String,
    category: String,
    stage: Option<String>,
    prompt_text: String,
    description: Option<String>,
    version: i32,
    is_active: bool,
    parent_template_id: Option<Uuid>,
    version_label: Option<String>,
    version_notes: Option<String>,
    metadata: Value,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TemplateRow> for PromptTemplate {
    fn from(row: TemplateRow) -> Self {
        Self {
            id: TemplateId::from_uuid(row.id),
            name: row.name,
            category: row.category,
            stage: row.stage.as_deref().and_then(TemplateStage::parse),
            prompt_text: row.prompt_text,
            description: row.description,
            version: row.version,
            is_active: row.is_active,
            is_current_version: true,
            parent_template_id: row.parent_template_id.map(TemplateId::from_uuid),
            version_label: row.version_label,
            version_notes: row.version_notes,
            metadata: row.metadata,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
