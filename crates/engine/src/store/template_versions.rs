use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use rolescope_common::ids::{TemplateId, TemplateVersionId};
use rolescope_common::types::template_version::{parse_template_change_type, TemplateChangeType};
use rolescope_common::types::TemplateVersionHistory;

use super::{StoreClient, StoreError};

impl StoreClient {
    /// Insert an immutable version snapshot within the same transaction as
    /// the head update it accompanies (§4.6).
    pub async fn insert_template_version_tx(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        version: &TemplateVersionHistory,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO template_version_history (
                id, template_id, version_number, version_label, previous_version_id,
                change_type, change_summary, changed_fields, name, category,
                prompt_text, description, metadata, created_at, created_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(version.id.0)
        .bind(version.template_id.0)
        .bind(version.version_number)
        .bind(&version.version_label)
        .bind(version.previous_version_id.map(|id| id.0))
        .bind(version.change_type.as_db_str())
        .bind(&version.change_summary)
        .bind(&version.changed_fields)
        .bind(&version.name)
        .bind(&version.category)
        .bind(&version.prompt_text)
        .bind(&version.description)
        .bind(&version.metadata)
        .bind(version.created_at)
        .bind(&version.created_by)
        .execute(&mut **tx)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }

    pub async fn list_template_versions(
        &self,
        template_id: TemplateId,
    ) -> Result<Vec<TemplateVersionHistory>, StoreError> {
        let rows = sqlx::query_as::<_, TemplateVersionRow>(
            r#"
            SELECT id, template_id, version_number, version_label, previous_version_id,
                   change_type, change_summary, changed_fields, name, category,
                   prompt_text, description, metadata, created_at, created_by
            FROM template_version_history
            WHERE template_id = $1
            ORDER BY version_number DESC
            "#,
        )
        .bind(template_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_template_version(
        &self,
        template_id: TemplateId,
        version_number: i32,
    ) -> Result<TemplateVersionHistory, StoreError> {
        let row = sqlx::query_as::<_, TemplateVersionRow>(
            r#"
            SELECT id, template_id, version_number, version_label, previous_version_id,
                   change_type, change_summary, changed_fields, name, category,
                   prompt_text, description, metadata, created_at, created_by
            FROM template_version_history
            WHERE template_id = $1 AND version_number = $2
            "#,
        )
        .bind(template_id.0)
        .bind(version_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?
        .ok_or_else(|| {
            StoreError::NotFound(format!("Template {} version {}", template_id, version_number))
        })?;

        Ok(row.into())
    }

    pub async fn latest_version_number(
        &self,
        template_id: TemplateId,
    ) -> Result<i32, StoreError> {
        let row: (Option<i32>,) = sqlx::query_as(
            "SELECT MAX(version_number) FROM template_version_history WHERE template_id = $1",
        )
        .bind(template_id.0)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.0.unwrap_or(0))
    }

    pub async fn latest_version_id(
        &self,
        template_id: TemplateId,
    ) -> Result<Option<TemplateVersionId>, StoreError> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"SELECT id FROM template_version_history
               WHERE template_id = $1 ORDER BY version_number DESC LIMIT 1"#,
        )
        .bind(template_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.map(|(id,)| TemplateVersionId::from_uuid(id)))
    }
}

#[derive(sqlx::FromRow)]
struct TemplateVersionRow {
    id: Uuid,
    template_id: Uuid,
    version_number: i32,
    version_label: Option<String>,
    previous_version_id: Option<Uuid>,
    change_type: String,
    change_summary: Option<String>,
    changed_fields: Vec<String>,
    name: String,
    category: String,
    prompt_text: String,
    description: Option<String>,
    metadata: Value,
    created_at: DateTime<Utc>,
    created_by: Option<String>,
}

impl From<TemplateVersionRow> for TemplateVersionHistory {
    fn from(row: TemplateVersionRow) -> Self {
        Self {
            id: TemplateVersionId::from_uuid(row.id),
            template_id: TemplateId::from_uuid(row.template_id),
            version_number: row.version_number,
            version_label: row.version_label,
            previous_version_id: row.previous_version_id.map(TemplateVersionId::from_uuid),
            change_type: parse_change_type(&row.change_type),
            change_summary: row.change_summary,
            changed_fields: row.changed_fields,
            name: row.name,
            category: row.category,
            prompt_text: row.prompt_text,
            description: row.description,
            metadata: row.metadata,
            created_at: row.created_at,
            created_by: row.created_by,
        }
    }
}

fn parse_change_type(s: &str) -> TemplateChangeType {
    parse_template_change_type(s)
}
