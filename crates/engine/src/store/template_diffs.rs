use serde_json::Value;
use uuid::Uuid;

use rolescope_common::ids::TemplateVersionId;
use rolescope_common::types::{FieldDiffStatus, TemplateDiff};

use super::{StoreClient, StoreError};

impl StoreClient {
    /// Look up a cached diff, checking both orderings of the version pair.
    /// Diffs are directional — `value_a`/`value_b` and `Added`/`Removed`
    /// flip depending on which version is "from" and which is "to" — so a
    /// hit on the reversed ordering is swapped back into the direction the
    /// caller asked for before it's returned.
    pub async fn get_cached_template_diff(
        &self,
        version_a_id: TemplateVersionId,
        version_b_id: TemplateVersionId,
    ) -> Result<Option<TemplateDiff>, StoreError> {
        let row: Option<(Uuid, Value)> = sqlx::query_as(
            r#"SELECT version_a_id, diff FROM template_version_diffs
               WHERE (version_a_id = $1 AND version_b_id = $2)
                  OR (version_a_id = $2 AND version_b_id = $1)"#,
        )
        .bind(version_a_id.0)
        .bind(version_b_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(match row {
            Some((cached_a, value)) => {
                let diff: TemplateDiff = serde_json::from_value(value)
                    .map_err(|e| StoreError::Query(format!("corrupt cached diff: {}", e)))?;
                if cached_a == version_a_id.0 {
                    Some(diff)
                } else {
                    Some(reverse_diff(diff))
                }
            }
            None => None,
        })
    }

    pub async fn cache_template_diff(
        &self,
        version_a_id: TemplateVersionId,
        version_b_id: TemplateVersionId,
        diff: &TemplateDiff,
    ) -> Result<(), StoreError> {
        let diff_json = serde_json::to_value(diff)
            .map_err(|e| StoreError::Query(format!("failed to serialize diff: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO template_version_diffs (id, version_a_id, version_b_id, diff, created_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (version_a_id, version_b_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(version_a_id.0)
        .bind(version_b_id.0)
        .bind(diff_json)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(())
    }
}

/// Flip a diff computed as (a, b) into its (b, a) equivalent: swap each
/// field's `value_a`/`value_b` and invert `Added`/`Removed` (`Modified` and
/// `Unchanged` are symmetric and pass through unchanged).
fn reverse_diff(mut diff: TemplateDiff) -> TemplateDiff {
    for field in &mut diff.fields {
        std::mem::swap(&mut field.value_a, &mut field.value_b);
        field.status = match &field.status {
            FieldDiffStatus::Added => FieldDiffStatus::Removed,
            FieldDiffStatus::Removed => FieldDiffStatus::Added,
            other => other.clone(),
        };
    }
    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolescope_common::types::{DiffSummary, FieldDiff};

    #[test]
    fn reverse_diff_swaps_values_and_inverts_added_removed() {
        let diff = TemplateDiff {
            fields: vec![
                FieldDiff {
                    field: "description".into(),
                    status: FieldDiffStatus::Added,
                    unified_diff: None,
                    value_a: None,
                    value_b: Some("new description".into()),
                },
                FieldDiff {
                    field: "name".into(),
                    status: FieldDiffStatus::Modified,
                    unified_diff: None,
                    value_a: Some("Old".into()),
                    value_b: Some("New".into()),
                },
            ],
            summary: DiffSummary::default(),
        };

        let reversed = reverse_diff(diff);

        let description = reversed.fields.iter().find(|f| f.field == "description").unwrap();
        assert_eq!(description.status, FieldDiffStatus::Removed);
        assert_eq!(description.value_a, Some("new description".into()));
        assert_eq!(description.value_b, None);

        let name = reversed.fields.iter().find(|f| f.field == "name").unwrap();
        assert_eq!(name.status, FieldDiffStatus::Modified);
        assert_eq!(name.value_a, Some("New".into()));
        assert_eq!(name.value_b, Some("Old".into()));
    }
}
