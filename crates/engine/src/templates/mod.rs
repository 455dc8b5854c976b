mod diff;

use serde_json::Value;

use rolescope_common::ids::TemplateId;
use rolescope_common::types::prompt_template::{TemplateStage, CONTENT_AFFECTING_FIELDS};
use rolescope_common::types::template_version::TemplateChangeType;
use rolescope_common::types::{PromptTemplate, TemplateDiff, TemplateVersionHistory};

use crate::store::{StoreClient, StoreError};

pub use diff::compute_diff;

#[derive(Debug, thiserror::Error)]
pub enum TemplateServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TemplateServiceError> for rolescope_common::RolescopeError {
    fn from(e: TemplateServiceError) -> Self {
        match e {
            TemplateServiceError::Store(se) => se.into(),
        }
    }
}

/// Fields a caller may set when creating a template. Unset optional fields
/// take their constructor defaults.
pub struct NewTemplate {
    pub name: String,
    pub category: String,
    pub stage: Option<TemplateStage>,
    pub prompt_text: String,
    pub description: Option<String>,
    pub metadata: Value,
    pub created_by: Option<String>,
}

/// Partial update; unset fields leave the current head value unchanged.
#[derive(Default)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub stage: Option<Option<TemplateStage>>,
    pub prompt_text: Option<String>,
    pub description: Option<Option<String>>,
    pub metadata: Option<Value>,
    pub is_active: Option<bool>,
    pub version_label: Option<Option<String>>,
    pub version_notes: Option<Option<String>>,
}

/// Create a new template head plus its initial `create` history row, in one
/// transaction (§4.6 "Initial version").
pub async fn create_template(
    store: &StoreClient,
    new: NewTemplate,
) -> Result<PromptTemplate, TemplateServiceError> {
    let mut template = PromptTemplate::new(new.name, new.category, new.prompt_text);
    template.stage = new.stage;
    template.description = new.description;
    template.metadata = new.metadata;
    template.created_by = new.created_by;

    let mut tx = store.begin().await?;
    store.insert_template_tx(&mut tx, &template).await?;
    store
        .insert_template_version_tx(&mut tx, &initial_version_row(&template, TemplateChangeType::Create))
        .await?;
    tx.commit().await.map_err(|e| StoreError::Query(e.to_string()))?;

    Ok(template)
}

/// Apply a partial update. A no-op update (no content-affecting field
/// changed) leaves `version` untouched and writes no history row (§4.6,
/// §8 invariant 8). Flipping `is_active` false→true is recorded as
/// `activate` rather than `update`.
pub async fn update_template(
    store: &StoreClient,
    id: TemplateId,
    update: TemplateUpdate,
) -> Result<PromptTemplate, TemplateServiceError> {
    let existing = store.get_template(id).await?;
    let mut proposed = existing.clone();

    if let Some(name) = update.name {
        proposed.name = name;
    }
    if let Some(category) = update.category {
        proposed.category = category;
    }
    if let Some(stage) = update.stage {
        proposed.stage = stage;
    }
    if let Some(prompt_text) = update.prompt_text {
        proposed.prompt_text = prompt_text;
    }
    if let Some(description) = update.description {
        proposed.description = description;
    }
    if let Some(metadata) = update.metadata {
        proposed.metadata = metadata;
    }
    if let Some(label) = update.version_label {
        proposed.version_label = label;
    }
    if let Some(notes) = update.version_notes {
        proposed.version_notes = notes;
    }

    let activating = update.is_active == Some(true) && !existing.is_active;
    if let Some(is_active) = update.is_active {
        proposed.is_active = is_active;
    }

    let changed_fields = existing.changed_fields_against(&proposed);
    if changed_fields.is_empty() && !activating {
        return Ok(existing);
    }

    proposed.version = existing.version + 1;
    proposed.updated_at = chrono::Utc::now();

    let change_type = if activating {
        TemplateChangeType::Activate
    } else {
        TemplateChangeType::Update
    };
    let previous_version_id = store.latest_version_id(id).await?;
    let version_row = version_row_from_template(&proposed, change_type, previous_version_id, changed_fields);

    let mut tx = store.begin().await?;
    store.update_template_tx(&mut tx, &proposed).await?;
    store.insert_template_version_tx(&mut tx, &version_row).await?;
    tx.commit().await.map_err(|e| StoreError::Query(e.to_string()))?;

    Ok(proposed)
}

/// Set the head's content to version `N`'s snapshot, recording a `restore`
/// history row at the next version number (§4.6, §8 round-trip behavior).
pub async fn restore_template(
    store: &StoreClient,
    id: TemplateId,
    version_number: i32,
) -> Result<PromptTemplate, TemplateServiceError> {
    let existing = store.get_template(id).await?;
    let target = store.get_template_version(id, version_number).await?;

    let mut restored = existing.clone();
    restored.name = target.name.clone();
    restored.category = target.category.clone();
    restored.prompt_text = target.prompt_text.clone();
    restored.description = target.description.clone();
    restored.metadata = target.metadata.clone();
    restored.version = existing.version + 1;
    restored.updated_at = chrono::Utc::now();

    let changed_fields = existing.changed_fields_against(&restored);
    let previous_version_id = store.latest_version_id(id).await?;
    let version_row = version_row_from_template(
        &restored,
        TemplateChangeType::Restore,
        previous_version_id,
        changed_fields,
    );

    let mut tx = store.begin().await?;
    store.update_template_tx(&mut tx, &restored).await?;
    store.insert_template_version_tx(&mut tx, &version_row).await?;
    tx.commit().await.map_err(|e| StoreError::Query(e.to_string()))?;

    Ok(restored)
}

/// Create a new template whose initial content mirrors `id`'s current head,
/// linked back via `parent_template_id` (§4.6).
pub async fn branch_template(
    store: &StoreClient,
    id: TemplateId,
    name_override: Option<String>,
    created_by: Option<String>,
) -> Result<PromptTemplate, TemplateServiceError> {
    let source = store.get_template(id).await?;

    let mut branched = PromptTemplate::new(
        name_override.unwrap_or_else(|| source.name.clone()),
        source.category.clone(),
        source.prompt_text.clone(),
    );
    branched.stage = source.stage.clone();
    branched.description = source.description.clone();
    branched.metadata = source.metadata.clone();
    branched.parent_template_id = Some(source.id);
    branched.created_by = created_by;
    branched.is_active = false;

    let mut tx = store.begin().await?;
    store.insert_template_tx(&mut tx, &branched).await?;
    store
        .insert_template_version_tx(&mut tx, &initial_version_row(&branched, TemplateChangeType::Branch))
        .await?;
    tx.commit().await.map_err(|e| StoreError::Query(e.to_string()))?;

    Ok(branched)
}

/// Diff two versions of a template, using the cache table as a read-through
/// layer keyed on either ordering of the pair (§4.6, §8 invariant 9).
pub async fn compare_versions(
    store: &StoreClient,
    template_id: TemplateId,
    version_a: i32,
    version_b: i32,
) -> Result<TemplateDiff, TemplateServiceError> {
    let a = store.get_template_version(template_id, version_a).await?;
    let b = store.get_template_version(template_id, version_b).await?;

    if let Some(cached) = store.get_cached_template_diff(a.id, b.id).await? {
        return Ok(cached);
    }

    let diff = compute_diff(&a, &b);
    store.cache_template_diff(a.id, b.id, &diff).await?;
    Ok(diff)
}

fn initial_version_row(
    template: &PromptTemplate,
    change_type: TemplateChangeType,
) -> TemplateVersionHistory {
    version_row_from_template(
        template,
        change_type,
        None,
        CONTENT_AFFECTING_FIELDS.iter().map(|f| f.to_string()).collect(),
    )
}

fn version_row_from_template(
    template: &PromptTemplate,
    change_type: TemplateChangeType,
    previous_version_id: Option<rolescope_common::ids::TemplateVersionId>,
    changed_fields: Vec<String>,
) -> TemplateVersionHistory {
    TemplateVersionHistory {
        id: rolescope_common::ids::TemplateVersionId::new(),
        template_id: template.id,
        version_number: template.version,
        version_label: template.version_label.clone(),
        previous_version_id,
        change_type,
        change_summary: None,
        changed_fields,
        name: template.name.clone(),
        category: template.category.clone(),
        prompt_text: template.prompt_text.clone(),
        description: template.description.clone(),
        metadata: template.metadata.clone(),
        created_at: template.updated_at,
        created_by: template.created_by.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activate_flag_is_detected_independent_of_content_fields() {
        let t = PromptTemplate::new("A".into(), "CTO".into(), "hello".into());
        let mut other = t.clone();
        other.is_active = true;
        assert!(t.changed_fields_against(&other).is_empty());
    }
}
