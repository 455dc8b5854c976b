use serde::{Deserialize, Serialize};

use crate::ids::TemplateVersionId;

/// Per-field diff status between two template versions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDiffStatus {
    Unchanged,
    Added,
    Removed,
    Modified,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldDiff {
    pub field: String,
    pub status: FieldDiffStatus,
    /// For long text fields (`prompt_text`, `description`), a unified-diff
    /// rendering; absent for short scalar fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unified_diff: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_b: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DiffSummary {
    pub additions: u32,
    pub deletions: u32,
    pub modifications: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemplateDiff {
    pub fields: Vec<FieldDiff>,
    pub summary: DiffSummary,
}

/// Cache row keyed on an ordered pair of version ids. Lookups check both
/// orderings before recomputing (§4.6); entries are never invalidated since
/// versions are immutable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemplateDiffCacheEntry {
    pub version_a_id: TemplateVersionId,
    pub version_b_id: TemplateVersionId,
    pub diff: TemplateDiff,
}
