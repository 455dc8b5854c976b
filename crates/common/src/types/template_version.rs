use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{TemplateId, TemplateVersionId};

/// The kind of event that produced a `TemplateVersionHistory` row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateChangeType {
    Create,
    Update,
    Restore,
    Branch,
    Activate,
}

impl TemplateChangeType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Restore => "restore",
            Self::Branch => "branch",
            Self::Activate => "activate",
        }
    }
}

pub fn parse_template_change_type(s: &str) -> TemplateChangeType {
    match s {
        "create" => TemplateChangeType::Create,
        "update" => TemplateChangeType::Update,
        "restore" => TemplateChangeType::Restore,
        "branch" => TemplateChangeType::Branch,
        "activate" => TemplateChangeType::Activate,
        other => {
            tracing::warn!(change_type = other, "unknown template change type, defaulting to update");
            TemplateChangeType::Update
        }
    }
}

/// An immutable snapshot of a template's content at a point in its lineage.
///
/// `version_number` is monotonically increasing per template; once written,
/// a history row is never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TemplateVersionHistory {
    pub id: TemplateVersionId,
    pub template_id: TemplateId,
    pub version_number: i32,
    #[serde(default)]
    pub version_label: Option<String>,
    #[serde(default)]
    pub previous_version_id: Option<TemplateVersionId>,
    pub change_type: TemplateChangeType,
    #[serde(default)]
    pub change_summary: Option<String>,
    pub changed_fields: Vec<String>,
    /// Full content snapshot at this version, so restore/diff never needs
    /// to replay history — each row is self-contained.
    pub name: String,
    pub category: String,
    pub prompt_text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<String>,
}
