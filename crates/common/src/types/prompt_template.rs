use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::TemplateId;

/// Classification used solely to select a default LLM model (§4.5, GLOSSARY).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateStage {
    Stage2Screening,
    Stage3Analysis,
}

impl TemplateStage {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Stage2Screening => "stage_2_screening",
            Self::Stage3Analysis => "stage_3_analysis",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "stage_2_screening" => Some(Self::Stage2Screening),
            "stage_3_analysis" => Some(Self::Stage3Analysis),
            _ => None,
        }
    }
}

/// The mutable "head" row for a prompt template. Distinct from the
/// immutable `TemplateVersionHistory` entries recording its past states.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub id: TemplateId,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub stage: Option<TemplateStage>,
    pub prompt_text: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: i32,
    pub is_active: bool,
    /// Always `true` for a `PromptTemplate` — it is the mutable head row.
    /// Past states are a structurally distinct type (`TemplateVersionHistory`)
    /// and never satisfy this type, so the field carries no other value, but
    /// serializing it keeps the wire shape self-describing for clients that
    /// render heads and history rows in the same list.
    #[serde(default = "default_true")]
    pub is_current_version: bool,
    #[serde(default)]
    pub parent_template_id: Option<TemplateId>,
    #[serde(default)]
    pub version_label: Option<String>,
    #[serde(default)]
    pub version_notes: Option<String>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The set of fields whose change triggers automatic version capture (§4.6).
pub const CONTENT_AFFECTING_FIELDS: [&str; 5] =
    ["name", "prompt_text", "description", "category", "metadata"];

fn default_true() -> bool {
    true
}

impl PromptTemplate {
    pub fn new(name: String, category: String, prompt_text: String) -> Self {
        let now = Utc::now();
        Self {
            id: TemplateId::new(),
            name: name.trim().to_string(),
            category: category.trim().to_string(),
            stage: None,
            prompt_text: prompt_text.trim().to_string(),
            description: None,
            version: 1,
            is_active: true,
            is_current_version: true,
            parent_template_id: None,
            version_label: None,
            version_notes: None,
            metadata: Value::Null,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Compute which content-affecting fields differ between `self` (the
    /// prior head) and `other` (the proposed new state).
    pub fn changed_fields_against(&self, other: &PromptTemplate) -> Vec<String> {
        let mut changed = Vec::new();
        if self.name != other.name {
            changed.push("name".to_string());
        }
        if self.prompt_text != other.prompt_text {
            changed.push("prompt_text".to_string());
        }
        if self.description != other.description {
            changed.push("description".to_string());
        }
        if self.category != other.category {
            changed.push("category".to_string());
        }
        if self.metadata != other.metadata {
            changed.push("metadata".to_string());
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_op_update_yields_no_changed_fields() {
        let t = PromptTemplate::new("A".into(), "CTO".into(), "hello".into());
        let clone = t.clone();
        assert!(t.changed_fields_against(&clone).is_empty());
    }

    #[test]
    fn single_field_update_is_detected() {
        let t = PromptTemplate::new("A".into(), "CTO".into(), "hello".into());
        let mut other = t.clone();
        other.prompt_text = "goodbye".into();
        assert_eq!(t.changed_fields_against(&other), vec!["prompt_text".to_string()]);
    }
}
