use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{PromptTemplate, TemplateDiff, TemplateVersionHistory};

#[derive(Clone, Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub category: String,
    pub prompt_text: String,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// PATCH /api/v1/templates/{id} — any subset of content-affecting fields.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct UpdateTemplateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub prompt_text: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ListTemplatesQuery {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ListTemplatesResponse {
    pub templates: Vec<PromptTemplate>,
    pub total: i64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ListTemplateVersionsResponse {
    pub versions: Vec<TemplateVersionHistory>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BranchTemplateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CompareVersionsQuery {
    pub a: i32,
    pub b: i32,
}

#[derive(Clone, Debug, Serialize)]
pub struct CompareVersionsResponse {
    #[serde(flatten)]
    pub diff: TemplateDiff,
}
