use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{CompanyId, ProfileId};

/// Suggested executive role a profile is being evaluated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SuggestedRole {
    Cto,
    Cio,
    Ciso,
}

impl SuggestedRole {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            Self::Cto => "CTO",
            Self::Cio => "CIO",
            Self::Ciso => "CISO",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CTO" => Some(Self::Cto),
            "CIO" => Some(Self::Cio),
            "CISO" => Some(Self::Ciso),
            _ => None,
        }
    }
}

/// A single entry in a profile's employment history, as reported by the
/// profile itself (distinct from the persisted profile-company edge, which
/// additionally carries the resolved company id).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExperienceEntry {
    pub company_name: Option<String>,
    #[serde(default)]
    pub company_linkedin_url: Option<String>,
    pub position_title: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub duration_text: Option<String>,
    #[serde(default)]
    pub is_current_role: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EducationEntry {
    pub school_name: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub field_of_study: Option<String>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
}

/// Minimal reference to the profile's current employer, as reported inline
/// on the profile payload (not yet resolved to a persisted company).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CurrentCompanyRef {
    pub name: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
}

/// Canonical profile record.
///
/// `linkedin_url` is always stored canonicalized (see `canonicalize_linkedin_url`).
/// Ingesting the same canonical URL twice replaces the prior row wholesale —
/// profiles are not merged field-by-field the way companies are.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub linkedin_url: String,
    pub full_name: String,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub current_position: Option<String>,
    #[serde(default)]
    pub current_company_name: Option<String>,
    #[serde(default)]
    pub current_company_linkedin_url: Option<String>,
    #[serde(default)]
    pub current_company_id: Option<CompanyId>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
    #[serde(default)]
    pub suggested_role: Option<SuggestedRole>,
    #[serde(default)]
    pub experiences: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub honors: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub contact_urls: Vec<String>,
    /// Raw scraper payload, preserved for debugging unknown fields.
    #[serde(default)]
    pub raw_payload: Value,
    /// Optional text-embedding of the profile's canonical projection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Build a fresh profile, trimming/collapsing whitespace on required
    /// string fields and deduplicating skills, consistent with the rest of
    /// the canonical model's constructor-time validation.
    #[allow(clippy::too_many_arguments)]
    pub fn new(linkedin_url: String, full_name: String) -> Self {
        let now = Utc::now();
        Self {
            id: ProfileId::new(),
            linkedin_url,
            full_name: collapse_whitespace(&full_name),
            headline: None,
            about: None,
            current_position: None,
            current_company_name: None,
            current_company_linkedin_url: None,
            current_company_id: None,
            country: None,
            city: None,
            profile_image_url: None,
            suggested_role: None,
            experiences: Vec::new(),
            education: Vec::new(),
            certifications: Vec::new(),
            honors: Vec::new(),
            languages: Vec::new(),
            skills: Vec::new(),
            contact_urls: Vec::new(),
            raw_payload: Value::Null,
            embedding: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Canonical textual projection used both for embeddings and for the
    /// deterministic serialization appended to scoring prompts (§4.5).
    pub fn canonical_projection(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Name: {}\n", self.full_name));
        if let Some(h) = &self.headline {
            out.push_str(&format!("Headline: {}\n", h));
        }
        if let Some(p) = &self.current_position {
            out.push_str(&format!("Current position: {}\n", p));
        }
        if let Some(c) = &self.current_company_name {
            out.push_str(&format!("Current company: {}\n", c));
        }
        if let Some(loc) = combine_location(&self.city, &self.country) {
            out.push_str(&format!("Location: {}\n", loc));
        }
        if let Some(about) = &self.about {
            out.push_str(&format!("About: {}\n", about));
        }
        if !self.experiences.is_empty() {
            out.push_str("Experience:\n");
            for exp in &self.experiences {
                out.push_str(&format!(
                    "- {} at {} ({} - {})\n",
                    exp.position_title.as_deref().unwrap_or("Unknown role"),
                    exp.company_name.as_deref().unwrap_or("Unknown company"),
                    exp.start_date.as_deref().unwrap_or("?"),
                    exp.end_date.as_deref().unwrap_or("Present"),
                ));
            }
        }
        if !self.education.is_empty() {
            out.push_str("Education:\n");
            for ed in &self.education {
                out.push_str(&format!(
                    "- {} {}\n",
                    ed.degree.as_deref().unwrap_or(""),
                    ed.school_name.as_deref().unwrap_or("Unknown school"),
                ));
            }
        }
        if !self.skills.is_empty() {
            out.push_str(&format!("Skills: {}\n", self.skills.join(", ")));
        }
        out
    }
}

fn combine_location(city: &Option<String>, country: &Option<String>) -> Option<String> {
    match (city, country) {
        (Some(c), Some(co)) => Some(format!("{}, {}", c, co)),
        (Some(c), None) => Some(c.clone()),
        (None, Some(co)) => Some(co.clone()),
        (None, None) => None,
    }
}

/// Trim and collapse internal whitespace runs to single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalize a LinkedIn profile or company URL: lowercase the host,
/// strip query string and fragment, and remove a trailing slash.
///
/// Idempotent: canonicalizing an already-canonical URL returns it unchanged.
pub fn canonicalize_linkedin_url(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("URL is empty".to_string());
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = url::Url::parse(&with_scheme).map_err(|e| format!("invalid URL: {}", e))?;

    let host = parsed
        .host_str()
        .ok_or_else(|| "URL has no host".to_string())?
        .to_lowercase();

    if !host.contains("linkedin.com") {
        return Err(format!("not a linkedin.com URL: {}", host));
    }

    let mut path = parsed.path().to_string();
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }

    Ok(format!("https://{}{}", host, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_strips_query_and_fragment() {
        let out = canonicalize_linkedin_url(
            "https://www.LinkedIn.com/in/janedoe/?trk=abc#section",
        )
        .unwrap();
        assert_eq!(out, "https://www.linkedin.com/in/janedoe");
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let once = canonicalize_linkedin_url("https://www.linkedin.com/in/janedoe").unwrap();
        let twice = canonicalize_linkedin_url(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn canonicalize_adds_scheme_when_missing() {
        let out = canonicalize_linkedin_url("www.linkedin.com/in/janedoe/").unwrap();
        assert_eq!(out, "https://www.linkedin.com/in/janedoe");
    }

    #[test]
    fn canonicalize_rejects_non_linkedin_host() {
        assert!(canonicalize_linkedin_url("https://example.com/in/janedoe").is_err());
    }

    #[test]
    fn collapse_whitespace_joins_runs() {
        assert_eq!(collapse_whitespace("  Jane   Doe\t\n"), "Jane Doe");
    }
}
