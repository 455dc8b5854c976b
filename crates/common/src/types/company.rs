use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::CompanyId;
use crate::types::profile::collapse_whitespace;

/// Coarse employee-count bucket, derived from `employee_count` — never stored,
/// always computed on read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanySizeCategory {
    Startup,
    Small,
    Medium,
    Large,
    Enterprise,
    Unknown,
}

impl CompanySizeCategory {
    pub fn from_employee_count(count: Option<i32>) -> Self {
        match count {
            Some(c) if c < 10 => Self::Startup,
            Some(c) if c < 50 => Self::Small,
            Some(c) if c < 200 => Self::Medium,
            Some(c) if c < 1000 => Self::Large,
            Some(_) => Self::Enterprise,
            None => Self::Unknown,
        }
    }
}

/// Outcome of resolving a scraped company against existing records (§4.4).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyResolutionOutcome {
    Created,
    Updated,
    Unchanged,
    /// Per-item validation failure in a batch resolve; the item was skipped,
    /// not an aborting error (§4.4).
    Skipped,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyLocation {
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingInfo {
    #[serde(default)]
    pub total_raised: Option<String>,
    #[serde(default)]
    pub last_round: Option<String>,
    #[serde(default)]
    pub investors: Vec<String>,
}

/// Canonical company record, deduplicated by identity (§4.4).
///
/// Unlike `Profile`, companies are never replaced wholesale: repeated
/// sightings merge, with incoming non-null fields overwriting existing ones.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    #[serde(default)]
    pub linkedin_company_url: Option<String>,
    pub name: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub specialties: Option<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub employee_count: Option<i32>,
    #[serde(default)]
    pub employee_range: Option<String>,
    #[serde(default)]
    pub follower_count: Option<i32>,
    #[serde(default)]
    pub year_founded: Option<i32>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub locations: Vec<CompanyLocation>,
    #[serde(default)]
    pub funding: Option<FundingInfo>,
    #[serde(default)]
    pub affiliated_companies: Vec<String>,
    /// Raw provider payload preserved for debugging; not validated.
    #[serde(default)]
    pub raw_payload: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: CompanyId::new(),
            linkedin_company_url: None,
            name: collapse_whitespace(&name),
            tagline: None,
            domain: None,
            website_url: None,
            logo_url: None,
            description: None,
            specialties: None,
            industries: Vec::new(),
            employee_count: None,
            employee_range: None,
            follower_count: None,
            year_founded: None,
            address_line1: None,
            address_line2: None,
            city: None,
            region: None,
            country: None,
            postal_code: None,
            email: None,
            phone: None,
            locations: Vec::new(),
            funding: None,
            affiliated_companies: Vec::new(),
            raw_payload: Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    /// Normalized identity key used for dedup when no LinkedIn URL is present:
    /// lowercased trimmed name plus domain, if any.
    pub fn identity_key(&self) -> (String, Option<String>) {
        (self.name.to_lowercase(), self.domain.clone())
    }

    pub fn size_category(&self) -> CompanySizeCategory {
        CompanySizeCategory::from_employee_count(self.employee_count)
    }

    pub fn age_years(&self) -> Option<i32> {
        self.year_founded.map(|y| Utc::now().year() - y)
    }

    /// Name plus tagline, when present, for display contexts that want more
    /// than the bare legal/registered name.
    pub fn display_name(&self) -> String {
        match &self.tagline {
            Some(tagline) if !tagline.trim().is_empty() => {
                format!("{} — {}", self.name, tagline.trim())
            }
            _ => self.name.clone(),
        }
    }

    /// `specialties` is stored as free text (often comma-separated); split it
    /// into a trimmed, non-empty list for callers that want to enumerate it.
    pub fn specialties_parsed(&self) -> Vec<String> {
        self.specialties
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Small and young, with either an early-stage funding round on record or
    /// very small and very young in the absence of funding data.
    pub fn is_startup(&self) -> bool {
        let small = matches!(
            self.size_category(),
            CompanySizeCategory::Startup | CompanySizeCategory::Small
        );
        let young = self.age_years().is_some_and(|age| age < 10);
        if !(small && young) {
            return false;
        }

        let early_stage_funded = self.funding.as_ref().is_some_and(|f| {
            f.last_round
                .as_deref()
                .is_some_and(|round| is_early_stage_round(round))
        });

        let very_small = matches!(self.size_category(), CompanySizeCategory::Startup);
        let very_young = self.age_years().is_some_and(|age| age < 3);

        early_stage_funded || (very_small && very_young)
    }

    pub fn full_address(&self) -> Option<String> {
        let parts: Vec<&str> = [
            self.address_line1.as_deref(),
            self.address_line2.as_deref(),
            self.city.as_deref(),
            self.region.as_deref(),
            self.postal_code.as_deref(),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }

    /// Apply constructor-time validation/coercion rules (§9b): non-negative
    /// counts, bounded founding year, deduped industries, derived domain.
    pub fn validate_and_normalize(&mut self) -> Result<(), String> {
        self.name = collapse_whitespace(&self.name);
        if self.name.is_empty() {
            return Err("company name must not be empty".to_string());
        }

        if let Some(c) = self.employee_count {
            if c < 0 {
                self.employee_count = None;
            }
        }
        if let Some(c) = self.follower_count {
            if c < 0 {
                self.follower_count = None;
            }
        }
        if let Some(y) = self.year_founded {
            let current = Utc::now().year();
            if !(1600..=current + 1).contains(&y) {
                self.year_founded = None;
            }
        }

        let mut seen = std::collections::HashSet::new();
        self.industries.retain(|i| seen.insert(i.to_lowercase()));

        if self.domain.is_none() {
            if let Some(website) = &self.website_url {
                self.domain = derive_domain(website);
            }
        }

        if let Some(email) = &self.email {
            self.email = Some(email.trim().to_lowercase());
        }

        Ok(())
    }
}

/// Derive a bare domain (no scheme, no `www.`, lowercased) from a website URL.
pub fn derive_domain(website: &str) -> Option<String> {
    let trimmed = website.trim();
    if trimmed.is_empty() {
        return None;
    }
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let parsed = url::Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    Some(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

/// Seed/pre-seed/Series A rounds read as "early stage"; anything later
/// (Series B+) or unrecognized text does not.
fn is_early_stage_round(round: &str) -> bool {
    let lower = round.to_lowercase();
    lower.contains("seed") || lower.contains("series a") || lower.contains("pre-seed")
}

use chrono::Datelike;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_domain_strips_www_and_scheme() {
        assert_eq!(
            derive_domain("https://www.Acme.com/about"),
            Some("acme.com".to_string())
        );
    }

    #[test]
    fn derive_domain_handles_bare_host() {
        assert_eq!(derive_domain("acme.io"), Some("acme.io".to_string()));
    }

    #[test]
    fn validate_rejects_empty_name() {
        let mut c = Company::new("   ".to_string());
        assert!(c.validate_and_normalize().is_err());
    }

    #[test]
    fn validate_dedupes_industries_case_insensitively() {
        let mut c = Company::new("Acme".to_string());
        c.industries = vec!["Software".into(), "software".into(), "Finance".into()];
        c.validate_and_normalize().unwrap();
        assert_eq!(c.industries, vec!["Software".to_string(), "Finance".to_string()]);
    }

    #[test]
    fn validate_clamps_implausible_founding_year() {
        let mut c = Company::new("Acme".to_string());
        c.year_founded = Some(1500);
        c.validate_and_normalize().unwrap();
        assert_eq!(c.year_founded, None);
    }

    #[test]
    fn size_category_buckets_by_employee_count() {
        let mut c = Company::new("Acme".to_string());
        c.employee_count = Some(5);
        assert_eq!(c.size_category(), CompanySizeCategory::Startup);
        c.employee_count = Some(1500);
        assert_eq!(c.size_category(), CompanySizeCategory::Enterprise);
    }

    #[test]
    fn display_name_appends_tagline_when_present() {
        let mut c = Company::new("Acme".to_string());
        assert_eq!(c.display_name(), "Acme");
        c.tagline = Some("Rockets for everyone".to_string());
        assert_eq!(c.display_name(), "Acme — Rockets for everyone");
    }

    #[test]
    fn specialties_parsed_splits_and_trims() {
        let mut c = Company::new("Acme".to_string());
        c.specialties = Some("Rockets,  Logistics ,,Space".to_string());
        assert_eq!(
            c.specialties_parsed(),
            vec!["Rockets".to_string(), "Logistics".to_string(), "Space".to_string()]
        );
    }

    #[test]
    fn is_startup_true_for_small_young_company_without_funding() {
        let mut c = Company::new("Acme".to_string());
        c.employee_count = Some(4);
        c.year_founded = Some(Utc::now().year() - 1);
        assert!(c.is_startup());
    }

    #[test]
    fn is_startup_false_for_large_company() {
        let mut c = Company::new("Acme".to_string());
        c.employee_count = Some(5000);
        c.year_founded = Some(Utc::now().year() - 1);
        assert!(!c.is_startup());
    }
}
