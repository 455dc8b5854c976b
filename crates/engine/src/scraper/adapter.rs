use serde_json::Value;

use rolescope_common::types::company::Company;
use rolescope_common::types::profile::{EducationEntry, ExperienceEntry, Profile};

/// A required field was missing or of the wrong shape in the scraper's
/// payload. Distinct from a transport error — the HTTP call succeeded, the
/// remote side's own response just didn't carry what ingestion needs (§4.2).
#[derive(Debug, thiserror::Error)]
#[error("incomplete scraped data: missing or invalid field `{field}`")]
pub struct IncompleteDataError {
    pub field: String,
}

impl IncompleteDataError {
    fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
        }
    }
}

/// Translate a scraped profile payload into a canonical `Profile`.
/// `linkedin_url` is the already-canonicalized URL used for the request,
/// not re-derived from the payload (providers sometimes omit or mangle it).
pub fn adapt_profile(linkedin_url: &str, payload: &Value) -> Result<Profile, IncompleteDataError> {
    let full_name = payload
        .get("full_name")
        .or_else(|| payload.get("name"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| IncompleteDataError::new("full_name"))?;

    let mut profile = Profile::new(linkedin_url.to_string(), full_name.to_string());

    profile.headline = string_field(payload, "headline");
    profile.about = string_field(payload, "about").or_else(|| string_field(payload, "summary"));
    profile.current_position = string_field(payload, "current_position");
    profile.country = string_field(payload, "country");
    profile.city = string_field(payload, "city");
    profile.profile_image_url = string_field(payload, "profile_image_url");

    if let Some(current_company) = payload.get("current_company") {
        profile.current_company_name = string_field(current_company, "name");
        profile.current_company_linkedin_url = string_field(current_company, "linkedin_url");
    }

    profile.experiences = payload
        .get("experiences")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(adapt_experience).collect())
        .unwrap_or_default();

    profile.education = payload
        .get("education")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(adapt_education).collect())
        .unwrap_or_default();

    profile.certifications = string_list(payload, "certifications");
    profile.honors = string_list(payload, "honors");
    profile.languages = string_list(payload, "languages");
    profile.skills = string_list(payload, "skills");
    profile.contact_urls = string_list(payload, "contact_urls");
    profile.raw_payload = payload.clone();

    Ok(profile)
}

fn adapt_experience(entry: &Value) -> ExperienceEntry {
    ExperienceEntry {
        company_name: string_field(entry, "company_name"),
        company_linkedin_url: string_field(entry, "company_linkedin_url"),
        position_title: string_field(entry, "position_title").or_else(|| string_field(entry, "title")),
        start_date: normalize_year_field(entry, "start_date"),
        end_date: normalize_year_field(entry, "end_date"),
        duration_text: string_field(entry, "duration_text"),
        is_current_role: entry
            .get("is_current_role")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        description: string_field(entry, "description"),
    }
}

fn adapt_education(entry: &Value) -> EducationEntry {
    EducationEntry {
        school_name: string_field(entry, "school_name"),
        degree: string_field(entry, "degree"),
        field_of_study: string_field(entry, "field_of_study"),
        start_year: int_field(entry, "start_year"),
        end_year: int_field(entry, "end_year"),
    }
}

/// Translate a scraped company payload into a canonical `Company`.
/// `name` is required; everything else degrades to `None`/empty rather than
/// failing the whole company (§4.2, §9b).
pub fn adapt_company(payload: &Value) -> Result<Company, IncompleteDataError> {
    let name = string_field(payload, "name").ok_or_else(|| IncompleteDataError::new("name"))?;

    let mut company = Company::new(name);
    company.linkedin_company_url = string_field(payload, "linkedin_company_url");
    company.tagline = string_field(payload, "tagline");
    company.domain = string_field(payload, "domain");
    company.website_url = string_field(payload, "website_url");
    company.logo_url = string_field(payload, "logo_url");
    company.description = string_field(payload, "description");
    company.specialties = string_field(payload, "specialties");
    company.industries = string_list(payload, "industries");
    company.employee_count = int_field(payload, "employee_count");
    company.employee_range = string_field(payload, "employee_range");
    company.follower_count = int_field(payload, "follower_count");
    company.year_founded = int_field(payload, "year_founded");
    company.address_line1 = string_field(payload, "address_line1");
    company.address_line2 = string_field(payload, "address_line2");
    company.city = string_field(payload, "city");
    company.region = string_field(payload, "region");
    company.country = string_field(payload, "country");
    company.postal_code = string_field(payload, "postal_code");
    company.email = string_field(payload, "email");
    company.phone = string_field(payload, "phone");
    company.affiliated_companies = string_list(payload, "affiliated_companies");
    company.raw_payload = payload.clone();

    company
        .validate_and_normalize()
        .map_err(|_| IncompleteDataError::new("name"))?;

    Ok(company)
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Numeric fields sometimes arrive as strings (e.g. `"2019"`); coerce when
/// unambiguous, otherwise drop (§4.2).
fn int_field(value: &Value, key: &str) -> Option<i32> {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_i64().map(|n| n as i32),
        Some(Value::String(s)) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
}

/// A malformed year string like `"Present"` normalizes to `None` rather
/// than being kept as free text in a date field (§4.2).
fn normalize_year_field(value: &Value, key: &str) -> Option<String> {
    let raw = string_field(value, key)?;
    if raw.chars().all(|c| c.is_ascii_digit()) {
        Some(raw)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn adapt_profile_requires_full_name() {
        let payload = json!({"headline": "CTO"});
        let err = adapt_profile("https://www.linkedin.com/in/jane", &payload).unwrap_err();
        assert_eq!(err.field, "full_name");
    }

    #[test]
    fn adapt_profile_fills_experiences_and_skills() {
        let payload = json!({
            "full_name": "Jane Doe",
            "skills": ["Rust", "Leadership"],
            "experiences": [
                {"company_name": "Acme", "position_title": "CTO", "start_date": "2019", "end_date": "Present"}
            ]
        });
        let profile = adapt_profile("https://www.linkedin.com/in/jane", &payload).unwrap();
        assert_eq!(profile.skills, vec!["Rust".to_string(), "Leadership".to_string()]);
        assert_eq!(profile.experiences.len(), 1);
        assert_eq!(profile.experiences[0].end_date, None);
    }

    #[test]
    fn adapt_company_requires_name() {
        let payload = json!({"domain": "acme.com"});
        assert!(adapt_company(&payload).is_err());
    }

    #[test]
    fn adapt_company_coerces_string_employee_count() {
        let payload = json!({"name": "Acme", "employee_count": "42"});
        let company = adapt_company(&payload).unwrap();
        assert_eq!(company.employee_count, Some(42));
    }
}
