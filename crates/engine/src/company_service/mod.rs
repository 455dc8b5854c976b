use chrono::Utc;

use rolescope_common::types::company::{Company, CompanyResolutionOutcome};

use crate::store::{StoreClient, StoreError};

/// The persisted result of resolving one scraped company plus which
/// outcome applied, for assembly into an ingestion response (§4.1, §4.4).
pub struct ResolvedCompany {
    pub company: Company,
    pub outcome: CompanyResolutionOutcome,
}

/// Resolve a single scraped company against existing records: match by
/// LinkedIn URL first, then by normalized name+domain, else insert new
/// (§4.4 steps 1-3).
pub async fn resolve_company(
    store: &StoreClient,
    mut incoming: Company,
) -> Result<ResolvedCompany, StoreError> {
    if let Err(_msg) = incoming.validate_and_normalize() {
        return Ok(ResolvedCompany {
            company: incoming,
            outcome: CompanyResolutionOutcome::Skipped,
        });
    }

    let existing = if let Some(url) = incoming.linkedin_company_url.clone() {
        store.get_company_by_url(&url).await?
    } else {
        store
            .find_company_by_name_and_domain(&incoming.name, incoming.domain.as_deref())
            .await?
    };

    match existing {
        None => {
            let created = store.insert_company(&incoming).await?;
            Ok(ResolvedCompany {
                company: created,
                outcome: CompanyResolutionOutcome::Created,
            })
        }
        Some(existing) => {
            let merged = merge_company(&existing, &incoming);
            if fields_equal(&existing, &merged) {
                Ok(ResolvedCompany {
                    company: existing,
                    outcome: CompanyResolutionOutcome::Unchanged,
                })
            } else {
                let updated = store.update_company(&merged).await?;
                Ok(ResolvedCompany {
                    company: updated,
                    outcome: CompanyResolutionOutcome::Updated,
                })
            }
        }
    }
}

/// Resolve a batch of scraped companies in input order. Database
/// connectivity errors abort the whole batch; per-item validation
/// failures are recorded as `Skipped` and do not stop later items (§4.4).
pub async fn resolve_companies(
    store: &StoreClient,
    incoming: Vec<Company>,
) -> Result<Vec<ResolvedCompany>, StoreError> {
    let mut results = Vec::with_capacity(incoming.len());
    for company in incoming {
        match resolve_company(store, company).await {
            Ok(resolved) => results.push(resolved),
            Err(e) => {
                tracing::error!(error = %e, "Company resolution aborted on database error");
                return Err(e);
            }
        }
    }
    Ok(results)
}

/// Merge `incoming` onto `existing`: non-null incoming fields win, keeping
/// the existing id/timestamps. Lists (industries, affiliated_companies)
/// are replaced wholesale when the incoming list is non-empty.
fn merge_company(existing: &Company, incoming: &Company) -> Company {
    let mut merged = existing.clone();

    merged.linkedin_company_url = incoming
        .linkedin_company_url
        .clone()
        .or(existing.linkedin_company_url.clone());
    merged.name = if incoming.name.is_empty() { existing.name.clone() } else { incoming.name.clone() };
    merged.tagline = incoming.tagline.clone().or(existing.tagline.clone());
    merged.domain = incoming.domain.clone().or(existing.domain.clone());
    merged.website_url = incoming.website_url.clone().or(existing.website_url.clone());
    merged.logo_url = incoming.logo_url.clone().or(existing.logo_url.clone());
    merged.description = incoming.description.clone().or(existing.description.clone());
    merged.specialties = incoming.specialties.clone().or(existing.specialties.clone());
    if !incoming.industries.is_empty() {
        merged.industries = incoming.industries.clone();
    }
    merged.employee_count = incoming.employee_count.or(existing.employee_count);
    merged.employee_range = incoming.employee_range.clone().or(existing.employee_range.clone());
    merged.follower_count = incoming.follower_count.or(existing.follower_count);
    merged.year_founded = incoming.year_founded.or(existing.year_founded);
    merged.address_line1 = incoming.address_line1.clone().or(existing.address_line1.clone());
    merged.address_line2 = incoming.address_line2.clone().or(existing.address_line2.clone());
    merged.city = incoming.city.clone().or(existing.city.clone());
    merged.region = incoming.region.clone().or(existing.region.clone());
    merged.country = incoming.country.clone().or(existing.country.clone());
    merged.postal_code = incoming.postal_code.clone().or(existing.postal_code.clone());
    merged.email = incoming.email.clone().or(existing.email.clone());
    merged.phone = incoming.phone.clone().or(existing.phone.clone());
    if !incoming.locations.is_empty() {
        merged.locations = incoming.locations.clone();
    }
    merged.funding = incoming.funding.clone().or(existing.funding.clone());
    if !incoming.affiliated_companies.is_empty() {
        merged.affiliated_companies = incoming.affiliated_companies.clone();
    }
    if incoming.raw_payload != serde_json::Value::Null {
        merged.raw_payload = incoming.raw_payload.clone();
    }
    merged.updated_at = Utc::now();

    merged
}

/// Whether the merge produced a no-op, ignoring `updated_at`.
fn fields_equal(existing: &Company, merged: &Company) -> bool {
    existing.linkedin_company_url == merged.linkedin_company_url
        && existing.name == merged.name
        && existing.tagline == merged.tagline
        && existing.domain == merged.domain
        && existing.website_url == merged.website_url
        && existing.logo_url == merged.logo_url
        && existing.description == merged.description
        && existing.specialties == merged.specialties
        && existing.industries == merged.industries
        && existing.employee_count == merged.employee_count
        && existing.employee_range == merged.employee_range
        && existing.follower_count == merged.follower_count
        && existing.year_founded == merged.year_founded
        && existing.address_line1 == merged.address_line1
        && existing.address_line2 == merged.address_line2
        && existing.city == merged.city
        && existing.region == merged.region
        && existing.country == merged.country
        && existing.postal_code == merged.postal_code
        && existing.email == merged.email
        && existing.phone == merged.phone
        && existing.locations == merged.locations
        && existing.funding == merged.funding
        && existing.affiliated_companies == merged.affiliated_companies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_incoming_non_null_fields() {
        let mut existing = Company::new("Acme".into());
        existing.domain = Some("old.com".into());
        let mut incoming = Company::new("Acme".into());
        incoming.domain = Some("new.com".into());
        incoming.tagline = Some("Better widgets".into());

        let merged = merge_company(&existing, &incoming);
        assert_eq!(merged.domain, Some("new.com".to_string()));
        assert_eq!(merged.tagline, Some("Better widgets".to_string()));
    }

    #[test]
    fn merge_keeps_existing_when_incoming_is_null() {
        let mut existing = Company::new("Acme".into());
        existing.domain = Some("old.com".into());
        let incoming = Company::new("Acme".into());

        let merged = merge_company(&existing, &incoming);
        assert_eq!(merged.domain, Some("old.com".to_string()));
    }

    #[test]
    fn identical_merge_is_a_no_op() {
        let existing = Company::new("Acme".into());
        let incoming = existing.clone();
        let merged = merge_company(&existing, &incoming);
        assert!(fields_equal(&existing, &merged));
    }
}
