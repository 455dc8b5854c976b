use rolescope_common::types::company::CompanyResolutionOutcome;
use rolescope_common::types::profile::{canonicalize_linkedin_url, SuggestedRole};
use rolescope_common::types::{infer_is_current_role, Profile, ProfileCompanyEdge};
use rolescope_common::RolescopeError;
use serde::Serialize;

use crate::company_service;
use crate::scraper::ScraperClient;
use crate::store::StoreClient;

/// Referenced companies past this count are silently discarded rather than
/// fetched (§4.1 step 4).
const MAX_REFERENCED_COMPANIES: usize = 5;

/// Minimum gap between successive company fetches within one ingestion run,
/// independent of the scraper's own per-minute rate limit (§4.1 step 5).
const INTER_COMPANY_FETCH_DELAY: std::time::Duration = std::time::Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("invalid LinkedIn URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Scraper(#[from] crate::scraper::ScraperError),

    #[error("failed to persist profile: {0}")]
    ProfileCreationFailed(String),

    #[error(transparent)]
    Store(#[from] crate::store::StoreError),
}

impl From<IngestionError> for RolescopeError {
    fn from(e: IngestionError) -> Self {
        match e {
            IngestionError::InvalidUrl(msg) => RolescopeError::InvalidLinkedInUrl(msg),
            IngestionError::Scraper(se) => se.into(),
            IngestionError::ProfileCreationFailed(msg) => {
                RolescopeError::ProfileCreationFailed(msg)
            }
            IngestionError::Store(se) => se.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct IngestedCompany {
    pub company_id: rolescope_common::ids::CompanyId,
    pub name: String,
    pub outcome: CompanyResolutionOutcome,
}

#[derive(Clone, Debug, Serialize)]
pub struct PipelineMetadata {
    pub companies_found: usize,
    pub companies_fetched: usize,
    pub pipeline_status: &'static str,
}

#[derive(Clone, Debug, Serialize)]
pub struct IngestionResult {
    pub profile: Profile,
    pub companies_processed: Vec<IngestedCompany>,
    pub pipeline_metadata: PipelineMetadata,
}

/// Run the full profile ingestion pipeline for one LinkedIn URL (§4.1).
///
/// Re-ingesting the same canonical URL replaces the prior profile and its
/// edges wholesale; referenced companies are merged, never replaced.
/// `include_companies = false` skips the entire company fetch/resolve/link
/// sequence but still persists the profile itself (§6.1 `POST /profiles`).
pub async fn ingest_profile(
    store: &StoreClient,
    scraper: &ScraperClient,
    raw_linkedin_url: &str,
    suggested_role: Option<SuggestedRole>,
    include_companies: bool,
) -> Result<IngestionResult, IngestionError> {
    let linkedin_url = canonicalize_linkedin_url(raw_linkedin_url)
        .map_err(IngestionError::InvalidUrl)?;

    let mut profile = scraper.fetch_profile(&linkedin_url).await?;
    profile.suggested_role = suggested_role;

    // Only clear the prior row once the re-scrape has actually succeeded, so a
    // failed fetch never leaves a profile permanently deleted.
    store.delete_profile_by_url(&linkedin_url).await?;

    let (resolved, companies_found, companies_fetched) = if include_companies {
        let referenced_urls = collect_referenced_company_urls(&profile);
        let companies_found = referenced_urls.len();

        let mut fetched_companies = Vec::with_capacity(referenced_urls.len());
        for (index, url) in referenced_urls.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(INTER_COMPANY_FETCH_DELAY).await;
            }
            match scraper.fetch_company(url).await {
                Ok(company) => fetched_companies.push(company),
                Err(e) => {
                    tracing::warn!(
                        company_url = %url,
                        error = %e,
                        "Skipping unreachable referenced company during ingestion"
                    );
                }
            }
        }
        let companies_fetched = fetched_companies.len();
        let resolved = company_service::resolve_companies(store, fetched_companies).await?;
        (resolved, companies_found, companies_fetched)
    } else {
        (Vec::new(), 0, 0)
    };

    if let Some(current_company_id) = current_company_id(&profile, &resolved) {
        profile.current_company_id = Some(current_company_id);
    }

    let persisted_profile = store
        .insert_profile(&profile)
        .await
        .map_err(|e| IngestionError::ProfileCreationFailed(e.to_string()))?;

    link_experience_edges(store, &persisted_profile, &resolved).await;

    let companies_processed = resolved
        .into_iter()
        .filter(|r| r.outcome != CompanyResolutionOutcome::Skipped)
        .map(|r| IngestedCompany {
            company_id: r.company.id,
            name: r.company.name,
            outcome: r.outcome,
        })
        .collect();

    Ok(IngestionResult {
        profile: persisted_profile,
        companies_processed,
        pipeline_metadata: PipelineMetadata {
            companies_found,
            companies_fetched,
            pipeline_status: "completed",
        },
    })
}

/// Match the profile's current employer name against the companies resolved
/// this run, best-effort (§4.1 step 8 — absence never fails ingestion).
fn current_company_id(
    profile: &Profile,
    resolved: &[company_service::ResolvedCompany],
) -> Option<rolescope_common::ids::CompanyId> {
    let name = profile.current_company_name.as_ref()?;
    resolved
        .iter()
        .find(|r| r.company.name.eq_ignore_ascii_case(name))
        .map(|r| r.company.id)
}

/// Current employer first, then each experience entry's company URL, deduped
/// in first-seen order and capped (§4.1 step 4).
fn collect_referenced_company_urls(profile: &Profile) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut urls = Vec::new();

    if let Some(url) = &profile.current_company_linkedin_url {
        if seen.insert(url.clone()) {
            urls.push(url.clone());
        }
    }

    for exp in &profile.experiences {
        if let Some(url) = &exp.company_linkedin_url {
            if seen.insert(url.clone()) {
                urls.push(url.clone());
            }
            if urls.len() >= MAX_REFERENCED_COMPANIES {
                break;
            }
        }
    }

    urls.truncate(MAX_REFERENCED_COMPANIES);
    urls
}

/// Link each experience entry to its resolved company by LinkedIn URL, then
/// by normalized name, logging and skipping entries that resolve to nothing
/// persisted this run (§4.1 step 8).
async fn link_experience_edges(
    store: &StoreClient,
    profile: &Profile,
    resolved: &[company_service::ResolvedCompany],
) {
    for exp in &profile.experiences {
        let company = match &exp.company_linkedin_url {
            Some(url) => resolved
                .iter()
                .find(|r| r.company.linkedin_company_url.as_deref() == Some(url.as_str())),
            None => None,
        }
        .or_else(|| {
            exp.company_name.as_ref().and_then(|name| {
                resolved
                    .iter()
                    .find(|r| r.company.name.eq_ignore_ascii_case(name))
            })
        });

        let Some(resolved_company) = company else {
            continue;
        };

        let is_current = if exp.is_current_role {
            true
        } else {
            infer_is_current_role(&exp.end_date)
        };

        let edge = ProfileCompanyEdge::new(
            profile.id,
            resolved_company.company.id,
            exp.position_title.clone(),
            exp.start_date.clone(),
            exp.end_date.clone(),
            exp.duration_text.clone(),
            is_current,
            exp.description.clone(),
        );

        if let Err(e) = store.insert_edge(&edge).await {
            tracing::warn!(
                profile_id = %profile.id,
                company_id = %resolved_company.company.id,
                error = %e,
                "Skipping experience edge that failed to persist"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolescope_common::types::profile::ExperienceEntry;

    fn exp(url: Option<&str>) -> ExperienceEntry {
        ExperienceEntry {
            company_name: None,
            company_linkedin_url: url.map(str::to_string),
            position_title: None,
            start_date: None,
            end_date: None,
            duration_text: None,
            is_current_role: false,
            description: None,
        }
    }

    #[test]
    fn dedupes_and_caps_referenced_company_urls() {
        let mut profile = Profile::new("https://www.linkedin.com/in/jane".into(), "Jane".into());
        profile.experiences = vec![
            exp(Some("https://www.linkedin.com/company/a")),
            exp(Some("https://www.linkedin.com/company/a")),
            exp(Some("https://www.linkedin.com/company/b")),
            exp(Some("https://www.linkedin.com/company/c")),
            exp(Some("https://www.linkedin.com/company/d")),
            exp(Some("https://www.linkedin.com/company/e")),
            exp(Some("https://www.linkedin.com/company/f")),
        ];

        let urls = collect_referenced_company_urls(&profile);
        assert_eq!(urls.len(), MAX_REFERENCED_COMPANIES);
        assert_eq!(urls[0], "https://www.linkedin.com/company/a");
    }

    #[test]
    fn ignores_experiences_without_a_company_url() {
        let mut profile = Profile::new("https://www.linkedin.com/in/jane".into(), "Jane".into());
        profile.experiences = vec![exp(None), exp(Some("https://www.linkedin.com/company/a"))];

        let urls = collect_referenced_company_urls(&profile);
        assert_eq!(urls, vec!["https://www.linkedin.com/company/a".to_string()]);
    }
}
