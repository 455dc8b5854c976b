use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use uuid::Uuid;

use rolescope_common::ids::CompanyId;
use rolescope_common::types::{Company, CompanyLocation, FundingInfo};

use super::{StoreClient, StoreError};

impl StoreClient {
    /// Insert a brand-new company row (§4.4 step: no existing match found).
    pub async fn insert_company(&self, company: &Company) -> Result<Company, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO companies (
                id, linkedin_company_url, name, tagline, domain, website_url,
                logo_url, description, specialties, industries, employee_count,
                employee_range, follower_count, year_founded, address_line1,
                address_line2, city, region, country, postal_code, email, phone,
                locations, funding, affiliated_companies, raw_payload,
                created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28
            )
            "#,
        )
        .bind(company.id.0)
        .bind(&company.linkedin_company_url)
        .bind(&company.name)
        .bind(&company.tagline)
        .bind(&company.domain)
        .bind(&company.website_url)
        .bind(&company.logo_url)
        .bind(&company.description)
        .bind(&company.specialties)
        .bind(&company.industries)
        .bind(company.employee_count)
        .bind(&company.employee_range)
        .bind(company.follower_count)
        .bind(company.year_founded)
        .bind(&company.address_line1)
        .bind(&company.address_line2)
        .bind(&company.city)
        .bind(&company.region)
        .bind(&company.country)
        .bind(&company.postal_code)
        .bind(&company.email)
        .bind(&company.phone)
        .bind(Json(&company.locations))
        .bind(Json(&company.funding))
        .bind(&company.affiliated_companies)
        .bind(&company.raw_payload)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(company.clone())
    }

    /// Persist an in-place merge of an existing company (matched by URL or
    /// by name+domain, merged field-by-field, §4.4).
    pub async fn update_company(&self, company: &Company) -> Result<Company, StoreError> {
        sqlx::query(
            r#"
            UPDATE companies SET
                linkedin_company_url = $2, name = $3, tagline = $4, domain = $5,
                website_url = $6, logo_url = $7, description = $8,
                specialties = $9, industries = $10, employee_count = $11,
                employee_range = $12, follower_count = $13, year_founded = $14,
                address_line1 = $15, address_line2 = $16, city = $17,
                region = $18, country = $19, postal_code = $20, email = $21,
                phone = $22, locations = $23, funding = $24,
                affiliated_companies = $25, raw_payload = $26, updated_at = $27
            WHERE id = $1
            "#,
        )
        .bind(company.id.0)
        .bind(&company.linkedin_company_url)
        .bind(&company.name)
        .bind(&company.tagline)
        .bind(&company.domain)
        .bind(&company.website_url)
        .bind(&company.logo_url)
        .bind(&company.description)
        .bind(&company.specialties)
        .bind(&company.industries)
        .bind(company.employee_count)
        .bind(&company.employee_range)
        .bind(company.follower_count)
        .bind(company.year_founded)
        .bind(&company.address_line1)
        .bind(&company.address_line2)
        .bind(&company.city)
        .bind(&company.region)
        .bind(&company.country)
        .bind(&company.postal_code)
        .bind(&company.email)
        .bind(&company.phone)
        .bind(Json(&company.locations))
        .bind(Json(&company.funding))
        .bind(&company.affiliated_companies)
        .bind(&company.raw_payload)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(company.clone())
    }

    pub async fn get_company(&self, id: CompanyId) -> Result<Company, StoreError> {
        let row = sqlx::query_as::<_, CompanyRow>(&format!("{} WHERE id = $1", COMPANY_SELECT_BASE))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?
            .ok_or_else(|| StoreError::NotFound(format!("Company {}", id)))?;

        Ok(row.into())
    }

    pub async fn get_company_by_url(
        &self,
        linkedin_company_url: &str,
    ) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query_as::<_, CompanyRow>(&format!(
            "{} WHERE linkedin_company_url = $1",
            COMPANY_SELECT_BASE
        ))
        .bind(linkedin_company_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// Find a company by case-insensitive name + domain, used as the
    /// fallback match when no LinkedIn URL is available (§4.4 step 2).
    pub async fn find_company_by_name_and_domain(
        &self,
        name: &str,
        domain: Option<&str>,
    ) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query_as::<_, CompanyRow>(&format!(
            "{} WHERE lower(name) = lower($1) AND lower(coalesce(domain, '')) = lower(coalesce($2, ''))",
            COMPANY_SELECT_BASE
        ))
        .bind(name)
        .bind(domain)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    pub async fn list_companies(
        &self,
        search: Option<&str>,
        industry: Option<&str>,
        employee_range: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Company>, i64), StoreError> {
        let like = search.map(|s| format!("%{}%", s));
        let rows = sqlx::query_as::<_, CompanyRow>(&format!(
            r#"{}
            WHERE ($1::text IS NULL OR name ILIKE $1)
              AND ($2::text IS NULL OR $2 = ANY(industries))
              AND ($3::text IS NULL OR employee_range = $3)
            ORDER BY created_at DESC LIMIT $4 OFFSET $5"#,
            COMPANY_SELECT_BASE
        ))
        .bind(&like)
        .bind(industry)
        .bind(employee_range)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        let total: (i64,) = sqlx::query_as(
            r#"SELECT COUNT(*) FROM companies
               WHERE ($1::text IS NULL OR name ILIKE $1)
                 AND ($2::text IS NULL OR $2 = ANY(industries))
                 AND ($3::text IS NULL OR employee_range = $3)"#,
        )
        .bind(&like)
        .bind(industry)
        .bind(employee_range)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Query(e.to_string()))?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }
}

const COMPANY_SELECT_BASE: &str = r#"
    SELECT id, linkedin_company_url, name, tagline, domain, website_url,
           logo_url, description, specialties, industries, employee_count,
           employee_range, follower_count, year_founded, address_line1,
           address_line2, city, region, country, postal_code, email, phone,
           locations, funding, affiliated_companies, raw_payload,
           created_at, updated_at
    FROM companies
"#;

#[derive(sqlx::FromRow)]
struct CompanyRow {
    id: Uuid,
    linkedin_company_url: Option<String>,
    name: String,
    tagline: Option<String>,
    domain: Option<String>,
    website_url: Option<String>,
    logo_url: Option<String>,
    description: Option<String>,
    specialties: Option<String>,
    industries: Vec<String>,
    employee_count: Option<i32>,
    employee_range: Option<String>,
    follower_count: Option<i32>,
    year_founded: Option<i32>,
    address_line1: Option<String>,
    address_line2: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    postal_code: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    locations: Json<Vec<CompanyLocation>>,
    funding: Json<Option<FundingInfo>>,
    affiliated_companies: Vec<String>,
    raw_payload: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Self {
            id: CompanyId::from_uuid(row.id),
            linkedin_company_url: row.linkedin_company_url,
            name: row.name,
            tagline: row.tagline,
            domain: row.domain,
            website_url: row.website_url,
            logo_url: row.logo_url,
            description: row.description,
            specialties: row.specialties,
            industries: row.industries,
            employee_count: row.employee_count,
            employee_range: row.employee_range,
            follower_count: row.follower_count,
            year_founded: row.year_founded,
            address_line1: row.address_line1,
            address_line2: row.address_line2,
            city: row.city,
            region: row.region,
            country: row.country,
            postal_code: row.postal_code,
            email: row.email,
            phone: row.phone,
            locations: row.locations.0,
            funding: row.funding.0,
            affiliated_companies: row.affiliated_companies,
            raw_payload: row.raw_payload,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
