use thiserror::Error;

/// Top-level error type for rolescope operations.
#[derive(Debug, Error)]
pub enum RolescopeError {
    #[error("PostgreSQL error: {0}")]
    Postgres(String),

    #[error("LLM API error: {0}")]
    LlmApi(String),

    // --- Operational errors ---
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Circuit breaker open for {0}")]
    CircuitOpen(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Internal(String),

    // --- Ingestion / scoring / template domain errors ---
    #[error("Invalid LinkedIn URL: {0}")]
    InvalidLinkedInUrl(String),

    #[error("Incomplete scraped data: {0}")]
    IncompleteData(String),

    #[error("Scraper service unavailable: {0}")]
    ScraperUnavailable(String),

    #[error("LLM service unavailable: {0}")]
    LlmUnavailable(String),

    #[error("LLM returned an unparseable response: {0}")]
    LlmBadResponse(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Scoring job not found: {0}")]
    JobNotFound(String),

    #[error("Failed to persist profile: {0}")]
    ProfileCreationFailed(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl RolescopeError {
    /// A stable machine-readable code for API error bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "STORAGE_UNAVAILABLE",
            Self::LlmApi(_) | Self::LlmUnavailable(_) => "LLM_UNAVAILABLE",
            Self::LlmBadResponse(_) => "LLM_BAD_RESPONSE",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::CircuitOpen(_) => "CIRCUIT_OPEN",
            Self::Timeout(_) => "TIMEOUT",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::InvalidLinkedInUrl(_) => "INVALID_LINKEDIN_URL",
            Self::IncompleteData(_) => "INCOMPLETE_DATA",
            Self::ScraperUnavailable(_) => "SCRAPER_UNAVAILABLE",
            Self::ProfileNotFound(_) => "PROFILE_NOT_FOUND",
            Self::CompanyNotFound(_) => "COMPANY_NOT_FOUND",
            Self::TemplateNotFound(_) => "TEMPLATE_NOT_FOUND",
            Self::JobNotFound(_) => "JOB_NOT_FOUND",
            Self::ProfileCreationFailed(_) => "PROFILE_CREATION_FAILED",
            Self::Unauthorized => "UNAUTHORIZED",
        }
    }

    /// The HTTP status this error should be rendered as.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_)
            | Self::ProfileNotFound(_)
            | Self::CompanyNotFound(_)
            | Self::TemplateNotFound(_)
            | Self::JobNotFound(_) => 404,
            Self::Validation(_)
            | Self::Serialization(_)
            | Self::InvalidLinkedInUrl(_)
            | Self::IncompleteData(_) => 422,
            Self::Unauthorized => 401,
            Self::CircuitOpen(_) => 503,
            Self::ScraperUnavailable(_) | Self::LlmUnavailable(_) => 502,
            Self::Timeout(_) => 504,
            Self::Postgres(_) => 503,
            _ => 500,
        }
    }
}

/// Result type alias for rolescope operations.
pub type Result<T> = std::result::Result<T, RolescopeError>;
