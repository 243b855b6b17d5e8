use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The clock's optimistic version check failed: another request
    /// advanced this company's day first. Surfaced as a retryable-by-user
    /// condition (the API layer maps it to HTTP 409), never retried here.
    #[error("Concurrent advance for company {company_id}: clock version moved")]
    ConcurrentAdvance { company_id: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid day key in storage: {raw}")]
    InvalidDayKey { raw: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
