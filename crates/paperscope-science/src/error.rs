use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScienceError {
    #[error("invalid DOI: {0}")]
    InvalidDoi(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("rate limit from {0}, retry after {1}s")]
    RateLimit(String, u64),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("invalid {0} date: {1}")]
    InvalidDate(String, String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("vocabulary error: {0}")]
    Vocabulary(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScienceError {
    /// Errors caused by the remote side rather than by the data itself.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ScienceError::Http(_)
                | ScienceError::ApiError(..)
                | ScienceError::RateLimit(..)
                | ScienceError::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScienceError>;
