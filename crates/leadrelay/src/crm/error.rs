//! CRM sink error types.

use thiserror::Error;

/// Errors that can occur while creating a deal.
#[derive(Error, Debug)]
pub enum CrmError {
    /// The request never got a response.
    #[error("CRM request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("CRM API rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The endpoint URL could not be built.
    #[error("Invalid CRM endpoint: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl CrmError {
    /// Whether the API refused this particular deal for good.
    ///
    /// Client errors count as permanent except those that depend on
    /// credentials, routing or load: 401, 403, 404, 408 and 429. Transport
    /// failures and server errors are always worth another attempt.
    pub fn is_permanent(&self) -> bool {
        match self {
            CrmError::Rejected { status, .. } => {
                (400..500).contains(status) && !matches!(status, 401 | 403 | 404 | 408 | 429)
            }
            CrmError::Http(_) | CrmError::InvalidUrl(_) => false,
        }
    }
}

/// Result type for CRM operations.
pub type Result<T> = std::result::Result<T, CrmError>;
