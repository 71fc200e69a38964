use std::time::Duration;

use thiserror::Error;

/// Failures raised inside the pagination/extraction core. None of them is
/// allowed to reach the run driver: the controller and normalizer degrade
/// each one to fewer records or a passthrough value.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("'{selector}' did not appear within {waited:?}")]
    ExtractionTimeout { selector: String, waited: Duration },

    #[error("could not navigate to page {page}: {reason}")]
    NavigationFailure { page: u32, reason: String },

    #[error("page count discovery failed: {0}")]
    DiscoveryFailure(String),

    #[error("unrecognized {field} '{value}': {reason}")]
    NormalizationAnomaly {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("browser error: {0}")]
    Browser(String),
}

impl From<chromiumoxide::error::CdpError> for ScrapeError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        ScrapeError::Browser(e.to_string())
    }
}

impl From<serde_json::Error> for ScrapeError {
    fn from(e: serde_json::Error) -> Self {
        ScrapeError::Browser(format!("unexpected page script result: {}", e))
    }
}

pub type ScrapeResult<T> = Result<T, ScrapeError>;
