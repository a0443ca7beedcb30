use thiserror::Error;

/// Failures surfaced by an analyzer. "No license found" is not one of them:
/// it is returned as [`LicenseBlock::NotFound`](crate::models::LicenseBlock).
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The reasoning backend replied, but not in the agreed format.
    #[error("malformed backend response: {0}")]
    MalformedBackendResponse(String),

    /// Transport failure or non-success HTTP status from the backend.
    #[error("reasoning backend failed: {0}")]
    Backend(String),

    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),
}

impl From<reqwest::Error> for AnalysisError {
    fn from(e: reqwest::Error) -> Self {
        AnalysisError::Backend(e.to_string())
    }
}
