use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Ticker or identifier could not be resolved. Terminal.
    #[error("Ticker {0} not found")]
    NotFound(String),

    /// Network or parse failure reported by an external provider.
    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

impl AnalysisError {
    /// Whether the caller may retry the whole aggregation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnalysisError::ProviderError(_))
    }
}
