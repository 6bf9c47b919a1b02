use async_trait::async_trait;
use chrono::NaiveDate;
use crate::{AnalysisError, Cik, FilingsMetadata, PricePoint, QuoteSummary, RawFacts};

/// Resolves a ticker symbol to the regulator's entity identifier.
#[async_trait]
pub trait IdentifierResolver: Send + Sync {
    /// Fails with `AnalysisError::NotFound` for unknown tickers.
    async fn resolve_cik(&self, ticker: &str) -> Result<Cik, AnalysisError>;
}

/// Regulatory filings source (submissions metadata and XBRL company facts)
#[async_trait]
pub trait FilingsProvider: Send + Sync {
    async fn get_filings(&self, cik: Cik) -> Result<FilingsMetadata, AnalysisError>;

    async fn get_raw_facts(&self, cik: Cik) -> Result<RawFacts, AnalysisError>;
}

/// Market data source
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn get_quote_summary(&self, ticker: &str) -> Result<QuoteSummary, AnalysisError>;

    /// Daily closes between `start` and `end`, oldest first.
    async fn get_price_history(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, AnalysisError>;
}
