use analysis_core::{
    AnalysisError, Cik, CompanyInfo, CompanyRecord, DateRange, FilingsMetadata, FilingsProvider,
    IdentifierResolver, MarketDataProvider, MarketDataView, PricePoint, QuoteSummary, RawFacts,
    RecordSummary,
};
use chrono::Utc;
use fundamental_analysis::{ConceptResolver, GrowthEngine, RatioEngine};
use quant_analysis::RiskEngine;
use std::sync::Arc;

pub mod cache;
pub mod config;
pub mod rate_limit;

pub use cache::{cache_key, CacheStore};
pub use config::AggregationOptions;
pub use rate_limit::RateLimiter;

#[cfg(test)]
mod tests;

/// Sequences provider fetches and runs the analysis engines to build one
/// `CompanyRecord` per ticker.
///
/// Fetches run strictly in order (CIK, filings, facts, market data) since the
/// filings calls depend on the resolved CIK. Cache and rate limiters belong to
/// this instance only.
pub struct AggregationOrchestrator {
    identifier_resolver: Arc<dyn IdentifierResolver>,
    filings_provider: Arc<dyn FilingsProvider>,
    market_data_provider: Arc<dyn MarketDataProvider>,
    ratio_engine: RatioEngine,
    growth_engine: GrowthEngine,
    risk_engine: RiskEngine,
    cache: CacheStore,
    /// Throttles filings/facts calls
    filings_limiter: RateLimiter,
    /// Throttles quote/price history calls
    market_limiter: RateLimiter,
    options: AggregationOptions,
}

impl AggregationOrchestrator {
    pub fn new(
        identifier_resolver: Arc<dyn IdentifierResolver>,
        filings_provider: Arc<dyn FilingsProvider>,
        market_data_provider: Arc<dyn MarketDataProvider>,
        options: AggregationOptions,
    ) -> Self {
        let mut cache = CacheStore::new(options.enable_cache);
        if let Some(ttl) = options.cache_ttl_secs {
            cache = cache.with_ttl(ttl);
        }

        Self {
            identifier_resolver,
            filings_provider,
            market_data_provider,
            ratio_engine: RatioEngine::new(),
            growth_engine: GrowthEngine::new(),
            risk_engine: RiskEngine::new(),
            cache,
            filings_limiter: RateLimiter::from_millis(options.rate_limit_ms),
            market_limiter: RateLimiter::from_millis(options.market_rate_limit_ms),
            options,
        }
    }

    pub fn options(&self) -> &AggregationOptions {
        &self.options
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Public accessor for the ratio engine (e.g. for extended breakdowns)
    pub fn ratio_engine(&self) -> &RatioEngine {
        &self.ratio_engine
    }

    pub fn risk_engine(&self) -> &RiskEngine {
        &self.risk_engine
    }

    /// Resolve the ticker's CIK (cached)
    pub async fn resolve_cik(&self, ticker: &str) -> Result<Cik, AnalysisError> {
        let ticker = ticker.to_uppercase();
        let key = cache_key("resolve_cik", &[ticker.as_str()]);
        if let Some(cik) = self.cache.get::<Cik>(&key) {
            tracing::debug!("Cache hit: {}", key);
            return Ok(*cik);
        }
        tracing::debug!("Cache miss: {}", key);

        let cik = self.identifier_resolver.resolve_cik(&ticker).await?;
        self.cache.set(key, Arc::new(cik));
        Ok(cik)
    }

    /// Get filings metadata (cached, rate limited)
    pub async fn get_filings(&self, cik: Cik) -> Result<Arc<FilingsMetadata>, AnalysisError> {
        let key = cache_key("get_filings", &[cik.to_string().as_str()]);
        if let Some(filings) = self.cache.get::<FilingsMetadata>(&key) {
            tracing::debug!("Cache hit: {}", key);
            return Ok(filings);
        }
        tracing::debug!("Cache miss: {}", key);

        let filings = Arc::new(
            self.filings_limiter
                .throttle(|| self.filings_provider.get_filings(cik))
                .await?,
        );
        self.cache.set(key, filings.clone());
        Ok(filings)
    }

    /// Get raw XBRL facts (cached, rate limited)
    pub async fn get_raw_facts(&self, cik: Cik) -> Result<Arc<RawFacts>, AnalysisError> {
        let key = cache_key("get_raw_facts", &[cik.to_string().as_str()]);
        if let Some(facts) = self.cache.get::<RawFacts>(&key) {
            tracing::debug!("Cache hit: {}", key);
            return Ok(facts);
        }
        tracing::debug!("Cache miss: {}", key);

        let facts = Arc::new(
            self.filings_limiter
                .throttle(|| self.filings_provider.get_raw_facts(cik))
                .await?,
        );
        self.cache.set(key, facts.clone());
        Ok(facts)
    }

    async fn get_quote_summary(&self, ticker: &str) -> Result<Arc<QuoteSummary>, AnalysisError> {
        let key = cache_key("get_quote_summary", &[ticker]);
        if self.options.cache_market_data {
            if let Some(quote) = self.cache.get::<QuoteSummary>(&key) {
                tracing::debug!("Cache hit: {}", key);
                return Ok(quote);
            }
            tracing::debug!("Cache miss: {}", key);
        }

        let quote = Arc::new(
            self.market_limiter
                .throttle(|| self.market_data_provider.get_quote_summary(ticker))
                .await?,
        );
        if self.options.cache_market_data {
            self.cache.set(key, quote.clone());
        }
        Ok(quote)
    }

    async fn get_price_history(
        &self,
        ticker: &str,
        range: &DateRange,
    ) -> Result<Arc<Vec<PricePoint>>, AnalysisError> {
        let start = range.start.to_string();
        let end = range.end.to_string();
        let key = cache_key("get_price_history", &[ticker, start.as_str(), end.as_str()]);
        if self.options.cache_market_data {
            if let Some(history) = self.cache.get::<Vec<PricePoint>>(&key) {
                tracing::debug!("Cache hit: {}", key);
                return Ok(history);
            }
            tracing::debug!("Cache miss: {}", key);
        }

        let history = Arc::new(
            self.market_limiter
                .throttle(|| {
                    self.market_data_provider
                        .get_price_history(ticker, range.start, range.end)
                })
                .await?,
        );
        if self.options.cache_market_data {
            self.cache.set(key, history.clone());
        }
        Ok(history)
    }

    /// Quote summary plus price history. Not cached unless `cache_market_data` is set.
    pub async fn get_market_data(
        &self,
        ticker: &str,
        range: &DateRange,
    ) -> Result<MarketDataView, AnalysisError> {
        let ticker = ticker.to_uppercase();
        let quote = self.get_quote_summary(&ticker).await?;
        let history = self.get_price_history(&ticker, range).await?;
        Ok(MarketDataView::new((*quote).clone(), (*history).clone()))
    }

    /// Fetch everything for `ticker` and assemble its record.
    ///
    /// Any provider failure aborts the whole aggregation; no partial record
    /// is returned.
    pub async fn aggregate(
        &self,
        ticker: &str,
        range: &DateRange,
    ) -> Result<CompanyRecord, AnalysisError> {
        if !range.is_valid() {
            return Err(AnalysisError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }

        let ticker = ticker.to_uppercase();
        tracing::info!("Starting aggregation for {} ({} to {})", ticker, range.start, range.end);

        let cik = self.resolve_cik(&ticker).await?;
        let filings = self.get_filings(cik).await?;
        let facts = self.get_raw_facts(cik).await?;
        let market_data = self.get_market_data(&ticker, range).await?;

        let financial_statements = ConceptResolver::build_statement_view(&facts);

        let risk = self.risk_engine.compute_risk(&market_data.price_history);
        if risk.is_none() {
            tracing::warn!(
                "Risk statistics unavailable for {} ({} price points)",
                ticker,
                market_data.price_history.len()
            );
        }

        let ratios = self
            .ratio_engine
            .compute_ratios(&financial_statements, &market_data, risk.as_ref());
        let growth = self.growth_engine.compute_growth(&financial_statements);

        tracing::info!(
            "Aggregated {} (CIK {}): {} concepts, {} ratios",
            ticker,
            cik,
            financial_statements.len(),
            ratios.len()
        );

        Ok(CompanyRecord {
            ticker,
            cik,
            fetched_at: Utc::now(),
            company: CompanyInfo::from(filings.as_ref()),
            financial_statements,
            ratios,
            growth,
            market_data,
            risk,
        })
    }

    /// Aggregate over the configured default date range.
    pub async fn aggregate_default(&self, ticker: &str) -> Result<CompanyRecord, AnalysisError> {
        let range = self.options.date_range();
        self.aggregate(ticker, &range).await
    }
}

/// Compact view of a record: company name, ticker, ratios and risk.
pub fn summarize(record: &CompanyRecord) -> RecordSummary {
    RecordSummary {
        company: record.company.name.clone(),
        ticker: record.ticker.clone(),
        ratios: record.ratios.clone(),
        risk: record.risk,
    }
}
