use analysis_core::DateRange;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Aggregation settings. Defaults: price history from 2020-01-01 to today,
/// caching on, 100ms between filings calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationOptions {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub enable_cache: bool,
    /// Delay after each filings provider call (0 = off)
    pub rate_limit_ms: u64,
    /// Delay after each market data call (0 = off)
    pub market_rate_limit_ms: u64,
    pub cache_market_data: bool,
    /// Cache entry lifetime; `None` keeps entries for the orchestrator's lifetime
    pub cache_ttl_secs: Option<u64>,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            end_date: Utc::now().date_naive(),
            enable_cache: true,
            rate_limit_ms: 100,
            market_rate_limit_ms: 0,
            cache_market_data: false,
            cache_ttl_secs: None,
        }
    }
}

impl AggregationOptions {
    /// Load from `AGG_*` environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build options from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();

        if let Some(v) = lookup("AGG_START_DATE") {
            options.start_date = parse_date("AGG_START_DATE", &v)?;
        }
        if let Some(v) = lookup("AGG_END_DATE") {
            options.end_date = parse_date("AGG_END_DATE", &v)?;
        }
        if let Some(v) = lookup("AGG_ENABLE_CACHE") {
            options.enable_cache = parse_var("AGG_ENABLE_CACHE", &v)?;
        }
        if let Some(v) = lookup("AGG_RATE_LIMIT_MS") {
            options.rate_limit_ms = parse_var("AGG_RATE_LIMIT_MS", &v)?;
        }
        if let Some(v) = lookup("AGG_MARKET_RATE_LIMIT_MS") {
            options.market_rate_limit_ms = parse_var("AGG_MARKET_RATE_LIMIT_MS", &v)?;
        }
        if let Some(v) = lookup("AGG_CACHE_MARKET_DATA") {
            options.cache_market_data = parse_var("AGG_CACHE_MARKET_DATA", &v)?;
        }
        if let Some(v) = lookup("AGG_CACHE_TTL_SECS") {
            options.cache_ttl_secs = Some(parse_var("AGG_CACHE_TTL_SECS", &v)?);
        }

        Ok(options)
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim().parse().with_context(|| format!("Invalid {}: {}", key, raw))
}

fn parse_date(key: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid {}: {}", key, raw))
}
