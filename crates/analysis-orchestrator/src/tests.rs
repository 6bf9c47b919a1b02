#[cfg(test)]
mod orchestrator_tests {
    use crate::{summarize, AggregationOptions, AggregationOrchestrator};
    use analysis_core::{
        AnalysisError, CanonicalConcept, Cik, DateRange, FactPoint, FactSeries, FilingsMetadata,
        FilingsProvider, IdentifierResolver, MarketDataProvider, PricePoint, QuoteSummary,
        RawFacts,
    };
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct CallCounts {
        cik: AtomicUsize,
        filings: AtomicUsize,
        facts: AtomicUsize,
        quote: AtomicUsize,
        history: AtomicUsize,
    }

    impl CallCounts {
        fn get(counter: &AtomicUsize) -> usize {
            counter.load(Ordering::SeqCst)
        }
    }

    /// In-memory stand-in for the filings and market data providers.
    struct MockProviders {
        calls: CallCounts,
        fail_facts: bool,
        closes: Vec<f64>,
    }

    impl MockProviders {
        fn new() -> Self {
            Self {
                calls: CallCounts::default(),
                fail_facts: false,
                closes: vec![100.0, 110.0, 90.0, 120.0],
            }
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series(points: &[(NaiveDate, f64)]) -> FactSeries {
        FactSeries::new(points.iter().map(|(end, val)| FactPoint::new(*end, *val)).collect())
    }

    fn sample_facts() -> RawFacts {
        let fy22 = d(2022, 9, 30);
        let fy23 = d(2023, 9, 30);
        let mut facts = RawFacts::new();
        facts.insert("Revenues".to_string(), series(&[(fy22, 900.0), (fy23, 1000.0)]));
        facts.insert("NetIncomeLoss".to_string(), series(&[(fy23, 100.0), (fy22, 80.0)]));
        facts.insert("Assets".to_string(), series(&[(fy23, 2000.0)]));
        facts.insert("Liabilities".to_string(), series(&[(fy23, 1200.0)]));
        facts.insert("StockholdersEquity".to_string(), series(&[(fy23, 800.0)]));
        facts.insert("AssetsCurrent".to_string(), series(&[(fy23, 600.0)]));
        facts.insert("LiabilitiesCurrent".to_string(), series(&[(fy23, 300.0)]));
        facts.insert("LongTermDebt".to_string(), series(&[(fy23, 200.0)]));
        facts.insert(
            "NetCashProvidedByUsedInOperatingActivities".to_string(),
            series(&[(fy23, 150.0)]),
        );
        facts.insert(
            "PaymentsToAcquirePropertyPlantAndEquipment".to_string(),
            series(&[(fy23, 50.0)]),
        );
        facts
    }

    #[async_trait]
    impl IdentifierResolver for MockProviders {
        async fn resolve_cik(&self, ticker: &str) -> Result<Cik, AnalysisError> {
            self.calls.cik.fetch_add(1, Ordering::SeqCst);
            match ticker {
                "AAPL" => Ok(Cik(320193)),
                other => Err(AnalysisError::NotFound(other.to_string())),
            }
        }
    }

    #[async_trait]
    impl FilingsProvider for MockProviders {
        async fn get_filings(&self, _cik: Cik) -> Result<FilingsMetadata, AnalysisError> {
            self.calls.filings.fetch_add(1, Ordering::SeqCst);
            Ok(FilingsMetadata {
                name: "Apple Inc.".to_string(),
                sic: Some("3571".to_string()),
                sic_description: Some("Electronic Computers".to_string()),
                fiscal_year_end: Some("0928".to_string()),
                state_of_incorporation: Some("CA".to_string()),
                tickers: vec!["AAPL".to_string()],
            })
        }

        async fn get_raw_facts(&self, _cik: Cik) -> Result<RawFacts, AnalysisError> {
            self.calls.facts.fetch_add(1, Ordering::SeqCst);
            if self.fail_facts {
                return Err(AnalysisError::ProviderError("HTTP 500: companyfacts".to_string()));
            }
            Ok(sample_facts())
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProviders {
        async fn get_quote_summary(&self, _ticker: &str) -> Result<QuoteSummary, AnalysisError> {
            self.calls.quote.fetch_add(1, Ordering::SeqCst);
            Ok(QuoteSummary {
                market_cap: Some(4000.0),
                shares_outstanding: Some(100.0),
                beta: Some(1.2),
                enterprise_value: Some(4500.0),
                ebitda: Some(300.0),
            })
        }

        async fn get_price_history(
            &self,
            _ticker: &str,
            start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<PricePoint>, AnalysisError> {
            self.calls.history.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .closes
                .iter()
                .enumerate()
                .map(|(i, c)| PricePoint::new(start + chrono::Duration::days(i as i64), *c))
                .collect())
        }
    }

    fn test_options() -> AggregationOptions {
        AggregationOptions {
            start_date: d(2023, 1, 1),
            end_date: d(2023, 12, 31),
            rate_limit_ms: 0,
            ..Default::default()
        }
    }

    fn orchestrator(
        providers: &Arc<MockProviders>,
        options: AggregationOptions,
    ) -> AggregationOrchestrator {
        AggregationOrchestrator::new(
            providers.clone(),
            providers.clone(),
            providers.clone(),
            options,
        )
    }

    fn range() -> DateRange {
        DateRange::new(d(2023, 1, 1), d(2023, 12, 31))
    }

    #[tokio::test]
    async fn test_aggregate_builds_full_record() {
        let providers = Arc::new(MockProviders::new());
        let orch = orchestrator(&providers, test_options());

        let record = orch.aggregate("aapl", &range()).await.unwrap();

        assert_eq!(record.ticker, "AAPL");
        assert_eq!(record.cik, Cik(320193));
        assert_eq!(record.company.name, "Apple Inc.");
        assert_eq!(record.company.sic_description.as_deref(), Some("Electronic Computers"));
        assert_eq!(record.financial_statements.len(), CanonicalConcept::ALL.len());
        assert_eq!(record.financial_statements.latest(CanonicalConcept::Revenue), Some(1000.0));

        assert_eq!(record.ratios.net_margin, Some(10.0));
        assert_eq!(record.ratios.pe_ratio, Some(40.0));
        assert_eq!(record.ratios.ev_to_ebitda, Some(15.0));
        assert_eq!(record.ratios.fcf_yield, Some(2.5));
        assert_eq!(record.ratios.beta, Some(1.2));

        let risk = record.risk.expect("four prices yield risk statistics");
        assert!((risk.max_drawdown - (90.0 - 110.0) / 110.0).abs() < 1e-12);
        assert_eq!(record.ratios.max_drawdown, Some(risk.max_drawdown));
        assert_eq!(record.ratios.volatility, Some(risk.annualized_volatility));

        let revenue_growth = record.growth[&CanonicalConcept::Revenue];
        assert!((revenue_growth.yoy_growth.unwrap() - 100.0 / 900.0).abs() < 1e-12);
        assert_eq!(record.market_data.price_history.len(), 4);
    }

    #[tokio::test]
    async fn test_cached_aggregation_fetches_each_key_once() {
        let providers = Arc::new(MockProviders::new());
        let orch = orchestrator(&providers, test_options());

        let first = orch.aggregate("AAPL", &range()).await.unwrap();
        let second = orch.aggregate("AAPL", &range()).await.unwrap();

        assert_eq!(first.ratios, second.ratios);
        assert_eq!(CallCounts::get(&providers.calls.cik), 1);
        assert_eq!(CallCounts::get(&providers.calls.filings), 1);
        assert_eq!(CallCounts::get(&providers.calls.facts), 1);
        // Market data is not cached by default
        assert_eq!(CallCounts::get(&providers.calls.quote), 2);
        assert_eq!(CallCounts::get(&providers.calls.history), 2);
        assert_eq!(orch.cache().len(), 3);
    }

    #[tokio::test]
    async fn test_resolve_cik_miss_then_hit() {
        let providers = Arc::new(MockProviders::new());
        let orch = orchestrator(&providers, test_options());
        assert!(orch.cache().is_empty());

        assert_eq!(orch.resolve_cik("aapl").await.unwrap(), Cik(320193));
        assert_eq!(CallCounts::get(&providers.calls.cik), 1);
        assert_eq!(orch.cache().len(), 1);

        // Same upper-cased key, served without another provider call
        assert_eq!(orch.resolve_cik("AAPL").await.unwrap(), Cik(320193));
        assert_eq!(CallCounts::get(&providers.calls.cik), 1);
        assert_eq!(orch.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_disabled_cache_refetches() {
        let providers = Arc::new(MockProviders::new());
        let options = AggregationOptions {
            enable_cache: false,
            ..test_options()
        };
        let orch = orchestrator(&providers, options);

        orch.aggregate("AAPL", &range()).await.unwrap();
        orch.aggregate("AAPL", &range()).await.unwrap();

        assert_eq!(CallCounts::get(&providers.calls.cik), 2);
        assert_eq!(CallCounts::get(&providers.calls.filings), 2);
        assert_eq!(CallCounts::get(&providers.calls.facts), 2);
        assert!(orch.cache().is_empty());
    }

    #[tokio::test]
    async fn test_market_data_caching_is_opt_in() {
        let providers = Arc::new(MockProviders::new());
        let options = AggregationOptions {
            cache_market_data: true,
            ..test_options()
        };
        let orch = orchestrator(&providers, options);

        orch.aggregate("AAPL", &range()).await.unwrap();
        orch.aggregate("AAPL", &range()).await.unwrap();

        assert_eq!(CallCounts::get(&providers.calls.quote), 1);
        assert_eq!(CallCounts::get(&providers.calls.history), 1);

        // A different window is a different key
        let other = DateRange::new(d(2022, 1, 1), d(2022, 12, 31));
        orch.aggregate("AAPL", &other).await.unwrap();
        assert_eq!(CallCounts::get(&providers.calls.history), 2);
    }

    #[tokio::test]
    async fn test_unknown_ticker_is_terminal() {
        let providers = Arc::new(MockProviders::new());
        let orch = orchestrator(&providers, test_options());

        let err = orch.aggregate("zzzz", &range()).await.unwrap_err();

        assert_eq!(err, AnalysisError::NotFound("ZZZZ".to_string()));
        assert_eq!(CallCounts::get(&providers.calls.filings), 0);
        assert_eq!(CallCounts::get(&providers.calls.quote), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates_without_partial_record() {
        let providers = Arc::new(MockProviders {
            fail_facts: true,
            ..MockProviders::new()
        });
        let orch = orchestrator(&providers, test_options());

        let err = orch.aggregate("AAPL", &range()).await.unwrap_err();

        assert_eq!(err, AnalysisError::ProviderError("HTTP 500: companyfacts".to_string()));
        assert!(err.is_retryable());
        // Market data is never requested after an earlier failure
        assert_eq!(CallCounts::get(&providers.calls.quote), 0);
        assert_eq!(CallCounts::get(&providers.calls.history), 0);
    }

    #[tokio::test]
    async fn test_inverted_range_rejected_before_fetching() {
        let providers = Arc::new(MockProviders::new());
        let orch = orchestrator(&providers, test_options());
        let inverted = DateRange::new(d(2024, 1, 1), d(2023, 1, 1));

        let err = orch.aggregate("AAPL", &inverted).await.unwrap_err();

        assert!(matches!(err, AnalysisError::InvalidRange { .. }));
        assert_eq!(CallCounts::get(&providers.calls.cik), 0);
    }

    #[tokio::test]
    async fn test_short_history_leaves_risk_absent() {
        let providers = Arc::new(MockProviders {
            closes: vec![100.0],
            ..MockProviders::new()
        });
        let orch = orchestrator(&providers, test_options());

        let record = orch.aggregate("AAPL", &range()).await.unwrap();

        assert!(record.risk.is_none());
        assert_eq!(record.ratios.sharpe_ratio, None);
        assert_eq!(record.ratios.beta, None);
        assert_eq!(record.ratios.net_margin, Some(10.0));
    }

    #[tokio::test]
    async fn test_summarize_projects_record() {
        let providers = Arc::new(MockProviders::new());
        let orch = orchestrator(&providers, test_options());
        let record = orch.aggregate_default("AAPL").await.unwrap();

        let summary = summarize(&record);

        assert_eq!(summary.company, "Apple Inc.");
        assert_eq!(summary.ticker, "AAPL");
        assert_eq!(summary.ratios, record.ratios);
        assert_eq!(summary.risk, record.risk);
    }

    #[tokio::test]
    async fn test_record_serializes_to_json() {
        let providers = Arc::new(MockProviders::new());
        let orch = orchestrator(&providers, test_options());
        let record = orch.aggregate("AAPL", &range()).await.unwrap();

        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["cik"], "0000320193");
        assert_eq!(json["ratios"]["netMargin"], 10.0);
        assert!(json["ratios"].get("revenueGrowth").is_none());
        assert_eq!(json["financialStatements"]["Revenue"][0]["val"], 1000.0);
        assert!(json["risk"]["annualizedVolatility"].is_number());
    }

    #[tokio::test(start_paused = true)]
    async fn test_filings_calls_are_throttled() {
        let providers = Arc::new(MockProviders::new());
        let options = AggregationOptions {
            rate_limit_ms: 100,
            ..test_options()
        };
        let orch = orchestrator(&providers, options);

        let start = tokio::time::Instant::now();
        orch.aggregate("AAPL", &range()).await.unwrap();
        // filings + facts
        assert!(start.elapsed() >= Duration::from_millis(200));

        let second = tokio::time::Instant::now();
        orch.aggregate("AAPL", &range()).await.unwrap();
        // Served from cache, market limiter disabled
        assert_eq!(second.elapsed(), Duration::ZERO);
    }
}
