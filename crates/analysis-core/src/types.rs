use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A single reported XBRL value for one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactPoint {
    /// Period end date
    pub end: NaiveDate,
    pub val: f64,
}

impl FactPoint {
    pub fn new(end: NaiveDate, val: f64) -> Self {
        Self { end, val }
    }
}

/// All reported values for one concept. Input order is not assumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactSeries(pub Vec<FactPoint>);

impl FactSeries {
    pub fn new(points: Vec<FactPoint>) -> Self {
        Self(points)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn points(&self) -> &[FactPoint] {
        &self.0
    }

    /// Point with the greatest period end. Equal ends resolve to the
    /// first-encountered point, matching a stable descending sort.
    pub fn latest(&self) -> Option<&FactPoint> {
        let mut best: Option<&FactPoint> = None;
        for point in &self.0 {
            match best {
                Some(b) if point.end <= b.end => {}
                _ => best = Some(point),
            }
        }
        best
    }

    /// Stable sort, latest period first.
    pub fn sort_latest_first(&mut self) {
        self.0.sort_by(|a, b| b.end.cmp(&a.end));
    }
}

impl From<Vec<FactPoint>> for FactSeries {
    fn from(points: Vec<FactPoint>) -> Self {
        Self(points)
    }
}

/// Raw provider facts keyed by tag name (e.g. "NetIncomeLoss").
pub type RawFacts = HashMap<String, FactSeries>;

/// Provider-agnostic financial statement line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalConcept {
    Revenue,
    NetIncome,
    Assets,
    Liabilities,
    StockholdersEquity,
    CurrentAssets,
    CurrentLiabilities,
    LongTermDebt,
    OperatingCashFlow,
    CapEx,
}

impl CanonicalConcept {
    pub const ALL: [CanonicalConcept; 10] = [
        CanonicalConcept::Revenue,
        CanonicalConcept::NetIncome,
        CanonicalConcept::Assets,
        CanonicalConcept::Liabilities,
        CanonicalConcept::StockholdersEquity,
        CanonicalConcept::CurrentAssets,
        CanonicalConcept::CurrentLiabilities,
        CanonicalConcept::LongTermDebt,
        CanonicalConcept::OperatingCashFlow,
        CanonicalConcept::CapEx,
    ];

    /// Provider tag aliases in priority order.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalConcept::Revenue => &[
                "Revenues",
                "RevenueFromContractWithCustomerExcludingAssessedTax",
            ],
            CanonicalConcept::NetIncome => &["NetIncomeLoss"],
            CanonicalConcept::Assets => &["Assets"],
            CanonicalConcept::Liabilities => &["Liabilities"],
            CanonicalConcept::StockholdersEquity => &["StockholdersEquity"],
            CanonicalConcept::CurrentAssets => &["AssetsCurrent"],
            CanonicalConcept::CurrentLiabilities => &["LiabilitiesCurrent"],
            CanonicalConcept::LongTermDebt => &["LongTermDebt", "LongTermDebtNoncurrent"],
            CanonicalConcept::OperatingCashFlow => &["NetCashProvidedByUsedInOperatingActivities"],
            CanonicalConcept::CapEx => &["PaymentsToAcquirePropertyPlantAndEquipment"],
        }
    }
}

/// Resolved statement series per canonical concept. Absent concepts are
/// simply missing from the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinancialStatementView(pub BTreeMap<CanonicalConcept, FactSeries>);

impl FinancialStatementView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, concept: CanonicalConcept, series: FactSeries) {
        self.0.insert(concept, series);
    }

    pub fn series(&self, concept: CanonicalConcept) -> Option<&FactSeries> {
        self.0.get(&concept)
    }

    pub fn latest(&self, concept: CanonicalConcept) -> Option<f64> {
        self.series(concept).and_then(|s| s.latest()).map(|p| p.val)
    }

    pub fn contains(&self, concept: CanonicalConcept) -> bool {
        self.0.contains_key(&concept)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Central Index Key. Rendered as a 10-digit zero-padded string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cik(pub u64);

impl fmt::Display for Cik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0>10}", self.0)
    }
}

impl Serialize for Cik {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Cik {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse::<u64>()
            .map(Cik)
            .map_err(serde::de::Error::custom)
    }
}

/// Company submissions metadata from the filings provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingsMetadata {
    pub name: String,
    #[serde(default)]
    pub sic: Option<String>,
    #[serde(default)]
    pub sic_description: Option<String>,
    #[serde(default)]
    pub fiscal_year_end: Option<String>,
    #[serde(default)]
    pub state_of_incorporation: Option<String>,
    #[serde(default)]
    pub tickers: Vec<String>,
}

/// Company identity kept in the final record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub name: String,
    pub sic_description: Option<String>,
    pub fiscal_year_end: Option<String>,
}

impl From<&FilingsMetadata> for CompanyInfo {
    fn from(filings: &FilingsMetadata) -> Self {
        Self {
            name: filings.name.clone(),
            sic_description: filings.sic_description.clone(),
            fiscal_year_end: filings.fiscal_year_end.clone(),
        }
    }
}

/// Point-in-time market fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    pub market_cap: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub beta: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub ebitda: Option<f64>,
}

/// Daily close
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Market fields plus chronological price history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDataView {
    pub market_cap: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub beta: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub ebitda: Option<f64>,
    pub price_history: Vec<PricePoint>,
}

impl MarketDataView {
    pub fn new(quote: QuoteSummary, price_history: Vec<PricePoint>) -> Self {
        Self {
            market_cap: quote.market_cap,
            shares_outstanding: quote.shares_outstanding,
            beta: quote.beta,
            enterprise_value: quote.enterprise_value,
            ebitda: quote.ebitda,
            price_history,
        }
    }
}

/// Risk statistics derived from a price history of at least two points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskStatistics {
    pub daily_volatility: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub annualized_return: f64,
    /// 5th-percentile historical daily return
    pub value_at_risk_95: f64,
}

/// Named ratios. A field is `None` (and omitted when serialized) whenever an
/// input was missing or a denominator was zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatioSet {
    // Profitability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_margin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_margin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_margin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebitda_margin: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roe: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roic: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<f64>,

    // Income statement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_growth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_value_per_share: Option<f64>,

    // Leverage / liquidity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_to_equity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_ratio: Option<f64>,

    // Valuation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_to_sales: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_to_book: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_to_ebitda: Option<f64>,

    // Cash flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_cash_flow: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcf_yield: Option<f64>,

    // Risk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharpe_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_drawdown: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_at_risk: Option<f64>,
}

impl RatioSet {
    /// Overlay every ratio present in `other`; ratios absent there are kept.
    pub fn merge(mut self, other: RatioSet) -> RatioSet {
        macro_rules! overlay {
            ($($field:ident),* $(,)?) => {
                $( if other.$field.is_some() { self.$field = other.$field; } )*
            };
        }
        overlay!(
            net_margin, gross_margin, operating_margin, ebitda_margin, roa, roe, roic, tax_rate,
            revenue, revenue_growth, eps, book_value_per_share,
            debt_to_equity, debt_ratio, current_ratio,
            pe_ratio, price_to_sales, price_to_book, ev_to_ebitda,
            free_cash_flow, fcf_yield,
            beta, sharpe_ratio, max_drawdown, volatility, value_at_risk,
        );
        self
    }

    /// Present ratios keyed by their serialized name.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(obj)) => obj
                .into_iter()
                .filter_map(|(k, v)| v.as_f64().map(|f| (k, f)))
                .collect(),
            _ => BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.to_map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Income statement breakdown used by the extended ratio variant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatement {
    pub revenue: Option<f64>,
    pub prev_revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
    pub net_income: Option<f64>,
    pub ebitda: Option<f64>,
    pub tax_expense: Option<f64>,
    pub pre_tax_income: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub total_equity: Option<f64>,
    pub current_assets: Option<f64>,
    pub current_liabilities: Option<f64>,
    pub total_debt: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowStatement {
    pub operating_cash_flow: Option<f64>,
    pub capex: Option<f64>,
}

/// Full statement breakdown (as opposed to raw XBRL facts)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementBreakdown {
    pub income_statement: IncomeStatement,
    pub balance_sheet: BalanceSheet,
    pub cash_flow: CashFlowStatement,
}

/// Growth rates for one concept
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthRates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yoy_growth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cagr_5y: Option<f64>,
}

pub type GrowthMetrics = BTreeMap<CanonicalConcept, GrowthRates>;

/// Inclusive date window for price history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }
}

/// Final aggregate for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRecord {
    pub ticker: String,
    pub cik: Cik,
    pub fetched_at: DateTime<Utc>,
    pub company: CompanyInfo,
    pub financial_statements: FinancialStatementView,
    pub ratios: RatioSet,
    pub growth: GrowthMetrics,
    pub market_data: MarketDataView,
    pub risk: Option<RiskStatistics>,
}

/// Compact projection of a record for callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub company: String,
    pub ticker: String,
    pub ratios: RatioSet,
    pub risk: Option<RiskStatistics>,
}
