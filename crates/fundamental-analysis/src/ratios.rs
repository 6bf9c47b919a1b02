use analysis_core::{
    CanonicalConcept, FinancialStatementView, MarketDataView, RatioSet, RiskStatistics,
    StatementBreakdown,
};

/// `numerator / denominator`, or `None` when an input is missing, the
/// denominator is zero, or the quotient is not finite.
pub(crate) fn divide(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if d == 0.0 {
        return None;
    }
    let value = n / d;
    value.is_finite().then_some(value)
}

/// Same as [`divide`], scaled to percent.
pub(crate) fn percent(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    divide(numerator, denominator).map(|v| v * 100.0)
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn sum(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    finite(Some(a? + b?))
}

fn difference(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    finite(Some(a? - b?))
}

/// Composes statement values, market fields and risk statistics into ratios.
///
/// Both variants are pure. A ratio whose guard fails is left as `None`, so it
/// never appears in serialized output.
pub struct RatioEngine;

impl RatioEngine {
    pub fn new() -> Self {
        Self
    }

    fn calculate_roic(
        &self,
        net_income: Option<f64>,
        equity: Option<f64>,
        debt: Option<f64>,
    ) -> Option<f64> {
        percent(net_income, sum(equity, debt))
    }

    fn calculate_free_cash_flow(
        &self,
        operating_cash_flow: Option<f64>,
        capex: Option<f64>,
    ) -> Option<f64> {
        difference(operating_cash_flow, capex)
    }

    fn calculate_fcf_yield(
        &self,
        free_cash_flow: Option<f64>,
        market_cap: Option<f64>,
    ) -> Option<f64> {
        percent(free_cash_flow, market_cap)
    }

    fn calculate_revenue_growth(&self, current: Option<f64>, previous: Option<f64>) -> Option<f64> {
        let previous = previous?;
        percent(difference(current, Some(previous)), Some(previous))
    }

    /// Risk fields are copied only when risk statistics exist.
    fn apply_risk(
        &self,
        ratios: &mut RatioSet,
        market: &MarketDataView,
        risk: Option<&RiskStatistics>,
    ) {
        if let Some(risk) = risk {
            ratios.beta = finite(market.beta);
            ratios.sharpe_ratio = finite(Some(risk.sharpe_ratio));
            ratios.max_drawdown = finite(Some(risk.max_drawdown));
            ratios.volatility = finite(Some(risk.annualized_volatility));
            ratios.value_at_risk = finite(Some(risk.value_at_risk_95));
        }
    }

    /// Ratios over resolved XBRL concepts and market data.
    pub fn compute_ratios(
        &self,
        statements: &FinancialStatementView,
        market: &MarketDataView,
        risk: Option<&RiskStatistics>,
    ) -> RatioSet {
        let revenue = statements.latest(CanonicalConcept::Revenue);
        let net_income = statements.latest(CanonicalConcept::NetIncome);
        let assets = statements.latest(CanonicalConcept::Assets);
        let liabilities = statements.latest(CanonicalConcept::Liabilities);
        let equity = statements.latest(CanonicalConcept::StockholdersEquity);
        let current_assets = statements.latest(CanonicalConcept::CurrentAssets);
        let current_liabilities = statements.latest(CanonicalConcept::CurrentLiabilities);
        let long_term_debt = statements.latest(CanonicalConcept::LongTermDebt);
        let operating_cash_flow = statements.latest(CanonicalConcept::OperatingCashFlow);
        let capex = statements.latest(CanonicalConcept::CapEx);

        let free_cash_flow = self.calculate_free_cash_flow(operating_cash_flow, capex);

        let mut ratios = RatioSet {
            // Profitability
            net_margin: percent(net_income, revenue),
            roa: percent(net_income, assets),
            roe: percent(net_income, equity),
            roic: self.calculate_roic(net_income, equity, long_term_debt),

            // Leverage
            debt_to_equity: divide(long_term_debt, equity),
            debt_ratio: divide(liabilities, assets),

            // Liquidity
            current_ratio: divide(current_assets, current_liabilities),

            // Valuation
            pe_ratio: divide(market.market_cap, net_income),
            price_to_sales: divide(market.market_cap, revenue),
            price_to_book: divide(market.market_cap, equity),
            ev_to_ebitda: divide(market.enterprise_value, market.ebitda),

            // Cash flow
            free_cash_flow,
            fcf_yield: self.calculate_fcf_yield(free_cash_flow, market.market_cap),

            ..Default::default()
        };

        self.apply_risk(&mut ratios, market, risk);
        ratios
    }

    /// Ratios over a full income statement / balance sheet / cash flow breakdown.
    pub fn compute_extended_ratios(
        &self,
        breakdown: &StatementBreakdown,
        market: &MarketDataView,
        risk: Option<&RiskStatistics>,
    ) -> RatioSet {
        let is = &breakdown.income_statement;
        let bs = &breakdown.balance_sheet;
        let cf = &breakdown.cash_flow;

        let free_cash_flow = self.calculate_free_cash_flow(cf.operating_cash_flow, cf.capex);

        let mut ratios = RatioSet {
            // Income statement
            revenue: finite(is.revenue),
            revenue_growth: self.calculate_revenue_growth(is.revenue, is.prev_revenue),
            gross_margin: percent(is.gross_profit, is.revenue),
            operating_margin: percent(is.operating_income, is.revenue),
            net_margin: percent(is.net_income, is.revenue),
            ebitda_margin: percent(is.ebitda, is.revenue),
            tax_rate: percent(is.tax_expense, is.pre_tax_income),
            eps: divide(is.net_income, market.shares_outstanding),

            // Balance sheet
            book_value_per_share: divide(bs.total_equity, market.shares_outstanding),
            current_ratio: divide(bs.current_assets, bs.current_liabilities),
            debt_to_equity: divide(bs.total_liabilities, bs.total_equity),

            // Cash flow
            free_cash_flow,

            // Profitability
            roa: percent(is.net_income, bs.total_assets),
            roe: percent(is.net_income, bs.total_equity),
            roic: self.calculate_roic(is.net_income, bs.total_equity, bs.total_debt),

            // Valuation
            pe_ratio: divide(market.market_cap, is.net_income),
            price_to_sales: divide(market.market_cap, is.revenue),
            price_to_book: divide(market.market_cap, bs.total_equity),
            fcf_yield: self.calculate_fcf_yield(free_cash_flow, market.market_cap),

            ..Default::default()
        };

        self.apply_risk(&mut ratios, market, risk);
        ratios
    }
}

impl Default for RatioEngine {
    fn default() -> Self {
        Self::new()
    }
}
