use analysis_core::{PricePoint, RiskStatistics};
use statrs::statistics::Statistics;

/// Trading days per year used for annualization
pub const TRADING_DAYS: f64 = 252.0;

/// Converts a daily price history into risk statistics.
pub struct RiskEngine;

impl RiskEngine {
    pub fn new() -> Self {
        Self
    }

    /// Simple daily returns: `(p[i] - p[i-1]) / p[i-1]`
    pub fn daily_returns(&self, prices: &[f64]) -> Vec<f64> {
        prices
            .windows(2)
            .map(|w| (w[1] - w[0]) / w[0])
            .collect()
    }

    /// Most negative decline from the running peak, 0.0 for a never-falling series.
    fn calculate_max_drawdown(&self, prices: &[f64]) -> f64 {
        if prices.is_empty() {
            return 0.0;
        }

        let mut peak = prices[0];
        let mut max_dd: f64 = 0.0;

        for &price in prices {
            if price > peak {
                peak = price;
            }
            let drawdown = (price - peak) / peak;
            max_dd = max_dd.min(drawdown);
        }

        max_dd
    }

    /// Historical 95% value at risk: the 5th-percentile daily return.
    fn calculate_var(&self, returns: &[f64]) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }

        let mut sorted = returns.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let index = (returns.len() as f64 * 0.05) as usize;
        sorted[index.min(sorted.len() - 1)]
    }

    /// Risk statistics from closing prices. `None` when fewer than two prices
    /// are available or any price is non-positive.
    pub fn compute_risk_from_prices(&self, prices: &[f64]) -> Option<RiskStatistics> {
        if prices.len() < 2 {
            return None;
        }
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            tracing::warn!("Price history contains non-positive closes, skipping risk statistics");
            return None;
        }

        let returns = self.daily_returns(prices);
        let mean_return = returns.iter().mean();
        let daily_volatility = returns.iter().population_std_dev();

        let sharpe_ratio = if daily_volatility == 0.0 {
            0.0
        } else {
            mean_return / daily_volatility
        };

        Some(RiskStatistics {
            daily_volatility,
            annualized_volatility: daily_volatility * TRADING_DAYS.sqrt(),
            sharpe_ratio,
            max_drawdown: self.calculate_max_drawdown(prices),
            annualized_return: mean_return * TRADING_DAYS,
            value_at_risk_95: self.calculate_var(&returns),
        })
    }

    /// Risk statistics for a chronological price history.
    pub fn compute_risk(&self, price_history: &[PricePoint]) -> Option<RiskStatistics> {
        let closes: Vec<f64> = price_history.iter().map(|p| p.close).collect();
        self.compute_risk_from_prices(&closes)
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new()
    }
}
