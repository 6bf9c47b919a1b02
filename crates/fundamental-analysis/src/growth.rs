use analysis_core::{
    CanonicalConcept, FactSeries, FinancialStatementView, GrowthMetrics, GrowthRates,
};

/// Concepts that get growth rates
pub const GROWTH_CONCEPTS: [CanonicalConcept; 3] = [
    CanonicalConcept::Revenue,
    CanonicalConcept::NetIncome,
    CanonicalConcept::OperatingCashFlow,
];

const CAGR_YEARS: usize = 5;

/// Period-over-period and five-period compound growth per concept.
pub struct GrowthEngine;

impl GrowthEngine {
    pub fn new() -> Self {
        Self
    }

    /// Values ordered oldest period first, one per period end. Duplicate
    /// period ends keep the first point encountered, matching `latest()`.
    fn chronological_values(&self, series: &FactSeries) -> Vec<f64> {
        let mut sorted = series.clone();
        sorted.sort_latest_first();

        let mut points = sorted.points().to_vec();
        points.dedup_by_key(|p| p.end);
        points.into_iter().rev().map(|p| p.val).collect()
    }

    fn calculate_yoy_growth(&self, values: &[f64]) -> Option<f64> {
        if values.len() < 2 {
            return None;
        }
        let current = values[values.len() - 1];
        let previous = values[values.len() - 2];
        if previous == 0.0 {
            return None;
        }
        let growth = (current - previous) / previous.abs();
        growth.is_finite().then_some(growth)
    }

    fn calculate_cagr(&self, values: &[f64]) -> Option<f64> {
        if values.len() < CAGR_YEARS {
            return None;
        }
        let current = values[values.len() - 1];
        let base = values[values.len() - CAGR_YEARS];
        if base <= 0.0 {
            return None;
        }
        let cagr = (current / base).powf(1.0 / CAGR_YEARS as f64) - 1.0;
        cagr.is_finite().then_some(cagr)
    }

    /// Growth rates for every growth concept with at least two reported periods.
    pub fn compute_growth(&self, statements: &FinancialStatementView) -> GrowthMetrics {
        let mut growth = GrowthMetrics::new();
        for concept in GROWTH_CONCEPTS {
            let Some(series) = statements.series(concept) else {
                continue;
            };
            let values = self.chronological_values(series);
            if values.len() < 2 {
                continue;
            }
            growth.insert(
                concept,
                GrowthRates {
                    yoy_growth: self.calculate_yoy_growth(&values),
                    cagr_5y: self.calculate_cagr(&values),
                },
            );
        }
        growth
    }
}

impl Default for GrowthEngine {
    fn default() -> Self {
        Self::new()
    }
}
