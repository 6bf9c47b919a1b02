use analysis_core::{CanonicalConcept, FactSeries, FinancialStatementView, RawFacts};

/// Maps canonical concepts onto provider tags.
///
/// Aliases are tried in priority order and the first tag with a non-empty
/// series wins. A concept with no matching tag is unavailable data, not an
/// error.
pub struct ConceptResolver;

impl ConceptResolver {
    /// First non-empty series among the concept's aliases, with the tag it came from.
    pub fn resolve_series<'a>(
        facts: &'a RawFacts,
        concept: CanonicalConcept,
    ) -> Option<(&'static str, &'a FactSeries)> {
        concept
            .aliases()
            .iter()
            .find_map(|tag| {
                facts
                    .get(*tag)
                    .filter(|series| !series.is_empty())
                    .map(|series| (*tag, series))
            })
    }

    /// Value of the most recent period for `concept`, if any alias resolves.
    pub fn resolve_latest(facts: &RawFacts, concept: CanonicalConcept) -> Option<f64> {
        Self::resolve_series(facts, concept)
            .and_then(|(_, series)| series.latest())
            .map(|point| point.val)
    }

    /// Resolve every canonical concept. Stored series are sorted latest first.
    pub fn build_statement_view(facts: &RawFacts) -> FinancialStatementView {
        let mut view = FinancialStatementView::new();
        for concept in CanonicalConcept::ALL {
            if let Some((tag, series)) = Self::resolve_series(facts, concept) {
                tracing::debug!("Resolved {:?} via tag {} ({} facts)", concept, tag, series.len());
                let mut series = series.clone();
                series.sort_latest_first();
                view.insert(concept, series);
            }
        }
        view
    }
}
