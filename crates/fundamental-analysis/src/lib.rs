//! Fundamental side of the aggregation: tag-alias resolution over raw XBRL
//! facts, ratio composition and statement growth rates.

pub mod growth;
pub mod ratios;
pub mod resolver;

pub use growth::{GrowthEngine, GROWTH_CONCEPTS};
pub use ratios::RatioEngine;
pub use resolver::ConceptResolver;
