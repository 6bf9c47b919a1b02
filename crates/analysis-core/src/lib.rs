//! Shared data model, error type and provider traits for the aggregation
//! workspace.

pub mod error;
pub mod traits;
pub mod types;

pub use error::*;
pub use traits::*;
pub use types::*;
