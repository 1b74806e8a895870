//! Business logic services.
//!
//! Each store owns one collection and validates its input before mutating
//! it. [`ServiceContainer`] composes the stores behind a single lock and is
//! the only handle transports hold.

mod container;
mod documentation;
mod insights;
mod metrics;
mod observations;
mod patterns;
pub mod similarity;

pub use container::ServiceContainer;
pub use documentation::{DocumentationIndex, INDEX_FILE};
pub use insights::InsightGenerator;
pub use metrics::MetricAggregator;
pub use observations::ObservationStore;
pub use patterns::{PatternAnalyzer, effectiveness, suggestions};

use crate::{Error, Result};

/// Trims `value`, rejecting it if nothing is left.
pub(crate) fn require_text(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        Err(Error::validation(field, "is required"))
    } else {
        Ok(value.to_string())
    }
}

/// Trims `value` and checks it against the `allowed` agent types.
///
/// An empty allow-list accepts any non-empty tag.
pub(crate) fn require_agent_type(field: &str, value: &str, allowed: &[String]) -> Result<String> {
    let agent_type = require_text(field, value)?;
    if crate::config::allows(allowed, &agent_type) {
        Ok(agent_type)
    } else {
        Err(Error::validation(
            field,
            format!(
                "'{agent_type}' is not an accepted agent type (expected one of: {})",
                allowed.join(", ")
            ),
        ))
    }
}
