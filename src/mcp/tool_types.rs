//! Argument types and helpers for MCP tools.
//!
//! Argument structs use `#[serde(deny_unknown_fields)]` so a misspelled
//! parameter is reported instead of silently ignored.

use crate::models::{Complexity, ObservationFilter, ObservationQuery, TimeRange, TimeRangeArgs};
use crate::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Field reported when a decode error names no field.
const ARGUMENTS_FIELD: &str = "arguments";

/// Decodes tool arguments, mapping decode failures to validation errors.
///
/// # Errors
///
/// Returns [`Error::Validation`] naming the missing or unknown field when
/// serde reports one, and `arguments` otherwise.
pub fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| {
        let message = e.to_string();
        let field = field_from_message(&message).unwrap_or(ARGUMENTS_FIELD);
        Error::validation(field, message.clone())
    })
}

/// Extracts the backtick-quoted field from serde's missing/unknown field
/// messages.
fn field_from_message(message: &str) -> Option<&str> {
    if !(message.starts_with("missing field") || message.starts_with("unknown field")) {
        return None;
    }
    let start = message.find('`')? + 1;
    let len = message[start..].find('`')?;
    Some(&message[start..start + len])
}

/// Arguments for tools that take none.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}

/// Arguments for `search_agent_observations`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchObservationsArgs {
    /// Free-text query.
    pub query: String,
    /// Maximum number of results.
    pub limit: Option<i64>,
    /// Similarity floor in `[0, 1]`.
    pub min_similarity: Option<f64>,
    /// Restrict to one agent type.
    pub agent_type: Option<String>,
    /// Restrict to one category.
    pub category: Option<String>,
    /// Restrict to one project.
    pub project_id: Option<String>,
    /// Restrict to one task.
    pub task_id: Option<String>,
    /// Restrict to one complexity level.
    pub complexity: Option<String>,
    /// Restrict to a creation-time window.
    pub time_range: Option<TimeRangeArgs>,
}

impl SearchObservationsArgs {
    /// Converts the raw arguments into a query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a negative limit, an unknown
    /// complexity or a malformed time range.
    pub fn into_query(self) -> Result<ObservationQuery> {
        let limit = self
            .limit
            .map(|limit| {
                usize::try_from(limit)
                    .map_err(|_| Error::validation("limit", "must be a positive integer"))
            })
            .transpose()?;
        let complexity = Complexity::parse_field(self.complexity.as_deref(), "complexity")?;
        let time_range = self
            .time_range
            .as_ref()
            .map(|range| TimeRange::from_args(range, "time_range"))
            .transpose()?;

        let filter = ObservationFilter {
            agent_type: trimmed(self.agent_type),
            category: trimmed(self.category),
            project_id: trimmed(self.project_id),
            task_id: trimmed(self.task_id),
            complexity,
            time_range,
        };

        Ok(ObservationQuery {
            query: self.query,
            limit,
            min_similarity: self.min_similarity,
            filter,
        })
    }
}

/// Trims a filter value the way stored tags are trimmed; blank means unset.
fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
