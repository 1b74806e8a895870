//! Observation tool handlers: store and search.

use crate::mcp::tool_types::{SearchObservationsArgs, parse_arguments};
use crate::models::{ObservationFilter, ObservationRequest, SearchResult};
use crate::services::ServiceContainer;
use crate::Result;
use serde::Serialize;
use serde_json::Value;

use super::super::ToolResult;

/// Query echo attached to observation search results.
#[derive(Debug, Serialize)]
struct ObservationQueryMetadata {
    query: String,
    total_results: usize,
    limit: usize,
    min_similarity: f64,
    filters_applied: ObservationFilter,
}

/// `search_agent_observations` payload.
#[derive(Debug, Serialize)]
struct ObservationSearchPayload {
    #[serde(flatten)]
    result: SearchResult,
    query_metadata: ObservationQueryMetadata,
}

/// Executes `store_agent_observation`.
///
/// # Errors
///
/// Returns a validation error for malformed arguments.
pub fn execute_store_observation(
    services: &ServiceContainer,
    arguments: Value,
) -> Result<ToolResult> {
    let request: ObservationRequest = parse_arguments(arguments)?;
    let receipt = services.store_observation(request)?;
    ToolResult::json(&receipt)
}

/// Executes `search_agent_observations`.
///
/// # Errors
///
/// Returns a validation error for malformed arguments or an invalid query.
pub fn execute_search_observations(
    services: &ServiceContainer,
    arguments: Value,
) -> Result<ToolResult> {
    let args: SearchObservationsArgs = parse_arguments(arguments)?;
    let query = args.into_query()?;
    let result = services.search_observations(&query)?;

    let defaults = &services.config().search;
    let query_metadata = ObservationQueryMetadata {
        total_results: result.results.len(),
        limit: query.limit.unwrap_or(defaults.default_limit),
        min_similarity: query
            .min_similarity
            .unwrap_or(defaults.default_min_similarity),
        filters_applied: query.filter,
        query: query.query,
    };

    ToolResult::json(&ObservationSearchPayload {
        result,
        query_metadata,
    })
}
