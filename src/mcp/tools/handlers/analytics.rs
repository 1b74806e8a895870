//! Analytics tool handlers: metrics, coordination patterns and insights.

use crate::Result;
use crate::mcp::tool_types::parse_arguments;
use crate::models::{InsightRequest, MetricRequest, PatternRequest};
use crate::services::ServiceContainer;
use serde_json::Value;

use super::super::ToolResult;

/// Executes `store_agent_metric`.
///
/// # Errors
///
/// Returns a validation error for malformed arguments or measurements.
pub fn execute_store_metric(services: &ServiceContainer, arguments: Value) -> Result<ToolResult> {
    let request: MetricRequest = parse_arguments(arguments)?;
    let receipt = services.store_metric(request)?;
    ToolResult::json(&receipt)
}

/// Executes `analyze_coordination_patterns`.
///
/// # Errors
///
/// Returns a validation error for malformed arguments or metrics.
pub fn execute_analyze_pattern(
    services: &ServiceContainer,
    arguments: Value,
) -> Result<ToolResult> {
    let request: PatternRequest = parse_arguments(arguments)?;
    let analysis = services.analyze_pattern(request)?;
    ToolResult::json(&analysis)
}

/// Executes `generate_agent_insights`.
///
/// # Errors
///
/// Returns a validation error for a malformed time range or focus area.
pub fn execute_generate_insights(
    services: &ServiceContainer,
    arguments: Value,
) -> Result<ToolResult> {
    let request: InsightRequest = parse_arguments(arguments)?;
    let report = services.generate_insights(&request)?;
    ToolResult::json(&report)
}
