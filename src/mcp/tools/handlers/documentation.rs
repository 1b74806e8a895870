//! Documentation tool handlers: search and listings.

use crate::Result;
use crate::mcp::tool_types::{NoArgs, parse_arguments};
use crate::models::{DocumentationQuery, Technology};
use crate::services::ServiceContainer;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::super::ToolResult;

#[derive(Debug, Serialize)]
struct CategoriesPayload {
    categories: BTreeMap<&'static str, &'static str>,
}

#[derive(Debug, Serialize)]
struct TechnologiesPayload {
    technologies: &'static [Technology],
}

/// Executes `search_documentation`.
///
/// # Errors
///
/// Returns a validation error for malformed arguments or an invalid query.
pub fn execute_search_documentation(
    services: &ServiceContainer,
    arguments: Value,
) -> Result<ToolResult> {
    let query: DocumentationQuery = parse_arguments(arguments)?;
    let result = services.search_documentation(&query)?;
    ToolResult::json(&result)
}

/// Executes `get_categories`.
///
/// # Errors
///
/// Returns a validation error if any argument is given.
pub fn execute_get_categories(services: &ServiceContainer, arguments: Value) -> Result<ToolResult> {
    let NoArgs {} = parse_arguments(arguments)?;
    let categories = services
        .documentation()
        .categories()
        .iter()
        .copied()
        .collect();
    ToolResult::json(&CategoriesPayload { categories })
}

/// Executes `get_technologies`.
///
/// # Errors
///
/// Returns a validation error if any argument is given.
pub fn execute_get_technologies(
    services: &ServiceContainer,
    arguments: Value,
) -> Result<ToolResult> {
    let NoArgs {} = parse_arguments(arguments)?;
    ToolResult::json(&TechnologiesPayload {
        technologies: services.documentation().technologies(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::ToolContent;
    use serde_json::json;

    fn payload(result: &ToolResult) -> Value {
        let ToolContent::Text { text } = &result.content[0];
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_search_documentation_with_technology() {
        let services = ServiceContainer::default();
        let result = execute_search_documentation(
            &services,
            json!({"query": "clerk authentication", "technology": "clerk", "min_similarity": 0.1}),
        )
        .unwrap();
        let body = payload(&result);

        assert_eq!(body["results"][0]["chunk"]["chunk_id"], "clerk_001");
        assert_eq!(body["query_metadata"]["filters_applied"]["technology"], "Clerk");
    }

    #[test]
    fn test_search_documentation_unknown_category() {
        let services = ServiceContainer::default();
        let err = execute_search_documentation(
            &services,
            json!({"query": "anything", "category": "recipes"}),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("category"));
    }
}
