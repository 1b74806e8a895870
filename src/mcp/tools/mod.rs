//! MCP tool implementations.
//!
//! # Module Structure
//!
//! - [`definitions`]: Tool schema definitions (JSON Schema for input validation)
//! - [`handlers`]: Tool execution logic
//!   - `handlers::observations`: store and search observations
//!   - `handlers::analytics`: metrics, coordination patterns and insights
//!   - `handlers::documentation`: documentation search and listings

mod definitions;
mod handlers;

use crate::services::ServiceContainer;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of MCP tools bound to one service container.
#[derive(Clone)]
pub struct ToolRegistry {
    /// Available tools.
    tools: HashMap<String, ToolDefinition>,
    /// Services the tools operate on.
    services: Arc<ServiceContainer>,
}

impl ToolRegistry {
    /// Creates a registry with every observer tool.
    #[must_use]
    pub fn new(services: Arc<ServiceContainer>) -> Self {
        let observations = &services.config().observations;
        let tools = [
            definitions::store_observation_tool(observations),
            definitions::search_observations_tool(observations),
            definitions::store_metric_tool(observations),
            definitions::analyze_patterns_tool(observations),
            definitions::generate_insights_tool(),
            definitions::search_documentation_tool(),
            definitions::categories_tool(),
            definitions::technologies_tool(),
        ]
        .into_iter()
        .map(|tool| (tool.name.clone(), tool))
        .collect();

        Self { tools, services }
    }

    /// Returns all tool definitions, sorted by name.
    #[must_use]
    pub fn list_tools(&self) -> Vec<&ToolDefinition> {
        let mut tools: Vec<_> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Gets a tool definition by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Executes a tool with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an unknown tool or invalid
    /// arguments, and the service error if the operation fails.
    pub fn execute(&self, name: &str, arguments: Value) -> Result<ToolResult> {
        let services = self.services.as_ref();
        match name {
            "store_agent_observation" => handlers::execute_store_observation(services, arguments),
            "search_agent_observations" => {
                handlers::execute_search_observations(services, arguments)
            },
            "store_agent_metric" => handlers::execute_store_metric(services, arguments),
            "analyze_coordination_patterns" => {
                handlers::execute_analyze_pattern(services, arguments)
            },
            "generate_agent_insights" => handlers::execute_generate_insights(services, arguments),
            "search_documentation" => handlers::execute_search_documentation(services, arguments),
            "get_categories" => handlers::execute_get_categories(services, arguments),
            "get_technologies" => handlers::execute_get_technologies(services, arguments),
            _ => Err(Error::validation("name", format!("Unknown tool: {name}"))),
        }
    }
}

/// Definition of an MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for input validation.
    pub input_schema: Value,
}

/// Result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the result represents an error.
    #[serde(default)]
    pub is_error: bool,
}

impl ToolResult {
    /// Wraps `payload` as pretty-printed JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized.
    pub fn json<T: Serialize>(payload: &T) -> Result<Self> {
        let text = serde_json::to_string_pretty(payload)
            .map_err(|e| Error::internal("serialize_tool_result", e))?;
        Ok(Self {
            content: vec![ToolContent::Text { text }],
            is_error: false,
        })
    }
}

/// Content types that can be returned by tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        ToolRegistry::new(Arc::new(ServiceContainer::default()))
    }

    fn payload(result: &ToolResult) -> Value {
        let ToolContent::Text { text } = &result.content[0];
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_tool_registry_lists_all_tools_sorted() {
        let registry = registry();
        let names: Vec<_> = registry
            .list_tools()
            .iter()
            .map(|t| t.name.as_str())
            .collect();

        assert_eq!(
            names,
            vec![
                "analyze_coordination_patterns",
                "generate_agent_insights",
                "get_categories",
                "get_technologies",
                "search_agent_observations",
                "search_documentation",
                "store_agent_metric",
                "store_agent_observation",
            ]
        );
    }

    #[test]
    fn test_tool_definitions() {
        let registry = registry();
        let store = registry.get_tool("store_agent_observation").unwrap();
        let required = store.input_schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("content")));
        assert!(required.contains(&json!("analysis")));
        assert_eq!(
            store.input_schema["properties"]["category"]["enum"]
                .as_array()
                .unwrap()
                .len(),
            6
        );
        // An empty agent allow-list leaves the field open.
        assert!(
            store.input_schema["properties"]["agent_type"]
                .get("enum")
                .is_none()
        );

        let metric = registry.get_tool("store_agent_metric").unwrap();
        assert!(
            metric.input_schema["properties"]["metric_type"]["enum"]
                .as_array()
                .unwrap()
                .contains(&json!("response_time"))
        );
    }

    #[test]
    fn test_agent_allow_list_constrains_every_agent_field() {
        let mut config = crate::ObserverConfig::default();
        config.observations.agent_types = vec!["backend".to_string(), "testing".to_string()];
        let registry = ToolRegistry::new(Arc::new(ServiceContainer::new(config)));

        let expected = json!(["backend", "testing"]);
        let schema = |tool: &str| registry.get_tool(tool).unwrap().input_schema.clone();
        assert_eq!(
            schema("store_agent_observation")["properties"]["agent_type"]["enum"],
            expected
        );
        assert_eq!(schema("store_agent_metric")["properties"]["agent_type"]["enum"], expected);
        assert_eq!(
            schema("analyze_coordination_patterns")["properties"]["agent_sequence"]["items"]
                ["enum"],
            expected
        );
    }

    #[test]
    fn test_execute_unknown_tool() {
        let err = registry().execute("delete_everything", json!({})).unwrap_err();
        assert_eq!(err.rpc_code(), -32602);
        assert!(err.to_string().contains("Unknown tool"));
    }

    #[test]
    fn test_execute_get_categories() {
        let result = registry().execute("get_categories", json!({})).unwrap();
        assert!(!result.is_error);
        let categories = payload(&result);
        assert_eq!(
            categories["categories"]["mcp"],
            "Model Context Protocol related documentation"
        );
    }

    #[test]
    fn test_execute_get_technologies() {
        let result = registry().execute("get_technologies", json!({})).unwrap();
        let technologies = payload(&result)["technologies"].as_array().unwrap().clone();
        assert_eq!(technologies.len(), 9);
        assert!(technologies.iter().any(|t| t["name"] == "Convex"));
    }

    #[test]
    fn test_execute_rejects_unexpected_arguments() {
        let err = registry()
            .execute("get_categories", json!({"verbose": true}))
            .unwrap_err();
        assert_eq!(err.field(), Some("verbose"));
    }
}
