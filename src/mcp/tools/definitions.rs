//! Tool definitions for MCP tools.
//!
//! JSON Schemas for every tool. Vocabulary enums follow the configured
//! allow-lists so the advertised schema matches what validation accepts.

use super::ToolDefinition;
use crate::config::ObservationSettings;
use crate::models::{CATEGORY_DESCRIPTIONS, Complexity, MetricType, TECHNOLOGIES};
use serde_json::{Value, json};

/// String schema, constrained to `values` when the list is non-empty.
fn vocabulary(description: &str, values: &[String]) -> Value {
    if values.is_empty() {
        json!({ "type": "string", "description": description })
    } else {
        json!({ "type": "string", "description": description, "enum": values })
    }
}

fn complexity_levels() -> Vec<&'static str> {
    Complexity::all().iter().map(Complexity::as_str).collect()
}

fn metric_types() -> Vec<&'static str> {
    MetricType::all().iter().map(MetricType::as_str).collect()
}

fn time_range_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "description": description,
        "properties": {
            "start": { "type": "string", "format": "date-time" },
            "end": { "type": "string", "format": "date-time" }
        },
        "additionalProperties": false
    })
}

/// Defines `store_agent_observation`.
pub fn store_observation_tool(settings: &ObservationSettings) -> ToolDefinition {
    ToolDefinition {
        name: "store_agent_observation".to_string(),
        description: "Store an observation about agent behavior, performance or coordination \
                      for later similarity search and insight generation"
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "agent_type": vocabulary("Agent making the observation", &settings.agent_types),
                "task_id": { "type": "string", "description": "Task identifier" },
                "project_id": { "type": "string", "description": "Project identifier" },
                "category": vocabulary("Observation category", &settings.categories),
                "content": {
                    "type": "string",
                    "description": "Human-readable description of the observation",
                    "minLength": settings.min_content_length,
                    "maxLength": settings.max_content_length
                },
                "observation_data": {
                    "type": "object",
                    "description": "Structured observation data (metrics, context)"
                },
                "analysis": {
                    "type": "object",
                    "description": "Analysis of the observation",
                    "properties": {
                        "trend": {
                            "type": "string",
                            "enum": ["improving", "declining", "stable", "anomaly"]
                        },
                        "confidence": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
                        "impact": { "type": "string", "enum": ["high", "medium", "low"] }
                    }
                },
                "recommendations": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Improvement recommendations"
                },
                "complexity": {
                    "type": "string",
                    "description": "Task complexity (default: medium)",
                    "enum": complexity_levels()
                },
                "feature": { "type": "string", "description": "Feature or component" },
                "environment": {
                    "type": "string",
                    "description": "Environment (default: development)"
                },
                "dependencies": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Agents or tasks this work depended on"
                },
                "correlations": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Related observations or patterns"
                }
            },
            "required": [
                "agent_type", "task_id", "project_id", "category", "content",
                "observation_data", "analysis"
            ]
        }),
    }
}

/// Defines `search_agent_observations`.
pub fn search_observations_tool(settings: &ObservationSettings) -> ToolDefinition {
    ToolDefinition {
        name: "search_agent_observations".to_string(),
        description: "Search stored agent observations by similarity with optional filters"
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Natural language search query" },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results (1-100)",
                    "default": 10,
                    "minimum": 1,
                    "maximum": 100
                },
                "min_similarity": {
                    "type": "number",
                    "description": "Minimum similarity threshold (0.0-1.0)",
                    "default": 0.3,
                    "minimum": 0.0,
                    "maximum": 1.0
                },
                "agent_type": vocabulary("Filter by agent type", &settings.agent_types),
                "category": vocabulary("Filter by category", &settings.categories),
                "project_id": { "type": "string", "description": "Filter by project" },
                "task_id": { "type": "string", "description": "Filter by task" },
                "complexity": {
                    "type": "string",
                    "description": "Filter by complexity",
                    "enum": complexity_levels()
                },
                "time_range": time_range_schema("Filter by creation time")
            },
            "required": ["query"]
        }),
    }
}

/// Defines `store_agent_metric`.
pub fn store_metric_tool(settings: &ObservationSettings) -> ToolDefinition {
    ToolDefinition {
        name: "store_agent_metric".to_string(),
        description: "Append measurements to an agent metric series and return live statistics"
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "agent_type": vocabulary("Agent being measured", &settings.agent_types),
                "metric_type": {
                    "type": "string",
                    "description": "Metric being recorded",
                    "enum": metric_types()
                },
                "project_id": { "type": "string", "description": "Project context" },
                "measurements": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "timestamp": { "type": "string", "format": "date-time" },
                            "value": { "type": "number" },
                            "context": { "type": "object" }
                        },
                        "required": ["timestamp", "value"]
                    }
                },
                "thresholds": {
                    "type": "object",
                    "description": "Rating boundaries, fixed when the series is created",
                    "properties": {
                        "excellent": { "type": "number" },
                        "good": { "type": "number" },
                        "acceptable": { "type": "number" },
                        "poor": { "type": "number" }
                    },
                    "additionalProperties": false
                },
                "aggregation_period": {
                    "type": "string",
                    "description": "Aggregation period (default: hour)",
                    "enum": ["minute", "hour", "day", "week"]
                }
            },
            "required": ["agent_type", "metric_type", "project_id", "measurements"]
        }),
    }
}

/// Defines `analyze_coordination_patterns`.
pub fn analyze_patterns_tool(settings: &ObservationSettings) -> ToolDefinition {
    ToolDefinition {
        name: "analyze_coordination_patterns".to_string(),
        description: "Score a multi-agent coordination pattern and suggest optimizations"
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "agent_sequence": {
                    "type": "array",
                    "items": vocabulary("Agent type", &settings.agent_types),
                    "minItems": 2,
                    "description": "Ordered agents taking part"
                },
                "pattern_name": { "type": "string", "description": "Pattern name" },
                "project_context": {
                    "type": "string",
                    "description": "Project where the pattern was observed"
                },
                "success_metrics": {
                    "type": "object",
                    "properties": {
                        "completion_rate": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
                        "average_duration": {
                            "type": "number",
                            "minimum": 0.0,
                            "description": "Hours"
                        },
                        "quality_score": { "type": "number", "minimum": 0.0, "maximum": 1.0 },
                        "conflict_rate": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
                    }
                },
                "applicable_scenarios": {
                    "type": "array",
                    "items": { "type": "string" }
                },
                "complexity_suitability": {
                    "type": "array",
                    "items": { "type": "string", "enum": complexity_levels() }
                },
                "resource_requirements": { "type": "object" },
                "historical_performance": { "type": "array", "items": { "type": "object" } }
            },
            "required": ["agent_sequence", "pattern_name", "project_context"]
        }),
    }
}

/// Defines `generate_agent_insights`.
pub fn generate_insights_tool() -> ToolDefinition {
    ToolDefinition {
        name: "generate_agent_insights".to_string(),
        description: "Summarize observations, metrics and patterns into trends, \
                      recommendations and optional predictions"
            .to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "agent_type": { "type": "string", "description": "Restrict to one agent type" },
                "project_id": { "type": "string", "description": "Restrict to one project" },
                "time_range": time_range_schema("Restrict to a time window"),
                "focus_areas": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Metric types or observation categories to concentrate on"
                },
                "include_predictions": {
                    "type": "boolean",
                    "default": false,
                    "description": "Include naive linear predictions per metric type"
                }
            }
        }),
    }
}

/// Defines `search_documentation`.
pub fn search_documentation_tool() -> ToolDefinition {
    let categories: Vec<&str> = CATEGORY_DESCRIPTIONS.iter().map(|(name, _)| *name).collect();
    let technologies: Vec<&str> = TECHNOLOGIES.iter().map(|tech| tech.name).collect();

    ToolDefinition {
        name: "search_documentation".to_string(),
        description: "Search technical documentation using natural language queries".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Natural language search query" },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results (1-100)",
                    "default": 10,
                    "minimum": 1,
                    "maximum": 100
                },
                "category": {
                    "type": "string",
                    "description": "Filter by documentation category",
                    "enum": categories
                },
                "technology": {
                    "type": "string",
                    "description": "Filter by technology",
                    "enum": technologies
                },
                "doc_type": { "type": "string", "description": "Filter by content kind" },
                "min_similarity": {
                    "type": "number",
                    "description": "Minimum similarity threshold (0.0-1.0)",
                    "default": 0.3,
                    "minimum": 0.0,
                    "maximum": 1.0
                }
            },
            "required": ["query"]
        }),
    }
}

/// Defines `get_categories`.
pub fn categories_tool() -> ToolDefinition {
    ToolDefinition {
        name: "get_categories".to_string(),
        description: "Get all available documentation categories".to_string(),
        input_schema: json!({ "type": "object", "properties": {} }),
    }
}

/// Defines `get_technologies`.
pub fn technologies_tool() -> ToolDefinition {
    ToolDefinition {
        name: "get_technologies".to_string(),
        description: "Get all supported technologies".to_string(),
        input_schema: json!({ "type": "object", "properties": {} }),
    }
}
