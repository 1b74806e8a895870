//! MCP server end-to-end tests.
//!
//! Drives the server through raw JSON-RPC messages, the way an agent talks to
//! it over stdio:
//! - Handshake and tool discovery
//! - Tool execution workflows (store, then search)
//! - Error responses with `error_type` and `field` data
//! - Notifications and malformed frames

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::float_cmp,
    clippy::needless_pass_by_value
)]

use serde_json::{Value, json};
use std::sync::Arc;
use vector_observer::ServiceContainer;
use vector_observer::mcp::McpServer;

fn server() -> McpServer {
    McpServer::new(Arc::new(ServiceContainer::default()))
}

fn rpc(server: &McpServer, id: u64, method: &str, params: Value) -> Value {
    let request = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
    let response = server
        .handle_request(&request.to_string())
        .expect("request with an id must be answered");
    serde_json::from_str(&response).expect("response must be valid JSON")
}

fn call_tool(server: &McpServer, id: u64, name: &str, arguments: Value) -> Value {
    rpc(
        server,
        id,
        "tools/call",
        json!({"name": name, "arguments": arguments}),
    )
}

/// Decodes the JSON payload carried in the first text block of a tool result.
fn tool_payload(response: &Value) -> Value {
    assert!(
        response.get("error").is_none(),
        "unexpected error: {response}"
    );
    let result = &response["result"];
    assert_eq!(result["isError"], false);
    assert_eq!(result["content"][0]["type"], "text");
    serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap()
}

fn observation_args(content: &str) -> Value {
    json!({
        "agent_type": "backend",
        "task_id": "auth-001",
        "project_id": "project-a",
        "category": "performance",
        "content": content,
        "observation_data": {"response_time_ms": 120},
        "analysis": {"trend": "improving", "confidence": 0.9}
    })
}

mod handshake {
    use super::*;

    #[test]
    fn test_initialize_reports_tool_capability() {
        let server = server();
        let response = rpc(&server, 1, "initialize", json!({}));

        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["serverInfo"]["name"], "vector-search");
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[test]
    fn test_initialized_notification_is_silent() {
        let server = server();
        let notification = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        assert!(server.handle_request(&notification.to_string()).is_none());
    }

    #[test]
    fn test_list_tools_exposes_every_tool_with_schema() {
        let server = server();
        let response = rpc(&server, 2, "tools/list", json!({}));
        let tools = response["result"]["tools"].as_array().unwrap();

        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        for expected in [
            "store_agent_observation",
            "search_agent_observations",
            "store_agent_metric",
            "analyze_coordination_patterns",
            "generate_agent_insights",
            "search_documentation",
            "get_categories",
            "get_technologies",
        ] {
            assert!(names.contains(&expected), "missing tool {expected}");
        }

        for tool in tools {
            assert_eq!(tool["inputSchema"]["type"], "object");
            assert!(!tool["description"].as_str().unwrap().is_empty());
        }
    }

    #[test]
    fn test_ping() {
        let server = server();
        let response = rpc(&server, 3, "ping", json!({}));
        assert_eq!(response["result"], json!({}));
    }
}

mod workflows {
    use super::*;

    #[test]
    fn test_store_then_search_observation() {
        let server = server();
        let stored = tool_payload(&call_tool(
            &server,
            1,
            "store_agent_observation",
            observation_args("Successfully implemented user authentication API"),
        ));
        let id = stored["observation_id"].as_str().unwrap().to_string();
        assert_eq!(stored["status"], "stored");

        let found = tool_payload(&call_tool(
            &server,
            2,
            "search_agent_observations",
            json!({"query": "authentication API performance", "min_similarity": 0.1}),
        ));

        assert_eq!(found["total_found"], 1);
        assert_eq!(found["results"][0]["chunk"]["id"], id);
        assert_eq!(found["results"][0]["rank"], 1);
        assert!(found["results"][0]["similarity"].as_f64().unwrap() > 0.1);
        assert_eq!(found["query_metadata"]["query"], "authentication API performance");
    }

    #[test]
    fn test_padded_filter_values_match_stored_tags() {
        let server = server();
        call_tool(
            &server,
            1,
            "store_agent_observation",
            observation_args("Successfully implemented user authentication API"),
        );

        let found = tool_payload(&call_tool(
            &server,
            2,
            "search_agent_observations",
            json!({
                "query": "authentication API",
                "min_similarity": 0.1,
                "agent_type": " backend",
                "category": "performance "
            }),
        ));
        assert_eq!(found["total_found"], 1);
    }

    #[test]
    fn test_metric_pattern_and_insights_round() {
        let server = server();

        let metric = tool_payload(&call_tool(
            &server,
            1,
            "store_agent_metric",
            json!({
                "agent_type": "backend",
                "metric_type": "response_time",
                "project_id": "project-a",
                "measurements": [
                    {"timestamp": "2025-01-15T10:00:00Z", "value": 95, "context": "login"},
                    {"timestamp": "2025-01-15T11:00:00Z", "value": 87}
                ]
            }),
        ));
        assert_eq!(metric["statistics"]["mean"], 91.0);
        assert_eq!(metric["statistics"]["count"], 2);

        let pattern = tool_payload(&call_tool(
            &server,
            2,
            "analyze_coordination_patterns",
            json!({
                "agent_sequence": ["planning", "backend", "testing"],
                "pattern_name": "plan-build-verify",
                "project_context": "project-a",
                "success_metrics": {
                    "completion_rate": 0.95,
                    "quality_score": 0.88,
                    "conflict_rate": 0.05
                }
            }),
        ));
        assert!(pattern["effectiveness_score"].as_f64().unwrap() > 0.8);

        let insights = tool_payload(&call_tool(
            &server,
            3,
            "generate_agent_insights",
            json!({"project_id": "project-a", "include_predictions": true}),
        ));
        assert_eq!(insights["summary"]["total_metrics"], 1);
        assert_eq!(insights["summary"]["total_patterns"], 1);
        assert_eq!(insights["patterns"][0]["pattern_id"], pattern["pattern_id"]);
        assert!(insights["predictions"].is_array());
    }

    #[test]
    fn test_documentation_lookup() {
        let server = server();
        let categories = tool_payload(&call_tool(&server, 1, "get_categories", json!({})));
        assert!(categories["categories"].as_object().unwrap().contains_key("authentication"));

        let docs = tool_payload(&call_tool(
            &server,
            2,
            "search_documentation",
            json!({"query": "clerk authentication", "min_similarity": 0.1}),
        ));
        assert!(!docs["results"].as_array().unwrap().is_empty());
    }
}

mod errors {
    use super::*;

    fn error_of(response: &Value) -> &Value {
        assert!(response.get("result").is_none(), "expected an error: {response}");
        &response["error"]
    }

    #[test]
    fn test_search_limit_out_of_range() {
        let server = server();
        for limit in [0, 101] {
            let response = call_tool(
                &server,
                1,
                "search_agent_observations",
                json!({"query": "authentication", "limit": limit}),
            );
            let error = error_of(&response);
            assert_eq!(error["code"], -32602);
            assert_eq!(error["data"]["error_type"], "ValidationError");
            assert_eq!(error["data"]["field"], "limit");
        }
    }

    #[test]
    fn test_short_agent_sequence() {
        let server = server();
        let response = call_tool(
            &server,
            1,
            "analyze_coordination_patterns",
            json!({
                "agent_sequence": ["backend"],
                "pattern_name": "solo",
                "project_context": "project-a"
            }),
        );
        let error = error_of(&response);
        assert_eq!(error["code"], -32602);
        assert_eq!(error["data"]["field"], "agent_sequence");
    }

    #[test]
    fn test_missing_required_field_is_named() {
        let server = server();
        let mut args = observation_args("Successfully implemented user authentication API");
        args.as_object_mut().unwrap().remove("task_id");

        let response = call_tool(&server, 1, "store_agent_observation", args);
        assert_eq!(error_of(&response)["data"]["field"], "task_id");
    }

    #[test]
    fn test_unknown_tool() {
        let server = server();
        let response = call_tool(&server, 1, "delete_everything", json!({}));
        let error = error_of(&response);
        assert_eq!(error["code"], -32602);
        assert!(error["message"].as_str().unwrap().contains("delete_everything"));
    }

    #[test]
    fn test_unknown_method() {
        let server = server();
        let response = rpc(&server, 9, "resources/list", json!({}));
        assert_eq!(error_of(&response)["code"], -32601);
        assert_eq!(response["id"], 9);
    }

    #[test]
    fn test_malformed_frames() {
        let server = server();

        let response: Value =
            serde_json::from_str(&server.handle_request("{not json").unwrap()).unwrap();
        assert_eq!(error_of(&response)["code"], -32700);
        assert_eq!(response["id"], Value::Null);

        let response: Value =
            serde_json::from_str(&server.handle_request(r#"{"id": 4}"#).unwrap()).unwrap();
        assert_eq!(error_of(&response)["code"], -32600);
    }

    #[test]
    fn test_failed_call_does_not_store() {
        let server = server();
        let mut args = observation_args("short");
        args["content"] = json!("short");
        let response = call_tool(&server, 1, "store_agent_observation", args);
        assert_eq!(error_of(&response)["data"]["field"], "content");

        let insights = tool_payload(&call_tool(&server, 2, "generate_agent_insights", json!({})));
        assert_eq!(insights["summary"]["total_observations"], 0);
    }
}
