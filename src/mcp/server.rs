//! MCP server setup and lifecycle.
//!
//! Implements a line-delimited JSON-RPC 2.0 server over stdio, or over HTTP
//! (`POST /mcp`) with the `http` feature. Stdout carries only protocol
//! frames; logs go to stderr or a file.

use super::dispatch::McpMethod;
use crate::mcp::ToolRegistry;
use crate::services::ServiceContainer;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::sync::Arc;
use std::time::Instant;
use tracing::info_span;

/// Maximum request size (1 MiB).
const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;

/// MCP protocol version.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name reported during initialization.
const SERVER_NAME: &str = "vector-search";

const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

/// Transport type for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Standard input/output.
    #[default]
    Stdio,
    /// HTTP transport.
    Http,
}

impl Transport {
    /// Returns the transport name used in logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        }
    }
}

/// MCP server for the observer.
#[derive(Clone)]
pub struct McpServer {
    /// Tool registry.
    tools: ToolRegistry,
    /// Transport type.
    transport: Transport,
    /// HTTP port (if using HTTP transport).
    port: u16,
}

impl McpServer {
    /// Creates a server exposing the tools of `services`.
    #[must_use]
    pub fn new(services: Arc<ServiceContainer>) -> Self {
        Self {
            tools: ToolRegistry::new(services),
            transport: Transport::Stdio,
            port: 3000,
        }
    }

    /// Sets the transport type.
    #[must_use]
    pub const fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Sets the HTTP port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// The tool registry.
    #[must_use]
    pub const fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Starts the MCP server and blocks until the transport closes.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be read, written or bound.
    pub fn start(&self) -> Result<()> {
        tracing::info!(transport = self.transport.as_str(), "Starting MCP server");
        match self.transport {
            Transport::Stdio => self.run_stdio(),
            Transport::Http => self.run_http(),
        }
    }

    /// Runs the server over stdio.
    fn run_stdio(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        let reader = BufReader::new(stdin.lock());

        for line in reader.lines() {
            let line = line.map_err(|e| Error::internal("read_stdin", e))?;

            if line.trim().is_empty() {
                continue;
            }

            let Some(response) = self.handle_request(&line) else {
                continue;
            };

            writeln!(stdout, "{response}").map_err(|e| Error::internal("write_stdout", e))?;
            stdout
                .flush()
                .map_err(|e| Error::internal("flush_stdout", e))?;
        }

        tracing::info!("Stdin closed, shutting down");
        Ok(())
    }

    /// Runs the server over HTTP.
    #[cfg(feature = "http")]
    fn run_http(&self) -> Result<()> {
        use axum::http::header;
        use axum::{Router, routing::post};
        use tower_http::set_header::SetResponseHeaderLayer;
        use tower_http::trace::TraceLayer;

        let state = Arc::new(self.clone());

        let app = Router::new()
            .route("/mcp", post(handle_http_request))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                header::HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_FRAME_OPTIONS,
                header::HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::CONTENT_SECURITY_POLICY,
                header::HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::CACHE_CONTROL,
                header::HeaderValue::from_static("no-store"),
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let rt =
            tokio::runtime::Runtime::new().map_err(|e| Error::internal("create_runtime", e))?;

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.port));
        tracing::info!(port = self.port, "Starting MCP HTTP server");

        rt.block_on(async {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .map_err(|e| Error::internal("bind", e))?;

            axum::serve(listener, app)
                .await
                .map_err(|e| Error::internal("serve", e))
        })
    }

    /// Runs the server over HTTP (feature not enabled).
    #[cfg(not(feature = "http"))]
    fn run_http(&self) -> Result<()> {
        Err(Error::internal("run_http", "http feature not enabled"))
    }

    /// Handles one JSON-RPC message.
    ///
    /// Returns `None` for notifications (messages without an `id`), which
    /// are never answered.
    #[must_use]
    pub fn handle_request(&self, request: &str) -> Option<String> {
        if request.len() > MAX_REQUEST_BODY_SIZE {
            tracing::warn!(
                request_size = request.len(),
                max_size = MAX_REQUEST_BODY_SIZE,
                "Request exceeds maximum size limit"
            );
            return Some(format_error(
                Value::Null,
                &DispatchError::new(
                    INVALID_REQUEST,
                    format!(
                        "Request too large: {} bytes (max: {MAX_REQUEST_BODY_SIZE} bytes)",
                        request.len()
                    ),
                ),
            ));
        }

        let start = Instant::now();
        let transport_label = self.transport.as_str();

        let span = info_span!(
            "mcp.request",
            transport = transport_label,
            rpc.method = tracing::field::Empty,
            rpc.id = tracing::field::Empty,
            status = tracing::field::Empty
        );
        let _guard = span.enter();

        let mut method_label = "invalid";
        let (response, status_label) = match parse_request(request) {
            Ok(req) => {
                let method = McpMethod::parse(&req.method);
                method_label = method.label();
                span.record("rpc.method", req.method.as_str());
                if let Some(id) = &req.id {
                    span.record("rpc.id", id.to_string().as_str());
                }

                tracing::debug!(method = %req.method, "Processing MCP request");

                let silent = method.is_notification();
                let result = self.dispatch_method(method, req.params);
                let status_label = if result.is_ok() { "success" } else { "error" };
                span.record("status", status_label);

                // notifications are never answered, even on failure
                let response = req
                    .id
                    .filter(|_| !silent)
                    .map(|id| format_response(id, result));
                (response, status_label)
            },
            Err(error) => {
                span.record("status", "invalid");
                (Some(format_error(Value::Null, &error)), "invalid")
            },
        };

        metrics::counter!(
            "mcp_requests_total",
            "method" => method_label,
            "transport" => transport_label,
            "status" => status_label
        )
        .increment(1);
        metrics::histogram!(
            "mcp_request_duration_ms",
            "method" => method_label,
            "transport" => transport_label
        )
        .record(start.elapsed().as_secs_f64() * 1000.0);

        response
    }

    /// Dispatches a method call.
    fn dispatch_method(&self, method: McpMethod, params: Option<Value>) -> DispatchResult {
        match method {
            McpMethod::Initialize => Ok(self.handle_initialize()),
            McpMethod::Initialized => Ok(Value::Null),
            McpMethod::ListTools => Ok(self.handle_list_tools()),
            McpMethod::CallTool => self.handle_call_tool(params),
            McpMethod::Ping => Ok(serde_json::json!({})),
            McpMethod::Unknown(name) => Err(DispatchError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {name}"),
            )),
        }
    }

    /// Handles the initialize method.
    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    /// Handles tools/list.
    fn handle_list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .tools
            .list_tools()
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect();

        serde_json::json!({ "tools": tools })
    }

    /// Handles tools/call.
    fn handle_call_tool(&self, params: Option<Value>) -> DispatchResult {
        let params =
            params.ok_or_else(|| DispatchError::new(INVALID_PARAMS, "Missing params"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| DispatchError::new(INVALID_PARAMS, "Missing tool name"))?;
        let span = info_span!("mcp.tool.call", tool.name = name);
        let _guard = span.enter();
        let start = Instant::now();

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => serde_json::json!({}),
            Some(arguments) => arguments.clone(),
        };

        let (result, status_label) = match self.tools.execute(name, arguments) {
            Ok(result) => (
                Ok(serde_json::json!({
                    "content": result.content,
                    "isError": result.is_error
                })),
                "success",
            ),
            Err(e) => {
                tracing::warn!(
                    tool = name,
                    error_type = e.error_type(),
                    field = e.field(),
                    error = %e,
                    "Tool call failed"
                );
                (Err(DispatchError::from(e)), "error")
            },
        };

        metrics::counter!(
            "mcp_tool_calls_total",
            "tool" => name.to_string(),
            "status" => status_label
        )
        .increment(1);
        metrics::histogram!("mcp_tool_duration_ms", "tool" => name.to_string())
            .record(start.elapsed().as_secs_f64() * 1000.0);

        result
    }
}

/// A JSON-RPC error produced while handling a request.
#[derive(Debug, Clone, PartialEq)]
struct DispatchError {
    code: i32,
    message: String,
    data: Option<Value>,
}

impl DispatchError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl From<Error> for DispatchError {
    fn from(error: Error) -> Self {
        Self {
            code: error.rpc_code(),
            data: Some(serde_json::json!({
                "error_type": error.error_type(),
                "field": error.field(),
            })),
            message: error.to_string(),
        }
    }
}

/// Result type for method dispatch.
type DispatchResult = std::result::Result<Value, DispatchError>;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC version (required by protocol but not used in code).
    #[serde(rename = "jsonrpc", default)]
    _jsonrpc: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
}

/// A request that named a method.
struct ParsedRequest {
    id: Option<Value>,
    method: String,
    params: Option<Value>,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

/// JSON-RPC error.
#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

/// Parses one message: unparsable JSON is a parse error, anything that is
/// not a request object with a method is an invalid request.
fn parse_request(request: &str) -> std::result::Result<ParsedRequest, DispatchError> {
    let value: Value = serde_json::from_str(request)
        .map_err(|e| DispatchError::new(PARSE_ERROR, format!("Parse error: {e}")))?;
    let req: JsonRpcRequest = serde_json::from_value(value)
        .map_err(|e| DispatchError::new(INVALID_REQUEST, format!("Invalid Request: {e}")))?;
    let method = req
        .method
        .ok_or_else(|| DispatchError::new(INVALID_REQUEST, "Invalid Request: missing method"))?;

    Ok(ParsedRequest {
        id: req.id,
        method,
        params: req.params,
    })
}

/// Formats a response for `id`.
fn format_response(id: Value, result: DispatchResult) -> String {
    match result {
        Ok(value) => {
            let response = JsonRpcResponse {
                jsonrpc: "2.0",
                id,
                result: Some(value),
                error: None,
            };
            serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
        },
        Err(error) => format_error(id, &error),
    }
}

/// Formats an error response.
fn format_error(id: Value, error: &DispatchError) -> String {
    let response = JsonRpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(JsonRpcError {
            code: error.code,
            message: error.message.clone(),
            data: error.data.clone(),
        }),
    };
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

/// HTTP request handler: one JSON-RPC message per POST body.
#[cfg(feature = "http")]
async fn handle_http_request(
    axum::extract::State(server): axum::extract::State<Arc<McpServer>>,
    body: String,
) -> axum::response::Response {
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;

    let status = if body.len() > MAX_REQUEST_BODY_SIZE {
        StatusCode::PAYLOAD_TOO_LARGE
    } else {
        StatusCode::OK
    };

    match server.handle_request(&body) {
        Some(response) => (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            response,
        )
            .into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> McpServer {
        McpServer::new(Arc::new(ServiceContainer::default()))
    }

    fn call(server: &McpServer, request: &str) -> Value {
        let response = server.handle_request(request).unwrap();
        serde_json::from_str(&response).unwrap()
    }

    #[test]
    fn test_mcp_server_creation() {
        let server = server();
        assert_eq!(server.transport, Transport::Stdio);
        assert_eq!(server.port, 3000);
    }

    #[test]
    fn test_with_transport() {
        let server = server().with_transport(Transport::Http).with_port(8080);
        assert_eq!(server.transport, Transport::Http);
        assert_eq!(server.port, 8080);
    }

    #[test]
    fn test_handle_initialize() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        );

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], SERVER_NAME);
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[test]
    fn test_notifications_are_not_answered() {
        let server = server();
        assert!(
            server
                .handle_request(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .is_none()
        );
        assert!(
            server
                .handle_request(r#"{"jsonrpc":"2.0","method":"initialized"}"#)
                .is_none()
        );
        assert!(
            server
                .handle_request(r#"{"jsonrpc":"2.0","id":5,"method":"initialized"}"#)
                .is_none()
        );
    }

    #[test]
    fn test_handle_list_tools() {
        let response = call(&server(), r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#);
        let tools = response["result"]["tools"].as_array().unwrap();

        assert_eq!(tools.len(), 8);
        assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
    }

    #[test]
    fn test_handle_ping() {
        let response = call(&server(), r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#);
        assert_eq!(response["id"], "p");
        assert!(response["result"].is_object());
    }

    #[test]
    fn test_handle_unknown_method() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#,
        );
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(
            response["error"]["message"],
            "Method not found: resources/list"
        );
    }

    #[test]
    fn test_handle_parse_error() {
        let response = call(&server(), "{not json");
        assert_eq!(response["error"]["code"], -32700);
        assert!(response["id"].is_null());
    }

    #[test]
    fn test_handle_missing_method() {
        let response = call(&server(), r#"{"jsonrpc":"2.0","id":3}"#);
        assert_eq!(response["error"]["code"], -32600);

        let response = call(&server(), "[1, 2]");
        assert_eq!(response["error"]["code"], -32600);
    }

    #[test]
    fn test_handle_oversized_request() {
        let request = format!(
            r#"{{"jsonrpc":"2.0","id":1,"method":"ping","params":"{}"}}"#,
            "x".repeat(MAX_REQUEST_BODY_SIZE)
        );
        let response = call(&server(), &request);
        assert_eq!(response["error"]["code"], -32600);
    }

    #[test]
    fn test_call_tool_validation_error_carries_field() {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": {
                "name": "search_agent_observations",
                "arguments": {"query": "x", "limit": 0}
            }
        });
        let response = call(&server(), &request.to_string());

        assert_eq!(response["id"], 7);
        assert_eq!(response["error"]["code"], -32602);
        assert_eq!(response["error"]["data"]["error_type"], "ValidationError");
        assert_eq!(response["error"]["data"]["field"], "limit");
    }

    #[test]
    fn test_call_tool_missing_name() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{}}"#,
        );
        assert_eq!(response["error"]["code"], -32602);
        assert_eq!(response["error"]["message"], "Missing tool name");
    }

    #[test]
    fn test_call_tool_success_wraps_text_content() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"get_categories"}}"#,
        );

        assert_eq!(response["result"]["isError"], false);
        assert_eq!(response["result"]["content"][0]["type"], "text");
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert!(payload["categories"].is_object());
    }

    #[test]
    fn test_dispatch_error_from_internal_error() {
        let error = DispatchError::from(Error::internal("store", "Lock poisoned"));
        assert_eq!(error.code, -32603);
        assert_eq!(
            error.data,
            Some(serde_json::json!({"error_type": "InternalError", "field": null}))
        );
    }
}
