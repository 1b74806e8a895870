//! MCP server implementation.
//!
//! Exposes the observer to agents over the Model Context Protocol.
//!
//! ## Tools
//!
//! - `store_agent_observation`, `search_agent_observations`
//! - `store_agent_metric`
//! - `analyze_coordination_patterns`
//! - `generate_agent_insights`
//! - `search_documentation`, `get_categories`, `get_technologies`
//!
//! ## Usage
//!
//! ```bash
//! vector-observer serve
//! ```
//!
//! ### Client configuration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "vector-search": {
//!       "command": "vector-observer",
//!       "args": ["serve"]
//!     }
//!   }
//! }
//! ```

// Handlers keep `&self` for a uniform dispatch table.
#![allow(clippy::unused_self)]
// Allow match_same_arms for explicit enum handling with default fallback.
#![allow(clippy::match_same_arms)]

mod dispatch;
mod server;
mod tool_types;
mod tools;

pub use server::{McpServer, Transport};
pub use tools::{ToolContent, ToolDefinition, ToolRegistry, ToolResult};
