//! # Vector Observer
//!
//! An observation store for multi-agent systems, served over MCP.
//!
//! Agents record what happened while they worked (observations), stream
//! numeric measurements (metrics), and describe how they collaborated
//! (coordination patterns). The store answers lexical similarity searches
//! over observations and composes all three collections into trend and
//! prediction summaries.
//!
//! ## Features
//!
//! - In-memory stores behind a single reader/writer lock
//! - Term-vector cosine similarity search with metadata filters
//! - Live metric statistics with threshold ratings
//! - Coordination pattern effectiveness scoring and suggestions
//! - Insight generation with trends and naive linear predictions
//! - MCP server over stdio (and HTTP with the `http` feature)
//!
//! ## Example
//!
//! ```rust
//! use vector_observer::ServiceContainer;
//! use vector_observer::models::ObservationRequest;
//!
//! let services = ServiceContainer::default();
//! let receipt = services.store_observation(ObservationRequest {
//!     agent_type: "backend".to_string(),
//!     task_id: "task-1".to_string(),
//!     project_id: "demo".to_string(),
//!     category: "performance".to_string(),
//!     content: "Successfully implemented user authentication API".to_string(),
//!     observation_data: Some(serde_json::Map::new()),
//!     analysis: Some(serde_json::json!({ "trend": "improving" })),
//!     ..ObservationRequest::default()
//! })?;
//! assert!(receipt.observation_id.as_str().starts_with("obs_"));
//! # Ok::<(), vector_observer::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod mcp;
pub mod models;
pub mod observability;
pub mod services;

pub use config::ObserverConfig;
pub use models::{
    CoordinationPattern, MetricSeries, MetricType, Observation, ObservationFilter, ObservationId,
    SearchHit, SearchResult,
};
pub use services::{DocumentationIndex, ServiceContainer};

/// Error type for observer operations.
///
/// | Variant | Raised When | JSON-RPC code |
/// |---------|-------------|---------------|
/// | `Validation` | Missing fields, out-of-range values, malformed arguments | `-32602` |
/// | `NotFound` | A referenced identifier does not exist | `-32602` |
/// | `OperationFailed` | Lock poisoning, I/O, serialization failures | `-32603` |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Malformed or out-of-range input.
    ///
    /// Always carries the offending field so callers can self-correct.
    #[error("invalid input for '{field}': {reason}")]
    Validation {
        /// Name of the offending field (dotted path for nested values).
        field: String,
        /// The violated constraint.
        reason: String,
    },

    /// A referenced identifier is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// An unexpected internal failure.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds a validation error for `field`.
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Builds an internal error for `operation`.
    #[must_use]
    pub fn internal(operation: impl Into<String>, cause: impl ToString) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }

    /// Returns the wire-level error type name.
    #[must_use]
    pub const fn error_type(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::NotFound(_) => "NotFoundError",
            Self::OperationFailed { .. } => "InternalError",
        }
    }

    /// Returns the offending field, if the error is tied to one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            Self::NotFound(_) | Self::OperationFailed { .. } => None,
        }
    }

    /// Returns the JSON-RPC error code for this error.
    #[must_use]
    pub const fn rpc_code(&self) -> i32 {
        match self {
            Self::Validation { .. } | Self::NotFound(_) => -32602,
            Self::OperationFailed { .. } => -32603,
        }
    }
}

/// Result type alias for observer operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::validation("limit", "must be between 1 and 100");
        assert_eq!(
            err.to_string(),
            "invalid input for 'limit': must be between 1 and 100"
        );

        let err = Error::internal("store_lock", "poisoned");
        assert_eq!(err.to_string(), "operation 'store_lock' failed: poisoned");

        let err = Error::NotFound("obs_123".to_string());
        assert_eq!(err.to_string(), "not found: obs_123");
    }

    #[test]
    fn test_error_wire_mapping() {
        let err = Error::validation("agent_sequence", "needs at least 2 agents");
        assert_eq!(err.error_type(), "ValidationError");
        assert_eq!(err.field(), Some("agent_sequence"));
        assert_eq!(err.rpc_code(), -32602);

        let err = Error::internal("serialize", "boom");
        assert_eq!(err.error_type(), "InternalError");
        assert_eq!(err.field(), None);
        assert_eq!(err.rpc_code(), -32603);

        assert_eq!(Error::NotFound("x".into()).error_type(), "NotFoundError");
    }
}
