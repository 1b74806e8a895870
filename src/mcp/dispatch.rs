//! JSON-RPC method names understood by the observer.
//!
//! Wire names are parsed once into [`McpMethod`]. The server matches on the
//! variant and labels request metrics with [`McpMethod::label`], which keeps
//! caller-chosen names out of metric labels.

/// A JSON-RPC method the server may receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpMethod {
    /// Handshake: protocol version, capabilities and server info.
    Initialize,
    /// Handshake acknowledgement. Always a notification.
    Initialized,
    /// The observer tools with their input schemas.
    ListTools,
    /// Runs one observer tool.
    CallTool,
    /// Liveness check.
    Ping,
    /// Anything else; answered with method-not-found.
    Unknown(String),
}

impl McpMethod {
    /// Parses a wire method name.
    ///
    /// The acknowledgement is accepted under both its bare `initialized` and
    /// its `notifications/initialized` spelling.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "initialize" => Self::Initialize,
            "initialized" | "notifications/initialized" => Self::Initialized,
            "tools/list" => Self::ListTools,
            "tools/call" => Self::CallTool,
            "ping" => Self::Ping,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Metric label: the canonical wire name, or `unknown`.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Initialized => "notifications/initialized",
            Self::ListTools => "tools/list",
            Self::CallTool => "tools/call",
            Self::Ping => "ping",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Returns true for methods that never get a response, even with an id.
    #[must_use]
    pub const fn is_notification(&self) -> bool {
        matches!(self, Self::Initialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("initialize", &McpMethod::Initialize; "initialize")]
    #[test_case("initialized", &McpMethod::Initialized; "bare acknowledgement")]
    #[test_case("notifications/initialized", &McpMethod::Initialized; "namespaced acknowledgement")]
    #[test_case("tools/list", &McpMethod::ListTools; "list tools")]
    #[test_case("tools/call", &McpMethod::CallTool; "call tool")]
    #[test_case("ping", &McpMethod::Ping; "ping")]
    fn test_parse_known(name: &str, expected: &McpMethod) {
        assert_eq!(&McpMethod::parse(name), expected);
    }

    #[test]
    fn test_unknown_names_share_one_label() {
        let method = McpMethod::parse("resources/list");
        assert_eq!(method, McpMethod::Unknown("resources/list".to_string()));
        assert_eq!(method.label(), "unknown");
        assert_eq!(McpMethod::parse("prompts/get").label(), "unknown");
    }

    #[test]
    fn test_labels_parse_back() {
        for method in [
            McpMethod::Initialize,
            McpMethod::Initialized,
            McpMethod::ListTools,
            McpMethod::CallTool,
            McpMethod::Ping,
        ] {
            assert_eq!(McpMethod::parse(method.label()), method);
        }
    }

    #[test]
    fn test_only_acknowledgement_is_notification() {
        assert!(McpMethod::Initialized.is_notification());
        assert!(!McpMethod::Initialize.is_notification());
        assert!(!McpMethod::Unknown("initialized/extra".to_string()).is_notification());
    }
}
