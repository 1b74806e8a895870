//! Agent observation types.

use super::RecordKind;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

prefixed_id!(
    /// Unique identifier of a stored observation (`obs_<hex>`).
    ObservationId,
    "obs"
);

/// Task complexity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Routine work.
    Low,
    /// Typical work.
    #[default]
    Medium,
    /// Demanding work.
    High,
    /// Business-critical work.
    Critical,
}

impl Complexity {
    /// Returns all complexity levels.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High, Self::Critical]
    }

    /// Returns the level as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parses a complexity level from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Parses an optional level, reporting `field` on failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the value is not a known level.
    pub fn parse_field(raw: Option<&str>, field: &str) -> Result<Option<Self>> {
        raw.map(|value| {
            Self::parse(value).ok_or_else(|| {
                Error::validation(
                    field,
                    format!("expected one of low, medium, high, critical; got '{value}'"),
                )
            })
        })
        .transpose()
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of change reported by an analysis or trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Getting better.
    Improving,
    /// Getting worse.
    Declining,
    /// No meaningful change.
    Stable,
    /// Out-of-pattern behavior.
    Anomaly,
}

impl Trend {
    /// Returns the trend as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "improving",
            Self::Declining => "declining",
            Self::Stable => "stable",
            Self::Anomaly => "anomaly",
        }
    }

    /// Parses a trend from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "improving" => Some(Self::Improving),
            "declining" => Some(Self::Declining),
            "stable" => Some(Self::Stable),
            "anomaly" => Some(Self::Anomaly),
            _ => None,
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Impact of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    /// Significant effect.
    High,
    /// Moderate effect.
    Medium,
    /// Minor effect.
    Low,
}

impl Impact {
    /// Parses an impact level from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// The analysis block attached to an observation.
///
/// `trend`, `confidence` and `impact` are typed; any other keys the agent
/// sends are kept verbatim in `details`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Analysis {
    /// Direction of change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    /// Confidence in `[0.0, 1.0]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Impact level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<Impact>,
    /// Free-form analysis fields.
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl Analysis {
    /// Validates a raw analysis object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the value is not an object, or if
    /// `trend`, `confidence` or `impact` fall outside their vocabularies.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut details) = value else {
            return Err(Error::validation("analysis", "must be an object"));
        };

        let trend = match details.remove("trend") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(Trend::parse(&s).ok_or_else(|| {
                Error::validation(
                    "analysis.trend",
                    format!("expected improving, declining, stable or anomaly; got '{s}'"),
                )
            })?),
            Some(_) => return Err(Error::validation("analysis.trend", "must be a string")),
        };

        let confidence = match details.remove("confidence") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => {
                let c = n.as_f64().unwrap_or(f64::NAN);
                if !(0.0..=1.0).contains(&c) {
                    return Err(Error::validation(
                        "analysis.confidence",
                        format!("must be between 0.0 and 1.0, got {n}"),
                    ));
                }
                Some(c)
            },
            Some(_) => {
                return Err(Error::validation(
                    "analysis.confidence",
                    "must be a number between 0.0 and 1.0",
                ));
            },
        };

        let impact = match details.remove("impact") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(Impact::parse(&s).ok_or_else(|| {
                Error::validation(
                    "analysis.impact",
                    format!("expected high, medium or low; got '{s}'"),
                )
            })?),
            Some(_) => return Err(Error::validation("analysis.impact", "must be a string")),
        };

        Ok(Self {
            trend,
            confidence,
            impact,
            details,
        })
    }
}

/// Metadata carried by every observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationMetadata {
    /// Always [`RecordKind::Observation`].
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Agent that made the observation.
    pub agent_type: String,
    /// Task the observation belongs to.
    pub task_id: String,
    /// Project the observation belongs to.
    pub project_id: String,
    /// Observation category.
    pub category: String,
    /// Server-assigned creation time.
    pub timestamp: DateTime<Utc>,
    /// Task complexity.
    pub complexity: Complexity,
    /// Feature or component being worked on.
    pub feature: Option<String>,
    /// Environment the observation was made in.
    pub environment: String,
    /// Agents or tasks this work depended on.
    pub dependencies: Vec<String>,
}

/// A stored, write-once agent observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    /// Unique identifier.
    #[serde(rename = "chunk_id")]
    pub id: ObservationId,
    /// Human-readable description, searched by similarity.
    pub content: String,
    /// Observation metadata.
    pub metadata: ObservationMetadata,
    /// Structured observation data.
    pub observation_data: Map<String, Value>,
    /// Analysis block.
    pub analysis: Analysis,
    /// Improvement recommendations.
    pub recommendations: Vec<String>,
    /// Related observations or patterns.
    pub correlations: Vec<String>,
    /// Whitespace word count of `content`.
    pub tokens: usize,
    /// Insertion order, used to break timestamp ties.
    #[serde(skip)]
    pub sequence: u64,
}

impl Observation {
    /// Returns the creation timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.metadata.timestamp
    }
}

/// Arguments of `store_agent_observation`.
///
/// Every field defaults so that absent required fields surface as
/// validation errors naming the field instead of opaque decode errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObservationRequest {
    /// Agent making the observation.
    pub agent_type: String,
    /// Task identifier.
    pub task_id: String,
    /// Project identifier.
    pub project_id: String,
    /// Observation category.
    pub category: String,
    /// Human-readable description (10 to 2000 characters by default).
    pub content: String,
    /// Structured observation data (required).
    pub observation_data: Option<Map<String, Value>>,
    /// Analysis block (required).
    pub analysis: Option<Value>,
    /// Improvement recommendations.
    pub recommendations: Vec<String>,
    /// Task complexity (defaults to `medium`).
    pub complexity: Option<String>,
    /// Feature or component being worked on.
    pub feature: Option<String>,
    /// Environment (defaults to `development`).
    pub environment: Option<String>,
    /// Agents or tasks this work depended on.
    pub dependencies: Vec<String>,
    /// Related observations or patterns.
    pub correlations: Vec<String>,
}

/// Result of storing an observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservationReceipt {
    /// The generated identifier.
    pub observation_id: ObservationId,
    /// Always `"stored"`.
    pub status: &'static str,
    /// Server-assigned creation time.
    pub timestamp: DateTime<Utc>,
}
