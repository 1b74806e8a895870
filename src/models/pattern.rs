//! Coordination pattern types.

use super::{Complexity, RecordKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

prefixed_id!(
    /// Unique identifier of an analyzed pattern (`pattern_<hex>`).
    PatternId,
    "pattern"
);

/// Measured success of a coordination pattern.
///
/// Rates are fractions in `[0, 1]`; `average_duration` is in hours. Other
/// numeric metrics are accepted and kept alongside.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SuccessMetrics {
    /// Fraction of runs that completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_rate: Option<f64>,
    /// Mean end-to-end duration in hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_duration: Option<f64>,
    /// Mean output quality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    /// Fraction of runs with conflicting agent output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict_rate: Option<f64>,
    /// Additional metrics.
    #[serde(flatten)]
    pub other: BTreeMap<String, f64>,
}

impl SuccessMetrics {
    /// Returns the fraction-valued metrics with their names.
    #[must_use]
    pub const fn rates(&self) -> [(&'static str, Option<f64>); 3] {
        [
            ("completion_rate", self.completion_rate),
            ("quality_score", self.quality_score),
            ("conflict_rate", self.conflict_rate),
        ]
    }
}

/// Metadata of a coordination pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternMetadata {
    /// Always [`RecordKind::Pattern`].
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Human-readable name. Not unique.
    pub pattern_name: String,
    /// Ordered agents taking part (at least two).
    pub agent_sequence: Vec<String>,
    /// Project where the pattern was observed.
    pub project_context: String,
    /// When the pattern was analyzed.
    pub timestamp: DateTime<Utc>,
    /// Complexity levels the pattern suits.
    pub complexity_suitability: Vec<Complexity>,
}

/// A stored coordination pattern.
///
/// The effectiveness score is derived from `success_metrics` on demand and
/// never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinationPattern {
    /// Unique identifier.
    #[serde(rename = "chunk_id")]
    pub id: PatternId,
    /// Searchable description.
    pub content: String,
    /// Pattern metadata.
    pub metadata: PatternMetadata,
    /// Measured success.
    pub success_metrics: SuccessMetrics,
    /// Scenarios the pattern applies to.
    pub applicable_scenarios: Vec<String>,
    /// Resource usage requirements.
    pub resource_requirements: Map<String, Value>,
    /// Historical execution entries.
    pub historical_performance: Vec<Value>,
    /// Word count of the description.
    pub tokens: usize,
}

impl CoordinationPattern {
    /// Builds the searchable description of a pattern.
    #[must_use]
    pub fn describe(pattern_name: &str, agent_sequence: &[String]) -> String {
        format!(
            "Coordination pattern: {pattern_name} with sequence {}",
            agent_sequence.join(" -> ")
        )
    }

    /// Returns true if `agent_type` takes part in the pattern.
    #[must_use]
    pub fn involves(&self, agent_type: &str) -> bool {
        self.metadata.agent_sequence.iter().any(|a| a == agent_type)
    }
}

/// Arguments of `analyze_coordination_patterns`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternRequest {
    /// Ordered agents taking part (at least two).
    pub agent_sequence: Vec<String>,
    /// Pattern name (non-empty).
    pub pattern_name: String,
    /// Project where the pattern was observed.
    pub project_context: String,
    /// Measured success.
    pub success_metrics: Option<SuccessMetrics>,
    /// Scenarios the pattern applies to.
    pub applicable_scenarios: Vec<String>,
    /// Complexity levels the pattern suits (defaults to `["medium"]`).
    pub complexity_suitability: Option<Vec<String>>,
    /// Resource usage requirements.
    pub resource_requirements: Map<String, Value>,
    /// Historical execution entries.
    pub historical_performance: Vec<Value>,
}

/// Result of analyzing a pattern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternAnalysis {
    /// Identifier of the stored pattern.
    pub pattern_id: PatternId,
    /// Derived effectiveness in `[0, 1]`.
    pub effectiveness_score: f64,
    /// One to three suggestions targeting the weakest dimensions.
    pub optimization_suggestions: Vec<String>,
    /// Echo of the applicable scenarios.
    pub applicable_scenarios: Vec<String>,
}
