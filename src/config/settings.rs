//! Configuration sections with their defaults.

use serde::Serialize;
use std::path::PathBuf;

/// Observation categories accepted out of the box.
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "performance",
    "quality",
    "coordination",
    "error",
    "success",
    "improvement",
];

/// Search limits and defaults.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchSettings {
    /// Limit used when the caller gives none.
    pub default_limit: usize,
    /// Largest accepted limit.
    pub max_limit: usize,
    /// Similarity floor used when the caller gives none.
    pub default_min_similarity: f64,
    /// Longest accepted query, in bytes.
    pub max_query_length: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            default_min_similarity: 0.3,
            max_query_length: 10_000,
        }
    }
}

/// Observation validation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObservationSettings {
    /// Shortest accepted content, in characters.
    pub min_content_length: usize,
    /// Longest accepted content, in characters.
    pub max_content_length: usize,
    /// Accepted agent types; empty accepts any non-empty tag.
    pub agent_types: Vec<String>,
    /// Accepted categories; empty accepts any non-empty tag.
    pub categories: Vec<String>,
}

impl Default for ObservationSettings {
    fn default() -> Self {
        Self {
            min_content_length: 10,
            max_content_length: 2000,
            agent_types: Vec::new(),
            categories: DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl ObservationSettings {
    /// Returns true if `agent_type` is allowed.
    #[must_use]
    pub fn accepts_agent_type(&self, agent_type: &str) -> bool {
        allows(&self.agent_types, agent_type)
    }

    /// Returns true if `category` is allowed.
    #[must_use]
    pub fn accepts_category(&self, category: &str) -> bool {
        allows(&self.categories, category)
    }
}

/// Returns true if `value` is non-empty and `list` is empty or contains it.
pub(crate) fn allows(list: &[String], value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && (list.is_empty() || list.iter().any(|v| v.trim() == value))
}

/// Coordination pattern scoring weights and suggestion triggers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternSettings {
    /// Weight of `completion_rate`.
    pub completion_weight: f64,
    /// Weight of `quality_score`.
    pub quality_weight: f64,
    /// Weight of `1 - conflict_rate`.
    pub conflict_weight: f64,
    /// Weight of the duration bonus.
    pub duration_weight: f64,
    /// Value substituted for a missing metric.
    pub neutral_value: f64,
    /// Per-agent duration (hours) at which the duration bonus reaches zero.
    pub reference_stage_duration: f64,
    /// Conflict rate above which synchronization is suggested.
    pub conflict_threshold: f64,
    /// Completion rate below which handoff gates are suggested.
    pub completion_threshold: f64,
    /// Quality score below which a review stage is suggested.
    pub quality_threshold: f64,
    /// Upper bound on suggestions per analysis.
    pub max_suggestions: usize,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            completion_weight: 0.4,
            quality_weight: 0.3,
            conflict_weight: 0.2,
            duration_weight: 0.1,
            neutral_value: 0.5,
            reference_stage_duration: 4.0,
            conflict_threshold: 0.2,
            completion_threshold: 0.8,
            quality_threshold: 0.8,
            max_suggestions: 3,
        }
    }
}

/// Insight generation knobs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightSettings {
    /// Relative change (0.05 = 5%) beyond which a trend is not stable.
    pub trend_threshold: f64,
    /// Recommendations kept in a report.
    pub max_recommendations: usize,
    /// Patterns kept in a report.
    pub max_patterns: usize,
}

impl Default for InsightSettings {
    fn default() -> Self {
        Self {
            trend_threshold: 0.05,
            max_recommendations: 10,
            max_patterns: 5,
        }
    }
}

/// Documentation index location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentationSettings {
    /// Directory holding `vector_db_index.json`; demo chunks are used when unset.
    pub index_dir: Option<PathBuf>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, falling back to pretty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Logging output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoggingSettings {
    /// Output format.
    pub format: LogFormat,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
    /// `tracing` filter directive (e.g. `info,vector_observer=debug`).
    pub filter: Option<String>,
}

/// Prometheus exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSettings {
    /// Expose metrics over HTTP while serving.
    pub enabled: bool,
    /// Exporter port.
    pub port: u16,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9090,
        }
    }
}
