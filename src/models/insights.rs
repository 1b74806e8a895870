//! Insight report types.

use super::{AggregationPeriod, MetricType, PatternId, SeriesId, TimeRangeArgs, Trend};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Arguments of `generate_agent_insights`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InsightRequest {
    /// Restrict to one agent type.
    pub agent_type: Option<String>,
    /// Restrict to one project.
    pub project_id: Option<String>,
    /// Restrict to a time window.
    pub time_range: Option<TimeRangeArgs>,
    /// Metric types and/or observation categories to concentrate on.
    pub focus_areas: Vec<String>,
    /// Include naive linear predictions.
    pub include_predictions: bool,
}

/// Collection totals after filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InsightSummary {
    /// Matching observations.
    pub total_observations: usize,
    /// Matching metric series.
    pub total_metrics: usize,
    /// Measurements across the matching series.
    pub total_measurements: usize,
    /// Matching coordination patterns.
    pub total_patterns: usize,
    /// Distinct agent types seen in matching observations and metrics.
    pub agent_types: Vec<String>,
    /// Matching observations per category.
    pub categories: BTreeMap<String, usize>,
}

/// Trend of one metric type over the analysis window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTrend {
    /// Improving, declining or stable, in the metric's natural direction.
    pub trend: Trend,
    /// Relative change of the recent mean against the early mean, in percent.
    pub change_percent: f64,
    /// Mean of the earliest third of the window.
    pub early_mean: f64,
    /// Mean of the most recent third of the window.
    pub recent_mean: f64,
    /// Measurements considered.
    pub sample_count: usize,
}

/// A pattern ranked by effectiveness.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternRanking {
    /// Pattern identifier.
    pub pattern_id: PatternId,
    /// Pattern name.
    pub pattern_name: String,
    /// Derived effectiveness in `[0, 1]`.
    pub effectiveness: f64,
    /// Ordered agents taking part.
    pub agent_sequence: Vec<String>,
}

/// A one-period-ahead linear extrapolation of a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPrediction {
    /// Series the prediction is for.
    pub metric_id: SeriesId,
    /// Agent being measured.
    pub agent_type: String,
    /// Metric being measured.
    pub metric_type: MetricType,
    /// Project context.
    pub project_id: String,
    /// Extrapolated value.
    pub predicted_value: f64,
    /// Confidence in `[0, 1]`; falls as residual variance grows.
    pub confidence: f64,
    /// Step used for the extrapolation.
    pub horizon: AggregationPeriod,
    /// Point in time the prediction refers to.
    pub predicted_for: DateTime<Utc>,
}

/// Result of `generate_agent_insights`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightReport {
    /// Collection totals.
    pub summary: InsightSummary,
    /// Trend per metric type name.
    pub performance_trends: BTreeMap<String, MetricTrend>,
    /// Deduplicated recommendations, most frequent first.
    pub recommendations: Vec<String>,
    /// Most effective patterns first.
    pub patterns: Vec<PatternRanking>,
    /// Present only when predictions were requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predictions: Option<Vec<MetricPrediction>>,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
}
