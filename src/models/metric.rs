//! Metric series types.
//!
//! Statistics and ratings are never stored; [`MetricSeries::statistics`]
//! and [`MetricSeries::rating`] recompute them from the measurements on
//! every call.

use super::RecordKind;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

prefixed_id!(
    /// Unique identifier of a metric series (`metric_<hex>`).
    SeriesId,
    "metric"
);

/// Kind of metric being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Latency in seconds (lower is better).
    ResponseTime,
    /// Fraction of tasks completed.
    TaskCompletionRate,
    /// Output quality score.
    QualityScore,
    /// Efficiency of multi-agent coordination.
    CoordinationEfficiency,
    /// Commits per period.
    CommitFrequency,
}

impl MetricType {
    /// Returns all metric types.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ResponseTime,
            Self::TaskCompletionRate,
            Self::QualityScore,
            Self::CoordinationEfficiency,
            Self::CommitFrequency,
        ]
    }

    /// Returns the metric type as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ResponseTime => "response_time",
            Self::TaskCompletionRate => "task_completion_rate",
            Self::QualityScore => "quality_score",
            Self::CoordinationEfficiency => "coordination_efficiency",
            Self::CommitFrequency => "commit_frequency",
        }
    }

    /// Parses a metric type from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "response_time" => Some(Self::ResponseTime),
            "task_completion_rate" => Some(Self::TaskCompletionRate),
            "quality_score" => Some(Self::QualityScore),
            "coordination_efficiency" => Some(Self::CoordinationEfficiency),
            "commit_frequency" => Some(Self::CommitFrequency),
            _ => None,
        }
    }

    /// Returns true for latency-like metrics where smaller values are better.
    #[must_use]
    pub const fn lower_is_better(&self) -> bool {
        matches!(self, Self::ResponseTime)
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregation period of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationPeriod {
    /// One minute.
    Minute,
    /// One hour.
    #[default]
    Hour,
    /// One day.
    Day,
    /// One week.
    Week,
}

impl AggregationPeriod {
    /// Parses a period from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "minute" => Some(Self::Minute),
            "hour" => Some(Self::Hour),
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            _ => None,
        }
    }

    /// Returns the length of one period.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        match self {
            Self::Minute => TimeDelta::minutes(1),
            Self::Hour => TimeDelta::hours(1),
            Self::Day => TimeDelta::days(1),
            Self::Week => TimeDelta::weeks(1),
        }
    }
}

/// Threshold-based rating of a series mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    /// Within the excellent boundary.
    Excellent,
    /// Within the good boundary.
    Good,
    /// Within the acceptable boundary.
    Acceptable,
    /// Beyond every better boundary.
    Poor,
}

/// Rating boundaries. Any subset may be supplied.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Thresholds {
    /// Excellent boundary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excellent: Option<f64>,
    /// Good boundary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub good: Option<f64>,
    /// Acceptable boundary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptable: Option<f64>,
    /// Poor boundary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poor: Option<f64>,
}

impl Thresholds {
    fn present(&self) -> impl Iterator<Item = f64> {
        [self.excellent, self.good, self.acceptable, self.poor]
            .into_iter()
            .flatten()
    }

    /// Returns true if no boundary is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }

    /// Returns true if every boundary that is set is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.present().all(f64::is_finite)
    }

    /// Infers the scale direction from the outermost boundaries.
    ///
    /// An `excellent` boundary below `poor` describes a lower-is-better
    /// metric. With fewer than two boundaries the metric's natural direction
    /// is used.
    #[must_use]
    pub fn lower_is_better(&self, default: bool) -> bool {
        let mut present = self.present();
        match (present.next(), present.last()) {
            (Some(first), Some(last)) if (first - last).abs() > f64::EPSILON => first < last,
            _ => default,
        }
    }

    /// Classifies `value` into the best bucket whose boundary it satisfies.
    ///
    /// A missing `acceptable` boundary falls back to `poor`. Returns `None`
    /// if no boundary is set.
    #[must_use]
    pub fn rate(&self, value: f64, default_lower_is_better: bool) -> Option<Rating> {
        if self.is_empty() {
            return None;
        }

        let lower_is_better = self.lower_is_better(default_lower_is_better);
        let within = |boundary: f64| {
            if lower_is_better {
                value <= boundary
            } else {
                value >= boundary
            }
        };

        let ladder = [
            (Rating::Excellent, self.excellent),
            (Rating::Good, self.good),
            (Rating::Acceptable, self.acceptable.or(self.poor)),
        ];

        Some(
            ladder
                .into_iter()
                .find_map(|(rating, boundary)| boundary.filter(|b| within(*b)).map(|_| rating))
                .unwrap_or(Rating::Poor),
        )
    }
}

/// Summary statistics derived from a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    /// Arithmetic mean.
    pub mean: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Number of values.
    pub count: usize,
    /// Median value.
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl Statistics {
    /// Computes statistics over `values`. Returns `None` for an empty slice.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let n = count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        // Near f64::MAX the plain sums overflow; rescale so finite input
        // always gives finite statistics.
        let mut mean = values.iter().sum::<f64>() / n;
        if !mean.is_finite() {
            mean = values.iter().map(|v| v / n).sum();
        }
        let mut std_dev = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        if !std_dev.is_finite() {
            let scale = min.abs().max(max.abs());
            let spread = values
                .iter()
                .map(|v| (v / scale - mean / scale).powi(2))
                .sum::<f64>();
            std_dev = scale * (spread / n).sqrt();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = count / 2;
        let median = if count % 2 == 0 {
            f64::midpoint(sorted[mid - 1], sorted[mid])
        } else {
            sorted[mid]
        };

        Some(Self {
            mean,
            min,
            max,
            count,
            median,
            std_dev,
        })
    }
}

/// One measurement as sent by callers; validated before storage.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeasurementInput {
    /// ISO-8601 timestamp (required).
    pub timestamp: Option<Value>,
    /// Numeric value (required).
    pub value: Option<Value>,
    /// Optional context.
    pub context: Option<Value>,
    /// Any other keys are kept as measurement attributes.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A validated measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    /// When the value was observed.
    pub timestamp: DateTime<Utc>,
    /// Observed value.
    pub value: f64,
    /// Optional context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    /// Extra measurement attributes.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// Metadata of a metric series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeriesMetadata {
    /// Always [`RecordKind::Metric`].
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Agent being measured.
    pub agent_type: String,
    /// Metric being measured.
    pub metric_type: MetricType,
    /// Project context.
    pub project_id: String,
    /// Aggregation period fixed at creation.
    pub aggregation_period: AggregationPeriod,
    /// When the series was created.
    pub timestamp: DateTime<Utc>,
}

/// An append-only series of measurements for one agent, metric and project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeries {
    /// Unique identifier.
    #[serde(rename = "chunk_id")]
    pub id: SeriesId,
    /// Series metadata.
    pub metadata: MetricSeriesMetadata,
    /// Measurements in arrival order.
    pub measurements: Vec<Measurement>,
    /// Rating boundaries fixed at creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Thresholds>,
}

impl MetricSeries {
    /// Returns the measurement values in arrival order.
    #[must_use]
    pub fn values(&self) -> Vec<f64> {
        self.measurements.iter().map(|m| m.value).collect()
    }

    /// Recomputes statistics over the whole series.
    #[must_use]
    pub fn statistics(&self) -> Option<Statistics> {
        Statistics::from_values(&self.values())
    }

    /// Rates the current mean against the series thresholds.
    #[must_use]
    pub fn rating(&self) -> Option<Rating> {
        let thresholds = self.thresholds.as_ref()?;
        let stats = self.statistics()?;
        thresholds.rate(stats.mean, self.metadata.metric_type.lower_is_better())
    }
}

/// Arguments of `store_agent_metric`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricRequest {
    /// Agent being measured.
    pub agent_type: String,
    /// Metric type name.
    pub metric_type: String,
    /// Project context.
    pub project_id: String,
    /// Batch of measurements to append (at least one).
    pub measurements: Vec<MeasurementInput>,
    /// Rating boundaries (used only when the series is created).
    pub thresholds: Option<Thresholds>,
    /// Aggregation period (used only when the series is created).
    pub aggregation_period: Option<String>,
}

/// Result of storing a metric batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReceipt {
    /// Series identifier.
    pub metric_id: SeriesId,
    /// Always `"stored"`.
    pub status: &'static str,
    /// Statistics over the entire series.
    pub statistics: Statistics,
    /// Rating of the series mean, if thresholds exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}
