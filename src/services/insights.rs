//! Cross-store insight generation.
//!
//! Reads all three stores under one snapshot and derives counts, per-metric
//! trends, merged recommendations, top patterns and optional naive
//! forecasts. Nothing here mutates a store.

use super::{MetricAggregator, ObservationStore, PatternAnalyzer};
use crate::config::InsightSettings;
use crate::models::{
    CoordinationPattern, InsightReport, InsightRequest, InsightSummary, MetricPrediction,
    MetricSeries, MetricTrend, MetricType, Observation, PatternRanking, TimeRange, Trend,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Validated insight filters.
#[derive(Debug, Clone, Default)]
struct Scope {
    agent_type: Option<String>,
    project_id: Option<String>,
    time_range: TimeRange,
    metric_types: BTreeSet<MetricType>,
    categories: BTreeSet<String>,
}

impl Scope {
    fn matches_agent(&self, agent_type: &str) -> bool {
        self.agent_type.as_deref().is_none_or(|a| a == agent_type)
    }

    fn matches_project(&self, project_id: &str) -> bool {
        self.project_id.as_deref().is_none_or(|p| p == project_id)
    }

    fn observation(&self, observation: &Observation) -> bool {
        let meta = &observation.metadata;
        self.matches_agent(&meta.agent_type)
            && self.matches_project(&meta.project_id)
            && self.time_range.contains(meta.timestamp)
            && (self.categories.is_empty() || self.categories.contains(&meta.category))
    }

    fn series(&self, series: &MetricSeries) -> bool {
        let meta = &series.metadata;
        self.matches_agent(&meta.agent_type)
            && self.matches_project(&meta.project_id)
            && (self.metric_types.is_empty() || self.metric_types.contains(&meta.metric_type))
    }

    fn pattern(&self, pattern: &CoordinationPattern) -> bool {
        self.agent_type.as_deref().is_none_or(|a| pattern.involves(a))
            && self.matches_project(&pattern.metadata.project_context)
            && self.time_range.contains(pattern.metadata.timestamp)
    }
}

/// A metric series restricted to the measurements inside the time window.
struct SeriesWindow<'a> {
    series: &'a MetricSeries,
    points: Vec<(DateTime<Utc>, f64)>,
}

/// Composes read-only views over the three stores into a report.
#[derive(Debug, Clone, Copy)]
pub struct InsightGenerator<'a> {
    settings: &'a InsightSettings,
    observations: &'a ObservationStore,
    metrics: &'a MetricAggregator,
    patterns: &'a PatternAnalyzer,
}

impl<'a> InsightGenerator<'a> {
    /// Creates a generator over the given stores.
    #[must_use]
    pub const fn new(
        settings: &'a InsightSettings,
        observations: &'a ObservationStore,
        metrics: &'a MetricAggregator,
        patterns: &'a PatternAnalyzer,
    ) -> Self {
        Self {
            settings,
            observations,
            metrics,
            patterns,
        }
    }

    /// Generates a report for the records matching `request`.
    ///
    /// No matching data yields an empty report, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the time range is malformed or a
    /// focus area is neither a metric type nor an accepted category.
    pub fn generate(&self, request: &InsightRequest) -> Result<InsightReport> {
        let scope = self.scope(request)?;

        let observations: Vec<&Observation> = self
            .observations
            .iter()
            .filter(|o| scope.observation(o))
            .collect();
        let windows: Vec<SeriesWindow<'_>> = self
            .metrics
            .iter()
            .filter(|s| scope.series(s))
            .filter_map(|series| {
                let points: Vec<_> = series
                    .measurements
                    .iter()
                    .filter(|m| scope.time_range.contains(m.timestamp))
                    .map(|m| (m.timestamp, m.value))
                    .collect();
                (!points.is_empty()).then_some(SeriesWindow { series, points })
            })
            .collect();
        let patterns: Vec<&CoordinationPattern> =
            self.patterns.iter().filter(|p| scope.pattern(p)).collect();

        let summary = summarize(&observations, &windows, patterns.len());
        let performance_trends = self.trends(&scope, &windows);
        let recommendations =
            merge_recommendations(&observations, self.settings.max_recommendations);
        let patterns = self.rank_patterns(&patterns);
        let predictions = request
            .include_predictions
            .then(|| windows.iter().filter_map(predict).collect());

        tracing::debug!(
            observations = summary.total_observations,
            metrics = summary.total_metrics,
            patterns = summary.total_patterns,
            "Generated agent insights"
        );

        Ok(InsightReport {
            summary,
            performance_trends,
            recommendations,
            patterns,
            predictions,
            generated_at: Utc::now(),
        })
    }

    fn scope(&self, request: &InsightRequest) -> Result<Scope> {
        let time_range = request
            .time_range
            .as_ref()
            .map(|args| TimeRange::from_args(args, "time_range"))
            .transpose()?
            .unwrap_or_default();

        let mut metric_types = BTreeSet::new();
        let mut categories = BTreeSet::new();
        for (i, area) in request.focus_areas.iter().enumerate() {
            let area = area.trim();
            if let Some(metric_type) = MetricType::parse(area) {
                metric_types.insert(metric_type);
            } else if self.observations.settings().accepts_category(area) {
                categories.insert(area.to_string());
            } else {
                return Err(Error::validation(
                    format!("focus_areas[{i}]"),
                    format!("'{area}' is neither a metric type nor an observation category"),
                ));
            }
        }

        Ok(Scope {
            agent_type: non_blank(request.agent_type.as_deref()),
            project_id: non_blank(request.project_id.as_deref()),
            time_range,
            metric_types,
            categories,
        })
    }

    fn trends(
        &self,
        scope: &Scope,
        windows: &[SeriesWindow<'_>],
    ) -> BTreeMap<String, MetricTrend> {
        let mut by_type: BTreeMap<MetricType, Vec<(DateTime<Utc>, f64)>> = BTreeMap::new();
        for window in windows {
            by_type
                .entry(window.series.metadata.metric_type)
                .or_default()
                .extend(window.points.iter().copied());
        }

        by_type
            .into_iter()
            .filter_map(|(metric_type, mut points)| {
                points.sort_by_key(|(ts, _)| *ts);
                let trend = trend_of(
                    &points,
                    &scope.time_range,
                    metric_type.lower_is_better(),
                    self.settings.trend_threshold,
                )?;
                Some((metric_type.as_str().to_string(), trend))
            })
            .collect()
    }

    fn rank_patterns(&self, patterns: &[&CoordinationPattern]) -> Vec<PatternRanking> {
        let mut ranked: Vec<PatternRanking> = patterns
            .iter()
            .map(|p| PatternRanking {
                pattern_id: p.id.clone(),
                pattern_name: p.metadata.pattern_name.clone(),
                effectiveness: self.patterns.effectiveness_of(p),
                agent_sequence: p.metadata.agent_sequence.clone(),
            })
            .collect();
        ranked.sort_by(|a, b| b.effectiveness.total_cmp(&a.effectiveness));
        ranked.truncate(self.settings.max_patterns);
        ranked
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

fn summarize(
    observations: &[&Observation],
    windows: &[SeriesWindow<'_>],
    total_patterns: usize,
) -> InsightSummary {
    let mut agent_types = BTreeSet::new();
    let mut categories = BTreeMap::new();
    for observation in observations {
        agent_types.insert(observation.metadata.agent_type.clone());
        *categories
            .entry(observation.metadata.category.clone())
            .or_insert(0) += 1;
    }
    for window in windows {
        agent_types.insert(window.series.metadata.agent_type.clone());
    }

    InsightSummary {
        total_observations: observations.len(),
        total_metrics: windows.len(),
        total_measurements: windows.iter().map(|w| w.points.len()).sum(),
        total_patterns,
        agent_types: agent_types.into_iter().collect(),
        categories,
    }
}

/// Deduplicates recommendations, most frequent first, then by first sighting.
fn merge_recommendations(observations: &[&Observation], limit: usize) -> Vec<String> {
    let mut seen: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut order = 0;
    for text in observations
        .iter()
        .flat_map(|o| o.recommendations.iter())
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
    {
        let entry = seen.entry(text).or_insert_with(|| {
            order += 1;
            (0, order)
        });
        entry.0 += 1;
    }

    let mut merged: Vec<(&str, (usize, usize))> = seen.into_iter().collect();
    merged.sort_by(|(_, (ca, fa)), (_, (cb, fb))| cb.cmp(ca).then(fa.cmp(fb)));
    merged
        .into_iter()
        .take(limit)
        .map(|(text, _)| text.to_string())
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean.is_finite() {
        mean
    } else {
        values.iter().map(|v| v / n).sum()
    }
}

/// Compares the most recent third of the window with the earliest third.
///
/// The window is the requested time range when both bounds are set and the
/// span of the data otherwise. Falls back to the first and last third of the
/// points when the data has no time spread. Requires at least two points.
fn trend_of(
    points: &[(DateTime<Utc>, f64)],
    range: &TimeRange,
    lower_is_better: bool,
    threshold: f64,
) -> Option<MetricTrend> {
    if points.len() < 2 {
        return None;
    }
    let (first, last) = (points.first()?.0, points.last()?.0);
    let start = range.start.filter(|_| range.end.is_some()).unwrap_or(first);
    let end = range.end.filter(|_| range.start.is_some()).unwrap_or(last);
    let third = (end - start) / 3;

    let mut early: Vec<f64> = points
        .iter()
        .filter(|(ts, _)| *ts <= start + third)
        .map(|(_, v)| *v)
        .collect();
    let mut recent: Vec<f64> = points
        .iter()
        .filter(|(ts, _)| *ts >= end - third)
        .map(|(_, v)| *v)
        .collect();

    if third.is_zero() || early.is_empty() || recent.is_empty() {
        let n = points.len().div_ceil(3);
        early = points[..n].iter().map(|(_, v)| *v).collect();
        recent = points[points.len() - n..].iter().map(|(_, v)| *v).collect();
    }

    let (early_mean, recent_mean) = (mean(&early), mean(&recent));
    let change = if early_mean.abs() > f64::EPSILON {
        (recent_mean - early_mean) / early_mean.abs()
    } else if (recent_mean - early_mean).abs() > f64::EPSILON {
        (recent_mean - early_mean).signum()
    } else {
        0.0
    };

    let trend = if change.abs() <= threshold {
        Trend::Stable
    } else if (change < 0.0) == lower_is_better {
        Trend::Improving
    } else {
        Trend::Declining
    };

    Some(MetricTrend {
        trend,
        change_percent: change * 100.0,
        early_mean,
        recent_mean,
        sample_count: points.len(),
    })
}

/// Least-squares extrapolation one aggregation period past the last point.
///
/// Returns `None` when that instant is not representable. Confidence
/// shrinks as the residual spread grows relative to the mean.
#[allow(clippy::cast_precision_loss)]
fn predict(window: &SeriesWindow<'_>) -> Option<MetricPrediction> {
    let points = &window.points;
    if points.len() < 2 {
        return None;
    }
    let origin = points.iter().map(|(ts, _)| *ts).min()?;
    let last = points.iter().map(|(ts, _)| *ts).max()?;
    let hours = |ts: DateTime<Utc>| (ts - origin).num_milliseconds() as f64 / 3_600_000.0;

    let n = points.len() as f64;
    let xs: Vec<f64> = points.iter().map(|(ts, _)| hours(*ts)).collect();
    let ys: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    let (x_mean, y_mean) = (mean(&xs), mean(&ys));

    let sxx: f64 = xs.iter().map(|x| (x - x_mean).powi(2)).sum();
    let sxy: f64 = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();
    let slope = if sxx > f64::EPSILON { sxy / sxx } else { 0.0 };
    let intercept = y_mean - slope * x_mean;

    let residual_std = (xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();
    let confidence = if y_mean.abs() > f64::EPSILON {
        1.0 / (1.0 + residual_std / y_mean.abs())
    } else if residual_std > f64::EPSILON {
        0.0
    } else {
        1.0
    };

    let meta = &window.series.metadata;
    let predicted_for = last.checked_add_signed(meta.aggregation_period.duration())?;

    Some(MetricPrediction {
        metric_id: window.series.id.clone(),
        agent_type: meta.agent_type.clone(),
        metric_type: meta.metric_type,
        project_id: meta.project_id.clone(),
        predicted_value: intercept + slope * hours(predicted_for),
        confidence: confidence.clamp(0.0, 1.0),
        horizon: meta.aggregation_period,
        predicted_for,
    })
}
