//! Metric aggregation.
//!
//! A series is keyed by agent type, metric type and project. The first batch
//! fixes the thresholds and aggregation period; later batches only append.

use super::{require_agent_type, require_text};
use crate::models::{
    AggregationPeriod, Measurement, MeasurementInput, MetricReceipt, MetricRequest, MetricSeries,
    MetricSeriesMetadata, MetricType, RecordKind, SeriesId, parse_timestamp,
};
use crate::{Error, Result};
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;

/// Series key: agent type, metric type, project.
type SeriesKey = (String, MetricType, String);

/// In-memory metric series collection.
#[derive(Debug, Clone, Default)]
pub struct MetricAggregator {
    agent_types: Vec<String>,
    series: BTreeMap<SeriesKey, MetricSeries>,
}

impl MetricAggregator {
    /// Creates an empty aggregator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            agent_types: Vec::new(),
            series: BTreeMap::new(),
        }
    }

    /// Restricts series to the listed agent types; empty accepts any.
    #[must_use]
    pub fn with_agent_types(mut self, agent_types: Vec<String>) -> Self {
        self.agent_types = agent_types;
        self
    }

    /// Number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Returns true if no series exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Iterates series ordered by agent, metric type and project.
    pub fn iter(&self) -> impl Iterator<Item = &MetricSeries> {
        self.series.values()
    }

    /// Appends a measurement batch, creating the series on first use.
    ///
    /// Statistics and rating cover the whole series after the append.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a key field is empty, the agent type
    /// is not accepted, the metric type or aggregation period is unknown,
    /// thresholds are not finite, the batch is empty, or a measurement lacks
    /// a valid timestamp or value. Nothing is appended on error.
    pub fn record(&mut self, request: MetricRequest) -> Result<MetricReceipt> {
        let agent_type =
            require_agent_type("agent_type", &request.agent_type, &self.agent_types)?;
        let metric_type = MetricType::parse(&request.metric_type).ok_or_else(|| {
            Error::validation(
                "metric_type",
                format!(
                    "unknown metric type '{}' (expected one of: {})",
                    request.metric_type,
                    MetricType::all()
                        .iter()
                        .map(MetricType::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
        })?;
        let project_id = require_text("project_id", &request.project_id)?;

        let aggregation_period = request
            .aggregation_period
            .as_deref()
            .map(|raw| {
                AggregationPeriod::parse(raw).ok_or_else(|| {
                    Error::validation(
                        "aggregation_period",
                        format!("unknown period '{raw}' (expected minute, hour, day or week)"),
                    )
                })
            })
            .transpose()?
            .unwrap_or_default();

        if let Some(thresholds) = &request.thresholds {
            if !thresholds.is_finite() {
                return Err(Error::validation("thresholds", "boundaries must be finite numbers"));
            }
        }

        if request.measurements.is_empty() {
            return Err(Error::validation(
                "measurements",
                "at least one measurement is required",
            ));
        }
        let batch = request
            .measurements
            .into_iter()
            .enumerate()
            .map(|(i, input)| validate_measurement(i, input))
            .collect::<Result<Vec<_>>>()?;
        let appended = batch.len();

        let key = (agent_type, metric_type, project_id);
        let series = self.series.entry(key.clone()).or_insert_with(|| {
            tracing::debug!(
                agent_type = %key.0,
                metric_type = %key.1,
                project_id = %key.2,
                "Created metric series"
            );
            MetricSeries {
                id: SeriesId::generate(),
                metadata: MetricSeriesMetadata {
                    kind: RecordKind::Metric,
                    agent_type: key.0.clone(),
                    metric_type,
                    project_id: key.2.clone(),
                    aggregation_period,
                    timestamp: Utc::now(),
                },
                measurements: Vec::new(),
                thresholds: request.thresholds.filter(|t| !t.is_empty()),
            }
        });
        series.measurements.extend(batch);

        let statistics = series.statistics().ok_or_else(|| {
            Error::internal("compute_metric_statistics", "series has no measurements")
        })?;
        let rating = series.rating();

        tracing::info!(
            metric_id = %series.id,
            metric_type = %metric_type,
            appended,
            count = statistics.count,
            "Stored agent metric"
        );
        metrics::counter!(
            "metric_measurements_stored_total",
            "metric_type" => metric_type.as_str()
        )
        .increment(appended as u64);

        Ok(MetricReceipt {
            metric_id: series.id.clone(),
            status: "stored",
            statistics,
            rating,
        })
    }
}

fn validate_measurement(index: usize, input: MeasurementInput) -> Result<Measurement> {
    let field = |name: &str| format!("measurements[{index}].{name}");

    let timestamp = match input.timestamp {
        Some(Value::String(raw)) => parse_timestamp(&raw).ok_or_else(|| {
            Error::validation(
                field("timestamp"),
                format!("expected an ISO-8601 timestamp, got '{raw}'"),
            )
        })?,
        Some(Value::Null) | None => {
            return Err(Error::validation(field("timestamp"), "is required"));
        },
        Some(other) => {
            return Err(Error::validation(
                field("timestamp"),
                format!("expected an ISO-8601 timestamp, got {other}"),
            ));
        },
    };

    let value = match input.value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(raw)) => raw.trim().parse::<f64>().ok(),
        Some(Value::Null) | None => {
            return Err(Error::validation(field("value"), "is required"));
        },
        Some(_) => None,
    }
    .filter(|v| v.is_finite())
    .ok_or_else(|| Error::validation(field("value"), "must be a finite number"))?;

    Ok(Measurement {
        timestamp,
        value,
        context: input.context.filter(|c| !c.is_null()),
        attributes: input.attributes,
    })
}
