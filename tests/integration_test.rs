//! Integration tests for vector-observer.
//!
//! Exercises the service container end to end: observations, metrics,
//! coordination patterns and insights sharing one set of stores.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::float_cmp,
    clippy::too_many_lines
)]

use serde_json::{Map, json};
use std::io::Write;
use std::sync::Arc;
use std::thread;
use vector_observer::models::{
    InsightRequest, MeasurementInput, MetricRequest, ObservationQuery, ObservationRequest,
    PatternRequest, Rating, SuccessMetrics, TimeRangeArgs, Trend,
};
use vector_observer::{Error, ObservationFilter, ObserverConfig, ServiceContainer};

fn observation(agent_type: &str, category: &str, content: &str) -> ObservationRequest {
    ObservationRequest {
        agent_type: agent_type.to_string(),
        task_id: "task-1".to_string(),
        project_id: "project-a".to_string(),
        category: category.to_string(),
        content: content.to_string(),
        observation_data: Some(Map::new()),
        analysis: Some(json!({"trend": "improving", "confidence": 0.8})),
        ..ObservationRequest::default()
    }
}

fn measurement(timestamp: &str, value: f64) -> MeasurementInput {
    MeasurementInput {
        timestamp: Some(json!(timestamp)),
        value: Some(json!(value)),
        ..MeasurementInput::default()
    }
}

fn metric(agent_type: &str, metric_type: &str, points: &[(&str, f64)]) -> MetricRequest {
    MetricRequest {
        agent_type: agent_type.to_string(),
        metric_type: metric_type.to_string(),
        project_id: "project-a".to_string(),
        measurements: points
            .iter()
            .map(|(ts, value)| measurement(ts, *value))
            .collect(),
        ..MetricRequest::default()
    }
}

fn pattern(sequence: &[&str], metrics: SuccessMetrics) -> PatternRequest {
    PatternRequest {
        agent_sequence: sequence.iter().map(ToString::to_string).collect(),
        pattern_name: "plan-build-verify".to_string(),
        project_context: "project-a".to_string(),
        success_metrics: Some(metrics),
        ..PatternRequest::default()
    }
}

fn favorable() -> SuccessMetrics {
    SuccessMetrics {
        completion_rate: Some(0.95),
        quality_score: Some(0.88),
        conflict_rate: Some(0.05),
        ..SuccessMetrics::default()
    }
}

#[test]
fn test_error_types() {
    let err = Error::validation("limit", "must be between 1 and 100, got 0");
    assert_eq!(err.error_type(), "ValidationError");
    assert_eq!(err.field(), Some("limit"));
    assert_eq!(err.rpc_code(), -32602);
    assert!(err.to_string().contains("limit"));

    let err = Error::internal("store_metric", "arithmetic on empty batch");
    assert_eq!(err.field(), None);
    assert_eq!(err.rpc_code(), -32603);
    assert!(err.to_string().contains("store_metric"));
}

#[test]
fn test_stored_observation_is_found_by_search() {
    let services = ServiceContainer::default();
    let receipt = services
        .store_observation(observation(
            "backend",
            "performance",
            "Successfully implemented user authentication API",
        ))
        .unwrap();
    assert!(receipt.observation_id.as_str().starts_with("obs_"));
    assert_eq!(receipt.status, "stored");

    let mut query = ObservationQuery::new("authentication API performance");
    query.min_similarity = Some(0.1);
    let result = services.search_observations(&query).unwrap();

    assert_eq!(result.total_found, 1);
    let hit = &result.results[0];
    assert_eq!(hit.chunk.id, receipt.observation_id);
    assert_eq!(hit.rank, 1);
    assert!(hit.similarity > 0.1);
    assert!(hit.similarity <= 1.0);
}

#[test]
fn test_metric_statistics_over_batch() {
    let services = ServiceContainer::default();
    let receipt = services
        .store_metric(metric(
            "backend",
            "response_time",
            &[("2025-01-15T10:00:00Z", 95.0), ("2025-01-15T11:00:00Z", 87.0)],
        ))
        .unwrap();

    assert_eq!(receipt.statistics.mean, 91.0);
    assert_eq!(receipt.statistics.min, 87.0);
    assert_eq!(receipt.statistics.max, 95.0);
    assert_eq!(receipt.statistics.count, 2);
}

#[test]
fn test_favorable_pattern_scores_high() {
    let services = ServiceContainer::default();
    let analysis = services
        .analyze_pattern(pattern(&["planning", "backend", "testing"], favorable()))
        .unwrap();

    assert!(analysis.pattern_id.as_str().starts_with("pattern_"));
    assert!(analysis.effectiveness_score > 0.8);
    assert!(analysis.effectiveness_score <= 1.0);
    assert!((1..=3).contains(&analysis.optimization_suggestions.len()));
}

#[test]
fn test_search_limit_bounds() {
    let services = ServiceContainer::default();
    for limit in [0, 101] {
        let mut query = ObservationQuery::new("authentication");
        query.limit = Some(limit);
        let err = services.search_observations(&query).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(err.field(), Some("limit"));
    }

    let mut query = ObservationQuery::new("authentication");
    query.limit = Some(100);
    assert!(services.search_observations(&query).is_ok());
}

#[test]
fn test_single_agent_sequence_is_rejected() {
    let services = ServiceContainer::default();
    let err = services
        .analyze_pattern(pattern(&["backend"], favorable()))
        .unwrap_err();

    assert_eq!(err.field(), Some("agent_sequence"));
    assert_eq!(services.counts().unwrap(), (0, 0, 0));
}

#[test]
fn test_failed_store_leaves_collections_untouched() {
    let services = ServiceContainer::default();

    let mut short = observation("backend", "performance", "too short");
    short.content = "tiny".to_string();
    assert_eq!(
        services.store_observation(short).unwrap_err().field(),
        Some("content")
    );

    let mut missing = observation("backend", "performance", "Missing analysis block here");
    missing.analysis = None;
    assert_eq!(
        services.store_observation(missing).unwrap_err().field(),
        Some("analysis")
    );

    let mut bad_batch = metric("backend", "response_time", &[("2025-01-15T10:00:00Z", 95.0)]);
    bad_batch.measurements.push(MeasurementInput {
        timestamp: Some(json!("2025-01-15T11:00:00Z")),
        value: Some(json!("fast")),
        ..MeasurementInput::default()
    });
    assert_eq!(
        services.store_metric(bad_batch).unwrap_err().field(),
        Some("measurements[1].value")
    );

    assert_eq!(services.counts().unwrap(), (0, 0, 0));
}

#[test]
fn test_metric_batches_append_to_one_series() {
    let services = ServiceContainer::default();
    let first = services
        .store_metric(metric(
            "backend",
            "response_time",
            &[("2025-01-15T10:00:00Z", 95.0), ("2025-01-15T11:00:00Z", 87.0)],
        ))
        .unwrap();
    let second = services
        .store_metric(metric("backend", "response_time", &[("2025-01-15T12:00:00Z", 80.0)]))
        .unwrap();

    assert_eq!(first.metric_id, second.metric_id);
    assert_eq!(second.statistics.count, 3);
    assert_eq!(second.statistics.min, 80.0);

    let other = services
        .store_metric(metric("frontend", "response_time", &[("2025-01-15T12:00:00Z", 80.0)]))
        .unwrap();
    assert_ne!(other.metric_id, first.metric_id);
    assert_eq!(services.counts().unwrap(), (0, 2, 0));
}

#[test]
fn test_threshold_rating() {
    let services = ServiceContainer::default();
    let mut request = metric("backend", "response_time", &[("2025-01-15T10:00:00Z", 150.0)]);
    request.thresholds = Some(vector_observer::models::Thresholds {
        excellent: Some(100.0),
        good: Some(200.0),
        acceptable: Some(500.0),
        poor: Some(1000.0),
    });

    let receipt = services.store_metric(request).unwrap();
    assert_eq!(receipt.rating, Some(Rating::Good));
}

#[test]
fn test_search_filters_and_ordering() {
    let services = ServiceContainer::default();
    services
        .store_observation(observation(
            "backend",
            "performance",
            "Database query latency improved after adding an index",
        ))
        .unwrap();
    services
        .store_observation(observation(
            "frontend",
            "performance",
            "Database query latency regressed on the dashboard page",
        ))
        .unwrap();
    services
        .store_observation(observation(
            "backend",
            "quality",
            "Refactored the payment module for readability",
        ))
        .unwrap();

    let mut query = ObservationQuery::new("database query latency")
        .with_filter(ObservationFilter::default().with_agent_type("backend"));
    query.min_similarity = Some(0.1);
    let result = services.search_observations(&query).unwrap();
    assert_eq!(result.total_found, 1);
    assert_eq!(result.results[0].chunk.metadata.agent_type, "backend");

    let mut unfiltered = ObservationQuery::new("database query latency");
    unfiltered.min_similarity = Some(0.1);
    let result = services.search_observations(&unfiltered).unwrap();
    assert_eq!(result.total_found, 2);
    assert!(result.results[0].similarity >= result.results[1].similarity);
    assert_eq!(result.results[0].rank, 1);
    assert_eq!(result.results[1].rank, 2);

    let mut truncated = unfiltered.clone();
    truncated.limit = Some(1);
    let result = services.search_observations(&truncated).unwrap();
    assert_eq!(result.results.len(), 1);
    assert_eq!(result.total_found, 2);
}

#[test]
fn test_equal_scores_rank_newest_first() {
    let services = ServiceContainer::default();
    let older = services
        .store_observation(observation(
            "backend",
            "success",
            "Deployment pipeline finished without errors",
        ))
        .unwrap();
    let newer = services
        .store_observation(observation(
            "backend",
            "success",
            "Deployment pipeline finished without errors",
        ))
        .unwrap();

    let result = services
        .search_observations(&ObservationQuery::new("deployment pipeline"))
        .unwrap();
    assert_eq!(result.total_found, 2);
    assert_eq!(result.results[0].chunk.id, newer.observation_id);
    assert_eq!(result.results[1].chunk.id, older.observation_id);
}

#[test]
fn test_punctuation_only_query_matches_nothing() {
    let services = ServiceContainer::default();
    services
        .store_observation(observation(
            "backend",
            "performance",
            "Successfully implemented user authentication API",
        ))
        .unwrap();

    let mut query = ObservationQuery::new("?!...");
    query.min_similarity = Some(0.0);
    let result = services.search_observations(&query).unwrap();
    assert!(result.results.iter().all(|hit| hit.similarity == 0.0));
}

#[test]
fn test_insights_compose_all_stores() {
    let services = ServiceContainer::default();

    let mut first = observation(
        "backend",
        "performance",
        "Response time dropped after caching the session lookups",
    );
    first.recommendations = vec!["Cache hot lookups".to_string()];
    services.store_observation(first).unwrap();

    let mut second = observation(
        "testing",
        "quality",
        "Integration suite caught a regression in token refresh",
    );
    second.recommendations = vec![
        "Cache hot lookups".to_string(),
        "Run integration tests on every merge".to_string(),
    ];
    services.store_observation(second).unwrap();

    services
        .store_metric(metric(
            "backend",
            "response_time",
            &[
                ("2025-01-15T10:00:00Z", 200.0),
                ("2025-01-15T11:00:00Z", 180.0),
                ("2025-01-15T12:00:00Z", 150.0),
                ("2025-01-15T13:00:00Z", 120.0),
                ("2025-01-15T14:00:00Z", 100.0),
                ("2025-01-15T15:00:00Z", 90.0),
            ],
        ))
        .unwrap();
    services
        .analyze_pattern(pattern(&["planning", "backend", "testing"], favorable()))
        .unwrap();

    let report = services
        .generate_insights(&InsightRequest {
            include_predictions: true,
            ..InsightRequest::default()
        })
        .unwrap();

    assert_eq!(report.summary.total_observations, 2);
    assert_eq!(report.summary.total_metrics, 1);
    assert_eq!(report.summary.total_measurements, 6);
    assert_eq!(report.summary.total_patterns, 1);
    assert_eq!(report.summary.agent_types, vec!["backend", "testing"]);

    assert_eq!(report.performance_trends["response_time"].trend, Trend::Improving);
    assert_eq!(report.recommendations[0], "Cache hot lookups");
    assert_eq!(report.recommendations.len(), 2);
    assert_eq!(report.patterns.len(), 1);

    let predictions = report.predictions.unwrap();
    assert_eq!(predictions.len(), 1);
    assert!(predictions[0].predicted_value < 90.0);
    assert!((0.0..=1.0).contains(&predictions[0].confidence));
}

#[test]
fn test_insights_scope_by_agent() {
    let services = ServiceContainer::default();
    services
        .store_observation(observation(
            "backend",
            "performance",
            "Backend latency is steady under load",
        ))
        .unwrap();
    services
        .store_observation(observation(
            "frontend",
            "performance",
            "Frontend bundle size grew after the chart upgrade",
        ))
        .unwrap();

    let report = services
        .generate_insights(&InsightRequest {
            agent_type: Some("frontend".to_string()),
            ..InsightRequest::default()
        })
        .unwrap();
    assert_eq!(report.summary.total_observations, 1);
    assert_eq!(report.summary.agent_types, vec!["frontend"]);
    assert!(report.predictions.is_none());
}

#[test]
fn test_insights_reject_malformed_time_range() {
    let services = ServiceContainer::default();
    let err = services
        .generate_insights(&InsightRequest {
            time_range: Some(TimeRangeArgs {
                start: Some("last tuesday".to_string()),
                end: None,
            }),
            ..InsightRequest::default()
        })
        .unwrap_err();
    assert!(err.field().unwrap().starts_with("time_range"));
}

#[test]
fn test_concurrent_metric_appends_serialize() {
    let services = Arc::new(ServiceContainer::default());
    let handles: Vec<_> = (0..8_i32)
        .map(|i| {
            let services = Arc::clone(&services);
            thread::spawn(move || {
                let timestamp = format!("2025-01-15T10:{i:02}:00Z");
                services
                    .store_metric(metric(
                        "backend",
                        "quality_score",
                        &[(timestamp.as_str(), f64::from(i))],
                    ))
                    .unwrap()
            })
        })
        .collect();

    let counts: Vec<usize> = handles
        .into_iter()
        .map(|h| h.join().unwrap().statistics.count)
        .collect();
    let mut sorted = counts.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, (1..=8).collect::<Vec<_>>());
    assert_eq!(services.counts().unwrap(), (0, 1, 0));
}

#[test]
fn test_closed_agent_type_allow_list_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[observations]\nagent_types = [\"backend\", \"testing\"]\n\n[search]\ndefault_limit = 5"
    )
    .unwrap();

    let config = ObserverConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.search.default_limit, 5);

    let services = ServiceContainer::new(config);
    services
        .store_observation(observation(
            "backend",
            "performance",
            "Allowed agent stored its observation",
        ))
        .unwrap();
    let err = services
        .store_observation(observation(
            "research",
            "performance",
            "Unlisted agent tried to store an observation",
        ))
        .unwrap_err();
    assert_eq!(err.field(), Some("agent_type"));

    let err = services
        .store_metric(metric("intruder", "response_time", &[("2025-01-15T10:00:00Z", 95.0)]))
        .unwrap_err();
    assert_eq!(err.field(), Some("agent_type"));

    let err = services
        .analyze_pattern(pattern(&["backend", "intruder"], favorable()))
        .unwrap_err();
    assert_eq!(err.field(), Some("agent_sequence[1]"));

    services
        .store_metric(metric("testing", "response_time", &[("2025-01-15T10:00:00Z", 95.0)]))
        .unwrap();
    services
        .analyze_pattern(pattern(&["backend", "testing"], favorable()))
        .unwrap();
    assert_eq!(services.counts().unwrap(), (1, 1, 1));
}
