//! The service handle shared by every transport.
//!
//! All three collections live behind one reader/writer lock: writes never
//! interleave and a reader never sees a half-appended batch. Validation runs
//! inside the store methods before any mutation, so a rejected call leaves
//! the collections untouched.

use super::{
    DocumentationIndex, InsightGenerator, MetricAggregator, ObservationStore, PatternAnalyzer,
};
use crate::config::ObserverConfig;
use crate::models::{
    DocumentSearchResult, DocumentationQuery, InsightReport, InsightRequest, MetricReceipt,
    MetricRequest, ObservationQuery, ObservationReceipt, ObservationRequest, PatternAnalysis,
    PatternRequest, SearchResult,
};
use crate::{Error, Result};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::instrument;

/// The three in-memory collections.
#[derive(Debug)]
struct Stores {
    observations: ObservationStore,
    metrics: MetricAggregator,
    patterns: PatternAnalyzer,
}

/// Owns the stores and the documentation index.
///
/// Create one per process (or per test) and share it behind an `Arc`.
#[derive(Debug)]
pub struct ServiceContainer {
    config: ObserverConfig,
    stores: RwLock<Stores>,
    documentation: DocumentationIndex,
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::with_documentation(ObserverConfig::default(), DocumentationIndex::demo())
    }
}

impl ServiceContainer {
    /// Creates empty stores and loads the documentation index named by
    /// `config`.
    #[must_use]
    pub fn new(config: ObserverConfig) -> Self {
        let documentation = DocumentationIndex::load(config.documentation.index_dir.as_deref());
        Self::with_documentation(config, documentation)
    }

    /// Creates empty stores served alongside `documentation`.
    #[must_use]
    pub fn with_documentation(config: ObserverConfig, documentation: DocumentationIndex) -> Self {
        let stores = Stores {
            observations: ObservationStore::new(
                config.observations.clone(),
                config.search.clone(),
            ),
            metrics: MetricAggregator::new()
                .with_agent_types(config.observations.agent_types.clone()),
            patterns: PatternAnalyzer::new(config.patterns.clone())
                .with_agent_types(config.observations.agent_types.clone()),
        };
        Self {
            config,
            stores: RwLock::new(stores),
            documentation,
        }
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &ObserverConfig {
        &self.config
    }

    /// The documentation index.
    #[must_use]
    pub const fn documentation(&self) -> &DocumentationIndex {
        &self.documentation
    }

    fn read(&self, operation: &str) -> Result<RwLockReadGuard<'_, Stores>> {
        self.stores.read().map_err(|_| Error::OperationFailed {
            operation: operation.to_string(),
            cause: "Lock poisoned".to_string(),
        })
    }

    fn write(&self, operation: &str) -> Result<RwLockWriteGuard<'_, Stores>> {
        self.stores.write().map_err(|_| Error::OperationFailed {
            operation: operation.to_string(),
            cause: "Lock poisoned".to_string(),
        })
    }

    /// Stores an agent observation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for invalid input.
    #[instrument(skip(self, request), fields(operation = "store_observation"))]
    pub fn store_observation(&self, request: ObservationRequest) -> Result<ObservationReceipt> {
        self.write("store_observation")?.observations.insert(request)
    }

    /// Searches stored observations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an invalid query.
    #[instrument(skip(self, query), fields(operation = "search_observations"))]
    pub fn search_observations(&self, query: &ObservationQuery) -> Result<SearchResult> {
        self.read("search_observations")?.observations.search(query)
    }

    /// Appends a metric batch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for invalid input.
    #[instrument(skip(self, request), fields(operation = "store_metric"))]
    pub fn store_metric(&self, request: MetricRequest) -> Result<MetricReceipt> {
        self.write("store_metric")?.metrics.record(request)
    }

    /// Scores and stores a coordination pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for invalid input.
    #[instrument(skip(self, request), fields(operation = "analyze_pattern"))]
    pub fn analyze_pattern(&self, request: PatternRequest) -> Result<PatternAnalysis> {
        self.write("analyze_pattern")?.patterns.analyze(request)
    }

    /// Generates insights over a consistent snapshot of all stores.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a malformed time range or focus area.
    #[instrument(skip(self, request), fields(operation = "generate_insights"))]
    pub fn generate_insights(&self, request: &InsightRequest) -> Result<InsightReport> {
        let stores = self.read("generate_insights")?;
        InsightGenerator::new(
            &self.config.insights,
            &stores.observations,
            &stores.metrics,
            &stores.patterns,
        )
        .generate(request)
    }

    /// Searches the documentation index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an invalid query.
    #[instrument(skip(self, query), fields(operation = "search_documentation"))]
    pub fn search_documentation(&self, query: &DocumentationQuery) -> Result<DocumentSearchResult> {
        self.documentation.search(query, &self.config.search)
    }

    /// Record counts: observations, metric series, patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn counts(&self) -> Result<(usize, usize, usize)> {
        let stores = self.read("counts")?;
        Ok((
            stores.observations.len(),
            stores.metrics.len(),
            stores.patterns.len(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};
    use std::sync::Arc;
    use std::thread;

    fn observation(i: usize) -> ObservationRequest {
        ObservationRequest {
            agent_type: "backend".to_string(),
            task_id: format!("task-{i}"),
            project_id: "project-a".to_string(),
            category: "success".to_string(),
            content: format!("completed deployment step number {i}"),
            observation_data: Some(Map::new()),
            analysis: Some(json!({"trend": "improving"})),
            ..ObservationRequest::default()
        }
    }

    #[test]
    fn test_rejected_call_leaves_stores_untouched() {
        let container = ServiceContainer::default();
        let err = container
            .analyze_pattern(PatternRequest {
                agent_sequence: vec!["solo".to_string()],
                pattern_name: "solo".to_string(),
                project_context: "p".to_string(),
                ..PatternRequest::default()
            })
            .unwrap_err();
        assert_eq!(err.field(), Some("agent_sequence"));
        assert_eq!(container.counts().unwrap(), (0, 0, 0));
    }

    #[test]
    fn test_concurrent_writes_serialize() {
        let container = Arc::new(ServiceContainer::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let container = Arc::clone(&container);
                thread::spawn(move || {
                    for i in 0..25 {
                        container.store_observation(observation(t * 100 + i)).unwrap();
                        container
                            .store_metric(MetricRequest {
                                agent_type: "backend".to_string(),
                                metric_type: "response_time".to_string(),
                                project_id: "project-a".to_string(),
                                measurements: vec![
                                    serde_json::from_value(json!({
                                        "timestamp": "2024-01-01T10:00:00Z",
                                        "value": 1.0
                                    }))
                                    .unwrap(),
                                ],
                                ..MetricRequest::default()
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(container.counts().unwrap(), (200, 1, 0));
        let report = container
            .generate_insights(&InsightRequest::default())
            .unwrap();
        assert_eq!(report.summary.total_measurements, 200);
    }

    #[test]
    fn test_fresh_containers_are_isolated() {
        let a = ServiceContainer::default();
        let b = ServiceContainer::default();
        a.store_observation(observation(1)).unwrap();
        assert_eq!(a.counts().unwrap().0, 1);
        assert_eq!(b.counts().unwrap().0, 0);
    }

    #[test]
    fn test_documentation_is_served() {
        let container = ServiceContainer::default();
        assert!(container.documentation().is_demo());
        let result = container
            .search_documentation(&DocumentationQuery {
                query: "convex database".to_string(),
                min_similarity: Some(0.1),
                ..DocumentationQuery::default()
            })
            .unwrap();
        assert_eq!(result.results[0].chunk.chunk_id, "convex_001");
    }
}
