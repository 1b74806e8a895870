//! Observation search types.

use super::{Complexity, Observation, TimeRange};
use serde::Serialize;

/// Metadata filters for observation search. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObservationFilter {
    /// Exact agent type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<String>,
    /// Exact category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Exact project identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Exact task identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Exact complexity level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    /// Inclusive creation-time window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
}

impl ObservationFilter {
    /// Creates an empty filter (matches all).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            agent_type: None,
            category: None,
            project_id: None,
            task_id: None,
            complexity: None,
            time_range: None,
        }
    }

    /// Restricts results to one agent type.
    #[must_use]
    pub fn with_agent_type(mut self, agent_type: impl Into<String>) -> Self {
        self.agent_type = Some(agent_type.into());
        self
    }

    /// Restricts results to one category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Restricts results to one project.
    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Restricts results to one task.
    #[must_use]
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Restricts results to one complexity level.
    #[must_use]
    pub const fn with_complexity(mut self, complexity: Complexity) -> Self {
        self.complexity = Some(complexity);
        self
    }

    /// Restricts results to a creation-time window.
    #[must_use]
    pub const fn with_time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// Returns true if the filter is empty (matches all).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.agent_type.is_none()
            && self.category.is_none()
            && self.project_id.is_none()
            && self.task_id.is_none()
            && self.complexity.is_none()
            && self.time_range.is_none()
    }

    /// Returns true if `observation` passes every active filter.
    #[must_use]
    pub fn matches(&self, observation: &Observation) -> bool {
        let meta = &observation.metadata;
        let eq = |filter: Option<&String>, value: &str| filter.is_none_or(|f| f == value);

        eq(self.agent_type.as_ref(), &meta.agent_type)
            && eq(self.category.as_ref(), &meta.category)
            && eq(self.project_id.as_ref(), &meta.project_id)
            && eq(self.task_id.as_ref(), &meta.task_id)
            && self.complexity.is_none_or(|c| c == meta.complexity)
            && self
                .time_range
                .is_none_or(|range| range.contains(meta.timestamp))
    }
}

/// A validated observation search.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationQuery {
    /// Free-text query (non-empty).
    pub query: String,
    /// Maximum results; the configured default applies when unset.
    pub limit: Option<usize>,
    /// Similarity floor; the configured default applies when unset.
    pub min_similarity: Option<f64>,
    /// Metadata filters.
    pub filter: ObservationFilter,
}

impl ObservationQuery {
    /// Creates a query with default limit, floor and no filters.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
            min_similarity: None,
            filter: ObservationFilter::new(),
        }
    }

    /// Sets the result limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the similarity floor.
    #[must_use]
    pub const fn with_min_similarity(mut self, min_similarity: f64) -> Self {
        self.min_similarity = Some(min_similarity);
        self
    }

    /// Sets the metadata filters.
    #[must_use]
    pub fn with_filter(mut self, filter: ObservationFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// The matching observation.
    pub chunk: Observation,
    /// Similarity in `[0, 1]`.
    pub similarity: f64,
    /// 1-based rank.
    pub rank: usize,
}

/// Ranked observation search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    /// Hits, best first.
    pub results: Vec<SearchHit>,
    /// Number of matches before truncation to the limit.
    pub total_found: usize,
    /// Elapsed search time in milliseconds.
    pub search_time_ms: f64,
}
