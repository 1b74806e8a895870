//! Observation store.
//!
//! Observations are write-once and kept in insertion order. Search is a
//! linear scan scoring every candidate that passes the metadata filters.

use super::{require_agent_type, require_text};
use super::similarity::TermSet;
use crate::config::{ObservationSettings, SearchSettings};
use crate::models::{
    Analysis, Complexity, Observation, ObservationId, ObservationMetadata, ObservationQuery,
    ObservationReceipt, ObservationRequest, RecordKind, SearchHit, SearchResult, word_count,
};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::time::Instant;

/// Default environment recorded when the caller names none.
const DEFAULT_ENVIRONMENT: &str = "development";

/// A stored observation with its precomputed term set.
#[derive(Debug, Clone)]
struct StoredObservation {
    observation: Observation,
    terms: TermSet,
}

/// In-memory observation collection.
#[derive(Debug, Clone, Default)]
pub struct ObservationStore {
    settings: ObservationSettings,
    search: SearchSettings,
    entries: Vec<StoredObservation>,
    next_sequence: u64,
}

impl ObservationStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new(settings: ObservationSettings, search: SearchSettings) -> Self {
        Self {
            settings,
            search,
            entries: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Number of stored observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validation rules in effect.
    #[must_use]
    pub const fn settings(&self) -> &ObservationSettings {
        &self.settings
    }

    /// Iterates observations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Observation> {
        self.entries.iter().map(|e| &e.observation)
    }

    /// Validates and stores an observation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a required field is missing, a tag
    /// is not allowed, the content length is out of bounds, or the analysis
    /// block is malformed. Nothing is stored on error.
    pub fn insert(&mut self, request: ObservationRequest) -> Result<ObservationReceipt> {
        let observation = self.build(request, Utc::now())?;
        let receipt = ObservationReceipt {
            observation_id: observation.id.clone(),
            status: "stored",
            timestamp: observation.timestamp(),
        };

        tracing::info!(
            observation_id = %observation.id,
            agent_type = %observation.metadata.agent_type,
            category = %observation.metadata.category,
            "Stored agent observation"
        );
        metrics::counter!(
            "observations_stored_total",
            "category" => observation.metadata.category.clone()
        )
        .increment(1);

        let terms = TermSet::from_text(&observation.content);
        self.entries.push(StoredObservation { observation, terms });
        self.next_sequence += 1;

        Ok(receipt)
    }

    /// Validates `request` and builds the record without storing it.
    fn build(&self, request: ObservationRequest, now: DateTime<Utc>) -> Result<Observation> {
        let agent_type =
            require_agent_type("agent_type", &request.agent_type, &self.settings.agent_types)?;
        let task_id = require_text("task_id", &request.task_id)?;
        let project_id = require_text("project_id", &request.project_id)?;
        let category = require_text("category", &request.category)?;
        if !self.settings.accepts_category(&category) {
            return Err(Error::validation(
                "category",
                format!(
                    "'{category}' is not an accepted category (expected one of: {})",
                    self.settings.categories.join(", ")
                ),
            ));
        }

        let content = request.content.trim();
        let length = content.chars().count();
        let (min, max) = (
            self.settings.min_content_length,
            self.settings.max_content_length,
        );
        if length < min || length > max {
            return Err(Error::validation(
                "content",
                format!("must be between {min} and {max} characters, got {length}"),
            ));
        }

        let observation_data = request
            .observation_data
            .ok_or_else(|| Error::validation("observation_data", "is required"))?;
        let analysis = request
            .analysis
            .ok_or_else(|| Error::validation("analysis", "is required"))
            .and_then(Analysis::from_value)?;
        let complexity = Complexity::parse_field(request.complexity.as_deref(), "complexity")?
            .unwrap_or_default();

        let environment = request
            .environment
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        let feature = request
            .feature
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        Ok(Observation {
            id: ObservationId::generate(),
            content: content.to_string(),
            metadata: ObservationMetadata {
                kind: RecordKind::Observation,
                agent_type,
                task_id,
                project_id,
                category,
                timestamp: now,
                complexity,
                feature,
                environment,
                dependencies: non_empty(request.dependencies),
            },
            observation_data,
            analysis,
            recommendations: non_empty(request.recommendations),
            correlations: non_empty(request.correlations),
            tokens: word_count(content),
            sequence: self.next_sequence,
        })
    }

    /// Ranks stored observations against `query`.
    ///
    /// Candidates failing a filter or scoring below the similarity floor are
    /// dropped; survivors are ordered by similarity, then newest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the query is empty or too long, the
    /// limit is outside `1..=max_limit`, or the floor is outside `[0, 1]`.
    pub fn search(&self, query: &ObservationQuery) -> Result<SearchResult> {
        let start = Instant::now();

        let text = query.query.trim();
        if text.is_empty() {
            return Err(Error::validation("query", "must not be empty"));
        }
        if text.len() > self.search.max_query_length {
            return Err(Error::validation(
                "query",
                format!(
                    "must be at most {} bytes, got {}",
                    self.search.max_query_length,
                    text.len()
                ),
            ));
        }

        let limit = query.limit.unwrap_or(self.search.default_limit);
        if limit == 0 || limit > self.search.max_limit {
            return Err(Error::validation(
                "limit",
                format!("must be between 1 and {}, got {limit}", self.search.max_limit),
            ));
        }

        let min_similarity = query
            .min_similarity
            .unwrap_or(self.search.default_min_similarity);
        if !(0.0..=1.0).contains(&min_similarity) {
            return Err(Error::validation(
                "min_similarity",
                format!("must be between 0.0 and 1.0, got {min_similarity}"),
            ));
        }

        let query_terms = TermSet::from_text(text);
        let mut scored: Vec<(f64, &Observation)> = self
            .entries
            .iter()
            .filter(|entry| query.filter.matches(&entry.observation))
            .map(|entry| (query_terms.similarity(&entry.terms), &entry.observation))
            .filter(|(similarity, _)| *similarity >= min_similarity)
            .collect();

        scored.sort_by(|(sa, a), (sb, b)| rank_order(*sa, a, *sb, b));

        let total_found = scored.len();
        let results = scored
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(i, (similarity, observation))| SearchHit {
                chunk: observation.clone(),
                similarity,
                rank: i + 1,
            })
            .collect();

        let search_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        metrics::histogram!("observation_search_duration_ms").record(search_time_ms);
        tracing::debug!(
            total_found,
            limit,
            min_similarity,
            search_time_ms,
            "Searched agent observations"
        );

        Ok(SearchResult {
            results,
            total_found,
            search_time_ms,
        })
    }
}

/// Orders by similarity descending, then timestamp descending, then
/// insertion order descending.
fn rank_order(sa: f64, a: &Observation, sb: f64, b: &Observation) -> Ordering {
    sb.total_cmp(&sa)
        .then_with(|| b.timestamp().cmp(&a.timestamp()))
        .then_with(|| b.sequence.cmp(&a.sequence))
}

fn non_empty(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}
