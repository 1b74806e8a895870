//! Data models for the observer.
//!
//! Requests are deserialized straight from tool arguments; records are
//! serialized straight into tool responses, so field names here are the wire
//! contract with calling agents.

/// Declares an opaque string identifier with a fixed prefix.
macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix shared by every generated identifier of this kind.
            pub const PREFIX: &'static str = $prefix;

            /// Wraps an existing identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generates a fresh, globally unique identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(format!("{}_{}", Self::PREFIX, uuid::Uuid::new_v4().simple()))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

mod documentation;
mod insights;
mod metric;
mod observation;
mod pattern;
mod search;
mod temporal;

pub use documentation::{
    AppliedFilters, CATEGORY_DESCRIPTIONS, ChunkMetadata, DocumentChunk, DocumentHit,
    DocumentQueryMetadata, DocumentSearchResult, DocumentationQuery, TECHNOLOGIES, Technology,
    find_technology, is_documentation_category,
};
pub use insights::{
    InsightReport, InsightRequest, InsightSummary, MetricPrediction, MetricTrend, PatternRanking,
};
pub use metric::{
    AggregationPeriod, Measurement, MeasurementInput, MetricReceipt, MetricRequest, MetricSeries,
    MetricSeriesMetadata, MetricType, Rating, SeriesId, Statistics, Thresholds,
};
pub use observation::{
    Analysis, Complexity, Impact, Observation, ObservationId, ObservationMetadata,
    ObservationReceipt, ObservationRequest, Trend,
};
pub use pattern::{
    CoordinationPattern, PatternAnalysis, PatternId, PatternMetadata, PatternRequest,
    SuccessMetrics,
};
pub use search::{ObservationFilter, ObservationQuery, SearchHit, SearchResult};
pub use temporal::{TimeRange, TimeRangeArgs, parse_timestamp};

use serde::Serialize;

/// Record discriminator emitted as the `type` field of record metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// An agent observation.
    #[default]
    Observation,
    /// A metric series.
    Metric,
    /// A coordination pattern.
    Pattern,
}

/// Counts whitespace-separated words, the way token budgets are estimated.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
