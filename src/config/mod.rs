//! Configuration management.
//!
//! Configuration comes from, in order of precedence:
//!
//! 1. Environment overrides (`VECTOR_DB_PATH`, `VECTOR_OBSERVER_*`)
//! 2. The TOML file given with `--config` or `VECTOR_OBSERVER_CONFIG_PATH`
//! 3. `<platform config dir>/vector-observer/config.toml`
//! 4. Built-in defaults

mod settings;

pub use settings::{
    DEFAULT_CATEGORIES, DocumentationSettings, InsightSettings, LogFormat, LoggingSettings,
    MetricsSettings, ObservationSettings, PatternSettings, SearchSettings,
};
pub(crate) use settings::allows;

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "VECTOR_OBSERVER_CONFIG_PATH";

/// Main configuration for the observer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObserverConfig {
    /// Search limits.
    pub search: SearchSettings,
    /// Observation validation.
    pub observations: ObservationSettings,
    /// Pattern scoring.
    pub patterns: PatternSettings,
    /// Insight generation.
    pub insights: InsightSettings,
    /// Documentation index.
    pub documentation: DocumentationSettings,
    /// Log output.
    pub logging: LoggingSettings,
    /// Prometheus exporter.
    pub metrics: MetricsSettings,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Search section.
    pub search: Option<ConfigFileSearch>,
    /// Observations section.
    pub observations: Option<ConfigFileObservations>,
    /// Patterns section.
    pub patterns: Option<ConfigFilePatterns>,
    /// Insights section.
    pub insights: Option<ConfigFileInsights>,
    /// Documentation section.
    pub documentation: Option<ConfigFileDocumentation>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
    /// Metrics section.
    pub metrics: Option<ConfigFileMetrics>,
}

/// Search section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileSearch {
    /// Default limit.
    pub default_limit: Option<usize>,
    /// Maximum limit.
    pub max_limit: Option<usize>,
    /// Default similarity floor.
    pub default_min_similarity: Option<f64>,
    /// Maximum query length.
    pub max_query_length: Option<usize>,
}

/// Observations section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileObservations {
    /// Minimum content length.
    pub min_content_length: Option<usize>,
    /// Maximum content length.
    pub max_content_length: Option<usize>,
    /// Agent type allow-list.
    pub agent_types: Option<Vec<String>>,
    /// Category allow-list.
    pub categories: Option<Vec<String>>,
}

/// Patterns section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFilePatterns {
    /// Completion weight.
    pub completion_weight: Option<f64>,
    /// Quality weight.
    pub quality_weight: Option<f64>,
    /// Conflict weight.
    pub conflict_weight: Option<f64>,
    /// Duration weight.
    pub duration_weight: Option<f64>,
    /// Neutral value for missing metrics.
    pub neutral_value: Option<f64>,
    /// Reference per-agent duration.
    pub reference_stage_duration: Option<f64>,
    /// Conflict suggestion trigger.
    pub conflict_threshold: Option<f64>,
    /// Completion suggestion trigger.
    pub completion_threshold: Option<f64>,
    /// Quality suggestion trigger.
    pub quality_threshold: Option<f64>,
    /// Maximum suggestions.
    pub max_suggestions: Option<usize>,
}

/// Insights section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileInsights {
    /// Trend threshold.
    pub trend_threshold: Option<f64>,
    /// Maximum recommendations.
    pub max_recommendations: Option<usize>,
    /// Maximum patterns.
    pub max_patterns: Option<usize>,
}

/// Documentation section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileDocumentation {
    /// Index directory.
    pub index_dir: Option<String>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Log file path.
    pub file: Option<String>,
    /// Filter directive.
    pub filter: Option<String>,
}

/// Metrics section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileMetrics {
    /// Enable the exporter.
    pub enabled: Option<bool>,
    /// Exporter port.
    pub port: Option<u16>,
}

impl ObserverConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves the effective configuration.
    ///
    /// An explicit path (or `VECTOR_OBSERVER_CONFIG_PATH`) must load;
    /// otherwise the platform default is tried and defaults are used if it is
    /// absent or broken. Environment overrides are applied last.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be read, parsed
    /// or validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::load_default(),
        };

        let config = config.with_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::internal("read_config_file", format!("{}: {e}", path.display())))?;

        let file: ConfigFile = toml::from_str(&contents)
            .map_err(|e| Error::internal("parse_config_file", format!("{}: {e}", path.display())))?;

        let config = Self::from_config_file(file);
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from the platform config directory.
    ///
    /// Returns default configuration if no config file is found or it fails
    /// to load.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let path = base_dirs
            .config_dir()
            .join("vector-observer")
            .join("config.toml");
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unusable config file");
                Self::default()
            },
        }
    }

    /// Converts a `ConfigFile` to `ObserverConfig`.
    #[must_use]
    pub fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(search) = file.search {
            let s = &mut config.search;
            set(&mut s.default_limit, search.default_limit);
            set(&mut s.max_limit, search.max_limit);
            set(&mut s.default_min_similarity, search.default_min_similarity);
            set(&mut s.max_query_length, search.max_query_length);
        }
        if let Some(observations) = file.observations {
            let o = &mut config.observations;
            set(&mut o.min_content_length, observations.min_content_length);
            set(&mut o.max_content_length, observations.max_content_length);
            set(&mut o.agent_types, observations.agent_types);
            set(&mut o.categories, observations.categories);
        }
        if let Some(patterns) = file.patterns {
            let p = &mut config.patterns;
            set(&mut p.completion_weight, patterns.completion_weight);
            set(&mut p.quality_weight, patterns.quality_weight);
            set(&mut p.conflict_weight, patterns.conflict_weight);
            set(&mut p.duration_weight, patterns.duration_weight);
            set(&mut p.neutral_value, patterns.neutral_value);
            set(&mut p.reference_stage_duration, patterns.reference_stage_duration);
            set(&mut p.conflict_threshold, patterns.conflict_threshold);
            set(&mut p.completion_threshold, patterns.completion_threshold);
            set(&mut p.quality_threshold, patterns.quality_threshold);
            set(&mut p.max_suggestions, patterns.max_suggestions);
        }
        if let Some(insights) = file.insights {
            let i = &mut config.insights;
            set(&mut i.trend_threshold, insights.trend_threshold);
            set(&mut i.max_recommendations, insights.max_recommendations);
            set(&mut i.max_patterns, insights.max_patterns);
        }
        if let Some(documentation) = file.documentation {
            if let Some(dir) = documentation.index_dir {
                config.documentation.index_dir = Some(PathBuf::from(dir));
            }
        }
        if let Some(logging) = file.logging {
            if let Some(format) = logging.format {
                config.logging.format = LogFormat::parse(&format);
            }
            if let Some(file) = logging.file {
                config.logging.file = Some(PathBuf::from(file));
            }
            config.logging.filter = logging.filter.or(config.logging.filter);
        }
        if let Some(metrics) = file.metrics {
            set(&mut config.metrics.enabled, metrics.enabled);
            set(&mut config.metrics.port, metrics.port);
        }

        config
    }

    /// Applies environment overrides using `lookup` to read variables.
    ///
    /// | Variable | Effect |
    /// |----------|--------|
    /// | `VECTOR_DB_PATH` | Documentation index directory |
    /// | `VECTOR_OBSERVER_LOG_FORMAT` | `pretty` or `json` |
    /// | `VECTOR_OBSERVER_LOG_FILE` | Append logs to this file |
    /// | `VECTOR_OBSERVER_METRICS_ENABLED` | `true`/`1` enables the exporter |
    /// | `VECTOR_OBSERVER_METRICS_PORT` | Exporter port |
    /// | `RUST_LOG` | Log filter directive |
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get("VECTOR_DB_PATH") {
            self.documentation.index_dir = Some(PathBuf::from(dir));
        }
        if let Some(format) = get("VECTOR_OBSERVER_LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&format);
        }
        if let Some(file) = get("VECTOR_OBSERVER_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }
        if let Some(enabled) = get("VECTOR_OBSERVER_METRICS_ENABLED") {
            self.metrics.enabled = matches!(
                enabled.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(port) = get("VECTOR_OBSERVER_METRICS_PORT").and_then(|p| p.trim().parse().ok())
        {
            self.metrics.port = port;
        }
        if let Some(filter) = get("RUST_LOG") {
            self.logging.filter = Some(filter);
        }

        self
    }

    /// Checks that limits, ranges and weights are coherent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        let s = &self.search;
        if s.max_limit == 0 {
            return Err(Error::validation("search.max_limit", "must be at least 1"));
        }
        if s.default_limit == 0 || s.default_limit > s.max_limit {
            return Err(Error::validation(
                "search.default_limit",
                format!("must be between 1 and {}", s.max_limit),
            ));
        }
        check_fraction("search.default_min_similarity", s.default_min_similarity)?;

        let o = &self.observations;
        if o.min_content_length > o.max_content_length {
            return Err(Error::validation(
                "observations.min_content_length",
                "must not exceed max_content_length",
            ));
        }

        let p = &self.patterns;
        for (field, weight) in [
            ("patterns.completion_weight", p.completion_weight),
            ("patterns.quality_weight", p.quality_weight),
            ("patterns.conflict_weight", p.conflict_weight),
            ("patterns.duration_weight", p.duration_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::validation(field, "must be a non-negative number"));
            }
        }
        check_fraction("patterns.neutral_value", p.neutral_value)?;
        if !p.reference_stage_duration.is_finite() || p.reference_stage_duration <= 0.0 {
            return Err(Error::validation(
                "patterns.reference_stage_duration",
                "must be positive",
            ));
        }

        let i = &self.insights;
        if !i.trend_threshold.is_finite() || i.trend_threshold < 0.0 {
            return Err(Error::validation(
                "insights.trend_threshold",
                "must be a non-negative number",
            ));
        }

        Ok(())
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn check_fraction(field: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::validation(field, "must be between 0.0 and 1.0"))
    }
}
