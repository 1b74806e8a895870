//! Coordination pattern analysis.
//!
//! Every analysis stores a new pattern record; patterns sharing a name are
//! never merged. Effectiveness is a weighted blend of the success metrics:
//!
//! ```text
//! score = w_c * completion + w_q * quality + w_x * (1 - conflict) + w_d * duration_bonus
//! duration_bonus = 1 - (average_duration / agents) / reference_stage_duration
//! ```
//!
//! Missing metrics count as the neutral value and every term is clamped to
//! `[0, 1]`, so the score stays in `[0, 1]`.

use super::{require_agent_type, require_text};
use crate::config::PatternSettings;
use crate::models::{
    Complexity, CoordinationPattern, PatternAnalysis, PatternId, PatternMetadata, PatternRequest,
    RecordKind, SuccessMetrics, word_count,
};
use crate::{Error, Result};
use chrono::Utc;

/// In-memory coordination pattern collection.
#[derive(Debug, Clone, Default)]
pub struct PatternAnalyzer {
    settings: PatternSettings,
    agent_types: Vec<String>,
    patterns: Vec<CoordinationPattern>,
}

impl PatternAnalyzer {
    /// Creates an empty analyzer.
    #[must_use]
    pub const fn new(settings: PatternSettings) -> Self {
        Self {
            settings,
            agent_types: Vec::new(),
            patterns: Vec::new(),
        }
    }

    /// Restricts sequences to the listed agent types; empty accepts any.
    #[must_use]
    pub fn with_agent_types(mut self, agent_types: Vec<String>) -> Self {
        self.agent_types = agent_types;
        self
    }

    /// Number of stored patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns true if no pattern has been analyzed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Iterates patterns in analysis order.
    pub fn iter(&self) -> impl Iterator<Item = &CoordinationPattern> {
        self.patterns.iter()
    }

    /// Scoring settings in effect.
    #[must_use]
    pub const fn settings(&self) -> &PatternSettings {
        &self.settings
    }

    /// Validates, scores and stores a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the sequence has fewer than two
    /// agents, an agent is empty or not accepted, the name or project is
    /// empty, a rate lies outside `[0, 1]`, the duration is negative, or a
    /// complexity level is unknown.
    pub fn analyze(&mut self, request: PatternRequest) -> Result<PatternAnalysis> {
        if request.agent_sequence.len() < 2 {
            return Err(Error::validation(
                "agent_sequence",
                format!(
                    "must contain at least 2 agents, got {}",
                    request.agent_sequence.len()
                ),
            ));
        }
        let agent_sequence = request
            .agent_sequence
            .iter()
            .enumerate()
            .map(|(i, agent)| {
                require_agent_type(&format!("agent_sequence[{i}]"), agent, &self.agent_types)
            })
            .collect::<Result<Vec<_>>>()?;
        let pattern_name = require_text("pattern_name", &request.pattern_name)?;
        let project_context = require_text("project_context", &request.project_context)?;

        let success_metrics = request.success_metrics.unwrap_or_default();
        validate_success_metrics(&success_metrics)?;

        let complexity_suitability = match request.complexity_suitability {
            None => vec![Complexity::Medium],
            Some(levels) => levels
                .iter()
                .enumerate()
                .map(|(i, level)| {
                    let field = format!("complexity_suitability[{i}]");
                    Complexity::parse_field(Some(level.as_str()), &field)
                        .map(Option::unwrap_or_default)
                })
                .collect::<Result<Vec<_>>>()?,
        };

        let effectiveness_score =
            effectiveness(&self.settings, &success_metrics, agent_sequence.len());
        let optimization_suggestions =
            suggestions(&self.settings, &success_metrics, agent_sequence.len());

        let content = CoordinationPattern::describe(&pattern_name, &agent_sequence);
        let pattern = CoordinationPattern {
            id: PatternId::generate(),
            tokens: word_count(&content),
            content,
            metadata: PatternMetadata {
                kind: RecordKind::Pattern,
                pattern_name,
                agent_sequence,
                project_context,
                timestamp: Utc::now(),
                complexity_suitability,
            },
            success_metrics,
            applicable_scenarios: request.applicable_scenarios,
            resource_requirements: request.resource_requirements,
            historical_performance: request.historical_performance,
        };

        tracing::info!(
            pattern_id = %pattern.id,
            pattern_name = %pattern.metadata.pattern_name,
            agents = pattern.metadata.agent_sequence.len(),
            effectiveness_score,
            "Analyzed coordination pattern"
        );
        metrics::counter!("patterns_analyzed_total").increment(1);

        let analysis = PatternAnalysis {
            pattern_id: pattern.id.clone(),
            effectiveness_score,
            optimization_suggestions,
            applicable_scenarios: pattern.applicable_scenarios.clone(),
        };
        self.patterns.push(pattern);

        Ok(analysis)
    }

    /// Effectiveness of a stored pattern, derived from its success metrics.
    #[must_use]
    pub fn effectiveness_of(&self, pattern: &CoordinationPattern) -> f64 {
        effectiveness(
            &self.settings,
            &pattern.success_metrics,
            pattern.metadata.agent_sequence.len(),
        )
    }
}

fn validate_success_metrics(metrics: &SuccessMetrics) -> Result<()> {
    for (name, rate) in metrics.rates() {
        if let Some(rate) = rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(Error::validation(
                    format!("success_metrics.{name}"),
                    format!("must be between 0.0 and 1.0, got {rate}"),
                ));
            }
        }
    }
    if let Some(duration) = metrics.average_duration {
        if !duration.is_finite() || duration < 0.0 {
            return Err(Error::validation(
                "success_metrics.average_duration",
                format!("must be a non-negative number of hours, got {duration}"),
            ));
        }
    }
    Ok(())
}

/// Mean hours each agent in the sequence accounts for.
#[allow(clippy::cast_precision_loss)]
fn stage_duration(average_duration: f64, agents: usize) -> f64 {
    average_duration / agents.max(1) as f64
}

/// Derives the effectiveness score of `metrics` for a sequence of `agents`.
#[must_use]
pub fn effectiveness(settings: &PatternSettings, metrics: &SuccessMetrics, agents: usize) -> f64 {
    let neutral = settings.neutral_value;
    let term = |value: Option<f64>| value.unwrap_or(neutral).clamp(0.0, 1.0);

    let duration_bonus = metrics.average_duration.map_or(neutral, |hours| {
        1.0 - stage_duration(hours, agents) / settings.reference_stage_duration
    });

    let score = settings.completion_weight * term(metrics.completion_rate)
        + settings.quality_weight * term(metrics.quality_score)
        + settings.conflict_weight * (1.0 - term(metrics.conflict_rate))
        + settings.duration_weight * term(Some(duration_bonus));

    score.clamp(0.0, 1.0)
}

/// Suggests improvements for the weakest measured dimensions, worst first.
///
/// Unmeasured dimensions never trigger a suggestion. When nothing is weak a
/// single reuse suggestion is returned.
#[must_use]
pub fn suggestions(
    settings: &PatternSettings,
    metrics: &SuccessMetrics,
    agents: usize,
) -> Vec<String> {
    let mut out = Vec::new();

    if let Some(conflict) = metrics.conflict_rate.filter(|c| *c > settings.conflict_threshold) {
        out.push(format!(
            "Add synchronization checkpoints between agents to reduce the {:.0}% conflict rate",
            conflict * 100.0
        ));
    }
    if let Some(hours) = metrics.average_duration {
        let per_stage = stage_duration(hours, agents);
        if per_stage > settings.reference_stage_duration {
            out.push(format!(
                "Parallelize independent stages: {per_stage:.1}h per agent exceeds the {:.1}h target",
                settings.reference_stage_duration
            ));
        }
    }
    if let Some(completion) = metrics
        .completion_rate
        .filter(|c| *c < settings.completion_threshold)
    {
        out.push(format!(
            "Add validation gates at each handoff to lift the {:.0}% completion rate",
            completion * 100.0
        ));
    }
    if let Some(quality) = metrics.quality_score.filter(|q| *q < settings.quality_threshold) {
        out.push(format!(
            "Insert a dedicated review stage before completion to raise the {quality:.2} quality score"
        ));
    }

    if out.is_empty() {
        out.push("Pattern performs well; reuse it for similar multi-agent tasks".to_string());
    }
    out.truncate(settings.max_suggestions.max(1));
    out
}
