//! PredictionService: runs the scoring components, weights them for a
//! strategy, and degrades through relaxed, frequency-only, and uniform
//! results instead of failing.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, NaiveDate, Utc};
use moka::sync::Cache;
use quiniela_core::config::{EnsembleConfig, QuinielaConfig};
use quiniela_core::errors::QuinielaErrorCode;
use quiniela_core::traits::DrawRepository;
use quiniela_core::types::NUMBER_COUNT;

use super::combiner::{self, Candidate};
use super::fallback;
use super::quality::{adjust_weights, DataQuality, WindowProfile};
use super::report::{ComponentReport, OutcomeStatus, Prediction, PredictionOutcome, PredictionStatistics};
use super::strategy::{ComponentWeights, Strategy};
use crate::detectors::DrawHistory;
use crate::engine::PatternEngine;
use crate::scoring::{
    validate, ComponentKind, ComponentOutput, ComponentStatus, FrequencyComponent, GapComponent,
    PatternComponent, ScoringComponent, ScoringContext, TrendComponent,
};

const MAX_MEMO_ENTRIES: u64 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PredictionKey {
    strategy: Strategy,
    window_days: u32,
    count: usize,
    threshold_bits: u64,
    as_of: NaiveDate,
}

/// What one component produced for a request.
struct ComponentRun {
    kind: ComponentKind,
    status: ComponentStatus,
    quality: DataQuality,
    output: Option<ComponentOutput>,
}

/// Ensemble predictions with a short-lived memo per request shape.
pub struct PredictionService {
    draws: Arc<dyn DrawRepository>,
    engine: Option<Arc<PatternEngine>>,
    components: Vec<Box<dyn ScoringComponent>>,
    config: EnsembleConfig,
    memo: Cache<PredictionKey, Arc<PredictionOutcome>>,
}

impl PredictionService {
    /// Service with the four standard components.
    pub fn new(
        draws: Arc<dyn DrawRepository>,
        engine: Arc<PatternEngine>,
        config: &QuinielaConfig,
    ) -> Self {
        let components: Vec<Box<dyn ScoringComponent>> = vec![
            Box::new(FrequencyComponent::new(Arc::clone(&draws))),
            Box::new(GapComponent::new(Arc::clone(&draws))),
            Box::new(TrendComponent::new(Arc::clone(&draws))),
            Box::new(PatternComponent::new(Arc::clone(&engine), Arc::clone(&draws))),
        ];
        let mut service = Self::with_components(draws, components, config.ensemble.clone());
        service.engine = Some(engine);
        service
    }

    /// Service over an explicit component set and no pattern engine.
    pub fn with_components(
        draws: Arc<dyn DrawRepository>,
        components: Vec<Box<dyn ScoringComponent>>,
        config: EnsembleConfig,
    ) -> Self {
        let memo = Cache::builder()
            .max_capacity(MAX_MEMO_ENTRIES)
            .time_to_live(Duration::from_secs(config.effective_prediction_ttl_secs()))
            .build();
        Self {
            draws,
            engine: None,
            components,
            config,
            memo,
        }
    }

    /// Strategy names with their descriptions.
    pub fn available_strategies(&self) -> BTreeMap<&'static str, &'static str> {
        Strategy::ALL
            .iter()
            .map(|s| (s.name(), s.description()))
            .collect()
    }

    /// Drop memoized predictions and the engine's aggregation cache.
    pub fn clear_cache(&self) {
        self.memo.invalidate_all();
        if let Some(engine) = &self.engine {
            engine.clear_cache();
        }
    }

    /// Rank `count` numbers for `strategy` over the window ending today.
    pub fn generate_predictions(
        &self,
        strategy: Strategy,
        window_days: u32,
        count: usize,
        threshold: f64,
    ) -> PredictionOutcome {
        let now = Utc::now();
        self.generate_predictions_at(strategy, window_days, count, threshold, now.date_naive(), now.timestamp())
    }

    /// As `generate_predictions`, with the window ending at `as_of` and
    /// pattern batch age measured against `now` (unix seconds).
    pub fn generate_predictions_at(
        &self,
        strategy: Strategy,
        window_days: u32,
        count: usize,
        threshold: f64,
        as_of: NaiveDate,
        now: i64,
    ) -> PredictionOutcome {
        let threshold = if threshold.is_finite() {
            threshold.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let count = count.min(NUMBER_COUNT);
        let key = PredictionKey {
            strategy,
            window_days,
            count,
            threshold_bits: threshold.to_bits(),
            as_of,
        };
        let mut outcome = match self.memo.get(&key) {
            Some(hit) => {
                tracing::debug!(strategy = %strategy, window_days, prediction_cache_hit = true, "predictions served from memo");
                (*hit).clone()
            }
            None => {
                let built = self.build(strategy, window_days, count, threshold, as_of, now);
                self.memo.insert(key, Arc::new(built.clone()));
                built
            }
        };
        // Batch age depends on `now`, so it is measured per call and never memoized.
        outcome.pattern_batch_age_secs = self.pattern_batch_age(window_days, now, &mut outcome.notes);
        outcome
    }

    fn build(
        &self,
        strategy: Strategy,
        window_days: u32,
        count: usize,
        threshold: f64,
        as_of: NaiveDate,
        now: i64,
    ) -> PredictionOutcome {
        let span = tracing::info_span!("generate_predictions", strategy = %strategy, window_days, count);
        let _guard = span.enter();
        let mut notes = Vec::new();

        let profile = self.profile(window_days, as_of, &mut notes);
        let ctx = ScoringContext {
            window_days,
            as_of,
            now,
        };
        let runs: Vec<ComponentRun> = if window_days == 0 {
            notes.push("window must cover at least one day".to_string());
            Vec::new()
        } else {
            self.components
                .iter()
                .map(|c| self.run_component(c.as_ref(), &ctx, &profile))
                .collect()
        };

        let active: Vec<(ComponentKind, f64)> = runs
            .iter()
            .filter(|r| r.status.is_valid())
            .map(|r| (r.kind, r.quality.overall))
            .collect();
        let weights = adjust_weights(strategy, &active, self.config.effective_min_component_weight());
        let valid_outputs: Vec<&ComponentOutput> = runs
            .iter()
            .filter(|r| r.status.is_valid())
            .filter_map(|r| r.output.as_ref())
            .collect();
        let candidates = combiner::combine(&valid_outputs, &weights);

        let (status, selected, applied_threshold) =
            self.select(&runs, &candidates, count, threshold, &mut notes);

        let predictions: Vec<Prediction> = selected
            .into_iter()
            .enumerate()
            .map(|(i, c)| Prediction::from_candidate(i + 1, c, status))
            .collect();
        let components = component_reports(strategy, &runs, &weights, &predictions);

        tracing::info!(
            status = ?status,
            predictions = predictions.len(),
            active_components = active.len(),
            "predictions generated"
        );

        PredictionOutcome {
            strategy,
            window_days,
            as_of,
            requested_count: count,
            requested_threshold: threshold,
            applied_threshold,
            status,
            statistics: PredictionStatistics::from_predictions(&predictions),
            predictions,
            components,
            pattern_batch_age_secs: None,
            notes,
        }
    }

    fn profile(&self, window_days: u32, as_of: NaiveDate, notes: &mut Vec<String>) -> WindowProfile {
        let history = as_of
            .checked_sub_days(Days::new(u64::from(window_days)))
            .map(|start| self.draws.get_draws_in_period(start, as_of));
        match history {
            Some(Ok(draws)) => WindowProfile::from_history(&DrawHistory::from_draws(&draws), window_days, as_of),
            Some(Err(e)) => {
                tracing::warn!(error = %e.tagged_string(), "could not measure window quality");
                notes.push(format!("data quality unavailable: {e}"));
                WindowProfile::from_history(&DrawHistory::default(), window_days, as_of)
            }
            None => WindowProfile::from_history(&DrawHistory::default(), window_days, as_of),
        }
    }

    fn run_component(
        &self,
        component: &dyn ScoringComponent,
        ctx: &ScoringContext,
        profile: &WindowProfile,
    ) -> ComponentRun {
        let kind = component.kind();
        let quality = DataQuality::assess(kind, profile);
        match component.score(ctx) {
            Ok(output) => {
                let status = validate(&output, self.config.effective_min_component_candidates());
                if let ComponentStatus::Rejected { reason } = &status {
                    tracing::info!(component = %kind, reason = %reason, "component output rejected");
                }
                ComponentRun {
                    kind,
                    status,
                    quality,
                    output: Some(output),
                }
            }
            Err(e) => {
                tracing::warn!(component = %kind, error = %e.tagged_string(), "component failed");
                ComponentRun {
                    kind,
                    status: ComponentStatus::Failed {
                        message: e.to_string(),
                    },
                    quality,
                    output: None,
                }
            }
        }
    }

    /// Threshold filter, one relax step, then frequency-only, then uniform.
    fn select(
        &self,
        runs: &[ComponentRun],
        candidates: &[Candidate],
        count: usize,
        threshold: f64,
        notes: &mut Vec<String>,
    ) -> (OutcomeStatus, Vec<Candidate>, Option<f64>) {
        if !candidates.is_empty() {
            let strict = combiner::rank(candidates, threshold, count);
            if strict.len() >= count {
                return (OutcomeStatus::Ok, strict, Some(threshold));
            }
            let relaxed_threshold = threshold * self.config.effective_relax_factor();
            let relaxed = combiner::rank(candidates, relaxed_threshold, count);
            if !relaxed.is_empty() {
                notes.push(format!(
                    "{} of {count} numbers reached confidence {threshold:.2}; threshold relaxed to {relaxed_threshold:.2}",
                    strict.len()
                ));
                return (OutcomeStatus::Relaxed, relaxed, Some(relaxed_threshold));
            }
            notes.push(format!(
                "no number reached confidence {relaxed_threshold:.2} after relaxing"
            ));
        } else {
            notes.push("no component produced a usable signal".to_string());
        }

        let frequency = runs
            .iter()
            .find(|r| r.kind == ComponentKind::Frequency)
            .and_then(|r| r.output.as_ref())
            .filter(|o| !o.is_empty());
        if let Some(output) = frequency {
            notes.push("ranked by frequency alone".to_string());
            return (OutcomeStatus::FrequencyFallback, fallback::frequency_only(output, count), None);
        }

        notes.push("insufficient data: returning an unweighted sample".to_string());
        (OutcomeStatus::InsufficientData, fallback::uniform_sample(count), None)
    }

    fn pattern_batch_age(&self, window_days: u32, now: i64, notes: &mut Vec<String>) -> Option<i64> {
        let engine = self.engine.as_ref()?;
        let report = engine.score_numbers_at(window_days, now).ok()?;
        if report.is_stale && report.batch_id.is_some() {
            notes.push(format!(
                "pattern batch is {}h old; recompute patterns to refresh",
                report.batch_age_secs.unwrap_or_default() / 3600
            ));
        }
        report.batch_age_secs
    }
}

fn component_reports(
    strategy: Strategy,
    runs: &[ComponentRun],
    weights: &ComponentWeights,
    predictions: &[Prediction],
) -> Vec<ComponentReport> {
    let base = strategy.weights();
    runs.iter()
        .map(|run| {
            let numbers_in_predictions = predictions
                .iter()
                .filter(|p| p.contributing().any(|k| k == run.kind))
                .count();
            let effectiveness = if predictions.is_empty() {
                0.0
            } else {
                numbers_in_predictions as f64 / predictions.len() as f64
            };
            ComponentReport {
                kind: run.kind,
                status: run.status.clone(),
                degraded: run.output.as_ref().is_some_and(|o| o.degraded),
                quality: run.quality,
                base_weight: base.get(run.kind),
                adjusted_weight: weights.get(run.kind),
                numbers_found: run.output.as_ref().map_or(0, ComponentOutput::len),
                numbers_in_predictions,
                effectiveness,
            }
        })
        .collect()
}

impl std::fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionService")
            .field("components", &self.components.iter().map(|c| c.kind()).collect::<Vec<_>>())
            .field("memo_entries", &self.memo.entry_count())
            .finish()
    }
}
