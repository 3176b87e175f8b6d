//! PatternEngine: runs the detectors for a window under a fresh batch id,
//! persists what they find, and aggregates the newest batch into per-number
//! scores.
//!
//! Detection and scoring are decoupled: `score_numbers` never triggers a
//! detection pass. The returned `ScoreReport` carries the batch age so
//! callers can decide when to recompute.

pub mod cache;
pub mod report;

pub use cache::AggregationCache;
pub use report::{
    Aggregation, DetectionReport, DetectorRun, DetectorRunResult, NumberScore,
    PatternContribution, ScoreReport, SummaryStats,
};

use std::sync::Arc;
use std::time::Instant;

use chrono::{Days, NaiveDate, Utc};
use quiniela_core::config::{EngineConfig, QuinielaConfig};
use quiniela_core::errors::{EngineError, QuinielaErrorCode};
use quiniela_core::events::{
    BatchCompleteEvent, BatchStartedEvent, DetectorFinishedEvent, DetectorRunStatus,
    EventDispatcher, PatternPersistFailedEvent,
};
use quiniela_core::traits::{DrawRepository, PatternRepository};
use quiniela_core::types::{ActivePatternQuery, PatternKind, PatternRecord, ScorePeriod};
use uuid::Uuid;

use crate::detectors::{
    CorrelationDetector, CyclicalDetector, DetectionOutcome, Detector, DrawHistory,
    SequentialDetector,
};
use crate::patterns::{DetectedPattern, PatternSignature};

/// Aggregation weight of a stored pattern.
///
/// `base(kind) * (1 + min(0.5, strength)) * (1 + min(0.3, support / 100))`.
pub fn pattern_weight(kind: PatternKind, strength: f64, support: u64) -> f64 {
    let strength_multiplier = 1.0 + strength.clamp(0.0, 0.5);
    let support_multiplier = 1.0 + (support as f64 / 100.0).min(0.3);
    kind.base_weight() * strength_multiplier * support_multiplier
}

/// Orchestrates detection batches and pattern-score aggregation.
pub struct PatternEngine {
    draws: Arc<dyn DrawRepository>,
    store: Arc<dyn PatternRepository>,
    detectors: Vec<Box<dyn Detector>>,
    config: EngineConfig,
    cache: AggregationCache,
    events: EventDispatcher,
}

impl PatternEngine {
    /// Engine with the three standard detectors.
    pub fn new(
        draws: Arc<dyn DrawRepository>,
        store: Arc<dyn PatternRepository>,
        config: &QuinielaConfig,
        cache: AggregationCache,
    ) -> Self {
        let detectors: Vec<Box<dyn Detector>> = vec![
            Box::new(SequentialDetector::new(&config.detection)),
            Box::new(CyclicalDetector::new(&config.detection)),
            Box::new(CorrelationDetector::new(&config.detection)),
        ];
        Self::with_detectors(draws, store, detectors, config.engine.clone(), cache)
    }

    /// Engine with an explicit detector set.
    pub fn with_detectors(
        draws: Arc<dyn DrawRepository>,
        store: Arc<dyn PatternRepository>,
        detectors: Vec<Box<dyn Detector>>,
        config: EngineConfig,
        cache: AggregationCache,
    ) -> Self {
        Self {
            draws,
            store,
            detectors,
            config,
            cache,
            events: EventDispatcher::new(),
        }
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn draws(&self) -> &Arc<dyn DrawRepository> {
        &self.draws
    }

    /// Drop every cached aggregation.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// `window_days`, or `engine.default_window_days` when absent.
    pub fn window_or_default(&self, window_days: Option<u32>) -> u32 {
        window_days.unwrap_or_else(|| self.config.effective_default_window_days())
    }

    /// Run all detectors over the window ending today.
    pub fn compute_patterns(&self, window_days: Option<u32>) -> Result<DetectionReport, EngineError> {
        let now = Utc::now();
        self.compute_patterns_at(self.window_or_default(window_days), now.date_naive(), now.timestamp())
    }

    /// Run all detectors over `end - window_days ..= end`, stamping rows with `now`.
    pub fn compute_patterns_at(
        &self,
        window_days: u32,
        end: NaiveDate,
        now: i64,
    ) -> Result<DetectionReport, EngineError> {
        if window_days == 0 {
            return Err(EngineError::InvalidWindow { days: window_days });
        }
        let start = end
            .checked_sub_days(Days::new(u64::from(window_days)))
            .ok_or(EngineError::InvalidWindow { days: window_days })?;
        let batch_id = Uuid::new_v4().to_string();
        let batch_started = Instant::now();

        let span = tracing::info_span!("compute_patterns", batch_id = %batch_id, window_days);
        let _guard = span.enter();

        let stale_deactivated = self.store.deactivate_stale_patterns(
            window_days,
            self.config.effective_staleness_secs(),
            now,
        )?;
        self.events.emit_batch_started(&BatchStartedEvent {
            batch_id: batch_id.clone(),
            window_days,
            stale_deactivated,
        });

        let draws = self.draws.get_draws_in_period(start, end)?;
        let history = DrawHistory::from_draws(&draws);
        let period = ScorePeriod { start, end };

        let runs: Vec<DetectorRun> = self
            .detectors
            .iter()
            .map(|detector| {
                self.run_detector(detector.as_ref(), &history, &batch_id, window_days, period, now)
            })
            .collect();

        // New rows for this window make any cached aggregation obsolete.
        self.cache.invalidate(window_days);

        let report = DetectionReport {
            batch_id: batch_id.clone(),
            window_days,
            period_start: start,
            period_end: end,
            draws_analyzed: history.draw_count(),
            stale_deactivated,
            summary: SummaryStats::from_runs(&runs),
            runs,
        };

        let duration_ms = batch_started.elapsed().as_millis() as u64;
        self.events.emit_batch_complete(&BatchCompleteEvent {
            batch_id,
            window_days,
            persisted: report.persisted(),
            failed: report.failed(),
            duration_ms,
        });
        tracing::info!(
            patterns_persisted = report.persisted(),
            patterns_failed = report.failed(),
            draws = report.draws_analyzed,
            duration_ms,
            "pattern batch complete"
        );
        Ok(report)
    }

    fn run_detector(
        &self,
        detector: &dyn Detector,
        history: &DrawHistory,
        batch_id: &str,
        window_days: u32,
        period: ScorePeriod,
        now: i64,
    ) -> DetectorRun {
        let kind = detector.kind();
        let started = Instant::now();

        let (result, status) = match detector.detect(history) {
            Ok(DetectionOutcome::Detected(report)) => {
                let (persisted, failed) =
                    self.persist_all(&report.patterns, window_days, batch_id, period, now);
                let (superseded, supersede_error) = if failed > 0 && persisted == 0 {
                    tracing::warn!(kind = %kind, failed, "every pattern failed to persist, keeping previous generation");
                    (0, None)
                } else {
                    match self.store.deactivate_superseded(kind, window_days, batch_id) {
                        Ok(n) => (n, None),
                        Err(e) => {
                            // Older generations stay active until a later batch
                            // supersedes them; scoring reads only the newest batch.
                            tracing::warn!(kind = %kind, error = %e.tagged_string(), "failed to deactivate superseded patterns");
                            (0, Some(e.to_string()))
                        }
                    }
                };
                (
                    DetectorRunResult::Detected {
                        patterns: report.patterns,
                        persisted,
                        failed,
                        superseded,
                        supersede_error,
                        matrix_stats: report.matrix_stats,
                    },
                    DetectorRunStatus::Detected,
                )
            }
            Ok(DetectionOutcome::InsufficientData {
                required,
                available,
            }) => {
                tracing::info!(kind = %kind, required, available, "insufficient data for detector");
                (
                    DetectorRunResult::InsufficientData {
                        required,
                        available,
                    },
                    DetectorRunStatus::InsufficientData,
                )
            }
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e.tagged_string(), "detector failed");
                (
                    DetectorRunResult::Failed {
                        message: e.to_string(),
                    },
                    DetectorRunStatus::Failed,
                )
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        let patterns = match &result {
            DetectorRunResult::Detected { patterns, .. } => patterns.len(),
            _ => 0,
        };
        tracing::debug!(kind = %kind, patterns, detection_time_ms = duration_ms, "detector finished");
        self.events.emit_detector_finished(&DetectorFinishedEvent {
            batch_id: batch_id.to_string(),
            kind,
            status,
            patterns,
            duration_ms,
        });

        DetectorRun {
            kind,
            duration_ms,
            result,
        }
    }

    /// Persist each pattern on its own; returns (persisted, failed).
    fn persist_all(
        &self,
        patterns: &[DetectedPattern],
        window_days: u32,
        batch_id: &str,
        period: ScorePeriod,
        now: i64,
    ) -> (usize, usize) {
        let mut persisted = 0;
        let mut failed = 0;
        for pattern in patterns {
            let outcome = pattern
                .encode()
                .map_err(|e| e.to_string())
                .and_then(|record| {
                    self.store
                        .persist_pattern(&record, window_days, batch_id, period, now)
                        .map_err(|e| e.to_string())
                });
            match outcome {
                Ok(_) => persisted += 1,
                Err(message) => {
                    failed += 1;
                    let signature = pattern.signature.to_json().unwrap_or_default();
                    tracing::warn!(kind = %pattern.kind(), signature = %signature, error = %message, "failed to persist pattern");
                    self.events.emit_pattern_persist_failed(&PatternPersistFailedEvent {
                        batch_id: batch_id.to_string(),
                        kind: pattern.kind(),
                        signature,
                        message,
                    });
                }
            }
        }
        (persisted, failed)
    }

    /// Aggregate the newest batch of a window into per-number scores.
    /// `None` scores the configured default window.
    pub fn score_numbers(&self, window_days: Option<u32>) -> Result<ScoreReport, EngineError> {
        self.score_numbers_at(self.window_or_default(window_days), Utc::now().timestamp())
    }

    /// As `score_numbers`, measuring batch age against `now` (unix seconds).
    pub fn score_numbers_at(&self, window_days: u32, now: i64) -> Result<ScoreReport, EngineError> {
        if window_days == 0 {
            return Err(EngineError::InvalidWindow { days: window_days });
        }

        let aggregation = match self.cache.get(window_days) {
            Some(hit) => {
                tracing::debug!(window_days, aggregation_cache_hit = true, "aggregation served from cache");
                hit
            }
            None => {
                let fresh = Arc::new(self.aggregate(window_days)?);
                self.cache.insert(window_days, Arc::clone(&fresh));
                tracing::debug!(
                    window_days,
                    aggregation_cache_hit = false,
                    patterns = fresh.patterns_used,
                    "aggregation computed"
                );
                fresh
            }
        };

        let batch_age_secs = aggregation
            .batch_updated_at
            .map(|updated| now.saturating_sub(updated).max(0));
        let is_stale = match batch_age_secs {
            Some(age) => age > self.config.effective_staleness_secs(),
            None => true,
        };
        if let (true, Some(age)) = (is_stale, batch_age_secs) {
            tracing::warn!(window_days, batch_age_secs = age, "scoring against a stale pattern batch");
        }

        Ok(ScoreReport {
            window_days,
            batch_id: aggregation.batch_id.clone(),
            batch_age_secs,
            is_stale,
            patterns_used: aggregation.patterns_used,
            scores: aggregation.scores.clone(),
        })
    }

    fn aggregate(&self, window_days: u32) -> Result<Aggregation, EngineError> {
        let mut aggregation = Aggregation::empty();
        let Some(batch) = self.store.latest_batch(window_days)? else {
            return Ok(aggregation);
        };

        let patterns = self.store.active_patterns(&ActivePatternQuery {
            window_days,
            min_strength: self.config.effective_min_pattern_strength(),
            batch_id: Some(batch.batch_id.clone()),
        })?;

        for record in &patterns {
            let signature = match decode_signature(record) {
                Ok(signature) => signature,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable pattern");
                    continue;
                }
            };
            let weight = pattern_weight(record.kind, record.strength, record.support);

            for row in self.store.pattern_scores(record.id)? {
                let Some(entry) = aggregation.scores.get_mut(usize::from(row.number)) else {
                    continue;
                };
                let contribution = row.score * weight;
                entry.score += contribution;
                entry.confidence += row.confidence * weight;
                entry.contributions.push(PatternContribution {
                    pattern_id: record.id,
                    kind: record.kind,
                    signature: signature.clone(),
                    weight,
                    score: row.score,
                    confidence: row.confidence,
                    contribution,
                    reasoning: row.reasoning,
                });
            }
            aggregation.patterns_used += 1;
        }

        aggregation.batch_id = Some(batch.batch_id);
        aggregation.batch_updated_at = Some(batch.updated_at);
        aggregation.normalize();
        Ok(aggregation)
    }
}

fn decode_signature(record: &PatternRecord) -> Result<PatternSignature, EngineError> {
    let signature =
        PatternSignature::from_json(&record.signature).map_err(|e| EngineError::CorruptPattern {
            pattern_id: record.id,
            message: e.to_string(),
        })?;
    if signature.kind() != record.kind {
        return Err(EngineError::CorruptPattern {
            pattern_id: record.id,
            message: format!("signature kind {} stored as {}", signature.kind(), record.kind),
        });
    }
    Ok(signature)
}

impl std::fmt::Debug for PatternEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternEngine")
            .field("detectors", &self.detectors.iter().map(|d| d.kind()).collect::<Vec<_>>())
            .field("cache", &self.cache)
            .finish()
    }
}
