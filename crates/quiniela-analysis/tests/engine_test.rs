//! Pattern engine batches against an in-memory store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use quiniela_analysis::engine::{AggregationCache, DetectorRunResult, PatternEngine};
use quiniela_analysis::patterns::PatternSignature;
use quiniela_core::config::QuinielaConfig;
use quiniela_core::errors::StorageError;
use quiniela_core::events::{BatchCompleteEvent, DetectorFinishedEvent, EventDispatcher, QuinielaEventHandler};
use quiniela_core::traits::{DrawRepository, PatternRepository};
use quiniela_core::types::{
    ActivePatternQuery, BatchInfo, Draw, NewPattern, PatternKind, PatternRecord, PatternScoreRecord,
    PersistOutcome, ScorePeriod,
};
use quiniela_storage::DatabaseManager;

const NOW: i64 = 1_717_200_000;
const HOUR: i64 = 3600;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

fn store_days(db: &DatabaseManager, days: &[Vec<u8>]) {
    let mut draws = Vec::new();
    for (i, numbers) in days.iter().enumerate() {
        let date = start() + Days::new(i as u64);
        for (p, &n) in numbers.iter().enumerate() {
            draws.push(Draw::new(date, n, p as u8 + 1).unwrap());
        }
    }
    db.save_draws(&draws).unwrap();
}

/// 200 dates; 12 and 34 each drawn on 40 dates, together on 32.
fn correlated_days() -> Vec<Vec<u8>> {
    (0..200u32)
        .map(|i| {
            let f = 40 + (3 * i % 60) as u8;
            let g = 40 + ((3 * i + 1) % 60) as u8;
            let h = 40 + ((3 * i + 2) % 60) as u8;
            match i {
                0..=31 => vec![12, 34, f],
                32..=39 => vec![12, f, g],
                40..=47 => vec![34, f, g],
                _ => vec![f, g, h],
            }
        })
        .collect()
}

fn last_day(days: &[Vec<u8>]) -> NaiveDate {
    start() + Days::new(days.len() as u64 - 1)
}

struct Fixture {
    db: Arc<DatabaseManager>,
    engine: PatternEngine,
}

fn fixture(days: &[Vec<u8>]) -> Fixture {
    let db = Arc::new(DatabaseManager::open_in_memory().unwrap());
    store_days(&db, days);
    let draws: Arc<dyn DrawRepository> = db.clone();
    let store: Arc<dyn PatternRepository> = db.clone();
    let config = QuinielaConfig::default();
    let engine = PatternEngine::new(draws, store, &config, AggregationCache::from_config(&config.engine));
    Fixture { db, engine }
}

fn active(db: &DatabaseManager, batch_id: Option<String>) -> Vec<PatternRecord> {
    db.active_patterns(&ActivePatternQuery {
        window_days: 200,
        min_strength: 0.0,
        batch_id,
    })
    .unwrap()
}

#[test]
fn correlated_pair_is_flagged_and_scored() {
    let days = correlated_days();
    let fx = fixture(&days);
    let report = fx.engine.compute_patterns_at(200, last_day(&days), NOW).unwrap();

    assert_eq!(report.draws_analyzed, 600);
    let run = report.run(PatternKind::Correlation).unwrap();
    let DetectorRunResult::Detected { patterns, failed, .. } = &run.result else {
        panic!("correlation detector did not run: {:?}", run.result);
    };
    assert_eq!(*failed, 0);
    assert!(patterns
        .iter()
        .any(|p| p.signature == PatternSignature::correlation(34, 12)));

    let scores = fx.engine.score_numbers_at(200, NOW).unwrap();
    assert_eq!(scores.batch_id.as_deref(), Some(report.batch_id.as_str()));
    assert!(!scores.is_stale);
    let twelve = scores.score_of(12).unwrap();
    assert!(twelve
        .details_by_kind()
        .get(&PatternKind::Correlation)
        .is_some_and(|c| !c.is_empty()));
    assert!(scores.scores.iter().all(|s| (0.0..=100.0).contains(&s.score)));
    assert!(scores.scores.iter().all(|s| (0.0..=1.0).contains(&s.confidence)));
    assert!(scores.scores.iter().any(|s| s.score == 100.0));
}

#[test]
fn short_history_reports_insufficient_data_for_every_detector() {
    let days: Vec<Vec<u8>> = (0..20u8).map(|i| vec![i, i + 1, i + 2]).collect();
    let fx = fixture(&days);
    let report = fx.engine.compute_patterns_at(200, last_day(&days), NOW).unwrap();

    assert_eq!(report.runs.len(), 3);
    for run in &report.runs {
        assert!(
            matches!(run.result, DetectorRunResult::InsufficientData { available: 60, .. }),
            "{:?}: {:?}",
            run.kind,
            run.result
        );
    }
    assert_eq!(report.persisted(), 0);
    assert_eq!(report.summary.total_patterns, 0);

    let scores = fx.engine.score_numbers_at(200, NOW).unwrap();
    assert!(scores.batch_id.is_none());
    assert!(scores.is_stale);
    assert!(scores.scores.iter().all(|s| s.score == 0.0));
}

#[test]
fn recompute_leaves_one_active_generation() {
    let days = correlated_days();
    let fx = fixture(&days);
    let first = fx.engine.compute_patterns_at(200, last_day(&days), NOW).unwrap();
    let first_active = active(&fx.db, None);
    assert!(!first_active.is_empty());

    let second = fx
        .engine
        .compute_patterns_at(200, last_day(&days), NOW + HOUR)
        .unwrap();
    assert_ne!(first.batch_id, second.batch_id);

    let second_active = active(&fx.db, None);
    assert_eq!(second_active.len(), first_active.len());
    assert!(second_active.iter().all(|p| p.batch_id == second.batch_id));
    assert!(active(&fx.db, Some(first.batch_id.clone())).is_empty());

    // Rediscovery refreshes rows in place.
    for p in &second_active {
        let before = first_active
            .iter()
            .find(|q| q.kind == p.kind && q.signature == p.signature)
            .unwrap();
        assert_eq!(before.id, p.id);
        assert_eq!(p.created_at, NOW);
        assert_eq!(p.updated_at, NOW + HOUR);
    }
}

#[test]
fn scoring_is_idempotent_within_cache_ttl() {
    let days = correlated_days();
    let fx = fixture(&days);
    fx.engine.compute_patterns_at(200, last_day(&days), NOW).unwrap();

    let a = fx.engine.score_numbers_at(200, NOW + 10).unwrap();
    let b = fx.engine.score_numbers_at(200, NOW + 20).unwrap();
    assert_eq!(a.scores, b.scores);
    assert_eq!(a.batch_id, b.batch_id);
    assert_eq!(b.batch_age_secs, Some(20));
}

#[test]
fn new_batch_invalidates_cached_aggregation() {
    let days = correlated_days();
    let fx = fixture(&days);

    let before = fx.engine.score_numbers_at(200, NOW).unwrap();
    assert!(before.batch_id.is_none());

    let report = fx.engine.compute_patterns_at(200, last_day(&days), NOW).unwrap();
    let after = fx.engine.score_numbers_at(200, NOW).unwrap();
    assert_eq!(after.batch_id, Some(report.batch_id));
    assert!(after.patterns_used > 0);
}

#[test]
fn old_batches_are_reported_stale() {
    let days = correlated_days();
    let fx = fixture(&days);
    fx.engine.compute_patterns_at(200, last_day(&days), NOW).unwrap();

    let report = fx.engine.score_numbers_at(200, NOW + 25 * HOUR).unwrap();
    assert!(report.is_stale);
    assert_eq!(report.batch_age_secs, Some(25 * HOUR));
}

#[test]
fn zero_window_is_rejected() {
    let fx = fixture(&correlated_days());
    assert!(fx.engine.compute_patterns_at(0, start(), NOW).is_err());
    assert!(fx.engine.score_numbers_at(0, NOW).is_err());
}

#[test]
fn missing_window_resolves_to_configured_default() {
    let days = correlated_days();
    let db = Arc::new(DatabaseManager::open_in_memory().unwrap());
    store_days(&db, &days);
    let config = QuinielaConfig::from_toml("[engine]\ndefault_window_days = 200\n").unwrap();
    let engine = PatternEngine::new(
        db.clone(),
        db.clone(),
        &config,
        AggregationCache::from_config(&config.engine),
    );
    assert_eq!(engine.window_or_default(None), 200);
    assert_eq!(engine.window_or_default(Some(30)), 30);

    let report = engine.compute_patterns_at(200, last_day(&days), NOW).unwrap();
    let scores = engine.score_numbers(None).unwrap();
    assert_eq!(scores.window_days, 200);
    assert_eq!(scores.batch_id, Some(report.batch_id));

    let fallback = fixture(&days);
    assert_eq!(fallback.engine.window_or_default(None), 1825);
}

#[derive(Default)]
struct Recorder {
    detectors: AtomicUsize,
    batches: AtomicUsize,
}

impl QuinielaEventHandler for Recorder {
    fn on_detector_finished(&self, _event: &DetectorFinishedEvent) {
        self.detectors.fetch_add(1, Ordering::SeqCst);
    }

    fn on_batch_complete(&self, _event: &BatchCompleteEvent) {
        self.batches.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn batch_lifecycle_events_are_emitted() {
    let days = correlated_days();
    let recorder = Arc::new(Recorder::default());
    let mut events = EventDispatcher::new();
    events.register(recorder.clone());

    let fx = fixture(&days);
    let engine = fx.engine.with_events(events);
    engine.compute_patterns_at(200, last_day(&days), NOW).unwrap();

    assert_eq!(recorder.detectors.load(Ordering::SeqCst), 3);
    assert_eq!(recorder.batches.load(Ordering::SeqCst), 1);
}

/// Pattern store that fails chosen writes on demand.
struct FlakyStore {
    inner: Arc<DatabaseManager>,
    fail_persist: AtomicBool,
    fail_supersede: AtomicBool,
}

impl FlakyStore {
    fn new(inner: Arc<DatabaseManager>) -> Self {
        Self {
            inner,
            fail_persist: AtomicBool::new(false),
            fail_supersede: AtomicBool::new(false),
        }
    }
}

fn injected() -> StorageError {
    StorageError::sqlite("disk I/O error")
}

impl PatternRepository for FlakyStore {
    fn deactivate_stale_patterns(&self, window_days: u32, max_age_secs: i64, now: i64) -> Result<usize, StorageError> {
        self.inner.deactivate_stale_patterns(window_days, max_age_secs, now)
    }

    fn persist_pattern(
        &self,
        pattern: &NewPattern,
        window_days: u32,
        batch_id: &str,
        period: ScorePeriod,
        now: i64,
    ) -> Result<PersistOutcome, StorageError> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.persist_pattern(pattern, window_days, batch_id, period, now)
    }

    fn deactivate_superseded(&self, kind: PatternKind, window_days: u32, batch_id: &str) -> Result<usize, StorageError> {
        if self.fail_supersede.load(Ordering::SeqCst) {
            return Err(injected());
        }
        self.inner.deactivate_superseded(kind, window_days, batch_id)
    }

    fn active_patterns(&self, query: &ActivePatternQuery) -> Result<Vec<PatternRecord>, StorageError> {
        self.inner.active_patterns(query)
    }

    fn pattern_scores(&self, pattern_id: i64) -> Result<Vec<PatternScoreRecord>, StorageError> {
        self.inner.pattern_scores(pattern_id)
    }

    fn latest_batch(&self, window_days: u32) -> Result<Option<BatchInfo>, StorageError> {
        self.inner.latest_batch(window_days)
    }
}

fn flaky_fixture(days: &[Vec<u8>]) -> (Arc<DatabaseManager>, Arc<FlakyStore>, PatternEngine) {
    let db = Arc::new(DatabaseManager::open_in_memory().unwrap());
    store_days(&db, days);
    let flaky = Arc::new(FlakyStore::new(Arc::clone(&db)));
    let draws: Arc<dyn DrawRepository> = db.clone();
    let store: Arc<dyn PatternRepository> = flaky.clone();
    let config = QuinielaConfig::default();
    let engine = PatternEngine::new(draws, store, &config, AggregationCache::from_config(&config.engine));
    (db, flaky, engine)
}

#[test]
fn failed_batch_keeps_previous_generation_active() {
    let days = correlated_days();
    let (db, flaky, engine) = flaky_fixture(&days);
    let first = engine.compute_patterns_at(200, last_day(&days), NOW).unwrap();
    let first_active = active(&db, None);
    assert!(!first_active.is_empty());

    flaky.fail_persist.store(true, Ordering::SeqCst);
    let second = engine
        .compute_patterns_at(200, last_day(&days), NOW + HOUR)
        .unwrap();
    assert_eq!(second.persisted(), 0);
    assert!(second.failed() > 0);
    assert!(second.unsuperseded().is_empty());

    let still_active = active(&db, None);
    assert_eq!(still_active.len(), first_active.len());
    assert!(still_active.iter().all(|p| p.batch_id == first.batch_id));
    let scores = engine.score_numbers_at(200, NOW + HOUR).unwrap();
    assert_eq!(scores.batch_id, Some(first.batch_id));
}

#[test]
fn supersede_failure_is_reported_and_repaired_by_next_batch() {
    let days = correlated_days();
    let (db, flaky, engine) = flaky_fixture(&days);
    engine.compute_patterns_at(200, last_day(&days), NOW).unwrap();

    flaky.fail_supersede.store(true, Ordering::SeqCst);
    let broken = engine
        .compute_patterns_at(200, last_day(&days), NOW + HOUR)
        .unwrap();
    assert!(broken.unsuperseded().contains(&PatternKind::Correlation));
    let run = broken.run(PatternKind::Correlation).unwrap();
    let DetectorRunResult::Detected {
        persisted,
        superseded,
        supersede_error,
        ..
    } = &run.result
    else {
        panic!("expected a detected run, got {:?}", run.result);
    };
    assert!(*persisted > 0);
    assert_eq!(*superseded, 0);
    assert!(supersede_error.as_deref().unwrap().contains("disk I/O error"));

    // Scoring still reads only the newest batch.
    let scores = engine.score_numbers_at(200, NOW + HOUR).unwrap();
    assert_eq!(scores.batch_id, Some(broken.batch_id.clone()));

    flaky.fail_supersede.store(false, Ordering::SeqCst);
    let repaired = engine
        .compute_patterns_at(200, last_day(&days), NOW + 2 * HOUR)
        .unwrap();
    assert!(repaired.unsuperseded().is_empty());
    assert!(active(&db, None).iter().all(|p| p.batch_id == repaired.batch_id));
}
