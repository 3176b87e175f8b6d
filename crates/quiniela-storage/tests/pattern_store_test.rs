//! Pattern batches: upsert, supersession, staleness and active queries.

use chrono::NaiveDate;
use quiniela_core::traits::PatternRepository;
use quiniela_core::types::{
    ActivePatternQuery, NewPattern, NewPatternScore, PatternKind, PatternStatus, ScorePeriod,
};
use quiniela_storage::queries::patterns::{count_patterns, get_pattern};
use quiniela_storage::DatabaseManager;

const WINDOW: u32 = 365;
const NOW: i64 = 1_700_000_000;

fn period() -> ScorePeriod {
    ScorePeriod {
        start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    }
}

fn pattern(kind: PatternKind, number: u8, strength: f64, scores: &[(u8, f64)]) -> NewPattern {
    NewPattern {
        kind,
        signature: format!(r#"{{"type":"weekday_bias","number":{number}}}"#),
        params: r#"{"z":2.5}"#.to_string(),
        strength,
        support: 40,
        scores: scores
            .iter()
            .map(|&(n, s)| NewPatternScore {
                number: n,
                score: s,
                confidence: 0.5,
                details: "{}".to_string(),
                reasoning: format!("number {n}"),
            })
            .collect(),
    }
}

fn query(min_strength: f64) -> ActivePatternQuery {
    ActivePatternQuery {
        window_days: WINDOW,
        min_strength,
        batch_id: None,
    }
}

#[test]
fn rediscovery_updates_in_place_and_replaces_scores() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let first = db
        .persist_pattern(
            &pattern(PatternKind::Cyclical, 7, 0.4, &[(7, 20.0), (8, 10.0)]),
            WINDOW,
            "batch-a",
            period(),
            NOW,
        )
        .unwrap();
    assert!(!first.refreshed);
    assert_eq!(first.scores_written, 2);

    let second = db
        .persist_pattern(
            &pattern(PatternKind::Cyclical, 7, 0.6, &[(7, 30.0)]),
            WINDOW,
            "batch-b",
            period(),
            NOW + 60,
        )
        .unwrap();
    assert!(second.refreshed);
    assert_eq!(second.pattern_id, first.pattern_id);

    let stored = db
        .with_reader(|conn| get_pattern(conn, first.pattern_id))
        .unwrap()
        .unwrap();
    assert_eq!(stored.batch_id, "batch-b");
    assert_eq!(stored.created_at, NOW);
    assert_eq!(stored.updated_at, NOW + 60);
    assert!((stored.strength - 0.6).abs() < 1e-12);

    let scores = db.pattern_scores(first.pattern_id).unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].number, 7);
    assert_eq!(scores[0].score, 30.0);
}

#[test]
fn same_signature_in_another_window_is_a_separate_row() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let p = pattern(PatternKind::Cyclical, 3, 0.5, &[(3, 10.0)]);
    let a = db.persist_pattern(&p, 365, "b1", period(), NOW).unwrap();
    let b = db.persist_pattern(&p, 730, "b1", period(), NOW).unwrap();
    assert_ne!(a.pattern_id, b.pattern_id);
}

#[test]
fn superseded_generation_is_deactivated() {
    let db = DatabaseManager::open_in_memory().unwrap();
    db.persist_pattern(
        &pattern(PatternKind::Cyclical, 1, 0.5, &[(1, 10.0)]),
        WINDOW,
        "old",
        period(),
        NOW,
    )
    .unwrap();
    db.persist_pattern(
        &pattern(PatternKind::Cyclical, 2, 0.5, &[(2, 10.0)]),
        WINDOW,
        "new",
        period(),
        NOW + 10,
    )
    .unwrap();

    let deactivated = db
        .deactivate_superseded(PatternKind::Cyclical, WINDOW, "new")
        .unwrap();
    assert_eq!(deactivated, 1);

    let active = db.active_patterns(&query(0.0)).unwrap();
    assert_eq!(active.len(), 1);
    assert!(active.iter().all(|p| p.batch_id == "new"));
    assert_eq!(
        db.with_reader(|conn| count_patterns(conn, WINDOW, PatternStatus::Inactive))
            .unwrap(),
        1
    );
}

#[test]
fn supersession_is_scoped_to_kind() {
    let db = DatabaseManager::open_in_memory().unwrap();
    db.persist_pattern(
        &pattern(PatternKind::Sequential, 1, 0.5, &[(1, 10.0)]),
        WINDOW,
        "old",
        period(),
        NOW,
    )
    .unwrap();

    let deactivated = db
        .deactivate_superseded(PatternKind::Cyclical, WINDOW, "new")
        .unwrap();
    assert_eq!(deactivated, 0);
}

#[test]
fn stale_patterns_are_deactivated() {
    let db = DatabaseManager::open_in_memory().unwrap();
    db.persist_pattern(
        &pattern(PatternKind::Correlation, 4, 0.5, &[(4, 10.0)]),
        WINDOW,
        "b1",
        period(),
        NOW,
    )
    .unwrap();

    assert_eq!(db.deactivate_stale_patterns(WINDOW, 86_400, NOW + 3_600).unwrap(), 0);
    assert_eq!(db.deactivate_stale_patterns(WINDOW, 86_400, NOW + 90_000).unwrap(), 1);
    assert!(db.active_patterns(&query(0.0)).unwrap().is_empty());
    assert!(db.latest_batch(WINDOW).unwrap().is_none());
}

#[test]
fn active_query_filters_by_strength_and_orders_strongest_first() {
    let db = DatabaseManager::open_in_memory().unwrap();
    for (number, strength) in [(1u8, 0.05), (2, 0.9), (3, 0.3)] {
        db.persist_pattern(
            &pattern(PatternKind::Cyclical, number, strength, &[(number, 10.0)]),
            WINDOW,
            "b1",
            period(),
            NOW,
        )
        .unwrap();
    }

    let active = db.active_patterns(&query(0.1)).unwrap();
    let strengths: Vec<f64> = active.iter().map(|p| p.strength).collect();
    assert_eq!(strengths, vec![0.9, 0.3]);
}

#[test]
fn active_query_defaults_to_newest_batch() {
    let db = DatabaseManager::open_in_memory().unwrap();
    db.persist_pattern(
        &pattern(PatternKind::Sequential, 1, 0.5, &[(1, 10.0)]),
        WINDOW,
        "older",
        period(),
        NOW,
    )
    .unwrap();
    db.persist_pattern(
        &pattern(PatternKind::Cyclical, 2, 0.5, &[(2, 10.0)]),
        WINDOW,
        "newer",
        period(),
        NOW + 100,
    )
    .unwrap();

    let latest = db.latest_batch(WINDOW).unwrap().unwrap();
    assert_eq!(latest.batch_id, "newer");
    assert_eq!(latest.updated_at, NOW + 100);

    let active = db.active_patterns(&query(0.0)).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].batch_id, "newer");

    let explicit = db
        .active_patterns(&ActivePatternQuery {
            batch_id: Some("older".to_string()),
            ..query(0.0)
        })
        .unwrap();
    assert_eq!(explicit.len(), 1);
    assert_eq!(explicit[0].kind, PatternKind::Sequential);
}

#[test]
fn invalid_pattern_is_rejected_without_partial_writes() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let mut bad = pattern(PatternKind::Cyclical, 5, 0.5, &[(5, 10.0)]);
    bad.scores[0].details = "not json".to_string();

    assert!(db
        .persist_pattern(&bad, WINDOW, "b1", period(), NOW)
        .is_err());
    assert!(db.latest_batch(WINDOW).unwrap().is_none());
}
