//! `DrawRepository` and `PatternRepository` over `DatabaseManager`.

use std::collections::HashSet;

use chrono::{DateTime, Days, NaiveDate, Utc};
use quiniela_core::errors::StorageError;
use quiniela_core::events::DrawSavedEvent;
use quiniela_core::traits::{DrawRepository, PatternRepository};
use quiniela_core::types::{
    ActivePatternQuery, BatchInfo, Draw, NewPattern, NumberFrequency, PatternKind, PatternRecord,
    PatternScoreRecord, PersistOutcome, SaveOutcome, ScorePeriod, NUMBER_COUNT,
};

use crate::connection::writer::with_immediate_transaction;
use crate::connection::DatabaseManager;
use crate::queries::{draws, patterns};
use crate::retention::{self, RetentionReport};

impl DatabaseManager {
    /// Total stored draws.
    pub fn count_draws(&self) -> Result<u64, StorageError> {
        self.with_reader(draws::count_draws)
    }

    /// Delete draws older than the configured retention period before
    /// `today`, then checkpoint the WAL if anything was removed.
    pub fn apply_retention(&self, today: NaiveDate) -> Result<RetentionReport, StorageError> {
        let retention_days = self.retention_days();
        let report = self.with_writer(|conn| retention::apply_retention(conn, retention_days, today))?;
        if report.draws_deleted > 0 {
            let truncated = self.checkpoint()?;
            tracing::debug!(wal_truncated = truncated, "checkpoint after retention");
        }
        Ok(report)
    }

    /// Save many draws. Returns the number actually inserted.
    pub fn save_draws(&self, batch: &[Draw]) -> Result<usize, StorageError> {
        let mut inserted = 0;
        for draw in batch {
            if self.save_draw(draw)? == SaveOutcome::Inserted {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Schema version recorded in `PRAGMA user_version`.
    pub fn schema_version(&self) -> Result<u32, StorageError> {
        self.with_reader(crate::migrations::current_version)
    }
}

fn window_start(days: u32, as_of: NaiveDate) -> NaiveDate {
    as_of
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}

impl DrawRepository for DatabaseManager {
    fn get_draws_in_period(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Draw>, StorageError> {
        if start > end {
            return Ok(Vec::new());
        }
        self.with_reader(|conn| draws::draws_in_period(conn, start, end))
    }

    fn get_all_numbers_frequency(
        &self,
        days: u32,
        as_of: NaiveDate,
    ) -> Result<Vec<NumberFrequency>, StorageError> {
        let start = window_start(days, as_of);
        self.with_reader(|conn| {
            let total_dates = draws::distinct_dates(conn, start, as_of)?;
            if total_dates == 0 {
                return Ok(Vec::new());
            }
            let counts = draws::number_counts(conn, start, as_of)?;
            Ok(counts
                .into_iter()
                .map(|(number, count)| NumberFrequency {
                    number,
                    count,
                    relative: f64::from(count) / f64::from(total_dates),
                })
                .collect())
        })
    }

    fn count_draw_days(&self, days: u32, as_of: NaiveDate) -> Result<u32, StorageError> {
        let start = window_start(days, as_of);
        self.with_reader(|conn| draws::distinct_dates(conn, start, as_of))
    }

    fn save_draw(&self, draw: &Draw) -> Result<SaveOutcome, StorageError> {
        // Re-validate: callers may build Draw with a struct literal.
        let draw = Draw::new(draw.date, draw.number, draw.position)?;
        let now = Utc::now();

        let outcome = self.with_writer(|conn| {
            with_immediate_transaction(conn, |tx| {
                let outcome = draws::insert_draw(tx, &draw)?;
                if outcome == SaveOutcome::Inserted {
                    draws::set_metadata(
                        tx,
                        draws::LAST_UPDATE_KEY,
                        &now.to_rfc3339(),
                        now.timestamp(),
                    )?;
                }
                Ok(outcome)
            })
        })?;

        if outcome == SaveOutcome::Inserted {
            self.events().emit_draw_saved(&DrawSavedEvent {
                date: draw.date,
                number: draw.number,
                position: draw.position,
            });
        } else {
            tracing::trace!(date = %draw.date, number = draw.number, position = draw.position, "duplicate draw ignored");
        }
        Ok(outcome)
    }

    fn get_recent_draws(&self, limit: usize) -> Result<Vec<Draw>, StorageError> {
        self.with_reader(|conn| draws::recent_draws(conn, limit))
    }

    fn data_coverage_days(&self) -> Result<u32, StorageError> {
        let bounds = self.with_reader(draws::date_bounds)?;
        Ok(match bounds {
            Some((first, last)) => {
                let span = (last - first).num_days() + 1;
                u32::try_from(span).unwrap_or(u32::MAX)
            }
            None => 0,
        })
    }

    fn last_update(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let raw = self.with_reader(|conn| draws::get_metadata(conn, draws::LAST_UPDATE_KEY))?;
        raw.map(|value| {
            DateTime::parse_from_rfc3339(&value)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| StorageError::InvalidRecord {
                    message: format!("bad last_update '{value}': {e}"),
                })
        })
        .transpose()
    }
}

fn ensure_json(what: &str, text: &str) -> Result<(), StorageError> {
    serde_json::from_str::<serde_json::Value>(text)
        .map(|_| ())
        .map_err(|e| StorageError::Serialization {
            message: format!("{what} is not valid JSON: {e}"),
        })
}

fn validate_pattern(pattern: &NewPattern) -> Result<(), StorageError> {
    ensure_json("signature", &pattern.signature)?;
    ensure_json("params", &pattern.params)?;
    if !(0.0..=1.0).contains(&pattern.strength) {
        return Err(StorageError::InvalidRecord {
            message: format!("pattern strength {} outside [0, 1]", pattern.strength),
        });
    }
    for score in &pattern.scores {
        if usize::from(score.number) >= NUMBER_COUNT {
            return Err(StorageError::InvalidRecord {
                message: format!("score number {} outside 0..{NUMBER_COUNT}", score.number),
            });
        }
        if !score.score.is_finite() || !score.confidence.is_finite() {
            return Err(StorageError::InvalidRecord {
                message: format!("non-finite score for number {}", score.number),
            });
        }
        ensure_json("score details", &score.details)?;
    }
    Ok(())
}

impl PatternRepository for DatabaseManager {
    fn deactivate_stale_patterns(
        &self,
        window_days: u32,
        max_age_secs: i64,
        now: i64,
    ) -> Result<usize, StorageError> {
        let cutoff = now.saturating_sub(max_age_secs);
        let deactivated =
            self.with_writer(|conn| patterns::deactivate_updated_before(conn, window_days, cutoff))?;
        if deactivated > 0 {
            tracing::info!(window_days, deactivated, "deactivated stale patterns");
        }
        Ok(deactivated)
    }

    fn persist_pattern(
        &self,
        pattern: &NewPattern,
        window_days: u32,
        batch_id: &str,
        period: ScorePeriod,
        now: i64,
    ) -> Result<PersistOutcome, StorageError> {
        validate_pattern(pattern)?;
        self.with_writer(|conn| {
            with_immediate_transaction(conn, |tx| {
                let (pattern_id, refreshed) =
                    patterns::upsert_pattern(tx, pattern, window_days, batch_id, now)?;
                let scores_written =
                    patterns::replace_scores(tx, pattern_id, batch_id, period, &pattern.scores)?;
                Ok(PersistOutcome {
                    pattern_id,
                    refreshed,
                    scores_written,
                })
            })
        })
    }

    fn deactivate_superseded(
        &self,
        kind: PatternKind,
        window_days: u32,
        batch_id: &str,
    ) -> Result<usize, StorageError> {
        self.with_writer(|conn| patterns::deactivate_other_batches(conn, kind, window_days, batch_id))
    }

    fn active_patterns(
        &self,
        query: &ActivePatternQuery,
    ) -> Result<Vec<PatternRecord>, StorageError> {
        self.with_reader(|conn| {
            let batch_id = match &query.batch_id {
                Some(id) => id.clone(),
                None => match patterns::latest_active_batch(conn, query.window_days)? {
                    Some(info) => info.batch_id,
                    None => return Ok(Vec::new()),
                },
            };
            let rows = patterns::active_patterns_in_batch(
                conn,
                query.window_days,
                &batch_id,
                query.min_strength,
            )?;

            let mut seen = HashSet::new();
            Ok(rows
                .into_iter()
                .filter(|p| seen.insert((p.kind, p.signature.clone())))
                .collect())
        })
    }

    fn pattern_scores(&self, pattern_id: i64) -> Result<Vec<PatternScoreRecord>, StorageError> {
        self.with_reader(|conn| patterns::scores_for_pattern(conn, pattern_id))
    }

    fn latest_batch(&self, window_days: u32) -> Result<Option<BatchInfo>, StorageError> {
        self.with_reader(|conn| patterns::latest_active_batch(conn, window_days))
    }
}
