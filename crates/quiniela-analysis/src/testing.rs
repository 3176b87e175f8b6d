//! In-memory draw repository for unit tests.

use std::collections::BTreeSet;
use std::sync::Mutex;

use chrono::{DateTime, Days, NaiveDate, Utc};
use quiniela_core::errors::StorageError;
use quiniela_core::traits::DrawRepository;
use quiniela_core::types::{Draw, NumberFrequency, SaveOutcome, NUMBER_COUNT};

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[derive(Debug, Default)]
pub(crate) struct MemoryDraws {
    draws: Mutex<Vec<Draw>>,
}

impl MemoryDraws {
    /// Record `numbers` on `date` at positions 1, 2, 3.
    pub(crate) fn push(&mut self, date: NaiveDate, numbers: &[u8]) {
        let draws = self.draws.get_mut().unwrap();
        for (i, &number) in numbers.iter().enumerate() {
            draws.push(Draw::new(date, number, i as u8 + 1).unwrap());
        }
    }

    fn window(&self, days: u32, as_of: NaiveDate) -> Vec<Draw> {
        let start = as_of - Days::new(u64::from(days));
        self.draws
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.date >= start && d.date <= as_of)
            .copied()
            .collect()
    }
}

impl DrawRepository for MemoryDraws {
    fn get_draws_in_period(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Draw>, StorageError> {
        let mut draws: Vec<Draw> = self
            .draws
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.date >= start && d.date <= end)
            .copied()
            .collect();
        draws.sort_by_key(|d| (d.date, d.position));
        Ok(draws)
    }

    fn get_all_numbers_frequency(&self, days: u32, as_of: NaiveDate) -> Result<Vec<NumberFrequency>, StorageError> {
        let draws = self.window(days, as_of);
        let dates: BTreeSet<NaiveDate> = draws.iter().map(|d| d.date).collect();
        let mut counts = [0u32; NUMBER_COUNT];
        for d in &draws {
            counts[usize::from(d.number)] += 1;
        }
        Ok(counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(n, &count)| NumberFrequency {
                number: n as u8,
                count,
                relative: f64::from(count) / dates.len() as f64,
            })
            .collect())
    }

    fn count_draw_days(&self, days: u32, as_of: NaiveDate) -> Result<u32, StorageError> {
        let dates: BTreeSet<NaiveDate> = self.window(days, as_of).iter().map(|d| d.date).collect();
        Ok(dates.len() as u32)
    }

    fn save_draw(&self, draw: &Draw) -> Result<SaveOutcome, StorageError> {
        let mut draws = self.draws.lock().unwrap();
        if draws.contains(draw) {
            return Ok(SaveOutcome::Duplicate);
        }
        draws.push(*draw);
        Ok(SaveOutcome::Inserted)
    }

    fn get_recent_draws(&self, limit: usize) -> Result<Vec<Draw>, StorageError> {
        let mut draws = self.draws.lock().unwrap().clone();
        draws.sort_by(|a, b| b.date.cmp(&a.date).then(a.position.cmp(&b.position)));
        draws.truncate(limit);
        Ok(draws)
    }

    fn data_coverage_days(&self) -> Result<u32, StorageError> {
        let draws = self.draws.lock().unwrap();
        let first = draws.iter().map(|d| d.date).min();
        let last = draws.iter().map(|d| d.date).max();
        Ok(match (first, last) {
            (Some(a), Some(b)) => (b - a).num_days() as u32 + 1,
            _ => 0,
        })
    }

    fn last_update(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        Ok(None)
    }
}
