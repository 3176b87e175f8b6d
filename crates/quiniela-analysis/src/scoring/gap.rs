//! Gap: how overdue each number is relative to its usual spacing.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use quiniela_core::errors::ScoringError;
use quiniela_core::traits::DrawRepository;
use quiniela_core::types::NUMBER_COUNT;

use super::{no_data, ComponentDetails, ComponentKind, ComponentOutput, ComponentResult, ScoringComponent, ScoringContext};
use crate::detectors::DrawHistory;
use crate::stats;

const MIN_DRAWS: usize = 50;
const MIN_APPEARANCES: usize = 2;
/// Delay ratio above which a number counts as overdue.
const OVERDUE_RATIO: f64 = 1.5;
/// Lower edge of the on-schedule band.
const ON_SCHEDULE_RATIO: f64 = 0.7;

pub struct GapComponent {
    draws: Arc<dyn DrawRepository>,
}

impl GapComponent {
    pub fn new(draws: Arc<dyn DrawRepository>) -> Self {
        Self { draws }
    }
}

/// Score and undamped confidence for a delay ratio.
fn score_ratio(ratio: f64) -> (f64, f64) {
    if ratio > OVERDUE_RATIO {
        ((20.0 * ratio).min(100.0), (0.4 + 0.3 * (ratio - 1.0)).min(0.8))
    } else if ratio >= ON_SCHEDULE_RATIO {
        (30.0 - 20.0 * (ratio - 1.0).abs(), 0.6)
    } else {
        ((10.0 - 5.0 * ratio).max(0.0), 0.3)
    }
}

fn score_number(number: u8, appearances: &[NaiveDate], as_of: NaiveDate) -> Option<ComponentResult> {
    if appearances.len() < MIN_APPEARANCES {
        return None;
    }
    let gaps: Vec<f64> = appearances
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days() as f64)
        .collect();
    let average_gap = stats::mean(&gaps);
    if average_gap <= 0.0 {
        return None;
    }
    let gap_std = if gaps.len() > 1 {
        stats::sample_std(&gaps)
    } else {
        average_gap * 0.5
    };
    let last = *appearances.last()?;
    let days_since_last = (as_of - last).num_days().max(0);
    let delay_ratio = days_since_last as f64 / average_gap;

    let (score, confidence) = score_ratio(delay_ratio);
    let regularity = 1.0 - 0.5 * (gap_std / average_gap).min(1.0);

    Some(ComponentResult {
        number,
        score: score.clamp(0.0, 100.0),
        confidence: (confidence * regularity).clamp(0.0, 1.0),
        details: ComponentDetails::Gap {
            days_since_last,
            average_gap,
            median_gap: stats::median(&gaps),
            gap_std,
            delay_ratio,
            appearances: appearances.len(),
        },
    })
}

impl ScoringComponent for GapComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Gap
    }

    fn score(&self, ctx: &ScoringContext) -> Result<ComponentOutput, ScoringError> {
        let start = ctx
            .as_of
            .checked_sub_days(Days::new(u64::from(ctx.window_days)))
            .ok_or_else(|| no_data(self.kind(), "window reaches before the calendar"))?;
        let draws = self.draws.get_draws_in_period(start, ctx.as_of)?;
        if draws.len() < MIN_DRAWS {
            return Err(no_data(
                self.kind(),
                format!("{} draws, need {MIN_DRAWS}", draws.len()),
            ));
        }

        let history = DrawHistory::from_draws(&draws);
        let mut appearances: Vec<Vec<NaiveDate>> = vec![Vec::new(); NUMBER_COUNT];
        for day in history.days() {
            for &number in &day.numbers {
                let dates = &mut appearances[usize::from(number)];
                if dates.last() != Some(&day.date) {
                    dates.push(day.date);
                }
            }
        }

        let results = appearances
            .iter()
            .enumerate()
            .filter_map(|(number, dates)| score_number(number as u8, dates, ctx.as_of))
            .collect();
        Ok(ComponentOutput::new(self.kind(), results))
    }
}
