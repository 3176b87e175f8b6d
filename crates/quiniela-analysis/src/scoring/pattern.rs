//! Pattern: the engine's aggregation of stored patterns, with a digit
//! heuristic when no usable aggregation exists.

use std::collections::BTreeSet;
use std::sync::Arc;

use quiniela_core::errors::ScoringError;
use quiniela_core::traits::DrawRepository;
use quiniela_core::types::{NumberFrequency, PatternKind};

use super::{no_data, ComponentDetails, ComponentKind, ComponentOutput, ComponentResult, ScoringComponent, ScoringContext};
use crate::engine::{PatternEngine, ScoreReport};

const TOP_DIGITS: usize = 4;
const DIGIT_MATCH_BONUS: f64 = 15.0;
const BOTH_DIGITS_BONUS: f64 = 10.0;

pub struct PatternComponent {
    engine: Arc<PatternEngine>,
    draws: Arc<dyn DrawRepository>,
}

impl PatternComponent {
    pub fn new(engine: Arc<PatternEngine>, draws: Arc<dyn DrawRepository>) -> Self {
        Self { engine, draws }
    }

    fn output_from_report(&self, report: &ScoreReport) -> ComponentOutput {
        let results = report
            .scores
            .iter()
            .filter(|s| s.score > 0.0)
            .map(|s| {
                let kinds: BTreeSet<PatternKind> = s.contributions.iter().map(|c| c.kind).collect();
                ComponentResult {
                    number: s.number,
                    score: s.score,
                    confidence: s.confidence,
                    details: ComponentDetails::Pattern {
                        patterns: s.contributions.len(),
                        kinds: kinds.into_iter().collect(),
                    },
                }
            })
            .collect();
        ComponentOutput::new(self.kind(), results)
    }

    fn digit_fallback(&self, ctx: &ScoringContext) -> Result<ComponentOutput, ScoringError> {
        let rows = self.draws.get_all_numbers_frequency(ctx.window_days, ctx.as_of)?;
        if rows.is_empty() {
            return Err(no_data(self.kind(), "no draws for the digit heuristic"));
        }
        let mut output = ComponentOutput::new(self.kind(), digit_heuristic(&rows));
        output.degraded = true;
        Ok(output)
    }
}

/// The `TOP_DIGITS` most frequent digits, most frequent first.
fn top_digits(counts: &[u32; 10]) -> Vec<u8> {
    let mut digits: Vec<u8> = (0..10).filter(|&d| counts[usize::from(d)] > 0).collect();
    digits.sort_by(|a, b| counts[usize::from(*b)].cmp(&counts[usize::from(*a)]).then(a.cmp(b)));
    digits.truncate(TOP_DIGITS);
    digits
}

/// Bonus for numbers whose tens or units digit is among the historically hot ones.
pub fn digit_heuristic(rows: &[NumberFrequency]) -> Vec<ComponentResult> {
    let mut tens = [0u32; 10];
    let mut units = [0u32; 10];
    for row in rows {
        tens[usize::from(row.number / 10)] += row.count;
        units[usize::from(row.number % 10)] += row.count;
    }
    let hot_tens = top_digits(&tens);
    let hot_units = top_digits(&units);

    (0..100u8)
        .filter_map(|number| {
            let tens_match = hot_tens.contains(&(number / 10));
            let units_match = hot_units.contains(&(number % 10));
            let mut score = 0.0;
            if tens_match {
                score += DIGIT_MATCH_BONUS;
            }
            if units_match {
                score += DIGIT_MATCH_BONUS;
            }
            if tens_match && units_match {
                score += BOTH_DIGITS_BONUS;
            }
            (score > 0.0).then(|| ComponentResult {
                number,
                score,
                confidence: (0.3 + score / 40.0).min(0.7),
                details: ComponentDetails::DigitHeuristic {
                    tens_match,
                    units_match,
                },
            })
        })
        .collect()
}

impl ScoringComponent for PatternComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Pattern
    }

    fn score(&self, ctx: &ScoringContext) -> Result<ComponentOutput, ScoringError> {
        match self.engine.score_numbers_at(ctx.window_days, ctx.now) {
            Ok(report) if report.patterns_used > 0 => {
                if report.is_stale {
                    tracing::debug!(
                        window_days = ctx.window_days,
                        batch_age_secs = ?report.batch_age_secs,
                        "pattern component using a stale batch"
                    );
                }
                Ok(self.output_from_report(&report))
            }
            Ok(_) => {
                tracing::debug!(window_days = ctx.window_days, "no active patterns, using digit heuristic");
                self.digit_fallback(ctx)
            }
            Err(e) => {
                tracing::warn!(window_days = ctx.window_days, error = %e, "pattern aggregation failed, using digit heuristic");
                self.digit_fallback(ctx)
            }
        }
    }
}
