//! Frequency: how often each number appeared in the window.

use std::sync::Arc;

use quiniela_core::errors::ScoringError;
use quiniela_core::traits::DrawRepository;

use super::{no_data, ComponentDetails, ComponentKind, ComponentOutput, ComponentResult, ScoringComponent, ScoringContext};
use crate::stats;

const Z_BONUS_PER_SIGMA: f64 = 10.0;
const MAX_Z_BONUS: f64 = 20.0;
/// Counts below this damp confidence proportionally.
const MIN_CONFIDENT_COUNT: u32 = 5;

pub struct FrequencyComponent {
    draws: Arc<dyn DrawRepository>,
}

impl FrequencyComponent {
    pub fn new(draws: Arc<dyn DrawRepository>) -> Self {
        Self { draws }
    }
}

impl ScoringComponent for FrequencyComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Frequency
    }

    fn score(&self, ctx: &ScoringContext) -> Result<ComponentOutput, ScoringError> {
        let rows = self.draws.get_all_numbers_frequency(ctx.window_days, ctx.as_of)?;
        if rows.is_empty() {
            return Err(no_data(self.kind(), format!("no draws in the last {} days", ctx.window_days)));
        }

        let counts: Vec<f64> = rows.iter().map(|r| f64::from(r.count)).collect();
        let mean_count = stats::mean(&counts);
        let std_count = stats::sample_std(&counts);

        let results = rows
            .iter()
            .map(|row| {
                let count = f64::from(row.count);
                let z_score = if std_count > 0.0 {
                    (count - mean_count) / std_count
                } else {
                    0.0
                };
                let bonus = if count > mean_count {
                    (Z_BONUS_PER_SIGMA * z_score).min(MAX_Z_BONUS)
                } else {
                    0.0
                };
                let score = (row.relative * 100.0 + bonus).clamp(0.0, 100.0);

                let mut confidence = (0.4 + 8.0 * row.relative).min(0.9);
                if row.count < MIN_CONFIDENT_COUNT {
                    confidence *= f64::from(row.count) / f64::from(MIN_CONFIDENT_COUNT);
                }

                ComponentResult {
                    number: row.number,
                    score,
                    confidence: confidence.clamp(0.0, 1.0),
                    details: ComponentDetails::Frequency {
                        appearances: row.count,
                        relative_frequency: row.relative,
                        z_score,
                    },
                }
            })
            .collect();

        Ok(ComponentOutput::new(self.kind(), results))
    }
}
