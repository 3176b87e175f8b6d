//! Trend: recent relative frequency against the full window.

use std::sync::Arc;

use quiniela_core::errors::ScoringError;
use quiniela_core::traits::DrawRepository;
use quiniela_core::types::{NumberFrequency, NUMBER_COUNT};

use super::{
    no_data, ComponentDetails, ComponentKind, ComponentOutput, ComponentResult, ScoringComponent,
    ScoringContext, TrendDirection,
};

const MAX_RECENT_DAYS: u32 = 30;
const MAX_MEDIUM_DAYS: u32 = 90;
/// Momentum beyond which a trend counts as moving.
const DIRECTION_BAND: f64 = 0.1;

pub struct TrendComponent {
    draws: Arc<dyn DrawRepository>,
}

/// Nested windows for a base window of `days`.
pub fn trend_windows(days: u32) -> (u32, u32, u32) {
    let recent = (days / 4).clamp(1, MAX_RECENT_DAYS);
    let medium = (days / 2).clamp(1, MAX_MEDIUM_DAYS);
    (recent, medium, days)
}

/// `(recent - base) / base`, or `2 * recent` for a number new to the window.
pub fn momentum(recent: f64, base: f64) -> f64 {
    if base > 0.0 {
        (recent - base) / base
    } else {
        2.0 * recent
    }
}

fn relative_by_number(rows: &[NumberFrequency]) -> Vec<f64> {
    let mut rel = vec![0.0; NUMBER_COUNT];
    for row in rows {
        if let Some(slot) = rel.get_mut(usize::from(row.number)) {
            *slot = row.relative;
        }
    }
    rel
}

impl TrendComponent {
    pub fn new(draws: Arc<dyn DrawRepository>) -> Self {
        Self { draws }
    }
}

impl ScoringComponent for TrendComponent {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Trend
    }

    fn score(&self, ctx: &ScoringContext) -> Result<ComponentOutput, ScoringError> {
        let (recent_days, medium_days, base_days) = trend_windows(ctx.window_days);
        let base_rows = self.draws.get_all_numbers_frequency(base_days, ctx.as_of)?;
        if base_rows.is_empty() {
            return Err(no_data(self.kind(), format!("no draws in the last {base_days} days")));
        }
        let recent = relative_by_number(&self.draws.get_all_numbers_frequency(recent_days, ctx.as_of)?);
        let medium = relative_by_number(&self.draws.get_all_numbers_frequency(medium_days, ctx.as_of)?);
        let base = relative_by_number(&base_rows);

        let results = (0..NUMBER_COUNT)
            .filter_map(|n| {
                let m = momentum(recent[n], base[n]);
                let score = 50.0 * recent[n] + 30.0 * m;
                if score <= 0.0 {
                    return None;
                }
                let direction = if m > DIRECTION_BAND {
                    TrendDirection::Up
                } else if m < -DIRECTION_BAND {
                    TrendDirection::Down
                } else {
                    TrendDirection::Stable
                };
                Some(ComponentResult {
                    number: n as u8,
                    score: score.min(100.0),
                    confidence: (0.3 + 5.0 * recent[n]).min(0.8),
                    details: ComponentDetails::Trend {
                        recent: recent[n],
                        medium: medium[n],
                        base: base[n],
                        momentum: m,
                        direction,
                    },
                })
            })
            .collect();

        Ok(ComponentOutput::new(self.kind(), results))
    }
}
