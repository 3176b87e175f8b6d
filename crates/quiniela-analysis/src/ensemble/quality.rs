//! Data-quality scores and the weight adjustment they drive.

use chrono::NaiveDate;
use serde::Serialize;

use super::strategy::{ComponentWeights, Strategy};
use crate::detectors::DrawHistory;
use crate::scoring::ComponentKind;

/// Days since the newest draw at which recency is still perfect.
const FRESH_DAYS: i64 = 2;
/// Days since the newest draw at which recency reaches zero.
const EXPIRED_DAYS: i64 = 30;

/// What a window holds, measured once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowProfile {
    pub window_days: u32,
    pub draw_count: usize,
    pub distinct_days: usize,
    pub newest: Option<NaiveDate>,
    pub as_of: NaiveDate,
}

impl WindowProfile {
    pub fn from_history(history: &DrawHistory, window_days: u32, as_of: NaiveDate) -> Self {
        Self {
            window_days,
            draw_count: history.draw_count(),
            distinct_days: history.day_count(),
            newest: history.last_date(),
            as_of,
        }
    }
}

/// Quality of the data available to one component, each part in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataQuality {
    pub volume: f64,
    pub coverage: f64,
    pub recency: f64,
    pub overall: f64,
}

impl DataQuality {
    pub fn assess(kind: ComponentKind, profile: &WindowProfile) -> Self {
        let volume = (profile.draw_count as f64 / kind.volume_target() as f64).min(1.0);
        let coverage = if profile.window_days == 0 {
            0.0
        } else {
            (profile.distinct_days as f64 / f64::from(profile.window_days)).min(1.0)
        };
        let recency = match profile.newest {
            Some(newest) => {
                let age = (profile.as_of - newest).num_days().max(0);
                if age <= FRESH_DAYS {
                    1.0
                } else {
                    (1.0 - (age - FRESH_DAYS) as f64 / (EXPIRED_DAYS - FRESH_DAYS) as f64).max(0.0)
                }
            }
            None => 0.0,
        };
        Self {
            volume,
            coverage,
            recency,
            overall: (0.4 * volume + 0.3 * coverage + 0.3 * recency).clamp(0.0, 1.0),
        }
    }
}

/// Strategy weights moved by quality and renormalized over `active`.
///
/// Every active component ends with at least `floor` of the final weight:
/// components that would fall below it are pinned there and the remaining
/// mass is shared in proportion among the rest. Components not listed in
/// `active` get zero weight.
pub fn adjust_weights(
    strategy: Strategy,
    active: &[(ComponentKind, f64)],
    floor: f64,
) -> ComponentWeights {
    let base = strategy.weights();
    let adaptability = strategy.adaptability();
    let raw: Vec<(ComponentKind, f64)> = active
        .iter()
        .map(|&(kind, quality)| {
            let b = base.get(kind);
            (kind, (b + (quality - 0.5) * 2.0 * adaptability * b).max(0.0))
        })
        .collect();

    let mut adjusted = ComponentWeights::zero();
    if raw.is_empty() {
        return adjusted;
    }
    // Infeasible floors degrade to an even split.
    let floor = floor.clamp(0.0, 1.0 / raw.len() as f64);

    let mut pinned = vec![false; raw.len()];
    loop {
        let free_mass = 1.0 - floor * pinned.iter().filter(|&&p| p).count() as f64;
        let free_total: f64 = raw
            .iter()
            .zip(&pinned)
            .filter(|(_, &p)| !p)
            .map(|((_, w), _)| w)
            .sum();
        let mut newly_pinned = false;
        for (i, &(kind, w)) in raw.iter().enumerate() {
            if pinned[i] {
                adjusted.set(kind, floor);
                continue;
            }
            let share = if free_total > 0.0 {
                w / free_total * free_mass
            } else {
                free_mass / pinned.iter().filter(|&&p| !p).count() as f64
            };
            if share < floor {
                pinned[i] = true;
                newly_pinned = true;
            }
            adjusted.set(kind, share);
        }
        if !newly_pinned {
            return adjusted;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::date;

    fn profile(draws: usize, days: usize, newest_offset: Option<u64>) -> WindowProfile {
        let as_of = date(2024, 6, 30);
        WindowProfile {
            window_days: 100,
            draw_count: draws,
            distinct_days: days,
            newest: newest_offset.map(|o| as_of - chrono::Days::new(o)),
            as_of,
        }
    }

    #[test]
    fn full_fresh_data_is_perfect() {
        let q = DataQuality::assess(ComponentKind::Trend, &profile(300, 100, Some(1)));
        assert!((q.overall - 1.0).abs() < 1e-12);
    }

    #[test]
    fn recency_decays_to_zero() {
        let q = DataQuality::assess(ComponentKind::Trend, &profile(300, 100, Some(16)));
        assert!((q.recency - 0.5).abs() < 1e-12);
        let q = DataQuality::assess(ComponentKind::Trend, &profile(300, 100, Some(45)));
        assert_eq!(q.recency, 0.0);
        let q = DataQuality::assess(ComponentKind::Trend, &profile(0, 0, None));
        assert_eq!(q.overall, 0.0);
    }

    #[test]
    fn neutral_quality_keeps_base_weights() {
        let active: Vec<(ComponentKind, f64)> = ComponentKind::ALL.iter().map(|&k| (k, 0.5)).collect();
        let w = adjust_weights(Strategy::Balanced, &active, 0.05);
        let base = Strategy::Balanced.weights();
        for kind in ComponentKind::ALL {
            assert!((w.get(kind) - base.get(kind)).abs() < 1e-12, "{kind}");
        }
    }

    #[test]
    fn poor_quality_weight_stays_at_floor_after_renormalizing() {
        let active = [
            (ComponentKind::Frequency, 1.0),
            (ComponentKind::Gap, 1.0),
            (ComponentKind::Pattern, 0.0),
        ];
        let w = adjust_weights(Strategy::Aggressive, &active, 0.05);
        assert_eq!(w.trend, 0.0);
        assert!((w.total() - 1.0).abs() < 1e-12);
        // pattern: 0.1 - 0.08 = 0.02, pinned at 0.05 of the final weight.
        assert!((w.pattern - 0.05).abs() < 1e-12);
        let (freq_raw, gap_raw) = (0.15 * 1.8, 0.40 * 1.8);
        assert!((w.frequency - 0.95 * freq_raw / (freq_raw + gap_raw)).abs() < 1e-12);
        assert!((w.gap - 0.95 * gap_raw / (freq_raw + gap_raw)).abs() < 1e-12);
    }

    #[test]
    fn every_active_weight_respects_floor() {
        for strategy in Strategy::ALL {
            for q in [0.0, 0.25, 0.5, 1.0] {
                let active: Vec<(ComponentKind, f64)> = ComponentKind::ALL
                    .iter()
                    .enumerate()
                    .map(|(i, &k)| (k, if i == 0 { 1.0 } else { q }))
                    .collect();
                let w = adjust_weights(strategy, &active, 0.05);
                assert!((w.total() - 1.0).abs() < 1e-12, "{strategy} q={q}");
                for kind in ComponentKind::ALL {
                    assert!(w.get(kind) >= 0.05 - 1e-12, "{strategy} {kind} q={q}: {}", w.get(kind));
                }
            }
        }
    }

    #[test]
    fn single_active_component_takes_all_weight() {
        let w = adjust_weights(Strategy::Balanced, &[(ComponentKind::Gap, 0.0)], 0.05);
        assert!((w.gap - 1.0).abs() < 1e-12);
        assert!(adjust_weights(Strategy::Balanced, &[], 0.05).total() == 0.0);
    }
}
