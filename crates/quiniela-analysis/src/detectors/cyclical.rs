//! Cyclical detector: weekday bias and monthly seasonality.

use chrono::Datelike;
use quiniela_core::config::DetectionConfig;
use quiniela_core::errors::DetectionError;
use quiniela_core::types::{PatternKind, NUMBER_COUNT};

use super::{DetectionOutcome, Detector, DetectorReport, DrawHistory};
use crate::patterns::{
    DetectedPattern, DetectedScore, PatternParams, PatternSignature, ScoreDetails,
    WeekdayDeviation,
};
use crate::stats;

const MIN_WEEKDAY_APPEARANCES: u32 = 10;
const MIN_MONTHLY_APPEARANCES: u32 = 12;
/// Coefficient of variation above which monthly rates count as seasonal.
const MIN_MONTHLY_CV: f64 = 0.5;
/// Months within this share of the peak rate are reported as peaks.
const PEAK_MONTH_RATIO: f64 = 0.8;

/// Per-bucket draw totals and per-number counts.
struct BucketCounts<const N: usize> {
    totals: [u32; N],
    counts: Vec<[u32; N]>,
}

impl<const N: usize> BucketCounts<N> {
    fn collect(history: &DrawHistory, bucket: impl Fn(chrono::NaiveDate) -> usize) -> Self {
        let mut totals = [0u32; N];
        let mut counts = vec![[0u32; N]; NUMBER_COUNT];
        for day in history.days() {
            let b = bucket(day.date);
            for &n in &day.numbers {
                totals[b] += 1;
                counts[usize::from(n)][b] += 1;
            }
        }
        Self { totals, counts }
    }

    fn appearances(&self, number: usize) -> u32 {
        self.counts[number].iter().sum()
    }
}

/// Finds numbers whose draw rate depends on the weekday or the month.
#[derive(Debug, Clone)]
pub struct CyclicalDetector {
    min_draws: usize,
    z_threshold: f64,
}

impl CyclicalDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            min_draws: config.effective_cyclical_min_draws(),
            z_threshold: config.effective_weekday_z_threshold(),
        }
    }

    fn weekday_patterns(&self, history: &DrawHistory) -> Vec<DetectedPattern> {
        let buckets = BucketCounts::<7>::collect(history, |d| {
            d.weekday().num_days_from_monday() as usize
        });
        let total_draws: u32 = buckets.totals.iter().sum();
        if total_draws == 0 {
            return Vec::new();
        }

        let mut patterns = Vec::new();
        for number in 0..NUMBER_COUNT {
            let appearances = buckets.appearances(number);
            if appearances < MIN_WEEKDAY_APPEARANCES {
                continue;
            }
            let expected = f64::from(appearances) / f64::from(total_draws);

            let significant: Vec<WeekdayDeviation> = (0..7)
                .filter_map(|weekday| {
                    let total = buckets.totals[weekday];
                    let count = buckets.counts[number][weekday];
                    if total == 0 || count == 0 {
                        return None;
                    }
                    let rate = f64::from(count) / f64::from(total);
                    let se = (expected * (1.0 - expected) / f64::from(total)).sqrt();
                    if se <= 0.0 {
                        return None;
                    }
                    let z = (rate - expected) / se;
                    (z.abs() > self.z_threshold).then_some(WeekdayDeviation {
                        weekday: weekday as u32,
                        rate,
                        z_score: z,
                        count,
                        total,
                    })
                })
                .collect();
            if significant.is_empty() {
                continue;
            }

            let max_z = significant
                .iter()
                .map(|d| d.z_score.abs())
                .fold(0.0, f64::max);
            let strength = (max_z / 3.0).min(1.0);
            let number = number as u8;

            patterns.push(DetectedPattern {
                signature: PatternSignature::WeekdayBias { number },
                params: PatternParams::WeekdayBias {
                    expected_rate: expected,
                    max_z_score: max_z,
                    p_value: stats::two_sided_normal_p_value(max_z),
                    significant_days: significant.clone(),
                },
                strength,
                support: u64::from(appearances),
                scores: vec![DetectedScore {
                    number,
                    score: strength * 50.0,
                    confidence: (0.4 + 0.4 * strength).min(0.8),
                    details: ScoreDetails::WeekdayBias {
                        expected_rate: expected,
                        max_z_score: max_z,
                        biased_weekdays: significant.iter().map(|d| d.weekday).collect(),
                    },
                    reasoning: format!("Weekday bias (z={max_z:.2})"),
                }],
            });
        }
        patterns
    }

    fn monthly_patterns(&self, history: &DrawHistory) -> Vec<DetectedPattern> {
        let buckets = BucketCounts::<12>::collect(history, |d| d.month0() as usize);

        let mut patterns = Vec::new();
        for number in 0..NUMBER_COUNT {
            let appearances = buckets.appearances(number);
            if appearances < MIN_MONTHLY_APPEARANCES {
                continue;
            }

            let mut rates = [0.0f64; 12];
            for (month, rate) in rates.iter_mut().enumerate() {
                let total = buckets.totals[month];
                if total > 0 {
                    *rate = f64::from(buckets.counts[number][month]) / f64::from(total);
                }
            }
            let mean = stats::mean(&rates);
            if mean <= 0.0 {
                continue;
            }
            let cv = stats::sample_std(&rates) / mean;
            if cv <= MIN_MONTHLY_CV {
                continue;
            }

            let max_rate = rates.iter().copied().fold(0.0, f64::max);
            let peak_months: Vec<u32> = rates
                .iter()
                .enumerate()
                .filter(|(_, &r)| r > max_rate * PEAK_MONTH_RATIO)
                .map(|(m, _)| m as u32 + 1)
                .collect();
            let strength = cv.min(1.0);
            let number = number as u8;

            patterns.push(DetectedPattern {
                signature: PatternSignature::MonthlySeasonal { number },
                params: PatternParams::MonthlySeasonal {
                    coefficient_variation: cv,
                    peak_months: peak_months.clone(),
                    month_rates: rates,
                },
                strength,
                support: u64::from(appearances),
                scores: vec![DetectedScore {
                    number,
                    score: strength * 40.0,
                    confidence: (0.3 + 0.4 * strength).min(0.7),
                    details: ScoreDetails::MonthlySeasonal {
                        coefficient_variation: cv,
                        peak_months,
                    },
                    reasoning: format!("Seasonal pattern (CV={cv:.2})"),
                }],
            });
        }
        patterns
    }
}

impl Default for CyclicalDetector {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

impl Detector for CyclicalDetector {
    fn kind(&self) -> PatternKind {
        PatternKind::Cyclical
    }

    fn min_draws(&self) -> usize {
        self.min_draws
    }

    fn detect(&self, history: &DrawHistory) -> Result<DetectionOutcome, DetectionError> {
        if let Some(short) = DetectionOutcome::check_minimum(history, self.min_draws) {
            return Ok(short);
        }

        let mut patterns = self.weekday_patterns(history);
        let weekday = patterns.len();
        patterns.extend(self.monthly_patterns(history));
        tracing::debug!(
            weekday,
            monthly = patterns.len() - weekday,
            "cyclical detection finished"
        );

        Ok(DetectionOutcome::Detected(DetectorReport {
            kind: PatternKind::Cyclical,
            patterns,
            matrix_stats: None,
        }))
    }
}
