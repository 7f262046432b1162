//! Antecedent rainfall aggregation.
//!
//! Antecedent rainfall is the wetness proxy the threshold and saturation
//! models consume: plain windowed totals, and an "effective" total where each
//! calendar day is weighted by `decay^d` for a day `d` days before the
//! reference time.
//!
//! # Clock injection
//! Every function takes the reference time as an argument. Windows are
//! half-open, `[reference - days_back * 24h, reference)`, and missing samples
//! inside a window simply contribute nothing.

use crate::config::validate_decay;
use crate::model::{ConfigError, EventMetrics, RainSample};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Recency weight used when no decay is configured.
pub const DEFAULT_DECAY: f64 = 0.84;

// ---------------------------------------------------------------------------
// Window sums
// ---------------------------------------------------------------------------

/// Start of the `days_back` window ending at `reference`.
pub fn window_start(reference: DateTime<Utc>, days_back: u32) -> DateTime<Utc> {
    hours_before(reference, 24 * i64::from(days_back))
}

/// `reference - hours`, clamped to the earliest representable instant.
pub fn hours_before(reference: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    reference
        .checked_sub_signed(Duration::hours(hours))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn in_window(sample: &RainSample, start: DateTime<Utc>, reference: DateTime<Utc>) -> bool {
    sample.timestamp >= start && sample.timestamp < reference
}

/// Total rainfall in `[reference - days_back days, reference)`.
pub fn antecedent_total(samples: &[RainSample], reference: DateTime<Utc>, days_back: u32) -> f64 {
    let start = window_start(reference, days_back);
    samples
        .iter()
        .filter(|s| in_window(s, start, reference))
        .filter_map(RainSample::depth_mm)
        .sum()
}

/// Decay-weighted rainfall over the same window as `antecedent_total`.
///
/// Rain is grouped by UTC calendar day; the day of `reference` has weight 1,
/// the day before `decay`, and so on. Callers are expected to pass a decay
/// already validated by `AntecedentAggregator::new`.
pub fn effective_total(
    samples: &[RainSample],
    reference: DateTime<Utc>,
    days_back: u32,
    decay: f64,
) -> f64 {
    let start = window_start(reference, days_back);
    let reference_day = reference.date_naive();

    let mut daily: BTreeMap<i64, f64> = BTreeMap::new();
    for sample in samples.iter().filter(|s| in_window(s, start, reference)) {
        if let Some(mm) = sample.depth_mm() {
            let days_before = (reference_day - sample.timestamp.date_naive()).num_days();
            *daily.entry(days_before).or_insert(0.0) += mm;
        }
    }

    daily
        .iter()
        .map(|(days_before, mm)| mm * decay.powi(*days_before as i32))
        .sum()
}

// ---------------------------------------------------------------------------
// Current event metrics
// ---------------------------------------------------------------------------

/// Metrics of the rain event in progress at `reference`.
///
/// Looks at samples in `[reference - lookback_hours, reference]`:
/// - `duration_h`: number of consecutive wet samples counting back from the
///   most recent one, stopping at the first dry or missing sample
/// - `max_intensity_mmh`: largest positive rainfall value in the window
/// - `total_mm`: sum of positive rainfall values in the window
///
/// An empty or all-dry window yields zeros; `sample_count` tells the two
/// apart.
pub fn current_event_metrics(
    samples: &[RainSample],
    reference: DateTime<Utc>,
    lookback_hours: u32,
) -> EventMetrics {
    let start = hours_before(reference, i64::from(lookback_hours));
    let mut window: Vec<&RainSample> = samples
        .iter()
        .filter(|s| s.timestamp >= start && s.timestamp <= reference)
        .collect();
    window.sort_by_key(|s| s.timestamp);

    let sample_count = window.iter().filter(|s| s.depth_mm().is_some()).count();

    let wet_values: Vec<f64> = window
        .iter()
        .filter_map(|s| s.depth_mm())
        .filter(|mm| *mm > 0.0)
        .collect();

    let streak = window.iter().rev().take_while(|s| s.is_wet()).count();

    EventMetrics {
        max_intensity_mmh: wet_values.iter().copied().fold(0.0, f64::max),
        duration_h: streak as f64,
        total_mm: wet_values.iter().sum(),
        sample_count,
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Antecedent totals over the windows recorded for each rainfall event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AntecedentSummary {
    pub antecedent_3d_mm: f64,
    pub antecedent_7d_mm: f64,
    pub antecedent_14d_mm: f64,
    pub antecedent_30d_mm: f64,
    pub effective_antecedent_mm: f64,
}

/// Antecedent rainfall calculator with a validated decay factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AntecedentAggregator {
    decay: f64,
    effective_window_days: u32,
}

impl AntecedentAggregator {
    /// Rejects `decay` outside `(0, 1]` and an empty effective window.
    pub fn new(decay: f64, effective_window_days: u32) -> Result<Self, ConfigError> {
        validate_decay(decay)?;
        if effective_window_days == 0 {
            return Err(ConfigError::invalid(
                "antecedent.effective_window_days",
                "must be at least 1 day",
            ));
        }
        Ok(Self {
            decay,
            effective_window_days,
        })
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    pub fn effective_window_days(&self) -> u32 {
        self.effective_window_days
    }

    pub fn antecedent(&self, samples: &[RainSample], reference: DateTime<Utc>, days_back: u32) -> f64 {
        antecedent_total(samples, reference, days_back)
    }

    pub fn effective_antecedent(
        &self,
        samples: &[RainSample],
        reference: DateTime<Utc>,
        days_back: u32,
    ) -> f64 {
        effective_total(samples, reference, days_back, self.decay)
    }

    /// 3/7/14/30-day totals plus the effective antecedent over the configured window.
    pub fn summary(&self, samples: &[RainSample], reference: DateTime<Utc>) -> AntecedentSummary {
        AntecedentSummary {
            antecedent_3d_mm: self.antecedent(samples, reference, 3),
            antecedent_7d_mm: self.antecedent(samples, reference, 7),
            antecedent_14d_mm: self.antecedent(samples, reference, 14),
            antecedent_30d_mm: self.antecedent(samples, reference, 30),
            effective_antecedent_mm: self.effective_antecedent(
                samples,
                reference,
                self.effective_window_days,
            ),
        }
    }
}

impl Default for AntecedentAggregator {
    fn default() -> Self {
        Self {
            decay: DEFAULT_DECAY,
            effective_window_days: 14,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// 2024-05-15 12:00 UTC, used as "now" across these tests.
    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
    }

    fn hours_before(hours: i64, mm: f64) -> RainSample {
        RainSample::new(reference() - Duration::hours(hours), mm)
    }

    // --- Window sums --------------------------------------------------------

    #[test]
    fn test_antecedent_sums_only_inside_window() {
        let samples = vec![
            hours_before(1, 2.0),
            hours_before(24 * 6, 3.0),
            hours_before(24 * 8, 50.0), // outside 7-day window
        ];
        assert_eq!(antecedent_total(&samples, reference(), 7), 5.0);
        assert_eq!(antecedent_total(&samples, reference(), 14), 55.0);
    }

    #[test]
    fn test_window_is_half_open() {
        let samples = vec![
            RainSample::new(reference(), 10.0),           // excluded: == reference
            hours_before(24 * 7, 4.0),                    // included: == window start
        ];
        assert_eq!(antecedent_total(&samples, reference(), 7), 4.0);
    }

    #[test]
    fn test_huge_windows_clamp_instead_of_overflowing() {
        assert_eq!(window_start(reference(), u32::MAX), DateTime::<Utc>::MIN_UTC);
        let samples = vec![hours_before(1, 2.0), hours_before(24 * 400, 3.0)];
        assert_eq!(antecedent_total(&samples, reference(), u32::MAX), 5.0);
        assert_eq!(effective_total(&samples, reference(), u32::MAX, 1.0), 5.0);

        let metrics = current_event_metrics(&samples, reference(), u32::MAX);
        assert_eq!(metrics.total_mm, 5.0);
        assert_eq!(metrics.sample_count, 2);
    }

    #[test]
    fn test_missing_values_count_as_zero() {
        let samples = vec![
            hours_before(2, 1.5),
            RainSample::missing(reference() - Duration::hours(3)),
        ];
        assert_eq!(antecedent_total(&samples, reference(), 1), 1.5);
        assert_eq!(antecedent_total(&[], reference(), 7), 0.0);
    }

    #[test]
    fn test_effective_weights_by_calendar_day() {
        // Same day as reference: weight 1. Two calendar days earlier: decay^2.
        let samples = vec![
            hours_before(2, 10.0),
            RainSample::new(Utc.with_ymd_and_hms(2024, 5, 13, 6, 0, 0).unwrap(), 10.0),
        ];
        let expected = 10.0 + 10.0 * 0.84_f64.powi(2);
        let got = effective_total(&samples, reference(), 14, 0.84);
        assert!((got - expected).abs() < 1e-9, "expected {}, got {}", expected, got);
    }

    #[test]
    fn test_decay_of_one_matches_plain_sum() {
        let samples: Vec<RainSample> = (1..200).map(|h| hours_before(h, (h % 7) as f64 * 0.4)).collect();
        let plain = antecedent_total(&samples, reference(), 7);
        let effective = effective_total(&samples, reference(), 7, 1.0);
        assert!((plain - effective).abs() < 1e-9);
    }

    // --- Aggregator ---------------------------------------------------------

    #[test]
    fn test_aggregator_rejects_invalid_decay() {
        assert!(AntecedentAggregator::new(0.0, 14).is_err());
        assert!(AntecedentAggregator::new(1.01, 14).is_err());
        assert!(AntecedentAggregator::new(f64::NAN, 14).is_err());
        assert!(AntecedentAggregator::new(1.0, 14).is_ok());
        assert!(AntecedentAggregator::new(0.84, 0).is_err());
    }

    #[test]
    fn test_summary_windows_are_nested() {
        let samples: Vec<RainSample> = (1..(24 * 40)).step_by(6).map(|h| hours_before(h, 1.0)).collect();
        let summary = AntecedentAggregator::default().summary(&samples, reference());
        assert!(summary.antecedent_3d_mm <= summary.antecedent_7d_mm);
        assert!(summary.antecedent_7d_mm <= summary.antecedent_14d_mm);
        assert!(summary.antecedent_14d_mm <= summary.antecedent_30d_mm);
        assert!(summary.effective_antecedent_mm <= summary.antecedent_14d_mm);
        assert_eq!(summary.antecedent_3d_mm, 12.0);
    }

    // --- Current event metrics ----------------------------------------------

    #[test]
    fn test_current_event_counts_contiguous_wet_streak_only() {
        let samples = vec![
            hours_before(6, 4.0),
            hours_before(5, 6.0),
            hours_before(4, 0.0), // breaks the streak
            hours_before(3, 2.0),
            hours_before(2, 8.0),
            hours_before(1, 3.0),
        ];
        let metrics = current_event_metrics(&samples, reference(), 48);
        assert_eq!(metrics.duration_h, 3.0);
        assert_eq!(metrics.max_intensity_mmh, 8.0);
        assert_eq!(metrics.total_mm, 23.0);
        assert_eq!(metrics.sample_count, 6);
    }

    #[test]
    fn test_current_event_streak_stops_at_missing_sample() {
        let samples = vec![
            hours_before(3, 2.0),
            RainSample::missing(reference() - Duration::hours(2)),
            hours_before(1, 1.0),
        ];
        let metrics = current_event_metrics(&samples, reference(), 48);
        assert_eq!(metrics.duration_h, 1.0);
        assert_eq!(metrics.sample_count, 2);
    }

    #[test]
    fn test_current_event_tolerates_unsorted_input() {
        let samples = vec![hours_before(1, 3.0), hours_before(3, 0.0), hours_before(2, 5.0)];
        let metrics = current_event_metrics(&samples, reference(), 48);
        assert_eq!(metrics.duration_h, 2.0);
    }

    #[test]
    fn test_empty_and_dry_windows_yield_zeros() {
        let empty = current_event_metrics(&[], reference(), 48);
        assert_eq!(empty, EventMetrics::default());
        assert!(!empty.has_data());

        let dry = vec![hours_before(1, 0.0), hours_before(2, 0.0)];
        let metrics = current_event_metrics(&dry, reference(), 48);
        assert_eq!(metrics.total_mm, 0.0);
        assert_eq!(metrics.duration_h, 0.0);
        assert_eq!(metrics.max_intensity_mmh, 0.0);
        assert!(metrics.has_data());
    }

    #[test]
    fn test_samples_older_than_lookback_are_ignored() {
        let samples = vec![hours_before(72, 30.0), hours_before(1, 2.0)];
        let metrics = current_event_metrics(&samples, reference(), 48);
        assert_eq!(metrics.total_mm, 2.0);
        assert_eq!(metrics.sample_count, 1);
    }
}
