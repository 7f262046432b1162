//! Rainfall event segmentation.
//!
//! Splits a precipitation series into discrete events: runs of wet samples
//! where no two consecutive wet samples are further apart than the configured
//! dry gap. Events below the minimum total are dropped silently.

use crate::config::{EventConfig, validate_events};
use crate::logging;
use crate::model::{ConfigError, RainSample, RainfallEvent};
use chrono::{DateTime, Duration, Utc};

/// Accumulation period assumed for a sample with no neighbours to measure against.
const FALLBACK_SPACING_HOURS: f64 = 1.0;

fn hours_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 3_600_000.0
}

/// Event segmenter with validated gap, minimum-total and peak-window settings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventSegmenter {
    config: EventConfig,
}

impl EventSegmenter {
    pub fn new(config: EventConfig) -> Result<Self, ConfigError> {
        validate_events(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EventConfig {
        &self.config
    }

    /// Segments `samples` into events ordered oldest first.
    ///
    /// Input order does not matter; the series is sorted before grouping.
    /// Pure function of its input.
    pub fn segment(&self, samples: &[RainSample]) -> Vec<RainfallEvent> {
        let mut sorted: Vec<&RainSample> = samples.iter().collect();
        sorted.sort_by_key(|s| s.timestamp);

        let rates = sample_rates(&sorted);
        let gap = self.config.min_inter_event_gap_hours;

        let mut runs: Vec<Vec<(&RainSample, f64)>> = Vec::new();
        let mut previous_wet: Option<DateTime<Utc>> = None;

        for (sample, rate) in sorted.iter().zip(rates) {
            if !sample.is_wet() {
                continue;
            }
            let starts_new = match previous_wet {
                Some(prev) => hours_between(prev, sample.timestamp) > gap,
                None => true,
            };
            if starts_new {
                runs.push(Vec::new());
            }
            if let Some(run) = runs.last_mut() {
                run.push((*sample, rate));
            }
            previous_wet = Some(sample.timestamp);
        }

        let candidates = runs.len();
        let events: Vec<RainfallEvent> = runs
            .iter()
            .filter_map(|run| self.summarize(run))
            .filter(|event| event.total_rainfall_mm >= self.config.min_event_total_mm)
            .collect();

        logging::log_segmentation_summary(candidates, events.len());
        events
    }

    fn summarize(&self, run: &[(&RainSample, f64)]) -> Option<RainfallEvent> {
        let (first, _) = run.first()?;
        let (last, _) = run.last()?;

        let total: f64 = run.iter().filter_map(|(s, _)| s.depth_mm()).sum();
        let max_rate = run.iter().map(|(_, r)| *r).fold(0.0, f64::max);
        let mean_rate = run.iter().map(|(_, r)| *r).sum::<f64>() / run.len() as f64;

        Some(RainfallEvent {
            start: first.timestamp,
            end: last.timestamp,
            duration_h: hours_between(first.timestamp, last.timestamp),
            total_rainfall_mm: total,
            max_intensity_mmh: max_rate,
            mean_intensity_mmh: mean_rate,
            peak_window_intensity_mmh: peak_window_intensity(run, self.config.peak_window_minutes),
            sample_count: run.len(),
        })
    }
}

/// Rainfall rate for every sample of a sorted series.
///
/// Uses the reported rate when present; otherwise divides the depth by the
/// spacing to the previous sample, or to the next one for the first sample.
fn sample_rates(sorted: &[&RainSample]) -> Vec<f64> {
    sorted
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            if let Some(rate) = sample.rainfall_rate_mmh.filter(|r| r.is_finite() && *r >= 0.0) {
                return rate;
            }
            let depth = sample.depth_mm().unwrap_or(0.0);
            let before = i
                .checked_sub(1)
                .map(|p| hours_between(sorted[p].timestamp, sample.timestamp));
            let after = sorted
                .get(i + 1)
                .map(|next| hours_between(sample.timestamp, next.timestamp));
            let spacing = before
                .filter(|h| *h > 0.0)
                .or(after.filter(|h| *h > 0.0))
                .unwrap_or(FALLBACK_SPACING_HOURS);
            depth / spacing
        })
        .collect()
}

/// Largest depth accumulated in any `(t - window, t]` span, as mm/h.
fn peak_window_intensity(run: &[(&RainSample, f64)], window_minutes: u32) -> f64 {
    let window = Duration::minutes(i64::from(window_minutes));
    let mut tail = 0;
    let mut running = 0.0;
    let mut peak_mm: f64 = 0.0;

    for (head, (sample, _)) in run.iter().enumerate() {
        running += sample.depth_mm().unwrap_or(0.0);
        while run[head].0.timestamp - run[tail].0.timestamp >= window {
            running -= run[tail].0.depth_mm().unwrap_or(0.0);
            tail += 1;
        }
        peak_mm = peak_mm.max(running);
    }

    peak_mm / f64::from(window_minutes) * 60.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
