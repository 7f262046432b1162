//! Upstream precipitation data access.
//!
//! The engine does not fetch or store observations. A data layer implements
//! `PrecipitationSource` by answering one question, "which samples fall in
//! this time range", and inherits the antecedent and current-event queries
//! from the provided methods so their semantics always match
//! `analysis::antecedent`.
//!
//! # Clock injection
//! All queries take the reference time explicitly. Use `Utc::now()` at the
//! call site for live assessments and a fixed instant in tests or replays.

use crate::analysis::antecedent::{
    antecedent_total, current_event_metrics, effective_total, hours_before, window_start,
};
use crate::model::{EventMetrics, RainSample};
use chrono::{DateTime, Duration, Utc};

/// A provider of timestamped rainfall samples.
pub trait PrecipitationSource {
    /// Samples with `start <= timestamp < end`, in any order.
    fn samples_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<RainSample>;

    /// Samples from the last `hours` before `reference`, oldest first.
    fn recent_samples(&self, reference: DateTime<Utc>, hours: u32) -> Vec<RainSample> {
        let mut samples =
            self.samples_between(hours_before(reference, i64::from(hours)), reference);
        samples.sort_by_key(|s| s.timestamp);
        samples
    }

    fn antecedent_total(&self, reference: DateTime<Utc>, days_back: u32) -> f64 {
        let samples = self.samples_between(window_start(reference, days_back), reference);
        antecedent_total(&samples, reference, days_back)
    }

    fn effective_antecedent(&self, reference: DateTime<Utc>, days_back: u32, decay: f64) -> f64 {
        let samples = self.samples_between(window_start(reference, days_back), reference);
        effective_total(&samples, reference, days_back, decay)
    }

    /// Metrics of the event in progress over `[reference - lookback, reference]`.
    fn current_event_metrics(&self, reference: DateTime<Utc>, lookback_hours: u32) -> EventMetrics {
        let start = hours_before(reference, i64::from(lookback_hours));
        // The window is closed at `reference`, so ask for one extra millisecond.
        let end = reference
            .checked_add_signed(Duration::milliseconds(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let samples = self.samples_between(start, end);
        current_event_metrics(&samples, reference, lookback_hours)
    }
}

/// In-memory series, sorted by timestamp on construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    samples: Vec<RainSample>,
}

impl SampleSeries {
    pub fn new(mut samples: Vec<RainSample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        Self { samples }
    }

    pub fn samples(&self) -> &[RainSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Adds a sample, keeping the series sorted.
    pub fn push(&mut self, sample: RainSample) {
        let idx = self.samples.partition_point(|s| s.timestamp <= sample.timestamp);
        self.samples.insert(idx, sample);
    }
}

impl From<Vec<RainSample>> for SampleSeries {
    fn from(samples: Vec<RainSample>) -> Self {
        Self::new(samples)
    }
}

impl PrecipitationSource for SampleSeries {
    fn samples_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<RainSample> {
        let lo = self.samples.partition_point(|s| s.timestamp < start);
        let hi = self.samples.partition_point(|s| s.timestamp < end);
        self.samples[lo..hi.max(lo)].to_vec()
    }
}
