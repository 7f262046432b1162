//! Core data types for the debris-flow risk engine.
//!
//! This module defines the shared domain model imported by all other modules:
//! precipitation samples, derived rainfall events, threshold parameters and the
//! risk assessment snapshot. It contains no I/O and no numerical logic beyond
//! trivial classification helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Reference constants
// ---------------------------------------------------------------------------

/// Guzzetti et al. (2008) scaling coefficient, used until a calibration succeeds.
pub const DEFAULT_ALPHA: f64 = 14.0;

/// Guzzetti et al. (2008) power-law exponent.
pub const DEFAULT_BETA: f64 = 0.4;

// ---------------------------------------------------------------------------
// Sample and event types
// ---------------------------------------------------------------------------

/// A single timestamped weather observation from a rain gauge station.
///
/// `rainfall_mm` is the depth accumulated since the previous report. It is
/// `None` when the station reported the row but the precipitation field was
/// missing; the engine treats missing rainfall as zero when aggregating and
/// as "not wet" when segmenting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainSample {
    pub timestamp: DateTime<Utc>,
    pub rainfall_mm: Option<f64>,
    pub rainfall_rate_mmh: Option<f64>,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
}

impl RainSample {
    /// A sample carrying only a rainfall depth.
    pub fn new(timestamp: DateTime<Utc>, rainfall_mm: f64) -> Self {
        Self {
            timestamp,
            rainfall_mm: Some(rainfall_mm),
            rainfall_rate_mmh: None,
            temperature_c: None,
            humidity_pct: None,
            pressure_hpa: None,
            wind_speed_kmh: None,
        }
    }

    /// A sample whose precipitation field was not reported.
    pub fn missing(timestamp: DateTime<Utc>) -> Self {
        Self {
            rainfall_mm: None,
            ..Self::new(timestamp, 0.0)
        }
    }

    pub fn with_rate(mut self, rate_mmh: f64) -> Self {
        self.rainfall_rate_mmh = Some(rate_mmh);
        self
    }

    /// Rainfall depth usable for summation: present, finite and non-negative.
    pub fn depth_mm(&self) -> Option<f64> {
        self.rainfall_mm.filter(|v| v.is_finite() && *v >= 0.0)
    }

    /// `true` if the sample recorded measurable rain.
    pub fn is_wet(&self) -> bool {
        self.depth_mm().is_some_and(|v| v > 0.0)
    }
}

/// A discrete rainfall event produced by `analysis::events::EventSegmenter`.
///
/// Derived on demand, never persisted by the engine. `end >= start` always
/// holds; a single-sample event has `duration_h == 0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainfallEvent {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_h: f64,
    pub total_rainfall_mm: f64,
    pub max_intensity_mmh: f64,
    pub mean_intensity_mmh: f64,
    pub peak_window_intensity_mmh: f64,
    pub sample_count: usize,
}

/// Rainfall metrics for the event in progress at a reference time.
///
/// `duration_h` counts the contiguous wet samples ending at the most recent
/// sample, so it reads as hours only for hourly series. `sample_count` is the
/// number of samples in the lookback window that carried a rainfall value.
/// Metrics precomputed by a store may leave it at zero; positive rainfall
/// still counts as data.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EventMetrics {
    pub max_intensity_mmh: f64,
    pub duration_h: f64,
    pub total_mm: f64,
    pub sample_count: usize,
}

impl EventMetrics {
    pub fn has_data(&self) -> bool {
        self.sample_count > 0 || self.total_mm > 0.0 || self.max_intensity_mmh > 0.0
    }
}

/// A labelled historical event used to calibrate the I-D threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalEvent {
    pub duration_h: f64,
    pub max_intensity_mmh: f64,
    pub debris_flow_occurred: bool,
}

// ---------------------------------------------------------------------------
// Threshold parameters
// ---------------------------------------------------------------------------

/// Parameters of the intensity-duration threshold `I(D) = alpha * D^(-beta)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdParameters {
    alpha: f64,
    beta: f64,
}

impl ThresholdParameters {
    /// Validates `alpha > 0` and `beta` in the open interval `(0, 1)`.
    pub fn new(alpha: f64, beta: f64) -> Result<Self, ConfigError> {
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(ConfigError::invalid(
                "threshold.alpha",
                format!("must be a positive finite number, got {}", alpha),
            ));
        }
        if !(beta > 0.0 && beta < 1.0) {
            return Err(ConfigError::invalid(
                "threshold.beta",
                format!("must lie strictly between 0 and 1, got {}", beta),
            ));
        }
        Ok(Self { alpha, beta })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }
}

impl Default for ThresholdParameters {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
        }
    }
}

impl fmt::Display for ThresholdParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "I = {:.2} * D^(-{:.2})", self.alpha, self.beta)
    }
}

// ---------------------------------------------------------------------------
// Risk classification
// ---------------------------------------------------------------------------

/// Debris-flow hazard levels, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    /// Classifies an exceedance ratio. Lower bounds are inclusive:
    /// 1.5 is CRITICAL, 1.0 is HIGH, 0.7 is MODERATE.
    pub fn from_exceedance(exceedance: f64) -> Self {
        if exceedance >= 1.5 {
            RiskLevel::Critical
        } else if exceedance >= 1.0 {
            RiskLevel::High
        } else if exceedance >= 0.7 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    /// Operator guidance for this level.
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::Critical => {
                "IMMEDIATE ACTION: Debris flow likely. Evacuate risk zones. Close access roads."
            }
            RiskLevel::High => {
                "WARNING: High debris flow probability. Monitor channels. Prepare evacuation."
            }
            RiskLevel::Moderate => {
                "WATCH: Elevated risk. Increase monitoring frequency. Alert stakeholders."
            }
            RiskLevel::Low => "NORMAL: Low risk. Continue routine monitoring.",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Moderate => write!(f, "MODERATE"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Snapshot of one risk assessment.
///
/// Every number that fed the classification is carried here so a reader can
/// reproduce the decision. Created fresh per call and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub timestamp: DateTime<Utc>,
    pub risk_level: RiskLevel,
    pub exceedance_ratio: f64,
    pub intensity_mmh: f64,
    pub duration_h: f64,
    pub antecedent_7d_mm: f64,
    pub antecedent_14d_mm: f64,
    pub effective_antecedent_mm: f64,
    pub total_event_mm: f64,
    pub saturation: f64,
    pub critical_slope_deg: f64,
    pub threshold_intensity_mmh: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Construction-time failures. Nothing else in the engine returns an error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
