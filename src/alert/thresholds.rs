//! Rainfall intensity-duration (I-D) threshold checking.
//!
//! The threshold curve `I(D) = alpha * D^(-beta)` gives, for an event of
//! duration `D` hours, the intensity above which debris flows become likely.
//! The model starts with literature parameters and moves to fitted ones only
//! when `calibrate` is called explicitly and the fit succeeds.

use crate::alert::calibration::{
    CalibrationOutcome, fit_power_law, lower_envelope, triggering_points,
};
use crate::logging;
use crate::model::{ConfigError, HistoricalEvent, RiskLevel, ThresholdParameters};
use serde::Serialize;

/// Antecedent total above which ground is considered wet.
pub const WET_ANTECEDENT_MM: f64 = 50.0;
/// Antecedent total above which ground is considered very wet.
pub const VERY_WET_ANTECEDENT_MM: f64 = 100.0;

const WET_MULTIPLIER: f64 = 1.2;
const VERY_WET_MULTIPLIER: f64 = 1.4;

/// Calibration state of a `ThresholdModel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationState {
    Uncalibrated,
    Calibrated,
}

/// Exceedance multiplier for antecedent wetness.
///
/// Bands are exclusive and checked from the wettest down, so at most one
/// multiplier ever applies.
pub fn antecedent_multiplier(antecedent_mm: f64) -> f64 {
    if antecedent_mm > VERY_WET_ANTECEDENT_MM {
        VERY_WET_MULTIPLIER
    } else if antecedent_mm > WET_ANTECEDENT_MM {
        WET_MULTIPLIER
    } else {
        1.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdModel {
    parameters: ThresholdParameters,
    state: CalibrationState,
    min_calibration_events: usize,
}

impl ThresholdModel {
    /// An uncalibrated model using `parameters`.
    pub fn new(parameters: ThresholdParameters, min_calibration_events: usize) -> Result<Self, ConfigError> {
        if min_calibration_events < 2 {
            return Err(ConfigError::invalid(
                "threshold.min_calibration_events",
                "a two-parameter fit needs at least 2 events",
            ));
        }
        Ok(Self {
            parameters,
            state: CalibrationState::Uncalibrated,
            min_calibration_events,
        })
    }

    pub fn parameters(&self) -> ThresholdParameters {
        self.parameters
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    /// `alpha * duration^(-beta)`; `+inf` for a non-positive duration.
    pub fn threshold_intensity(&self, duration_h: f64) -> f64 {
        if duration_h.is_nan() || duration_h <= 0.0 {
            return f64::INFINITY;
        }
        self.parameters.alpha() * duration_h.powf(-self.parameters.beta())
    }

    /// Observed over threshold intensity, scaled for antecedent wetness.
    ///
    /// A zero or negative duration gives an infinite threshold and therefore
    /// a ratio of zero.
    pub fn exceedance_ratio(&self, intensity_mmh: f64, duration_h: f64, antecedent_mm: f64) -> f64 {
        let raw = intensity_mmh.max(0.0) / self.threshold_intensity(duration_h);
        raw * antecedent_multiplier(antecedent_mm)
    }

    /// Risk level and exceedance ratio for the given conditions.
    pub fn assess_risk_level(
        &self,
        intensity_mmh: f64,
        duration_h: f64,
        antecedent_mm: f64,
    ) -> (RiskLevel, f64) {
        let exceedance = self.exceedance_ratio(intensity_mmh, duration_h, antecedent_mm);
        (RiskLevel::from_exceedance(exceedance), exceedance)
    }

    /// Refits the threshold to labelled historical events.
    ///
    /// Only events with `debris_flow_occurred` and positive duration and
    /// intensity qualify. With too few of them the parameters are left
    /// untouched. Otherwise the fit runs over the lower envelope of the
    /// triggering points, or over all of them when the envelope alone is too
    /// small. A failed fit keeps the current parameters, calibrated or not.
    pub fn calibrate(&mut self, events: &[HistoricalEvent]) -> CalibrationOutcome {
        let points = triggering_points(events);
        let outcome = if points.len() < self.min_calibration_events {
            CalibrationOutcome::InsufficientData {
                qualifying: points.len(),
                required: self.min_calibration_events,
            }
        } else {
            let envelope = lower_envelope(&points);
            let fit_points = if envelope.len() >= self.min_calibration_events {
                envelope
            } else {
                points
            };

            match fit_power_law(&fit_points) {
                Ok(parameters) => {
                    let previous = self.parameters;
                    self.parameters = parameters;
                    self.state = CalibrationState::Calibrated;
                    CalibrationOutcome::Calibrated {
                        parameters,
                        previous,
                        events_used: fit_points.len(),
                    }
                }
                Err(reason) => CalibrationOutcome::FitFailed {
                    reason,
                    retained: self.parameters,
                },
            }
        };

        logging::log_calibration_outcome(&outcome);
        outcome
    }
}

impl Default for ThresholdModel {
    fn default() -> Self {
        Self {
            parameters: ThresholdParameters::default(),
            state: CalibrationState::Uncalibrated,
            min_calibration_events: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
