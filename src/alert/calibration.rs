//! I-D threshold calibration.
//!
//! Fits `I = alpha * D^(-beta)` to the lower envelope of historical
//! debris-flow-triggering events with a bounded Levenberg-Marquardt solve.
//! The solver works on unbounded parameters `(u, v)` mapped through a
//! logistic function onto `alpha in [1, 100]` and `beta in [0.1, 1.0]`, so
//! every iterate stays inside the search box.

use crate::model::{HistoricalEvent, ThresholdParameters};
use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::storage::Owned;
use nalgebra::{Const, DVector, Dyn, OMatrix, U2, Vector2};
use serde::Serialize;

pub const ALPHA_BOUNDS: (f64, f64) = (1.0, 100.0);
pub const BETA_BOUNDS: (f64, f64) = (0.1, 1.0);

/// Starting point of every fit.
pub const SEED: (f64, f64) = (14.0, 0.4);

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of a calibration attempt. Only `Calibrated` changes the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CalibrationOutcome {
    Calibrated {
        parameters: ThresholdParameters,
        previous: ThresholdParameters,
        events_used: usize,
    },
    /// Fewer qualifying triggering events than required; nothing changed.
    InsufficientData { qualifying: usize, required: usize },
    /// The solver did not converge; `retained` are the parameters still in use.
    FitFailed {
        reason: String,
        retained: ThresholdParameters,
    },
}

impl CalibrationOutcome {
    pub fn is_calibrated(&self) -> bool {
        matches!(self, CalibrationOutcome::Calibrated { .. })
    }
}

// ---------------------------------------------------------------------------
// Point selection
// ---------------------------------------------------------------------------

/// `(duration_h, intensity_mmh)` of triggering events usable in a power law.
pub fn triggering_points(events: &[HistoricalEvent]) -> Vec<(f64, f64)> {
    events
        .iter()
        .filter(|e| e.debris_flow_occurred)
        .map(|e| (e.duration_h, e.max_intensity_mmh))
        .filter(|(d, i)| d.is_finite() && *d > 0.0 && i.is_finite() && *i > 0.0)
        .collect()
}

/// Points not dominated by any other point with both shorter-or-equal
/// duration and lower-or-equal intensity, sorted by duration.
pub fn lower_envelope(points: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));

    let mut envelope = Vec::new();
    let mut lowest = f64::INFINITY;
    for (duration, intensity) in sorted {
        if intensity < lowest {
            envelope.push((duration, intensity));
            lowest = intensity;
        }
    }
    envelope
}

// ---------------------------------------------------------------------------
// Bounded reparameterisation
// ---------------------------------------------------------------------------

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn to_bounded(raw: f64, (lo, hi): (f64, f64)) -> f64 {
    lo + (hi - lo) * logistic(raw)
}

/// d(bounded)/d(raw).
fn bounded_slope(raw: f64, (lo, hi): (f64, f64)) -> f64 {
    let s = logistic(raw);
    (hi - lo) * s * (1.0 - s)
}

fn to_raw(value: f64, (lo, hi): (f64, f64)) -> f64 {
    ((value - lo) / (hi - value)).ln()
}

// ---------------------------------------------------------------------------
// Least-squares problem
// ---------------------------------------------------------------------------

struct PowerLawProblem {
    durations: Vec<f64>,
    intensities: Vec<f64>,
    raw: Vector2<f64>,
}

impl PowerLawProblem {
    fn alpha_beta(&self) -> (f64, f64) {
        (
            to_bounded(self.raw[0], ALPHA_BOUNDS),
            to_bounded(self.raw[1], BETA_BOUNDS),
        )
    }
}

impl LeastSquaresProblem<f64, Dyn, U2> for PowerLawProblem {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, U2>;
    type ParameterStorage = Owned<f64, U2>;

    fn set_params(&mut self, x: &Vector2<f64>) {
        self.raw.copy_from(x);
    }

    fn params(&self) -> Vector2<f64> {
        self.raw
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        let (alpha, beta) = self.alpha_beta();
        let residuals = self
            .durations
            .iter()
            .zip(&self.intensities)
            .map(|(d, i)| alpha * d.powf(-beta) - i);
        Some(DVector::from_iterator(self.durations.len(), residuals))
    }

    fn jacobian(&self) -> Option<OMatrix<f64, Dyn, U2>> {
        let (alpha, beta) = self.alpha_beta();
        let d_alpha = bounded_slope(self.raw[0], ALPHA_BOUNDS);
        let d_beta = bounded_slope(self.raw[1], BETA_BOUNDS);

        let mut jacobian = OMatrix::<f64, Dyn, U2>::zeros_generic(Dyn(self.durations.len()), Const::<2>);
        for (row, d) in self.durations.iter().enumerate() {
            let scale = d.powf(-beta);
            jacobian[(row, 0)] = scale * d_alpha;
            jacobian[(row, 1)] = -alpha * scale * d.ln() * d_beta;
        }
        Some(jacobian)
    }
}

/// Fits the power law to `points`, seeded at `SEED`.
///
/// Returns `Err` with a description when the solver does not terminate
/// successfully or lands on parameters outside the valid open range.
pub fn fit_power_law(points: &[(f64, f64)]) -> Result<ThresholdParameters, String> {
    let problem = PowerLawProblem {
        durations: points.iter().map(|(d, _)| *d).collect(),
        intensities: points.iter().map(|(_, i)| *i).collect(),
        raw: Vector2::new(to_raw(SEED.0, ALPHA_BOUNDS), to_raw(SEED.1, BETA_BOUNDS)),
    };

    let (solved, report) = LevenbergMarquardt::new().minimize(problem);
    if !report.termination.was_successful() {
        return Err(format!(
            "solver did not converge: {:?} after {} evaluations",
            report.termination, report.number_of_evaluations
        ));
    }

    let (alpha, beta) = solved.alpha_beta();
    if !(alpha.is_finite() && beta.is_finite()) {
        return Err("solver produced non-finite parameters".to_string());
    }
    ThresholdParameters::new(alpha, beta).map_err(|e| format!("fitted parameters rejected: {}", e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
