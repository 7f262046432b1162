//! Structured logging for the debris-flow risk engine
//!
//! Installs a `tracing` subscriber from `LoggingConfig` and provides helpers
//! that log component outcomes at a severity chosen by what happened: a
//! successful calibration is informational, missing data is a warning and a
//! failed fit is an error.

use crate::alert::calibration::CalibrationOutcome;
use crate::alert::trigger::TriggerDecision;
use crate::config::LoggingConfig;
use crate::model::{ConfigError, RiskAssessment};
use std::fmt;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Engine component named in every log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Segmenter,
    Antecedent,
    Calibration,
    Assessor,
    Trigger,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Segmenter => write!(f, "SEGMENT"),
            Component::Antecedent => write!(f, "ANTECEDENT"),
            Component::Calibration => write!(f, "CALIBRATE"),
            Component::Assessor => write!(f, "ASSESS"),
            Component::Trigger => write!(f, "TRIGGER"),
        }
    }
}

// ---------------------------------------------------------------------------
// Subscriber setup
// ---------------------------------------------------------------------------

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Lines go to stderr unless
/// `config.file` is set, in which case they are appended to that file.
/// Calling this twice returns `ConfigError::Logging`.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.level.trim()).map_err(|e| {
            ConfigError::invalid("logging.level", format!("{}: {}", config.level, e))
        })?,
    };

    let writer = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(config.file.is_none());

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| ConfigError::Logging(e.to_string()))
}

// ---------------------------------------------------------------------------
// Outcome logging
// ---------------------------------------------------------------------------

/// Log the result of a threshold calibration at a severity matching the outcome.
pub fn log_calibration_outcome(outcome: &CalibrationOutcome) {
    let component = Component::Calibration.to_string();
    match outcome {
        CalibrationOutcome::Calibrated {
            parameters,
            events_used,
            ..
        } => tracing::info!(
            component = %component,
            alpha = parameters.alpha(),
            beta = parameters.beta(),
            events_used = *events_used,
            "I-D threshold calibrated: {}",
            parameters
        ),
        CalibrationOutcome::InsufficientData {
            qualifying,
            required,
        } => tracing::warn!(
            component = %component,
            qualifying = *qualifying,
            required = *required,
            "Insufficient data for threshold calibration, parameters unchanged"
        ),
        CalibrationOutcome::FitFailed { reason, retained } => tracing::error!(
            component = %component,
            retained = %retained,
            "Threshold calibration failed: {}",
            reason
        ),
    }
}

/// Log a finished assessment together with the trigger decision.
pub fn log_assessment(assessment: &RiskAssessment, decision: &TriggerDecision) {
    if let Some(note) = &assessment.note {
        tracing::info!(
            component = %Component::Assessor,
            risk_level = %assessment.risk_level,
            "Degenerate assessment: {}",
            note
        );
        return;
    }

    tracing::info!(
        component = %Component::Assessor,
        risk_level = %assessment.risk_level,
        exceedance_ratio = assessment.exceedance_ratio,
        saturation = assessment.saturation,
        critical_slope_deg = assessment.critical_slope_deg,
        "Risk assessed"
    );

    if decision.should_simulate {
        tracing::warn!(
            component = %Component::Trigger,
            "Simulation triggered: {}",
            decision.reason()
        );
    } else {
        tracing::debug!(component = %Component::Trigger, "{}", decision.reason());
    }
}

/// Log a summary of one segmentation pass.
pub fn log_segmentation_summary(candidates: usize, retained: usize) {
    let discarded = candidates - retained.min(candidates);
    let message = format!(
        "Segmentation complete: {}/{} events retained, {} below minimum total",
        retained, candidates, discarded
    );

    if candidates > 0 && retained == 0 {
        tracing::warn!(component = %Component::Segmenter, "{}", message);
    } else {
        tracing::debug!(component = %Component::Segmenter, "{}", message);
    }
}
