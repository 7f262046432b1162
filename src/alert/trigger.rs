//! Simulation trigger policy.
//!
//! Decides whether an assessment warrants launching the downstream debris-flow
//! simulation. The gate is an OR: any one strong signal is enough.

use crate::config::{TriggerConfig, validate_trigger};
use crate::model::{ConfigError, RiskAssessment, RiskLevel};
use serde::Serialize;
use std::fmt;

/// Reason text when no trigger condition holds.
pub const BELOW_THRESHOLD_REASON: &str = "Risk level below simulation threshold";

/// A trigger condition that held for an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "condition", rename_all = "snake_case")]
pub enum TriggerReason {
    RiskLevel { level: RiskLevel },
    ThresholdExceeded { exceedance_ratio: f64 },
    HighSaturation { saturation: f64 },
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerReason::RiskLevel { level } => write!(f, "Risk level: {}", level),
            TriggerReason::ThresholdExceeded { exceedance_ratio } => {
                write!(f, "I-D threshold exceeded ({:.2})", exceedance_ratio)
            }
            TriggerReason::HighSaturation { saturation } => {
                write!(f, "High soil saturation ({:.2})", saturation)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerDecision {
    pub should_simulate: bool,
    pub reasons: Vec<TriggerReason>,
}

impl TriggerDecision {
    /// The satisfied conditions joined with "; ", or `BELOW_THRESHOLD_REASON`.
    pub fn reason(&self) -> String {
        if self.reasons.is_empty() {
            return BELOW_THRESHOLD_REASON.to_string();
        }
        self.reasons
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerPolicy {
    exceedance_ratio: f64,
    saturation: f64,
}

impl TriggerPolicy {
    pub fn new(config: &TriggerConfig) -> Result<Self, ConfigError> {
        validate_trigger(config)?;
        Ok(Self {
            exceedance_ratio: config.exceedance_ratio,
            saturation: config.saturation,
        })
    }

    pub fn should_simulate(&self, assessment: &RiskAssessment) -> bool {
        assessment.risk_level >= RiskLevel::High
            || assessment.exceedance_ratio >= self.exceedance_ratio
            || assessment.saturation >= self.saturation
    }

    /// Every condition that holds, in the order level, exceedance, saturation.
    pub fn evaluate(&self, assessment: &RiskAssessment) -> TriggerDecision {
        let mut reasons = Vec::new();
        if assessment.risk_level >= RiskLevel::High {
            reasons.push(TriggerReason::RiskLevel {
                level: assessment.risk_level,
            });
        }
        if assessment.exceedance_ratio >= self.exceedance_ratio {
            reasons.push(TriggerReason::ThresholdExceeded {
                exceedance_ratio: assessment.exceedance_ratio,
            });
        }
        if assessment.saturation >= self.saturation {
            reasons.push(TriggerReason::HighSaturation {
                saturation: assessment.saturation,
            });
        }

        TriggerDecision {
            should_simulate: !reasons.is_empty(),
            reasons,
        }
    }
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        let config = TriggerConfig::default();
        Self {
            exceedance_ratio: config.exceedance_ratio,
            saturation: config.saturation,
        }
    }
}

/// `TriggerPolicy::default().should_simulate(assessment)`.
pub fn should_simulate(assessment: &RiskAssessment) -> bool {
    TriggerPolicy::default().should_simulate(assessment)
}
