//! Report handed to the downstream API layer.

use crate::alert::trigger::TriggerPolicy;
use crate::logging;
use crate::model::RiskAssessment;
use serde::Serialize;

/// An assessment with its trigger decision and operator guidance.
///
/// Non-finite numbers (the infinite threshold of a no-data assessment)
/// serialise as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReport {
    pub assessment: RiskAssessment,
    pub should_simulate: bool,
    pub reason: String,
    pub recommendation: String,
}

impl RiskReport {
    /// Applies `policy` to `assessment` and logs the result.
    pub fn new(assessment: RiskAssessment, policy: &TriggerPolicy) -> Self {
        let decision = policy.evaluate(&assessment);
        logging::log_assessment(&assessment, &decision);

        Self {
            should_simulate: decision.should_simulate,
            reason: decision.reason(),
            recommendation: assessment.risk_level.recommendation().to_string(),
            assessment,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
