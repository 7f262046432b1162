//! Threshold, calibration, assessment and trigger logic.
//!
//! `thresholds` and `calibration` hold the intensity-duration model,
//! `assess` composes it with the antecedent and soil models, and `trigger`
//! and `report` turn an assessment into the downstream decision.

pub mod assess;
pub mod calibration;
pub mod report;
pub mod thresholds;
pub mod trigger;
