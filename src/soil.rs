//! Soil saturation and critical slope.
//!
//! Saturation is a 0-1 proxy for pore-water content: event plus antecedent
//! rainfall over field capacity, capped at 1. Wetter soil fails on gentler
//! slopes, so the critical slope angle shrinks linearly with saturation:
//! `theta_crit = base * (1 - reduction_factor * saturation)`.

use crate::config::{SoilConfig, validate_soil};
use crate::model::ConfigError;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SoilSaturationModel {
    config: SoilConfig,
}

impl SoilSaturationModel {
    pub fn new(config: SoilConfig) -> Result<Self, ConfigError> {
        validate_soil(&config)?;
        Ok(Self { config })
    }

    pub fn field_capacity_mm(&self) -> f64 {
        self.config.field_capacity_mm
    }

    pub fn base_slope_deg(&self) -> f64 {
        self.config.base_slope_deg
    }

    /// `(event + antecedent) / field_capacity`, clamped to `[0, 1]`.
    ///
    /// Negative or non-finite rainfall inputs count as zero.
    pub fn saturation(&self, event_rainfall_mm: f64, antecedent_rainfall_mm: f64) -> f64 {
        let water = non_negative(event_rainfall_mm) + non_negative(antecedent_rainfall_mm);
        (water / self.config.field_capacity_mm).clamp(0.0, 1.0)
    }

    /// Critical slope angle in degrees for a given saturation.
    pub fn critical_slope(&self, saturation: f64) -> f64 {
        let saturation = if saturation.is_nan() { 0.0 } else { saturation.clamp(0.0, 1.0) };
        self.config.base_slope_deg * (1.0 - self.config.reduction_factor * saturation)
    }
}

fn non_negative(mm: f64) -> f64 {
    if mm.is_finite() && mm > 0.0 { mm } else { 0.0 }
}
