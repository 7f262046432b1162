//! Infinite-slope stability.
//!
//! Factor of safety for a planar soil layer of depth `z` on a slope `theta`
//! with pore pressure proportional to saturation `m`:
//!
//! ```text
//! FS = (c + (gamma*z - m*gamma_w*z) * cos^2(theta) * tan(phi))
//!      / (gamma*z * sin(theta) * cos(theta))
//! ```
//!
//! Used only where slope-angle data is available.

use crate::config::{StabilityConfig, validate_stability};
use crate::model::ConfigError;
use serde::Serialize;

/// Returned instead of dividing by a vanishing shear term (flat or vertical slope).
pub const STABLE_SENTINEL_FS: f64 = 999.0;

/// `sin(theta) * cos(theta)` at or below this counts as degenerate.
const DEGENERATE_SHEAR: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlopeStability {
    pub factor_of_safety: f64,
    pub unstable: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InfiniteSlopeModel {
    config: StabilityConfig,
}

impl InfiniteSlopeModel {
    pub fn new(config: StabilityConfig) -> Result<Self, ConfigError> {
        validate_stability(&config)?;
        Ok(Self { config })
    }

    pub fn factor_of_safety(&self, slope_deg: f64, saturation: f64) -> f64 {
        let c = &self.config;
        let theta = slope_deg.to_radians();
        let shear = theta.sin() * theta.cos();
        if shear.is_nan() || shear <= DEGENERATE_SHEAR {
            return STABLE_SENTINEL_FS;
        }

        let effective_weight = c.unit_weight_knm3 * c.depth_m - saturation * c.water_weight_knm3 * c.depth_m;
        let resisting = c.cohesion_kpa
            + effective_weight * theta.cos().powi(2) * c.friction_angle_deg.to_radians().tan();
        let driving = c.unit_weight_knm3 * c.depth_m * shear;
        resisting / driving
    }

    pub fn is_unstable(&self, slope_deg: f64, saturation: f64) -> bool {
        self.factor_of_safety(slope_deg, saturation) < 1.0
    }

    pub fn assess(&self, slope_deg: f64, saturation: f64) -> SlopeStability {
        let factor_of_safety = self.factor_of_safety(slope_deg, saturation);
        SlopeStability {
            factor_of_safety,
            unstable: factor_of_safety < 1.0,
        }
    }
}
