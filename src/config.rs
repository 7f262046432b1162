//! Engine configuration.
//!
//! One `EngineConfig` is built per process (from TOML, from the environment,
//! or from defaults) and passed by reference to every component. Values are
//! validated here and again by each component constructor, so an invalid
//! parameter fails at startup rather than in the middle of an assessment.
//!
//! Every field has a default, so a config file only needs to name the values
//! it overrides:
//!
//! ```toml
//! [events]
//! min_inter_event_gap_hours = 12.0
//!
//! [threshold]
//! alpha = 9.5
//! beta = 0.38
//! ```

use crate::model::{ConfigError, DEFAULT_ALPHA, DEFAULT_BETA, ThresholdParameters};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the TOML file read by `EngineConfig::from_env`.
pub const CONFIG_PATH_ENV: &str = "DEBRIS_ENGINE_CONFIG";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// A dry spell longer than this closes the current event.
    pub min_inter_event_gap_hours: f64,
    /// Events totalling less than this are discarded.
    pub min_event_total_mm: f64,
    /// Width of the sliding window used for peak intensity.
    pub peak_window_minutes: u32,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            min_inter_event_gap_hours: 6.0,
            min_event_total_mm: 5.0,
            peak_window_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AntecedentConfig {
    pub short_window_days: u32,
    pub long_window_days: u32,
    pub effective_window_days: u32,
    /// Daily recency weight for effective antecedent rainfall.
    pub decay: f64,
    pub current_event_lookback_hours: u32,
}

impl Default for AntecedentConfig {
    fn default() -> Self {
        Self {
            short_window_days: 7,
            long_window_days: 14,
            effective_window_days: 14,
            decay: 0.84,
            current_event_lookback_hours: 48,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub alpha: f64,
    pub beta: f64,
    /// Triggering events required before a fit is attempted.
    pub min_calibration_events: usize,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
            min_calibration_events: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilConfig {
    pub field_capacity_mm: f64,
    pub base_slope_deg: f64,
    pub reduction_factor: f64,
}

impl Default for SoilConfig {
    fn default() -> Self {
        Self {
            field_capacity_mm: 100.0,
            base_slope_deg: 35.0,
            reduction_factor: 0.2,
        }
    }
}

/// Geotechnical parameters of the infinite-slope model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    pub cohesion_kpa: f64,
    pub friction_angle_deg: f64,
    pub unit_weight_knm3: f64,
    pub depth_m: f64,
    pub water_weight_knm3: f64,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            cohesion_kpa: 5.0,
            friction_angle_deg: 35.0,
            unit_weight_knm3: 18.0,
            depth_m: 1.0,
            water_weight_knm3: 9.81,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub exceedance_ratio: f64,
    pub saturation: f64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            exceedance_ratio: 1.0,
            saturation: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. "info" or "debris_flow_engine=debug".
    pub level: String,
    /// Append log lines to this file instead of stderr.
    pub file: Option<PathBuf>,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub events: EventConfig,
    pub antecedent: AntecedentConfig,
    pub threshold: ThresholdConfig,
    pub soil: SoilConfig,
    pub stability: StabilityConfig,
    pub trigger: TriggerConfig,
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Loads `.env` if present, then the file named by `DEBRIS_ENGINE_CONFIG`.
    /// Falls back to validated defaults when the variable is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim()),
            _ => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Threshold parameters named by the `[threshold]` table.
    pub fn threshold_parameters(&self) -> Result<ThresholdParameters, ConfigError> {
        ThresholdParameters::new(self.threshold.alpha, self.threshold.beta)
    }

    /// Checks every bound the components rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_events(&self.events)?;
        validate_antecedent(&self.antecedent)?;
        self.threshold_parameters()?;
        if self.threshold.min_calibration_events < 2 {
            return Err(ConfigError::invalid(
                "threshold.min_calibration_events",
                "a two-parameter fit needs at least 2 events",
            ));
        }
        validate_soil(&self.soil)?;
        validate_stability(&self.stability)?;

        validate_trigger(&self.trigger)?;
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid("logging.level", "must not be empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Per-section validation (shared with component constructors)
// ---------------------------------------------------------------------------

pub(crate) fn validate_events(events: &EventConfig) -> Result<(), ConfigError> {
    require_non_negative("events.min_inter_event_gap_hours", events.min_inter_event_gap_hours)?;
    require_non_negative("events.min_event_total_mm", events.min_event_total_mm)?;
    if events.peak_window_minutes == 0 {
        return Err(ConfigError::invalid("events.peak_window_minutes", "must be at least 1"));
    }
    Ok(())
}

pub(crate) fn validate_antecedent(antecedent: &AntecedentConfig) -> Result<(), ConfigError> {
    validate_decay(antecedent.decay)?;
    for (field, days) in [
        ("antecedent.short_window_days", antecedent.short_window_days),
        ("antecedent.long_window_days", antecedent.long_window_days),
        ("antecedent.effective_window_days", antecedent.effective_window_days),
    ] {
        if days == 0 {
            return Err(ConfigError::invalid(field, "must be at least 1 day"));
        }
    }
    if antecedent.current_event_lookback_hours == 0 {
        return Err(ConfigError::invalid(
            "antecedent.current_event_lookback_hours",
            "must be at least 1 hour",
        ));
    }
    Ok(())
}

/// `decay` must lie in `(0, 1]`; 1 disables recency weighting.
pub(crate) fn validate_decay(decay: f64) -> Result<(), ConfigError> {
    if decay > 0.0 && decay <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            "antecedent.decay",
            format!("must lie in (0, 1], got {}", decay),
        ))
    }
}

pub(crate) fn validate_soil(soil: &SoilConfig) -> Result<(), ConfigError> {
    require_positive("soil.field_capacity_mm", soil.field_capacity_mm)?;
    if !(soil.base_slope_deg > 0.0 && soil.base_slope_deg < 90.0) {
        return Err(ConfigError::invalid(
            "soil.base_slope_deg",
            format!("must lie in (0, 90), got {}", soil.base_slope_deg),
        ));
    }
    if !(soil.reduction_factor > 0.0 && soil.reduction_factor <= 1.0) {
        return Err(ConfigError::invalid(
            "soil.reduction_factor",
            format!("must lie in (0, 1], got {}", soil.reduction_factor),
        ));
    }
    Ok(())
}

pub(crate) fn validate_stability(stability: &StabilityConfig) -> Result<(), ConfigError> {
    require_non_negative("stability.cohesion_kpa", stability.cohesion_kpa)?;
    if !(stability.friction_angle_deg >= 0.0 && stability.friction_angle_deg < 90.0) {
        return Err(ConfigError::invalid(
            "stability.friction_angle_deg",
            format!("must lie in [0, 90), got {}", stability.friction_angle_deg),
        ));
    }
    require_positive("stability.unit_weight_knm3", stability.unit_weight_knm3)?;
    require_positive("stability.depth_m", stability.depth_m)?;
    require_positive("stability.water_weight_knm3", stability.water_weight_knm3)?;
    Ok(())
}

pub(crate) fn validate_trigger(trigger: &TriggerConfig) -> Result<(), ConfigError> {
    require_positive("trigger.exceedance_ratio", trigger.exceedance_ratio)?;
    require_positive("trigger.saturation", trigger.saturation)?;
    Ok(())
}

fn require_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be positive, got {}", value)))
    }
}

fn require_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be non-negative, got {}", value)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
