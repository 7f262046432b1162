//! Risk assessment.
//!
//! `RiskAssessor` composes the threshold, antecedent and soil models into a
//! single `RiskAssessment` snapshot. It owns the only long-lived state in the
//! engine, the threshold parameters, which change only through `calibrate`.
//! Callers that assess and calibrate from several threads must serialise the
//! two themselves (a lock around the assessor, or a clone per assessment).

use crate::alert::calibration::CalibrationOutcome;
use crate::alert::thresholds::ThresholdModel;
use crate::analysis::antecedent::{AntecedentAggregator, AntecedentSummary};
use crate::config::{AntecedentConfig, EngineConfig, validate_antecedent};
use crate::logging::Component;
use crate::model::{
    ConfigError, EventMetrics, HistoricalEvent, RainSample, RainfallEvent, RiskAssessment,
    RiskLevel, ThresholdParameters,
};
use crate::soil::SoilSaturationModel;
use crate::source::PrecipitationSource;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Note attached to the assessment returned when the lookback window is empty.
pub const NO_DATA_NOTE: &str = "No recent rainfall data";

/// A segmented event with the conditions that preceded it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedEvent {
    pub event: RainfallEvent,
    /// Antecedent totals ending at `event.start`.
    pub antecedent: AntecedentSummary,
    pub saturation: f64,
    pub exceedance_ratio: f64,
    pub risk_level: RiskLevel,
}

impl AnnotatedEvent {
    /// Labels the event for threshold calibration.
    pub fn into_historical(self, debris_flow_occurred: bool) -> HistoricalEvent {
        HistoricalEvent {
            duration_h: self.event.duration_h,
            max_intensity_mmh: self.event.max_intensity_mmh,
            debris_flow_occurred,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RiskAssessor {
    threshold: ThresholdModel,
    soil: SoilSaturationModel,
    aggregator: AntecedentAggregator,
    windows: AntecedentConfig,
}

impl RiskAssessor {
    /// Builds every component from `config`, starting uncalibrated.
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        validate_antecedent(&config.antecedent)?;
        Ok(Self {
            threshold: ThresholdModel::new(
                config.threshold_parameters()?,
                config.threshold.min_calibration_events,
            )?,
            soil: SoilSaturationModel::new(config.soil.clone())?,
            aggregator: AntecedentAggregator::new(
                config.antecedent.decay,
                config.antecedent.effective_window_days,
            )?,
            windows: config.antecedent.clone(),
        })
    }

    pub fn threshold_model(&self) -> &ThresholdModel {
        &self.threshold
    }

    pub fn parameters(&self) -> ThresholdParameters {
        self.threshold.parameters()
    }

    pub fn soil(&self) -> &SoilSaturationModel {
        &self.soil
    }

    pub fn aggregator(&self) -> &AntecedentAggregator {
        &self.aggregator
    }

    /// Classifies the current event given precomputed antecedent totals.
    ///
    /// The exceedance ratio is scaled by the 7-day antecedent, and saturation
    /// is computed from the event total plus the 7-day antecedent. Metrics
    /// with no samples and no positive rainfall give the no-data assessment.
    pub fn assess(
        &self,
        metrics: &EventMetrics,
        antecedent_7d_mm: f64,
        antecedent_14d_mm: f64,
        effective_antecedent_mm: f64,
        timestamp: DateTime<Utc>,
    ) -> RiskAssessment {
        if !metrics.has_data() {
            return self.no_data_assessment(timestamp);
        }

        let (risk_level, exceedance_ratio) = self.threshold.assess_risk_level(
            metrics.max_intensity_mmh,
            metrics.duration_h,
            antecedent_7d_mm,
        );
        let saturation = self.soil.saturation(metrics.total_mm, antecedent_7d_mm);

        RiskAssessment {
            timestamp,
            risk_level,
            exceedance_ratio,
            intensity_mmh: metrics.max_intensity_mmh,
            duration_h: metrics.duration_h,
            antecedent_7d_mm,
            antecedent_14d_mm,
            effective_antecedent_mm,
            total_event_mm: metrics.total_mm,
            saturation,
            critical_slope_deg: self.soil.critical_slope(saturation),
            threshold_intensity_mmh: self.threshold.threshold_intensity(metrics.duration_h),
            note: None,
        }
    }

    /// Gathers current-event metrics and antecedent totals from `source` as of
    /// `reference`, then assesses them.
    pub fn assess_from_source<S: PrecipitationSource + ?Sized>(
        &self,
        source: &S,
        reference: DateTime<Utc>,
    ) -> RiskAssessment {
        let metrics = source.current_event_metrics(reference, self.windows.current_event_lookback_hours);
        if !metrics.has_data() {
            tracing::warn!(
                component = %Component::Assessor,
                lookback_hours = self.windows.current_event_lookback_hours,
                "No rainfall samples in lookback window as of {}",
                reference
            );
            return self.no_data_assessment(reference);
        }

        let antecedent_7d = source.antecedent_total(reference, self.windows.short_window_days);
        let antecedent_14d = source.antecedent_total(reference, self.windows.long_window_days);
        let effective = source.effective_antecedent(
            reference,
            self.aggregator.effective_window_days(),
            self.aggregator.decay(),
        );
        tracing::debug!(
            component = %Component::Antecedent,
            antecedent_7d_mm = antecedent_7d,
            antecedent_14d_mm = antecedent_14d,
            effective_antecedent_mm = effective,
            "Antecedent rainfall gathered"
        );

        self.assess(&metrics, antecedent_7d, antecedent_14d, effective, reference)
    }

    /// Computes the pre-event conditions of a segmented event.
    ///
    /// Antecedent windows end at `event.start`, so the event's own rain is not
    /// counted as antecedent.
    pub fn annotate_event(&self, event: &RainfallEvent, samples: &[RainSample]) -> AnnotatedEvent {
        let antecedent = self.aggregator.summary(samples, event.start);
        let saturation = self
            .soil
            .saturation(event.total_rainfall_mm, antecedent.antecedent_7d_mm);
        let (risk_level, exceedance_ratio) = self.threshold.assess_risk_level(
            event.max_intensity_mmh,
            event.duration_h,
            antecedent.antecedent_7d_mm,
        );

        AnnotatedEvent {
            event: event.clone(),
            antecedent,
            saturation,
            exceedance_ratio,
            risk_level,
        }
    }

    /// Refits the threshold. See `ThresholdModel::calibrate`.
    pub fn calibrate(&mut self, events: &[HistoricalEvent]) -> CalibrationOutcome {
        self.threshold.calibrate(events)
    }

    fn no_data_assessment(&self, timestamp: DateTime<Utc>) -> RiskAssessment {
        RiskAssessment {
            timestamp,
            risk_level: RiskLevel::Low,
            exceedance_ratio: 0.0,
            intensity_mmh: 0.0,
            duration_h: 0.0,
            antecedent_7d_mm: 0.0,
            antecedent_14d_mm: 0.0,
            effective_antecedent_mm: 0.0,
            total_event_mm: 0.0,
            saturation: 0.0,
            critical_slope_deg: self.soil.base_slope_deg(),
            threshold_intensity_mmh: f64::INFINITY,
            note: Some(NO_DATA_NOTE.to_string()),
        }
    }
}
