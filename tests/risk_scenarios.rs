//! End-to-end risk scenarios
//!
//! Drives the public API the way the surrounding service does: samples in,
//! assessment and trigger decision out, with calibration fed by segmented and
//! annotated historical storms.

use chrono::{DateTime, Duration, TimeZone, Utc};
use debris_flow_engine::alert::assess::RiskAssessor;
use debris_flow_engine::alert::calibration::CalibrationOutcome;
use debris_flow_engine::alert::report::RiskReport;
use debris_flow_engine::alert::thresholds::CalibrationState;
use debris_flow_engine::alert::trigger::{TriggerPolicy, should_simulate};
use debris_flow_engine::analysis::events::EventSegmenter;
use debris_flow_engine::config::EngineConfig;
use debris_flow_engine::model::{EventMetrics, HistoricalEvent, RainSample, RiskLevel};
use debris_flow_engine::source::{PrecipitationSource, SampleSeries};

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 3, 12, 0, 0).unwrap()
}

/// Hourly samples of constant intensity starting at `start`.
fn storm(start: DateTime<Utc>, hours: i64, intensity_mmh: f64) -> Vec<RainSample> {
    (0..hours)
        .map(|h| RainSample::new(start + Duration::hours(h), intensity_mmh).with_rate(intensity_mmh))
        .collect()
}

#[test]
fn test_three_hour_storm_on_wet_ground_triggers_simulation() {
    let assessor = RiskAssessor::default();
    let metrics = EventMetrics {
        max_intensity_mmh: 10.0,
        duration_h: 3.0,
        total_mm: 30.0,
        sample_count: 3,
    };
    let assessment = assessor.assess(&metrics, 60.0, 75.0, 48.0, reference());

    assert_eq!(assessment.risk_level, RiskLevel::High);
    assert!((assessment.threshold_intensity_mmh - 14.0 * 3.0_f64.powf(-0.4)).abs() < 1e-12);
    assert!((assessment.exceedance_ratio - 1.3302).abs() < 1e-3);
    assert!(should_simulate(&assessment));
}

#[test]
fn test_empty_lookback_window_is_low_and_does_not_trigger() {
    // Rain two weeks ago only; nothing in the 48 h lookback.
    let series = SampleSeries::new(storm(reference() - Duration::days(14), 5, 8.0));
    let assessor = RiskAssessor::default();
    let assessment = assessor.assess_from_source(&series, reference());

    assert_eq!(assessment.risk_level, RiskLevel::Low);
    assert_eq!(assessment.exceedance_ratio, 0.0);
    assert!(assessment.note.is_some());

    let report = RiskReport::new(assessment, &TriggerPolicy::default());
    assert!(!report.should_simulate);
}

#[test]
fn test_saturated_ground_triggers_without_threshold_exceedance() {
    // Light drizzle now, but 80 mm fell four days ago.
    let mut samples = storm(reference() - Duration::hours(2), 3, 1.0);
    samples.push(RainSample::new(reference() - Duration::days(4), 80.0));
    let series = SampleSeries::new(samples);

    let assessment = RiskAssessor::default().assess_from_source(&series, reference());
    assert!(assessment.exceedance_ratio < 0.7, "exceedance = {}", assessment.exceedance_ratio);
    assert_eq!(assessment.risk_level, RiskLevel::Low);
    assert!(assessment.saturation >= 0.7, "saturation = {}", assessment.saturation);

    let report = RiskReport::new(assessment, &TriggerPolicy::default());
    assert!(report.should_simulate);
    assert!(report.reason.starts_with("High soil saturation"), "reason = {}", report.reason);
}

#[test]
fn test_unsorted_input_gives_same_assessment() {
    let mut samples = storm(reference() - Duration::hours(4), 5, 6.0);
    samples.push(RainSample::new(reference() - Duration::days(2), 30.0));
    let sorted = SampleSeries::new(samples.clone());
    samples.reverse();
    let reversed = SampleSeries::new(samples);

    let assessor = RiskAssessor::default();
    assert_eq!(
        assessor.assess_from_source(&sorted, reference()),
        assessor.assess_from_source(&reversed, reference())
    );
}

#[test]
fn test_calibration_with_two_triggering_events_keeps_defaults() {
    let mut assessor = RiskAssessor::default();
    let events = vec![
        HistoricalEvent {
            duration_h: 2.0,
            max_intensity_mmh: 15.0,
            debris_flow_occurred: true,
        },
        HistoricalEvent {
            duration_h: 5.0,
            max_intensity_mmh: 9.0,
            debris_flow_occurred: true,
        },
    ];

    let outcome = assessor.calibrate(&events);
    assert!(matches!(outcome, CalibrationOutcome::InsufficientData { qualifying: 2, required: 3 }));
    assert_eq!(assessor.parameters().alpha(), 14.0);
    assert_eq!(assessor.parameters().beta(), 0.4);
    assert_eq!(assessor.threshold_model().state(), CalibrationState::Uncalibrated);
}

#[test]
fn test_segment_annotate_calibrate_pipeline() {
    // (duration_h, intensity, debris flow observed). A storm of `d` hours
    // spans d + 1 hourly samples.
    let history = [
        (1, 20.4, true),
        (2, 3.0, false),
        (2, 14.8, true),
        (4, 11.6, true),
        (3, 2.0, false),
        (8, 8.2, true),
        (16, 6.3, true),
    ];

    let mut samples = Vec::new();
    let mut start = reference() - Duration::days(60);
    for (duration, intensity, _) in history {
        samples.extend(storm(start, duration + 1, intensity));
        start += Duration::days(5);
    }
    // Dry readings between storms must not merge or split events.
    samples.push(RainSample::new(reference() - Duration::days(58), 0.0));
    samples.push(RainSample::missing(reference() - Duration::days(52)));

    let config = EngineConfig::default();
    let segmenter = EventSegmenter::new(config.events.clone()).unwrap();
    let events = segmenter.segment(&samples);
    assert_eq!(events.len(), history.len());

    let mut assessor = RiskAssessor::new(&config).unwrap();
    let labelled: Vec<HistoricalEvent> = events
        .iter()
        .zip(history)
        .map(|(event, (duration, intensity, occurred))| {
            assert_eq!(event.duration_h, duration as f64);
            assert_eq!(event.max_intensity_mmh, intensity);
            assessor.annotate_event(event, &samples).into_historical(occurred)
        })
        .collect();

    let first = assessor.annotate_event(&events[0], &samples);
    assert_eq!(first.antecedent.antecedent_30d_mm, 0.0, "first storm has no antecedent rain");

    let outcome = assessor.calibrate(&labelled);
    match outcome {
        CalibrationOutcome::Calibrated {
            parameters,
            previous,
            events_used,
        } => {
            assert_eq!(events_used, 5);
            assert_eq!(previous.alpha(), 14.0);
            assert!((parameters.alpha() - 20.0).abs() < 2.0, "alpha = {}", parameters.alpha());
            assert!(parameters.beta() > 0.3 && parameters.beta() < 0.55, "beta = {}", parameters.beta());
        }
        other => panic!("expected a successful fit, got {:?}", other),
    }
    assert_eq!(assessor.threshold_model().state(), CalibrationState::Calibrated);

    // The recalibrated curve now drives live assessments.
    let live = SampleSeries::new(storm(reference() - Duration::hours(3), 3, 12.0));
    let metrics = live.current_event_metrics(reference(), 48);
    let assessment = assessor.assess_from_source(&live, reference());
    let p = assessor.parameters();
    let expected = p.alpha() * metrics.duration_h.powf(-p.beta());
    assert!((assessment.threshold_intensity_mmh - expected).abs() < 1e-9);
}
