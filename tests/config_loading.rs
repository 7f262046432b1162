//! Configuration loading tests
//!
//! Loads the shipped `debris_engine.toml` and checks that invalid parameter
//! bounds are rejected when components are built, not when they are used.

use debris_flow_engine::alert::assess::RiskAssessor;
use debris_flow_engine::alert::trigger::TriggerPolicy;
use debris_flow_engine::analysis::antecedent::AntecedentAggregator;
use debris_flow_engine::analysis::events::EventSegmenter;
use debris_flow_engine::config::{EngineConfig, EventConfig};
use debris_flow_engine::model::{ConfigError, ThresholdParameters};
use debris_flow_engine::stability::InfiniteSlopeModel;

const SHIPPED_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/debris_engine.toml");

#[test]
fn test_shipped_config_matches_defaults() {
    let config = EngineConfig::load(SHIPPED_CONFIG).expect("shipped config should load");
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn test_shipped_config_builds_every_component() {
    let config = EngineConfig::load(SHIPPED_CONFIG).unwrap();

    let assessor = RiskAssessor::new(&config).expect("assessor");
    assert_eq!(assessor.parameters(), ThresholdParameters::default());
    assert_eq!(assessor.aggregator().decay(), 0.84);

    EventSegmenter::new(config.events.clone()).expect("segmenter");
    AntecedentAggregator::new(config.antecedent.decay, config.antecedent.effective_window_days)
        .expect("aggregator");
    InfiniteSlopeModel::new(config.stability.clone()).expect("slope model");
    TriggerPolicy::new(&config.trigger).expect("trigger policy");
}

#[test]
fn test_overrides_flow_into_the_assessor() {
    let config = EngineConfig::from_toml_str(
        r#"
        [threshold]
        alpha = 9.5
        beta = 0.38

        [soil]
        field_capacity_mm = 150.0
        "#,
    )
    .unwrap();

    let assessor = RiskAssessor::new(&config).unwrap();
    assert_eq!(assessor.parameters().alpha(), 9.5);
    assert_eq!(assessor.parameters().beta(), 0.38);
    assert_eq!(assessor.soil().field_capacity_mm(), 150.0);
}

#[test]
fn test_out_of_range_values_fail_fast() {
    let cases = [
        ("[threshold]\nbeta = 0.0\n", "threshold.beta"),
        ("[threshold]\nalpha = -3.0\n", "threshold.alpha"),
        ("[threshold]\nmin_calibration_events = 1\n", "threshold.min_calibration_events"),
        ("[antecedent]\ndecay = 1.5\n", "antecedent.decay"),
        ("[antecedent]\nlong_window_days = 0\n", "antecedent.long_window_days"),
        ("[soil]\nbase_slope_deg = 90.0\n", "soil.base_slope_deg"),
        ("[stability]\nfriction_angle_deg = 95.0\n", "stability.friction_angle_deg"),
        ("[events]\npeak_window_minutes = 0\n", "events.peak_window_minutes"),
        ("[trigger]\nsaturation = -0.1\n", "trigger.saturation"),
    ];

    for (toml, expected_field) in cases {
        match EngineConfig::from_toml_str(toml) {
            Err(ConfigError::InvalidValue { field, .. }) => {
                assert_eq!(field, expected_field, "for input {:?}", toml)
            }
            other => panic!("expected InvalidValue for {:?}, got {:?}", toml, other),
        }
    }
}

#[test]
fn test_wrong_type_is_a_parse_error() {
    let err = EngineConfig::from_toml_str("[events]\nmin_event_total_mm = \"five\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)), "got {:?}", err);
}

#[test]
fn test_component_constructors_validate_on_their_own() {
    let negative_gap = EventConfig {
        min_inter_event_gap_hours: -1.0,
        ..EventConfig::default()
    };
    assert!(EventSegmenter::new(negative_gap).is_err());
    assert!(AntecedentAggregator::new(0.0, 14).is_err());
    assert!(AntecedentAggregator::new(1.0, 14).is_ok());
}
