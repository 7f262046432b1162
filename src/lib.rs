//! Rainfall-triggered debris-flow risk engine.
//!
//! Turns a precipitation time series into a hazard classification and a
//! decision on whether to run the downstream debris-flow simulation.
//!
//! ```no_run
//! use chrono::Utc;
//! use debris_flow_engine::alert::assess::RiskAssessor;
//! use debris_flow_engine::alert::report::RiskReport;
//! use debris_flow_engine::alert::trigger::TriggerPolicy;
//! use debris_flow_engine::config::EngineConfig;
//! use debris_flow_engine::source::SampleSeries;
//!
//! let config = EngineConfig::from_env()?;
//! debris_flow_engine::logging::init_logging(&config.logging)?;
//!
//! let assessor = RiskAssessor::new(&config)?;
//! let policy = TriggerPolicy::new(&config.trigger)?;
//! let series = SampleSeries::default();
//! let report = RiskReport::new(assessor.assess_from_source(&series, Utc::now()), &policy);
//! println!("{}", report.to_json()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod alert;
pub mod analysis;
pub mod config;
pub mod logging;
pub mod model;
pub mod soil;
pub mod source;
pub mod stability;
