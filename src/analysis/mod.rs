//! Time-series analysis for the debris-flow risk engine.
//!
//! This module turns raw precipitation samples into the quantities the
//! threshold and soil models consume. Everything here is a pure function of
//! the samples and an injected reference time.
//!
//! Submodules:
//! - `events`: groups a series into discrete rainfall events.
//! - `antecedent`: windowed and decay-weighted antecedent rainfall, plus the
//!   metrics of the event in progress.

pub mod antecedent;
pub mod events;
