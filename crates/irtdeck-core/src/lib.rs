//! irtdeck-core — Graded response model evaluator and fitted-model curves.
//!
//! This crate holds the data model, the IRT evaluator, battery statistics,
//! disease-progression and drug-effect curves, the random-effect correlation
//! structure, and the TOML parameter parser that the renderers and the CLI
//! build on.

pub mod config;
pub mod covariance;
pub mod error;
pub mod grm;
pub mod model;
pub mod parameters;
pub mod parser;
pub mod pharmacology;
pub mod presets;
pub mod report;
pub mod statistics;
