//! bddscore core library.
//!
//! This crate scores Cucumber suites: feature files are modeled per element,
//! Ruby support files are split into hooks and step definitions, and a
//! weighted rule catalog is applied to every target.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `error`: Crate error type.
//! - `grammar`: Gherkin adapter seam and the built-in line grammar.
//! - `models`: Features, scenarios, hooks, step definitions and result structs.
//! - `rules`: Rule catalog and evaluator.
//! - `score`: Per-target scores and feature aggregation.
//! - `scan`: File discovery and the parallel scan runner.
//! - `output`: Human/JSON printers.
pub mod cli;
pub mod config;
pub mod error;
pub mod grammar;
pub mod models;
pub mod output;
pub mod rules;
pub mod scan;
pub mod score;
