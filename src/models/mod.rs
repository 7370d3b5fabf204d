//! Scorable targets and the serializable scan results built from them.

pub mod feature;
pub mod hook;
pub mod ruby;
pub mod scenario;
pub mod step_definition;
pub mod target;

pub use feature::Feature;
pub use hook::{Hook, HookType};
pub use scenario::{Scenario, ScenarioKind};
pub use step_definition::StepDefinition;
pub use target::{RuleTarget, TargetInfo, TargetKind};

use crate::rules::ScoreRecord;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Score of one target with the rules that fired on it.
pub struct TargetScore {
    pub location: String,
    pub name: String,
    pub score: i64,
    pub hits: Vec<ScoreRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Scored feature with its rolled-up totals.
pub struct FeatureScore {
    pub location: String,
    pub name: String,
    pub score: i64,
    pub scenarios_score: i64,
    pub total_score: i64,
    pub hits: Vec<ScoreRecord>,
    pub background: Option<TargetScore>,
    pub scenarios: Vec<TargetScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// A file that could not be read or modeled.
pub struct FileError {
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
/// Aggregated counts used by printers and the exit-code decision.
pub struct Summary {
    pub files: usize,
    pub features: usize,
    pub scenarios: usize,
    pub hooks: usize,
    pub step_definitions: usize,
    pub errors: usize,
    pub total_score: i64,
    pub threshold: Option<i64>,
    pub over_threshold: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Scan results container.
pub struct ScanResult {
    pub features: Vec<FeatureScore>,
    pub hooks: Vec<TargetScore>,
    pub step_definitions: Vec<TargetScore>,
    pub errors: Vec<FileError>,
    pub summary: Summary,
}
