//! Attributes shared by everything the rule catalog can score.

use serde::Serialize;

/// Kind of target a rule binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TargetKind {
    Feature,
    Scenario,
    Step,
    Hook,
    StepDefinition,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Feature => "Feature",
            TargetKind::Scenario => "Scenario",
            TargetKind::Step => "Step",
            TargetKind::Hook => "Hook",
            TargetKind::StepDefinition => "StepDefinition",
        }
    }
}

/// Location, name and tags of a scorable element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetInfo {
    /// `path:line` of the declaring line.
    pub location: String,
    pub name: String,
    pub tags: Vec<String>,
}

impl TargetInfo {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }

    /// Path part of the location.
    pub fn path(&self) -> &str {
        match self.location.rsplit_once(':') {
            Some((path, line)) if line.chars().all(|c| c.is_ascii_digit()) => path,
            _ => &self.location,
        }
    }
}

/// Common view over every scorable element.
pub trait RuleTarget {
    fn kind(&self) -> TargetKind;
    fn info(&self) -> &TargetInfo;

    /// Label substituted for `{class}` in rule phrases.
    fn class_name(&self) -> &'static str {
        self.kind().as_str()
    }

    fn location(&self) -> &str {
        &self.info().location
    }

    fn name(&self) -> &str {
        &self.info().name
    }

    fn tags(&self) -> &[String] {
        &self.info().tags
    }
}
