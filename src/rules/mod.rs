//! Rule definitions and the evaluator.
//!
//! A rule binds one predicate to one target kind. Evaluating a target never
//! mutates it: each fired rule yields a `ScoreRecord` and the caller keeps
//! the records next to the target (see `score::Scored`).

pub mod catalog;

pub use catalog::default_rules;

use crate::config::RuleOverride;
use crate::models::{Feature, Hook, RuleTarget, Scenario, StepDefinition, TargetKind};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Predicate of a rule; the variant fixes the target kind it applies to.
#[derive(Clone, Copy)]
pub enum Predicate {
    Feature(fn(&Feature) -> usize),
    Scenario(fn(&Scenario) -> usize),
    /// Called once per step line of a scenario or background.
    Step(fn(&str) -> usize),
    /// Receives every hook of the suite as peers.
    Hook(fn(&Hook, &[Hook]) -> usize),
    StepDefinition(fn(&StepDefinition) -> usize),
}

impl Predicate {
    pub fn target_kind(&self) -> TargetKind {
        match self {
            Predicate::Feature(_) => TargetKind::Feature,
            Predicate::Scenario(_) => TargetKind::Scenario,
            Predicate::Step(_) => TargetKind::Step,
            Predicate::Hook(_) => TargetKind::Hook,
            Predicate::StepDefinition(_) => TargetKind::StepDefinition,
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Predicate::{}", self.target_kind().as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub id: &'static str,
    /// Message with a `{class}` placeholder for the target label.
    pub phrase: &'static str,
    /// Weight per trigger; negative values are bonuses.
    pub score: i64,
    pub enabled: bool,
    pub predicate: Predicate,
}

impl Rule {
    pub fn new(id: &'static str, phrase: &'static str, score: i64, predicate: Predicate) -> Self {
        Self {
            id,
            phrase,
            score,
            enabled: true,
            predicate,
        }
    }

    pub fn target_kind(&self) -> TargetKind {
        self.predicate.target_kind()
    }

    pub fn render_phrase(&self, class: &str) -> String {
        self.phrase.replace("{class}", class)
    }

    fn record(&self, class: &str, count: usize) -> Option<ScoreRecord> {
        (count > 0).then(|| ScoreRecord {
            rule_id: self.id.to_string(),
            phrase: self.render_phrase(class),
            count,
            contribution: count as i64 * self.score,
        })
    }
}

/// One rule's outcome against one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRecord {
    pub rule_id: String,
    pub phrase: String,
    pub count: usize,
    pub contribution: i64,
}

fn active(rules: &[Rule]) -> impl Iterator<Item = &Rule> {
    rules.iter().filter(|r| r.enabled)
}

pub fn evaluate_feature(rules: &[Rule], feature: &Feature) -> Vec<ScoreRecord> {
    active(rules)
        .filter_map(|rule| match rule.predicate {
            Predicate::Feature(p) => rule.record(feature.class_name(), p(feature)),
            _ => None,
        })
        .collect()
}

/// Scenario rules plus step rules summed over the scenario's step lines.
pub fn evaluate_scenario(rules: &[Rule], scenario: &Scenario) -> Vec<ScoreRecord> {
    active(rules)
        .filter_map(|rule| match rule.predicate {
            Predicate::Scenario(p) => rule.record(scenario.class_name(), p(scenario)),
            Predicate::Step(p) => {
                let count = scenario.steps.iter().map(|s| p(s)).sum();
                rule.record(TargetKind::Step.as_str(), count)
            }
            _ => None,
        })
        .collect()
}

pub fn evaluate_hook(rules: &[Rule], hook: &Hook, peers: &[Hook]) -> Vec<ScoreRecord> {
    active(rules)
        .filter_map(|rule| match rule.predicate {
            Predicate::Hook(p) => rule.record(hook.class_name(), p(hook, peers)),
            _ => None,
        })
        .collect()
}

pub fn evaluate_step_definition(
    rules: &[Rule],
    step_definition: &StepDefinition,
) -> Vec<ScoreRecord> {
    active(rules)
        .filter_map(|rule| match rule.predicate {
            Predicate::StepDefinition(p) => {
                rule.record(step_definition.class_name(), p(step_definition))
            }
            _ => None,
        })
        .collect()
}

/// Replace weights and enablement before evaluation. Unknown ids are
/// reported and otherwise ignored.
pub fn apply_overrides(rules: &mut [Rule], overrides: &HashMap<String, RuleOverride>) {
    for (id, ov) in overrides {
        let Some(rule) = rules.iter_mut().find(|r| r.id == id.as_str()) else {
            tracing::warn!(rule = %id, "override for unknown rule ignored");
            continue;
        };
        if let Some(score) = ov.score {
            rule.score = score;
        }
        if let Some(enabled) = ov.enabled {
            rule.enabled = enabled;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::LineGrammar;

    fn two_rules() -> Vec<Rule> {
        vec![
            Rule::new(
                "steps",
                "{class} has steps.",
                3,
                Predicate::Scenario(|s| s.steps.len()),
            ),
            Rule::new(
                "bonus",
                "{class} bonus.",
                -2,
                Predicate::Scenario(|_| 1),
            ),
            Rule::new(
                "feature_only",
                "{class} never applies here.",
                50,
                Predicate::Feature(|_| 1),
            ),
            Rule::new("given", "{class} uses Given.", 5, Predicate::Step(|s| {
                usize::from(s.trim_start().starts_with("Given"))
            })),
        ]
    }

    fn scenario() -> Scenario {
        let lines: Vec<String> = ["Scenario: s", "  Given a", "  Given b", "  Then c"]
            .iter()
            .map(|l| l.to_string())
            .collect();
        Scenario::parse("f.feature:1", &lines, &LineGrammar)
    }

    #[test]
    fn test_evaluate_scenario_counts_and_contributions() {
        let records = evaluate_scenario(&two_rules(), &scenario());
        assert_eq!(
            records,
            vec![
                ScoreRecord {
                    rule_id: "steps".into(),
                    phrase: "Scenario has steps.".into(),
                    count: 3,
                    contribution: 9,
                },
                ScoreRecord {
                    rule_id: "bonus".into(),
                    phrase: "Scenario bonus.".into(),
                    count: 1,
                    contribution: -2,
                },
                ScoreRecord {
                    rule_id: "given".into(),
                    phrase: "Step uses Given.".into(),
                    count: 2,
                    contribution: 10,
                },
            ]
        );
    }

    #[test]
    fn test_rule_order_does_not_change_outcome() {
        let s = scenario();
        let mut reversed = two_rules();
        reversed.reverse();
        let mut a = evaluate_scenario(&two_rules(), &s);
        let mut b = evaluate_scenario(&reversed, &s);
        a.sort_by(|x, y| x.rule_id.cmp(&y.rule_id));
        b.sort_by(|x, y| x.rule_id.cmp(&y.rule_id));
        assert_eq!(a, b);
    }

    #[test]
    fn test_overrides_change_weight_and_disable() {
        let mut rules = two_rules();
        let mut overrides = HashMap::new();
        overrides.insert(
            "steps".to_string(),
            RuleOverride {
                score: Some(1),
                enabled: None,
            },
        );
        overrides.insert(
            "bonus".to_string(),
            RuleOverride {
                score: None,
                enabled: Some(false),
            },
        );
        overrides.insert("nope".to_string(), RuleOverride::default());
        apply_overrides(&mut rules, &overrides);
        let records = evaluate_scenario(&rules, &scenario());
        let ids: Vec<_> = records.iter().map(|r| r.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["steps", "given"]);
        assert_eq!(records[0].contribution, 3);
    }

    #[test]
    fn test_target_kind_follows_predicate() {
        let rules = two_rules();
        assert_eq!(rules[0].target_kind(), TargetKind::Scenario);
        assert_eq!(rules[2].target_kind(), TargetKind::Feature);
        assert_eq!(rules[3].target_kind(), TargetKind::Step);
    }
}
