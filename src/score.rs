//! Score aggregation.
//!
//! Targets never carry their own score. A `Scored` pairs a borrowed target
//! with the records the evaluator produced for it, and every total is
//! recomputed from those records on read, so aggregating twice gives the
//! same numbers.

use crate::models::{
    Feature, FeatureScore, Hook, RuleTarget, Scenario, StepDefinition, TargetScore,
};
use crate::rules::{
    evaluate_feature, evaluate_hook, evaluate_scenario, evaluate_step_definition, Rule,
    ScoreRecord,
};

/// A target alongside the rules that fired on it.
#[derive(Debug, Clone)]
pub struct Scored<'a, T> {
    pub target: &'a T,
    pub hits: Vec<ScoreRecord>,
}

impl<'a, T: RuleTarget> Scored<'a, T> {
    pub fn score(&self) -> i64 {
        self.hits.iter().map(|h| h.contribution).sum()
    }

    /// Rule id -> trigger count.
    pub fn rule_hits(&self) -> Vec<(&str, usize)> {
        self.hits
            .iter()
            .map(|h| (h.rule_id.as_str(), h.count))
            .collect()
    }

    pub fn to_target_score(&self) -> TargetScore {
        TargetScore {
            location: self.target.location().to_string(),
            name: self.target.name().to_string(),
            score: self.score(),
            hits: self.hits.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeatureReport<'a> {
    pub feature: Scored<'a, Feature>,
    pub background: Option<Scored<'a, Scenario>>,
    pub scenarios: Vec<Scored<'a, Scenario>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureTotals {
    /// Score of the feature's own rules.
    pub score: i64,
    /// Background plus every scenario.
    pub scenarios_score: i64,
    pub total_score: i64,
}

pub fn score_feature<'a>(rules: &[Rule], feature: &'a Feature) -> FeatureReport<'a> {
    let scenario = |s: &'a Scenario| Scored {
        target: s,
        hits: evaluate_scenario(rules, s),
    };
    FeatureReport {
        feature: Scored {
            target: feature,
            hits: evaluate_feature(rules, feature),
        },
        background: feature.background.as_ref().map(scenario),
        scenarios: feature.scenarios.iter().map(scenario).collect(),
    }
}

pub fn aggregate(report: &FeatureReport<'_>) -> FeatureTotals {
    let background = report.background.as_ref().map_or(0, Scored::score);
    let scenarios_score = background + report.scenarios.iter().map(Scored::score).sum::<i64>();
    let score = report.feature.score();
    FeatureTotals {
        score,
        scenarios_score,
        total_score: scenarios_score + score,
    }
}

impl FeatureReport<'_> {
    pub fn to_feature_score(&self) -> FeatureScore {
        let totals = aggregate(self);
        FeatureScore {
            location: self.feature.target.location().to_string(),
            name: self.feature.target.name().to_string(),
            score: totals.score,
            scenarios_score: totals.scenarios_score,
            total_score: totals.total_score,
            hits: self.feature.hits.clone(),
            background: self.background.as_ref().map(Scored::to_target_score),
            scenarios: self.scenarios.iter().map(Scored::to_target_score).collect(),
        }
    }
}

/// Score every hook, each against the full list as peers.
pub fn score_hooks<'a>(rules: &[Rule], hooks: &'a [Hook]) -> Vec<Scored<'a, Hook>> {
    hooks
        .iter()
        .map(|hook| Scored {
            target: hook,
            hits: evaluate_hook(rules, hook, hooks),
        })
        .collect()
}

pub fn score_step_definitions<'a>(
    rules: &[Rule],
    step_definitions: &'a [StepDefinition],
) -> Vec<Scored<'a, StepDefinition>> {
    step_definitions
        .iter()
        .map(|sd| Scored {
            target: sd,
            hits: evaluate_step_definition(rules, sd),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::LineGrammar;
    use crate::rules::{default_rules, Predicate};

    const SOURCE: &str = "\
Feature: Checkout 2
  Background:
    Given a cart
  Scenario: pay
    * pay
  Scenario:
    Given x
    Then y
";

    #[test]
    fn test_total_is_feature_plus_elements() {
        let feature = Feature::from_source("checkout.feature", SOURCE, &LineGrammar).unwrap();
        let report = score_feature(&default_rules(), &feature);
        let totals = aggregate(&report);
        let expected_scenarios = report.background.as_ref().unwrap().score()
            + report.scenarios.iter().map(|s| s.score()).sum::<i64>();
        assert_eq!(totals.scenarios_score, expected_scenarios);
        assert_eq!(totals.total_score, totals.scenarios_score + totals.score);
        // "Checkout 2" has numbers in its name.
        assert!(report
            .feature
            .rule_hits()
            .contains(&("feature_numbers_in_name", 1)));
        assert!(report.scenarios[0]
            .rule_hits()
            .contains(&("step_asterisk", 1)));
        assert!(report.scenarios[1]
            .rule_hits()
            .contains(&("scenario_no_name", 1)));
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let feature = Feature::from_source("checkout.feature", SOURCE, &LineGrammar).unwrap();
        let report = score_feature(&default_rules(), &feature);
        let first = aggregate(&report);
        let second = aggregate(&report);
        assert_eq!(first, second);
        assert_eq!(report.to_feature_score().total_score, first.total_score);
    }

    #[test]
    fn test_negative_weights_reduce_the_total() {
        let rules = vec![
            Rule::new("p", "{class} p", 5, Predicate::Scenario(|_| 1)),
            Rule::new("b", "{class} b", -7, Predicate::Feature(|_| 1)),
        ];
        let feature = Feature::from_source("checkout.feature", SOURCE, &LineGrammar).unwrap();
        let totals = aggregate(&score_feature(&rules, &feature));
        assert_eq!(totals.scenarios_score, 15);
        assert_eq!(totals.score, -7);
        assert_eq!(totals.total_score, 8);
    }

    #[test]
    fn test_empty_feature_scores_only_feature_rules() {
        let feature = Feature::from_source("empty.feature", "\n\n", &LineGrammar).unwrap();
        let report = score_feature(&default_rules(), &feature);
        let totals = aggregate(&report);
        assert_eq!(totals.scenarios_score, 0);
        assert_eq!(totals.total_score, totals.score);
        assert!(report.background.is_none());
    }

    #[test]
    fn test_hooks_are_scored_against_peers() {
        let lines: Vec<String> = ["After do", "reset", "end"]
            .iter()
            .map(|l| l.to_string())
            .collect();
        let hooks = vec![
            Hook::parse("features/support/hooks.rb:1", &lines).unwrap(),
            Hook::parse("features/support/hooks.rb:5", &lines).unwrap(),
        ];
        let scored = score_hooks(&default_rules(), &hooks);
        assert_eq!(scored.len(), 2);
        for hook in &scored {
            assert!(hook.rule_hits().contains(&("hook_duplicate", 1)));
            assert_eq!(hook.to_target_score().score, hook.score());
        }
    }
}
