//! Output rendering for the score and rules commands.
//!
//! Supports `human` (default) and `json` outputs. The JSON form is the
//! serialized result with a top-level summary.

use crate::models::{FeatureScore, ScanResult, TargetScore};
use crate::rules::{Rule, ScoreRecord};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Prefix for messages printed to stderr by the binary.
pub fn error_prefix(output: &str) -> String {
    if use_colors(output) {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

fn paint_score(score: i64, over: bool, color: bool) -> String {
    let text = format!("[{}]", score);
    if !color {
        return text;
    }
    if over {
        text.red().bold().to_string()
    } else if score > 0 {
        text.yellow().to_string()
    } else {
        text.green().to_string()
    }
}

fn print_hits(hits: &[ScoreRecord], indent: &str, color: bool) {
    for hit in hits {
        let weight = format!("{:+}", hit.contribution);
        let weight = if color {
            weight.bright_black().to_string()
        } else {
            weight
        };
        let times = if hit.count > 1 {
            format!(" (x{})", hit.count)
        } else {
            String::new()
        };
        println!("{}{} {}{}", indent, weight, hit.phrase, times);
    }
}

fn print_target(target: &TargetScore, indent: &str, color: bool) {
    if target.hits.is_empty() {
        return;
    }
    let location = if color {
        target.location.clone().bold().to_string()
    } else {
        target.location.clone()
    };
    println!(
        "{}{} {} {}",
        indent,
        paint_score(target.score, false, color),
        location,
        target.name
    );
    print_hits(&target.hits, &format!("{}    ", indent), color);
}

fn print_feature(feature: &FeatureScore, threshold: Option<i64>, color: bool) {
    let over = threshold.is_some_and(|t| feature.total_score > t);
    let location = if color {
        feature.location.clone().bold().to_string()
    } else {
        feature.location.clone()
    };
    println!(
        "{} {} {}",
        paint_score(feature.total_score, over, color),
        location,
        feature.name
    );
    print_hits(&feature.hits, "    ", color);
    if let Some(bg) = &feature.background {
        print_target(bg, "  ", color);
    }
    for scenario in &feature.scenarios {
        print_target(scenario, "  ", color);
    }
}

/// Print scan results in the requested format.
pub fn print_scan(res: &ScanResult, output: &str) {
    match output {
        "json" => println!("{:#}", compose_scan_json(res)),
        _ => {
            let color = use_colors(output);
            for feature in &res.features {
                print_feature(feature, res.summary.threshold, color);
            }
            for hook in &res.hooks {
                print_target(hook, "", color);
            }
            for sd in &res.step_definitions {
                print_target(sd, "", color);
            }
            for err in &res.errors {
                let tag = if color {
                    "✖".red().to_string()
                } else {
                    "✖".to_string()
                };
                println!("{} {} — {}", tag, err.file, err.message);
            }
            let s = &res.summary;
            let mut summary = format!(
                "— Summary — score={} files={} features={} scenarios={} hooks={} step_definitions={} errors={}",
                s.total_score,
                s.files,
                s.features,
                s.scenarios,
                s.hooks,
                s.step_definitions,
                s.errors
            );
            if let Some(t) = s.threshold {
                summary.push_str(&format!(
                    " over_threshold={} (threshold={})",
                    s.over_threshold, t
                ));
            }
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// Print the active rule catalog.
pub fn print_rules(rules: &[Rule], output: &str) {
    match output {
        "json" => println!("{:#}", compose_rules_json(rules)),
        _ => {
            let color = use_colors(output);
            for rule in rules {
                let id = if color {
                    rule.id.bold().to_string()
                } else {
                    rule.id.to_string()
                };
                let state = if rule.enabled { "" } else { " (disabled)" };
                println!(
                    "{:>4} {} [{}] {}{}",
                    rule.score,
                    id,
                    rule.target_kind().as_str(),
                    rule.render_phrase(rule.target_kind().as_str()),
                    state
                );
            }
        }
    }
}

/// Compose scan JSON object (pure) for testing/snapshot purposes.
pub fn compose_scan_json(res: &ScanResult) -> JsonVal {
    json!(res)
}

/// Compose rules JSON object (pure) for testing/snapshot purposes.
pub fn compose_rules_json(rules: &[Rule]) -> JsonVal {
    let items: Vec<_> = rules
        .iter()
        .map(|r| {
            json!({
                "id": r.id,
                "target": r.target_kind(),
                "score": r.score,
                "enabled": r.enabled,
                "phrase": r.phrase,
            })
        })
        .collect();
    let summary = json!({
        "total": rules.len(),
        "enabled": rules.iter().filter(|r| r.enabled).count(),
    });
    json!({"rules": items, "summary": summary})
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileError, Summary};
    use crate::rules::default_rules;

    #[test]
    fn test_compose_scan_json_shape() {
        let res = ScanResult {
            features: vec![FeatureScore {
                location: "features/a.feature:1".into(),
                name: "A".into(),
                score: 10,
                scenarios_score: 25,
                total_score: 35,
                hits: vec![],
                background: None,
                scenarios: vec![TargetScore {
                    location: "features/a.feature:3".into(),
                    name: "".into(),
                    score: 25,
                    hits: vec![ScoreRecord {
                        rule_id: "scenario_no_steps".into(),
                        phrase: "Scenario with no steps.".into(),
                        count: 1,
                        contribution: 25,
                    }],
                }],
            }],
            hooks: vec![],
            step_definitions: vec![],
            errors: vec![FileError {
                file: "features/b.feature".into(),
                message: "bad".into(),
            }],
            summary: Summary {
                files: 2,
                features: 1,
                scenarios: 1,
                errors: 1,
                total_score: 35,
                ..Summary::default()
            },
        };
        let out = compose_scan_json(&res);
        assert_eq!(out["summary"]["total_score"], 35);
        assert_eq!(out["features"][0]["total_score"], 35);
        assert_eq!(
            out["features"][0]["scenarios"][0]["hits"][0]["rule_id"],
            "scenario_no_steps"
        );
        assert!(out["features"][0]["background"].is_null());
        assert_eq!(out["errors"][0]["file"], "features/b.feature");
    }

    #[test]
    fn test_compose_rules_json_counts_enabled() {
        let mut rules = default_rules();
        let total = rules.len();
        rules[0].enabled = false;
        let out = compose_rules_json(&rules);
        assert_eq!(out["summary"]["total"], total);
        assert_eq!(out["summary"]["enabled"], total - 1);
        assert_eq!(out["rules"][0]["target"], "Feature");
        assert_eq!(out["rules"][0]["enabled"], false);
    }

    #[test]
    fn test_json_output_disables_colors() {
        assert!(!use_colors("json"));
        assert_eq!(error_prefix("json"), "error:");
    }
}
