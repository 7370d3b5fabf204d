//! Built-in rule catalog.
//!
//! Weights follow four levels; a config file can override any of them by id.

use super::{Predicate, Rule};
use crate::models::scenario::is_step_line;
use crate::models::{Feature, Hook, Scenario, StepDefinition};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

pub const FATAL: i64 = 100;
pub const ERROR: i64 = 25;
pub const WARNING: i64 = 10;
pub const INFO: i64 = 1;

const MAX_TAGS: usize = 8;
const MAX_NAME_LENGTH: usize = 180;
const MAX_SCENARIOS: usize = 10;
const MAX_STEPS: usize = 7;
const MAX_EXAMPLES: usize = 10;
const MAX_TABLE_ROWS: usize = 10;
const MAX_PARAMETERS: usize = 4;

/// Words describing how a step is carried out rather than what it means.
const IMPLEMENTATION_WORDS: &[&str] = &[
    "page",
    "site",
    "url",
    "button",
    "drop down",
    "dropdown",
    "select list",
    "click",
    "text box",
    "radio button",
    "check box",
    "xml",
    "window",
    "pop up",
    "pop-up",
    "screen",
    "database",
];

static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2}/\d{1,2}/\d{2,4}|\d{4}-\d{2}-\d{2})\b").unwrap());
static IMPLEMENTATION_WORD: Lazy<Vec<Regex>> = Lazy::new(|| {
    IMPLEMENTATION_WORDS
        .iter()
        .map(|w| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(w))).unwrap())
        .collect()
});

fn commented_tags(comments: &[String]) -> usize {
    comments
        .iter()
        .filter(|c| {
            c.trim_start_matches('#')
                .split_whitespace()
                .any(|t| t.starts_with('@') && t.len() > 1)
        })
        .count()
}

fn has_digits(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_digit())
}

fn is_commented(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

/// Example rows that are not commented out, header included.
fn live_examples(scenario: &Scenario) -> usize {
    scenario
        .examples_table()
        .iter()
        .filter(|r| !is_commented(r))
        .count()
}

fn out_of_order(scenario: &Scenario) -> bool {
    let rank = |kw: &str| match kw {
        "Given" => Some(0),
        "When" => Some(1),
        "Then" => Some(2),
        _ => None,
    };
    let ranks: Vec<u8> = scenario
        .step_order()
        .into_iter()
        .filter_map(rank)
        .collect();
    ranks.windows(2).any(|w| w[1] < w[0])
}

fn first_step_is_conjunction(scenario: &Scenario) -> bool {
    matches!(scenario.step_order().first(), Some(&"And") | Some(&"But"))
}

/// Tags that every scenario repeats and could live on the feature instead.
fn tags_on_all_scenarios(feature: &Feature) -> usize {
    let Some((first, rest)) = feature.scenarios.split_first() else {
        return 0;
    };
    if rest.is_empty() {
        return 0;
    }
    let mut seen: Vec<&String> = Vec::new();
    for tag in &first.info.tags {
        if !seen.contains(&tag) && rest.iter().all(|s| s.info.tags.contains(tag)) {
            seen.push(tag);
        }
    }
    seen.len()
}

fn hook_file_name(hook: &Hook) -> Option<String> {
    Path::new(hook.info.path())
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
}

fn feature_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "feature_no_name",
            "{class} has no name.",
            WARNING,
            Predicate::Feature(|f: &Feature| usize::from(f.info.name.trim().is_empty())),
        ),
        Rule::new(
            "feature_numbers_in_name",
            "{class} name has numbers.",
            WARNING,
            Predicate::Feature(|f: &Feature| usize::from(has_digits(&f.info.name))),
        ),
        Rule::new(
            "feature_long_name",
            "{class} has a long name.",
            INFO,
            Predicate::Feature(|f: &Feature| usize::from(f.info.name.len() > MAX_NAME_LENGTH)),
        ),
        Rule::new(
            "feature_too_many_tags",
            "{class} has too many tags.",
            INFO,
            Predicate::Feature(|f: &Feature| usize::from(f.info.tags.len() > MAX_TAGS)),
        ),
        Rule::new(
            "feature_commented_tag",
            "{class} has a commented out tag.",
            INFO,
            Predicate::Feature(|f: &Feature| commented_tags(&f.comments)),
        ),
        Rule::new(
            "feature_no_scenarios",
            "{class} with no scenarios.",
            ERROR,
            Predicate::Feature(|f: &Feature| usize::from(f.scenarios.is_empty())),
        ),
        Rule::new(
            "feature_too_many_scenarios",
            "{class} with too many scenarios.",
            INFO,
            Predicate::Feature(|f: &Feature| usize::from(f.scenarios.len() > MAX_SCENARIOS)),
        ),
        Rule::new(
            "background_with_no_scenarios",
            "{class} has a background with no scenarios.",
            WARNING,
            Predicate::Feature(|f: &Feature| {
                usize::from(f.background.is_some() && f.scenarios.is_empty())
            }),
        ),
        Rule::new(
            "background_with_one_scenario",
            "{class} has a background with only one scenario.",
            WARNING,
            Predicate::Feature(|f: &Feature| {
                usize::from(f.background.is_some() && f.scenarios.len() == 1)
            }),
        ),
        Rule::new(
            "feature_same_tag_on_all_scenarios",
            "{class} repeats the same tag on every scenario.",
            INFO,
            Predicate::Feature(tags_on_all_scenarios),
        ),
    ]
}

fn scenario_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "scenario_syntax_error",
            "{class} has a syntax error.",
            FATAL,
            Predicate::Scenario(|s: &Scenario| usize::from(s.syntax_error)),
        ),
        Rule::new(
            "scenario_no_name",
            "{class} has no name.",
            WARNING,
            Predicate::Scenario(|s: &Scenario| {
                usize::from(!s.is_background() && s.info.name.trim().is_empty())
            }),
        ),
        Rule::new(
            "scenario_numbers_in_name",
            "{class} name has numbers.",
            WARNING,
            Predicate::Scenario(|s: &Scenario| usize::from(has_digits(&s.info.name))),
        ),
        Rule::new(
            "scenario_long_name",
            "{class} has a long name.",
            INFO,
            Predicate::Scenario(|s: &Scenario| usize::from(s.info.name.len() > MAX_NAME_LENGTH)),
        ),
        Rule::new(
            "scenario_too_many_tags",
            "{class} has too many tags.",
            INFO,
            Predicate::Scenario(|s: &Scenario| usize::from(s.info.tags.len() > MAX_TAGS)),
        ),
        Rule::new(
            "scenario_commented_tag",
            "{class} has a commented out tag.",
            INFO,
            Predicate::Scenario(|s: &Scenario| commented_tags(&s.comments)),
        ),
        Rule::new(
            "scenario_no_steps",
            "{class} with no steps.",
            ERROR,
            Predicate::Scenario(|s: &Scenario| {
                usize::from(!s.syntax_error && s.step_order().is_empty())
            }),
        ),
        Rule::new(
            "scenario_too_many_steps",
            "{class} with too many steps.",
            WARNING,
            Predicate::Scenario(|s: &Scenario| usize::from(s.step_order().len() > MAX_STEPS)),
        ),
        Rule::new(
            "scenario_out_of_order_steps",
            "{class} steps are out of Given/When/Then order.",
            WARNING,
            Predicate::Scenario(|s: &Scenario| usize::from(out_of_order(s))),
        ),
        Rule::new(
            "scenario_invalid_first_step",
            "{class} begins with And/But.",
            WARNING,
            Predicate::Scenario(|s: &Scenario| usize::from(first_step_is_conjunction(s))),
        ),
        Rule::new(
            "outline_no_examples_table",
            "{class} with no examples table.",
            ERROR,
            Predicate::Scenario(|s: &Scenario| {
                usize::from(s.is_outline() && !s.syntax_error && s.examples_table().is_empty())
            }),
        ),
        Rule::new(
            "outline_no_examples",
            "{class} with no examples.",
            ERROR,
            Predicate::Scenario(|s: &Scenario| {
                usize::from(s.is_outline() && live_examples(s) == 1)
            }),
        ),
        Rule::new(
            "outline_one_example",
            "{class} with only one example.",
            WARNING,
            Predicate::Scenario(|s: &Scenario| {
                usize::from(s.is_outline() && live_examples(s) == 2)
            }),
        ),
        Rule::new(
            "outline_too_many_examples",
            "{class} with too many examples.",
            WARNING,
            Predicate::Scenario(|s: &Scenario| {
                usize::from(s.is_outline() && live_examples(s) > MAX_EXAMPLES + 1)
            }),
        ),
        Rule::new(
            "outline_commented_example",
            "{class} has a commented example.",
            INFO,
            Predicate::Scenario(|s: &Scenario| {
                s.examples_table().iter().filter(|r| is_commented(r)).count()
            }),
        ),
        Rule::new(
            "scenario_large_inline_table",
            "{class} has a step table that is too long.",
            INFO,
            Predicate::Scenario(|s: &Scenario| {
                s.inline_tables
                    .values()
                    .filter(|rows| rows.len() > MAX_TABLE_ROWS)
                    .count()
            }),
        ),
    ]
}

fn step_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "step_commented",
            "{class} is commented out.",
            INFO,
            Predicate::Step(|line: &str| usize::from(is_commented(line))),
        ),
        Rule::new(
            "step_asterisk",
            "{class} uses * instead of a keyword.",
            WARNING,
            Predicate::Step(|line: &str| usize::from(line.trim_start().starts_with("* "))),
        ),
        Rule::new(
            "step_implementation_word",
            "{class} uses an implementation word.",
            INFO,
            Predicate::Step(|line: &str| {
                if is_commented(line) || !is_step_line(line) {
                    return 0;
                }
                IMPLEMENTATION_WORD.iter().filter(|re| re.is_match(line)).count()
            }),
        ),
        Rule::new(
            "step_date_used",
            "{class} uses a hard coded date.",
            INFO,
            Predicate::Step(|line: &str| usize::from(!is_commented(line) && DATE.is_match(line))),
        ),
    ]
}

fn hook_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "hook_empty",
            "{class} with no content.",
            WARNING,
            Predicate::Hook(|h: &Hook, _| usize::from(h.code.is_empty() && h.comments.is_empty())),
        ),
        Rule::new(
            "hook_not_in_hooks_file",
            "{class} found outside of the hooks.rb file.",
            INFO,
            Predicate::Hook(|h: &Hook, _| {
                usize::from(hook_file_name(h).as_deref() != Some("hooks.rb"))
            }),
        ),
        Rule::new(
            "around_hook_without_2_parameters",
            "{class} Around hook without 2 parameters for scenario and block.",
            FATAL,
            Predicate::Hook(|h: &Hook, _| usize::from(h.around() && h.parameters.len() != 2)),
        ),
        Rule::new(
            "around_hook_no_block_call",
            "{class} Around hook does not call its block.",
            FATAL,
            Predicate::Hook(|h: &Hook, _| usize::from(h.around() && !h.calls_block())),
        ),
        Rule::new(
            "hook_no_debugging",
            "{class} without a begin/rescue for debugging.",
            INFO,
            Predicate::Hook(|h: &Hook, _| {
                let has_body = !h.code.is_empty() || !h.comments.is_empty();
                usize::from(has_body && !h.has_exception_guard())
            }),
        ),
        Rule::new(
            "hook_all_comments",
            "{class} is only comments.",
            ERROR,
            Predicate::Hook(|h: &Hook, _| usize::from(h.code.is_empty() && !h.comments.is_empty())),
        ),
        Rule::new(
            "hook_conflicting_tags",
            "{class} has a tag and its negation.",
            ERROR,
            Predicate::Hook(|h: &Hook, _| usize::from(h.conflicting_tags())),
        ),
        Rule::new(
            "hook_duplicate_tags",
            "{class} has duplicate tags.",
            WARNING,
            Predicate::Hook(|h: &Hook, _| usize::from(h.duplicate_tags())),
        ),
        Rule::new(
            "hook_duplicate",
            "{class} is defined more than once.",
            WARNING,
            Predicate::Hook(|h: &Hook, peers: &[Hook]| {
                usize::from(peers.iter().filter(|p| p.same_definition(h)).count() > 1)
            }),
        ),
    ]
}

fn step_definition_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "step_definition_no_code",
            "{class} with no code.",
            ERROR,
            Predicate::StepDefinition(|sd: &StepDefinition| usize::from(sd.code.is_empty())),
        ),
        Rule::new(
            "step_definition_too_many_parameters",
            "{class} has too many parameters.",
            WARNING,
            Predicate::StepDefinition(|sd: &StepDefinition| {
                usize::from(sd.parameters.len() > MAX_PARAMETERS)
            }),
        ),
        Rule::new(
            "step_definition_lazy_debugging",
            "{class} prints with puts.",
            INFO,
            Predicate::StepDefinition(|sd: &StepDefinition| {
                sd.code
                    .iter()
                    .filter(|l| {
                        l.as_str() == "puts" || l.starts_with("puts ") || l.starts_with("puts(")
                    })
                    .count()
            }),
        ),
        Rule::new(
            "step_definition_pending",
            "{class} is pending.",
            WARNING,
            Predicate::StepDefinition(|sd: &StepDefinition| {
                usize::from(sd.code.iter().any(|l| {
                    l == "pending" || l.starts_with("pending ") || l.starts_with("pending(")
                }))
            }),
        ),
        Rule::new(
            "step_definition_todo",
            "{class} has a TODO.",
            INFO,
            Predicate::StepDefinition(|sd: &StepDefinition| {
                sd.code
                    .iter()
                    .chain(sd.comments.iter())
                    .filter(|l| l.contains("TODO"))
                    .count()
            }),
        ),
    ]
}

/// Every built-in rule, grouped by target kind.
pub fn default_rules() -> Vec<Rule> {
    let mut rules = feature_rules();
    rules.extend(scenario_rules());
    rules.extend(step_rules());
    rules.extend(hook_rules());
    rules.extend(step_definition_rules());
    rules
}
