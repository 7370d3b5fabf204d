//! Scenario, Scenario Outline and Background built from a verbatim block.
//!
//! The block is re-parsed on its own rather than read off the parent tree:
//! it is prefixed with a synthetic `Feature:` line and handed to the same
//! grammar adapter, so every step and example row offset is relative to the
//! block itself. Literal lines are then copied out of the block so the
//! original indentation and spacing survive.

use crate::grammar::{Element, ElementKind, GrammarAdapter, StepArgument};
use crate::models::target::{RuleTarget, TargetInfo, TargetKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

static STEP_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(#\s*)?(Given|When|Then|And|But|\*)\s").unwrap());
static EXAMPLE_ROW_GRAMMAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(#\s*)?\|.*\|\s*$").unwrap());

/// Header prepended to a block before it is re-parsed in isolation.
const SYNTHETIC_HEADER: &str = "Feature: isolated element";

/// Maps a line reported by the isolated parse back onto the block: one for
/// the synthetic header, one for 1-indexing.
const LITERAL_LINE_OFFSET: usize = 2;

/// True for step lines, including commented-out ones (`# Given ...`).
pub fn is_step_line(line: &str) -> bool {
    STEP_GRAMMAR.is_match(line)
}

/// True for `|...|` rows, including commented-out ones.
pub fn is_example_row(line: &str) -> bool {
    EXAMPLE_ROW_GRAMMAR.is_match(line)
}

/// Drop every entry that is not a step line.
pub fn retain_step_lines(steps: &mut Vec<String>) {
    steps.retain(|s| is_step_line(s));
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ScenarioKind {
    Background,
    Scenario,
    Outline {
        /// Example rows; the header row of the first block only.
        examples: Vec<String>,
    },
}

impl ScenarioKind {
    fn from_element(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Background => ScenarioKind::Background,
            ElementKind::Scenario => ScenarioKind::Scenario,
            ElementKind::Outline => ScenarioKind::Outline {
                examples: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scenario {
    #[serde(flatten)]
    pub info: TargetInfo,
    pub kind: ScenarioKind,
    pub start_line: usize,
    pub comments: Vec<String>,
    /// Literal step lines, each preceded by its leading comments that look
    /// like steps themselves.
    pub steps: Vec<String>,
    /// Step literal line -> rendered `|a|b|` rows of its table.
    pub inline_tables: BTreeMap<String, Vec<String>>,
    pub syntax_error: bool,
    /// The verbatim block this scenario was built from.
    #[serde(skip)]
    pub lines: Vec<String>,
}

impl Scenario {
    /// Build a scenario from `block`, the verbatim lines of one element.
    ///
    /// `location` is `path:line` of the element keyword. A grammar failure of
    /// the isolated block is absorbed: the result has `syntax_error` set and
    /// no steps or examples.
    pub fn parse(
        location: impl Into<String>,
        block: &[String],
        adapter: &dyn GrammarAdapter,
    ) -> Self {
        let info = TargetInfo::new(location);
        let start_line = info
            .location
            .rsplit_once(':')
            .and_then(|(_, line)| line.parse().ok())
            .unwrap_or(0);
        let lines: Vec<String> = block
            .iter()
            .map(|l| l.trim_end_matches(['\r', '\n']).to_string())
            .collect();
        let mut scenario = Scenario {
            info,
            kind: ScenarioKind::Scenario,
            start_line,
            comments: Vec::new(),
            steps: Vec::new(),
            inline_tables: BTreeMap::new(),
            syntax_error: false,
            lines,
        };

        let mut text = String::from(SYNTHETIC_HEADER);
        for line in &scenario.lines {
            text.push('\n');
            text.push_str(line);
        }
        match adapter.parse(&text) {
            Ok(ast) => match ast.all_elements().next() {
                Some(element) => scenario.fill(element),
                None => scenario.syntax_error = true,
            },
            Err(err) => {
                tracing::debug!(
                    location = %scenario.info.location,
                    error = %err,
                    "element does not parse in isolation"
                );
                scenario.syntax_error = true;
            }
        }
        scenario
    }

    fn literal(&self, line: usize) -> Option<&String> {
        line.checked_sub(LITERAL_LINE_OFFSET)
            .and_then(|idx| self.lines.get(idx))
    }

    fn fill(&mut self, element: &Element) {
        self.kind = ScenarioKind::from_element(element.kind);
        self.comments = element.comments.iter().map(|c| c.text.clone()).collect();
        if element.kind != ElementKind::Background {
            self.info.tags = element.tags.iter().map(|t| t.name.clone()).collect();
        }
        self.info.name = full_name(&element.name, &element.description);

        let mut steps = Vec::new();
        let mut tables = BTreeMap::new();
        for step in &element.steps {
            steps.extend(step.comments.iter().map(|c| c.text.clone()));
            let Some(literal) = self.literal(step.line).cloned() else {
                continue;
            };
            if let Some(StepArgument::Table(rows)) = &step.argument {
                let rendered = rows
                    .iter()
                    .map(|row| format!("|{}|", row.cells.join("|")))
                    .collect();
                tables.insert(literal.clone(), rendered);
            }
            steps.push(literal);
        }
        retain_step_lines(&mut steps);
        self.steps = steps;
        self.inline_tables = tables;

        if element.kind == ElementKind::Outline {
            let mut rows = Vec::new();
            for (block_idx, examples) in element.examples.iter().enumerate() {
                for (row_idx, row) in examples.rows.iter().enumerate() {
                    if row_idx == 0 && block_idx != 0 {
                        continue;
                    }
                    rows.extend(row.comments.iter().map(|c| c.text.clone()));
                    if let Some(literal) = self.literal(row.line) {
                        rows.push(literal.clone());
                    }
                }
            }
            rows.retain(|r| is_example_row(r));
            self.kind = ScenarioKind::Outline { examples: rows };
        }
    }

    /// Keep name, tags and kind from the enclosing feature's tree when the
    /// isolated block could not be read.
    pub(crate) fn adopt(&mut self, element: &Element) {
        self.kind = ScenarioKind::from_element(element.kind);
        self.info.name = full_name(&element.name, &element.description);
        if element.kind != ElementKind::Background {
            self.info.tags = element.tags.iter().map(|t| t.name.clone()).collect();
        }
    }

    pub fn examples_table(&self) -> &[String] {
        match &self.kind {
            ScenarioKind::Outline { examples } => examples,
            _ => &[],
        }
    }

    pub fn is_background(&self) -> bool {
        matches!(self.kind, ScenarioKind::Background)
    }

    pub fn is_outline(&self) -> bool {
        matches!(self.kind, ScenarioKind::Outline { .. })
    }

    /// Keywords of the live (uncommented) steps, in order.
    pub fn step_order(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| !s.trim_start().starts_with('#'))
            .filter_map(|s| STEP_GRAMMAR.captures(s))
            .filter_map(|caps| caps.get(2).map(|m| m.as_str()))
            .collect()
    }
}

pub(crate) fn full_name(name: &str, description: &[String]) -> String {
    if description.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", name, description.join(" "))
    }
}

impl RuleTarget for Scenario {
    fn kind(&self) -> TargetKind {
        TargetKind::Scenario
    }

    fn info(&self) -> &TargetInfo {
        &self.info
    }

    fn class_name(&self) -> &'static str {
        match self.kind {
            ScenarioKind::Background => "Background",
            ScenarioKind::Scenario => "Scenario",
            ScenarioKind::Outline { .. } => "Scenario Outline",
        }
    }
}
