//! Feature files and their element spans.
//!
//! The grammar adapter's tree tells us where each Background, Scenario and
//! Outline starts and ends; the verbatim lines in between are then handed to
//! `Scenario::parse` so that comments, spacing and table layout come from the
//! file itself rather than from the normalized tree.

use crate::error::{Error, Result};
use crate::grammar::{Element, GrammarAdapter};
use crate::models::scenario::{full_name, Scenario, ScenarioKind};
use crate::models::target::{RuleTarget, TargetInfo, TargetKind};
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Feature {
    #[serde(flatten)]
    pub info: TargetInfo,
    pub background: Option<Scenario>,
    pub scenarios: Vec<Scenario>,
    /// Comment lines attached before the `Feature:` keyword.
    pub comments: Vec<String>,
    #[serde(skip)]
    pub feature_lines: Vec<String>,
}

/// Inclusive, 1-indexed line range of one element in its feature file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// First line: the earliest of leading comments, tags and the keyword.
    /// Last line: last examples row, else end of the last step (including
    /// its table or doc string), else the description, else the keyword.
    pub fn of(element: &Element) -> Self {
        let start = element
            .comments
            .iter()
            .map(|c| c.line)
            .chain(element.tags.iter().map(|t| t.line))
            .chain(std::iter::once(element.line))
            .min()
            .unwrap_or(element.line);
        let end = if let Some(examples) = element.examples.last() {
            examples.rows.last().map_or(examples.line, |row| row.line)
        } else if let Some(step) = element.steps.last() {
            step.last_line()
        } else if !element.description.is_empty() {
            element.line + element.description.len()
        } else {
            element.line
        };
        Span { start, end }
    }
}

impl Feature {
    /// Read and build a feature file. `display` is the path used in locations.
    pub fn from_file(path: &Path, display: &str, adapter: &dyn GrammarAdapter) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(display, &source, adapter)
    }

    /// Build a feature from its raw text.
    ///
    /// An all-blank source yields an empty feature. A file-level grammar
    /// failure is returned as `Error::FeatureSyntax`; failures confined to one
    /// element only mark that scenario.
    pub fn from_source(path: &str, source: &str, adapter: &dyn GrammarAdapter) -> Result<Self> {
        let mut feature = Feature {
            info: TargetInfo::new(path),
            feature_lines: source.lines().map(str::to_string).collect(),
            ..Feature::default()
        };
        if feature.feature_lines.iter().all(|l| l.trim().is_empty()) {
            return Ok(feature);
        }

        let ast = adapter.parse(source).map_err(|err| Error::FeatureSyntax {
            path: path.to_string(),
            line: err.line,
            message: err.message,
        })?;
        feature.info.location = format!("{}:{}", path, ast.line);
        feature.info.name = full_name(&ast.name, &ast.description);
        feature.info.tags = ast.tags.iter().map(|t| t.name.clone()).collect();
        feature.comments = ast.comments.iter().map(|c| c.text.clone()).collect();

        for element in ast.all_elements() {
            let span = Span::of(element);
            let block = feature.block(span);
            let mut scenario =
                Scenario::parse(format!("{}:{}", path, element.line), block, adapter);
            if scenario.syntax_error {
                scenario.adopt(element);
            }
            match scenario.kind {
                ScenarioKind::Background => feature.background = Some(scenario),
                _ => feature.scenarios.push(scenario),
            }
        }
        tracing::debug!(
            location = %feature.info.location,
            scenarios = feature.scenarios.len(),
            background = feature.background.is_some(),
            "built feature"
        );
        Ok(feature)
    }

    fn block(&self, span: Span) -> &[String] {
        let len = self.feature_lines.len();
        let start = span.start.saturating_sub(1).min(len);
        let end = span.end.min(len).max(start);
        &self.feature_lines[start..end]
    }

    /// Background (if any) followed by the scenarios.
    pub fn elements(&self) -> impl Iterator<Item = &Scenario> {
        self.background.iter().chain(self.scenarios.iter())
    }
}

impl RuleTarget for Feature {
    fn kind(&self) -> TargetKind {
        TargetKind::Feature
    }

    fn info(&self) -> &TargetInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{FeatureAst, GrammarError, LineGrammar};

    const SOURCE: &str = "\
# owner: qa
@billing
Feature: Invoices
  Invoices are emailed monthly

  Background:
    Given a customer

  # flaky on CI
  @slow
  Scenario: Send invoice
    When the month ends
    Then an email is sent

  Scenario Outline: Totals
    Given <n> items
    Then total is <t>
    Examples:
      | n | t  |
      | 1 | 10 |
    Examples:
      | n | t  |
      | 2 | 20 |

  Scenario: Described only
    Some prose here
    and more prose
";

    #[test]
    fn test_builds_tree_with_spans() {
        let f = Feature::from_source("billing.feature", SOURCE, &LineGrammar).unwrap();
        assert_eq!(f.info.location, "billing.feature:3");
        assert_eq!(f.info.name, "Invoices Invoices are emailed monthly");
        assert_eq!(f.info.tags, vec!["@billing"]);
        assert_eq!(f.comments, vec!["# owner: qa"]);

        let bg = f.background.as_ref().unwrap();
        assert_eq!(bg.info.location, "billing.feature:6");
        assert_eq!(bg.steps, vec!["    Given a customer"]);

        assert_eq!(f.scenarios.len(), 3);
        let send = &f.scenarios[0];
        assert_eq!(send.info.location, "billing.feature:11");
        assert_eq!(send.start_line, 11);
        assert_eq!(send.comments, vec!["# flaky on CI"]);
        assert_eq!(send.info.tags, vec!["@slow"]);
        assert_eq!(send.lines.first().map(String::as_str), Some("  # flaky on CI"));
        assert_eq!(send.steps.len(), 2);

        let outline = &f.scenarios[1];
        assert!(outline.is_outline());
        assert_eq!(outline.examples_table().len(), 3);
        assert_eq!(outline.lines.last().map(String::as_str), Some("      | 2 | 20 |"));

        let described = &f.scenarios[2];
        assert_eq!(described.info.name, "Described only Some prose here and more prose");
        assert_eq!(described.lines.len(), 3);
        assert!(described.steps.is_empty());
    }

    #[test]
    fn test_span_prefers_earliest_line() {
        let ast = LineGrammar.parse(SOURCE).unwrap();
        let send = &ast.elements[0];
        assert_eq!(Span::of(send), Span { start: 9, end: 13 });
        let outline = &ast.elements[1];
        assert_eq!(Span::of(outline), Span { start: 15, end: 23 });
        let described = &ast.elements[2];
        assert_eq!(Span::of(described), Span { start: 25, end: 27 });
    }

    #[test]
    fn test_span_ends_at_doc_string_close() {
        let src =
            "Feature: f\n  Scenario: s\n    Given text:\n      \"\"\"\n      x\n      \"\"\"\n";
        let ast = LineGrammar.parse(src).unwrap();
        assert_eq!(Span::of(&ast.elements[0]), Span { start: 2, end: 6 });
    }

    #[test]
    fn test_empty_source_yields_empty_feature() {
        let f = Feature::from_source("empty.feature", "\n  \n", &LineGrammar).unwrap();
        assert!(f.scenarios.is_empty());
        assert!(f.background.is_none());
        assert_eq!(f.info.location, "empty.feature");
    }

    #[test]
    fn test_feature_level_failure_propagates() {
        let err = Feature::from_source("bad.feature", "Feature: x\n  Given a\n", &LineGrammar)
            .unwrap_err();
        match err {
            Error::FeatureSyntax { path, line, .. } => {
                assert_eq!(path, "bad.feature");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    /// Adapter that accepts whole files but rejects isolated blocks.
    struct RejectIsolated;

    impl GrammarAdapter for RejectIsolated {
        fn parse(&self, text: &str) -> std::result::Result<FeatureAst, GrammarError> {
            if text.starts_with("Feature: isolated") {
                return Err(GrammarError::new(2, "rejected"));
            }
            LineGrammar.parse(text)
        }
    }

    #[test]
    fn test_element_failure_keeps_name_tags_and_kind() {
        let f = Feature::from_source("billing.feature", SOURCE, &RejectIsolated).unwrap();
        let bg = f.background.as_ref().unwrap();
        assert!(bg.syntax_error);
        let send = &f.scenarios[0];
        assert!(send.syntax_error);
        assert_eq!(send.info.name, "Send invoice");
        assert_eq!(send.info.tags, vec!["@slow"]);
        assert!(send.steps.is_empty());
        assert!(f.scenarios[1].is_outline());
        assert!(f.scenarios[1].examples_table().is_empty());
    }
}
