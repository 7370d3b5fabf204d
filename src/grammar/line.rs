//! Line-oriented Gherkin reader.
//!
//! Covers the subset the scorer needs: Feature, Background, Scenario,
//! Scenario Outline, Examples, steps with tables or doc strings, tags,
//! comments and free-text descriptions. Comments and tags are buffered and
//! attached to the next node that can own them.

use super::ast::{
    Comment, Element, ElementKind, Examples, FeatureAst, Row, Step, StepArgument, Tag,
};
use super::{GrammarAdapter, GrammarError};
use once_cell::sync::Lazy;
use regex::Regex;

static STEP_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Given|When|Then|And|But|\*)\s+(.*)$").unwrap());

const OUTLINE_KEYWORDS: &[&str] = &["Scenario Outline", "Scenario Template"];
const SCENARIO_KEYWORDS: &[&str] = &["Scenario", "Example"];
const EXAMPLES_KEYWORDS: &[&str] = &["Examples", "Scenarios"];

/// Built-in `GrammarAdapter`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineGrammar;

impl GrammarAdapter for LineGrammar {
    fn parse(&self, text: &str) -> Result<FeatureAst, GrammarError> {
        let mut parser = Parser::default();
        for (idx, raw) in text.lines().enumerate() {
            parser.line(idx + 1, raw)?;
        }
        parser.finish()
    }
}

struct OpenDocString {
    delimiter: &'static str,
    start_line: usize,
    content: Vec<String>,
}

#[derive(Default)]
struct Parser {
    feature: Option<FeatureAst>,
    current: Option<Element>,
    comments: Vec<Comment>,
    tags: Vec<Tag>,
    doc_string: Option<OpenDocString>,
}

/// Match `<keyword>:` for any of `keywords`, returning the keyword and the rest.
fn keyword_line<'a>(
    trimmed: &'a str,
    keywords: &[&'static str],
) -> Option<(&'static str, &'a str)> {
    keywords.iter().find_map(|kw| {
        trimmed
            .strip_prefix(kw)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|rest| (*kw, rest.trim()))
    })
}

fn split_cells(trimmed: &str) -> Vec<String> {
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|c| c.trim().to_string()).collect()
}

impl Parser {
    fn line(&mut self, n: usize, raw: &str) -> Result<(), GrammarError> {
        let trimmed = raw.trim();

        if let Some(doc) = self.doc_string.as_mut() {
            if trimmed == doc.delimiter {
                let doc = self.doc_string.take().map(|d| (d.start_line, d.content));
                if let Some((start_line, content)) = doc {
                    self.close_doc_string(start_line, content, n);
                }
            } else {
                doc.content.push(raw.to_string());
            }
            return Ok(());
        }

        if trimmed.is_empty() {
            return Ok(());
        }
        if trimmed.starts_with('#') {
            self.comments.push(Comment {
                text: trimmed.to_string(),
                line: n,
            });
            return Ok(());
        }
        if trimmed.starts_with('@') {
            return self.tag_line(n, trimmed);
        }

        if let Some((kw, name)) = keyword_line(trimmed, &["Feature"]) {
            return self.start_feature(n, kw, name);
        }
        if let Some((kw, name)) = keyword_line(trimmed, &["Background"]) {
            return self.start_element(n, ElementKind::Background, kw, name);
        }
        if let Some((kw, name)) = keyword_line(trimmed, OUTLINE_KEYWORDS) {
            return self.start_element(n, ElementKind::Outline, kw, name);
        }
        if let Some((kw, name)) = keyword_line(trimmed, SCENARIO_KEYWORDS) {
            return self.start_element(n, ElementKind::Scenario, kw, name);
        }
        if let Some((kw, name)) = keyword_line(trimmed, EXAMPLES_KEYWORDS) {
            return self.start_examples(n, kw, name);
        }
        if let Some(caps) = STEP_LINE.captures(trimmed) {
            return self.step(n, &caps[1], &caps[2]);
        }
        if trimmed.starts_with('|') {
            return self.row(n, trimmed);
        }
        if trimmed.starts_with("\"\"\"") || trimmed.starts_with("```") {
            let delimiter = if trimmed.starts_with("```") { "```" } else { "\"\"\"" };
            return self.open_doc_string(n, delimiter);
        }
        self.description(n, trimmed)
    }

    fn tag_line(&mut self, n: usize, trimmed: &str) -> Result<(), GrammarError> {
        for token in trimmed.split_whitespace() {
            if token.starts_with('#') {
                break;
            }
            if !token.starts_with('@') || token.len() == 1 {
                return Err(GrammarError::new(n, format!("invalid tag '{}'", token)));
            }
            self.tags.push(Tag {
                name: token.to_string(),
                line: n,
            });
        }
        Ok(())
    }

    fn start_feature(&mut self, n: usize, keyword: &str, name: &str) -> Result<(), GrammarError> {
        if self.feature.is_some() {
            return Err(GrammarError::new(n, "only one Feature is allowed per file"));
        }
        self.feature = Some(FeatureAst {
            keyword: keyword.to_string(),
            name: name.to_string(),
            description: Vec::new(),
            tags: std::mem::take(&mut self.tags),
            comments: std::mem::take(&mut self.comments),
            line: n,
            background: None,
            elements: Vec::new(),
        });
        Ok(())
    }

    fn start_element(
        &mut self,
        n: usize,
        kind: ElementKind,
        keyword: &str,
        name: &str,
    ) -> Result<(), GrammarError> {
        self.finish_element();
        let feature = self
            .feature
            .as_ref()
            .ok_or_else(|| GrammarError::new(n, format!("'{}' before Feature", keyword)))?;
        if kind == ElementKind::Background
            && (feature.background.is_some() || !feature.elements.is_empty())
        {
            return Err(GrammarError::new(
                n,
                "Background must be the first element of a Feature",
            ));
        }
        self.current = Some(Element {
            kind,
            keyword: keyword.to_string(),
            name: name.to_string(),
            description: Vec::new(),
            tags: std::mem::take(&mut self.tags),
            comments: std::mem::take(&mut self.comments),
            line: n,
            steps: Vec::new(),
            examples: Vec::new(),
        });
        Ok(())
    }

    fn start_examples(&mut self, n: usize, keyword: &str, name: &str) -> Result<(), GrammarError> {
        let tags = std::mem::take(&mut self.tags);
        let comments = std::mem::take(&mut self.comments);
        match self.current.as_mut() {
            Some(el) if el.kind == ElementKind::Outline => {
                el.examples.push(Examples {
                    keyword: keyword.to_string(),
                    name: name.to_string(),
                    description: Vec::new(),
                    tags,
                    comments,
                    line: n,
                    rows: Vec::new(),
                });
                Ok(())
            }
            _ => Err(GrammarError::new(
                n,
                format!("'{}' outside of a Scenario Outline", keyword),
            )),
        }
    }

    fn step(&mut self, n: usize, keyword: &str, text: &str) -> Result<(), GrammarError> {
        if !self.tags.is_empty() {
            return Err(GrammarError::new(n, "tags cannot be applied to a step"));
        }
        let comments = std::mem::take(&mut self.comments);
        match self.current.as_mut() {
            Some(el) if el.examples.is_empty() => {
                el.steps.push(Step {
                    keyword: keyword.to_string(),
                    text: text.to_string(),
                    line: n,
                    comments,
                    argument: None,
                });
                Ok(())
            }
            Some(_) => Err(GrammarError::new(n, "step after Examples")),
            None => Err(GrammarError::new(n, "step outside of a scenario")),
        }
    }

    fn row(&mut self, n: usize, trimmed: &str) -> Result<(), GrammarError> {
        if !trimmed.ends_with('|') || trimmed.len() < 2 {
            return Err(GrammarError::new(n, "table row must end with '|'"));
        }
        let row = Row {
            cells: split_cells(trimmed),
            line: n,
            comments: std::mem::take(&mut self.comments),
        };
        let Some(el) = self.current.as_mut() else {
            return Err(GrammarError::new(n, "table outside of a scenario"));
        };
        if let Some(examples) = el.examples.last_mut() {
            examples.rows.push(row);
            return Ok(());
        }
        let Some(step) = el.steps.last_mut() else {
            return Err(GrammarError::new(n, "table without a step"));
        };
        match step.argument.as_mut() {
            None => {
                step.argument = Some(StepArgument::Table(vec![row]));
                Ok(())
            }
            Some(StepArgument::Table(rows)) => {
                rows.push(row);
                Ok(())
            }
            Some(StepArgument::DocString { .. }) => Err(GrammarError::new(
                n,
                "step already has a doc string argument",
            )),
        }
    }

    fn open_doc_string(&mut self, n: usize, delimiter: &'static str) -> Result<(), GrammarError> {
        let ok = self
            .current
            .as_ref()
            .and_then(|el| el.steps.last().filter(|_| el.examples.is_empty()))
            .is_some_and(|step| step.argument.is_none());
        if !ok {
            return Err(GrammarError::new(n, "doc string without a step"));
        }
        self.doc_string = Some(OpenDocString {
            delimiter,
            start_line: n,
            content: Vec::new(),
        });
        Ok(())
    }

    fn close_doc_string(&mut self, start_line: usize, content: Vec<String>, end_line: usize) {
        if let Some(step) = self.current.as_mut().and_then(|el| el.steps.last_mut()) {
            step.argument = Some(StepArgument::DocString {
                content,
                start_line,
                end_line,
            });
        }
    }

    fn description(&mut self, n: usize, trimmed: &str) -> Result<(), GrammarError> {
        if !self.tags.is_empty() {
            return Err(GrammarError::new(n, "tags must be followed by an element"));
        }
        let text = trimmed.to_string();
        match (self.current.as_mut(), self.feature.as_mut()) {
            (Some(el), _) if el.steps.is_empty() && el.examples.is_empty() => {
                el.description.push(text);
                Ok(())
            }
            (Some(el), _) => match el.examples.last_mut() {
                Some(ex) if ex.rows.is_empty() => {
                    ex.description.push(text);
                    Ok(())
                }
                _ => Err(GrammarError::new(n, format!("unexpected line '{}'", trimmed))),
            },
            (None, Some(feature))
                if feature.background.is_none() && feature.elements.is_empty() =>
            {
                feature.description.push(text);
                Ok(())
            }
            _ => Err(GrammarError::new(n, format!("unexpected line '{}'", trimmed))),
        }
    }

    fn finish_element(&mut self) {
        if let Some(el) = self.current.take() {
            if let Some(feature) = self.feature.as_mut() {
                if el.kind == ElementKind::Background {
                    feature.background = Some(el);
                } else {
                    feature.elements.push(el);
                }
            }
        }
    }

    fn finish(mut self) -> Result<FeatureAst, GrammarError> {
        if let Some(doc) = self.doc_string.as_ref() {
            return Err(GrammarError::new(doc.start_line, "unterminated doc string"));
        }
        if let Some(tag) = self.tags.first() {
            return Err(GrammarError::new(tag.line, "tags must be followed by an element"));
        }
        self.finish_element();
        self.feature
            .ok_or_else(|| GrammarError::new(1, "no Feature keyword found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<FeatureAst, GrammarError> {
        LineGrammar.parse(text)
    }

    #[test]
    fn test_parse_feature_with_background_and_outline() {
        let text = "\
# file comment
@smoke
Feature: Login
  As a user

  Background:
    Given a browser

  # leading
  @fast @ui
  Scenario Outline: sign in
    Given I open <page>
    # about the table
    When I submit:
      | user | pass |
      | bob  | 123  |
    Then I see it
    Examples:
      | page |
      | home |
    Examples: more
      | page |
      # extra
      | away |
";
        let ast = parse(text).unwrap();
        assert_eq!(ast.name, "Login");
        assert_eq!(ast.line, 3);
        assert_eq!(ast.description, vec!["As a user"]);
        assert_eq!(ast.tags[0].name, "@smoke");
        assert_eq!(ast.comments[0].line, 1);

        let bg = ast.background.as_ref().unwrap();
        assert_eq!(bg.kind, ElementKind::Background);
        assert_eq!(bg.steps[0].line, 7);

        let outline = &ast.elements[0];
        assert_eq!(outline.kind, ElementKind::Outline);
        assert_eq!(outline.keyword, "Scenario Outline");
        assert_eq!(outline.comments[0].line, 9);
        assert_eq!(outline.tags.len(), 2);
        assert_eq!(outline.tags[0].line, 10);
        assert_eq!(outline.steps.len(), 3);
        assert_eq!(outline.steps[1].comments[0].text, "# about the table");
        assert_eq!(outline.steps[1].last_line(), 16);
        assert_eq!(outline.examples.len(), 2);
        assert_eq!(outline.examples[1].rows[1].comments[0].line, 23);
        assert_eq!(outline.examples[1].rows[1].line, 24);
        assert_eq!(outline.examples[1].rows[1].cells, vec!["away"]);
    }

    #[test]
    fn test_doc_string_end_line() {
        let text =
            "Feature: f\n  Scenario: s\n    Given text:\n      \"\"\"\n      hello\n      \"\"\"\n";
        let ast = parse(text).unwrap();
        let step = &ast.elements[0].steps[0];
        match step.argument.as_ref().unwrap() {
            StepArgument::DocString {
                content,
                start_line,
                end_line,
            } => {
                assert_eq!(content, &vec!["      hello".to_string()]);
                assert_eq!(*start_line, 4);
                assert_eq!(*end_line, 6);
            }
            other => panic!("unexpected argument {:?}", other),
        }
        assert_eq!(step.last_line(), 6);
    }

    #[test]
    fn test_errors_carry_line() {
        let err = parse("Feature: f\n  Scenario: s\n    Given a\n    garbage here\n").unwrap_err();
        assert_eq!(err.line, 4);

        let err = parse("Scenario: no feature\n").unwrap_err();
        assert_eq!(err.line, 1);

        let err = parse("Feature: f\n  Scenario: s\n    Given a\n    \"\"\"\n").unwrap_err();
        assert_eq!(err.message, "unterminated doc string");

        let err = parse("# only a comment\n").unwrap_err();
        assert_eq!(err.message, "no Feature keyword found");
    }

    #[test]
    fn test_examples_require_outline() {
        let err = parse("Feature: f\n  Scenario: s\n    Given a\n    Examples:\n").unwrap_err();
        assert_eq!(err.line, 4);
    }

    #[test]
    fn test_description_and_asterisk_step() {
        let ast =
            parse("Feature: f\n  Scenario: s\n    some words\n    more words\n    * do it\n")
                .unwrap();
        let el = &ast.elements[0];
        assert_eq!(el.description, vec!["some words", "more words"]);
        assert_eq!(el.steps[0].keyword, "*");
        assert_eq!(el.steps[0].text, "do it");
    }
}
