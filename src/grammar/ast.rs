//! Normalized syntax tree handed out by a `GrammarAdapter`.
//!
//! Every node carries the 1-indexed source line it was declared on, and every
//! node that may be preceded by comments keeps those comments with their own
//! lines. That is all the model builder needs to recover verbatim spans.

/// A `#` comment line, trimmed of leading indentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub line: usize,
}

/// A single `@tag` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Background,
    Scenario,
    Outline,
}

/// One table row (step argument or examples row).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<String>,
    pub line: usize,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArgument {
    Table(Vec<Row>),
    DocString {
        content: Vec<String>,
        start_line: usize,
        /// Line of the closing delimiter.
        end_line: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub keyword: String,
    pub text: String,
    pub line: usize,
    pub comments: Vec<Comment>,
    pub argument: Option<StepArgument>,
}

impl Step {
    /// Last source line covered by the step, including its argument block.
    pub fn last_line(&self) -> usize {
        match &self.argument {
            Some(StepArgument::Table(rows)) => rows.last().map_or(self.line, |r| r.line),
            Some(StepArgument::DocString { end_line, .. }) => *end_line,
            None => self.line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Examples {
    pub keyword: String,
    pub name: String,
    pub description: Vec<String>,
    pub tags: Vec<Tag>,
    pub comments: Vec<Comment>,
    pub line: usize,
    pub rows: Vec<Row>,
}

/// Background, Scenario or Scenario Outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: ElementKind,
    pub keyword: String,
    pub name: String,
    pub description: Vec<String>,
    pub tags: Vec<Tag>,
    pub comments: Vec<Comment>,
    pub line: usize,
    pub steps: Vec<Step>,
    pub examples: Vec<Examples>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureAst {
    pub keyword: String,
    pub name: String,
    pub description: Vec<String>,
    pub tags: Vec<Tag>,
    pub comments: Vec<Comment>,
    pub line: usize,
    pub background: Option<Element>,
    pub elements: Vec<Element>,
}

impl FeatureAst {
    /// Background first (when present), then tests in source order.
    pub fn all_elements(&self) -> impl Iterator<Item = &Element> {
        self.background.iter().chain(self.elements.iter())
    }
}
