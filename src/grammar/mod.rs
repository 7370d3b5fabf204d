//! Grammar adapter seam.
//!
//! The model builder never tokenizes Gherkin itself. It asks a
//! `GrammarAdapter` for a `FeatureAst` and reconciles that tree with the raw
//! text. `LineGrammar` is the built-in adapter; any other parser able to
//! report lines for tags, comments, steps and table rows can be plugged in.

pub mod ast;
mod line;

pub use ast::{
    Comment, Element, ElementKind, Examples, FeatureAst, Row, Step, StepArgument, Tag,
};
pub use line::LineGrammar;

/// Distinguishable parse failure reported by an adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct GrammarError {
    pub line: usize,
    pub message: String,
}

impl GrammarError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Turns raw feature text into a `FeatureAst`.
pub trait GrammarAdapter: Sync {
    fn parse(&self, text: &str) -> Result<FeatureAst, GrammarError>;
}
