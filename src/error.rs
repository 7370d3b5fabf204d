//! Error type shared by the model builders, the scan runner and config loading.
//!
//! Scenario-level grammar failures never surface here: they are absorbed into
//! `Scenario::syntax_error`. Everything else propagates to the caller.

use std::path::PathBuf;

/// Errors raised while building or scoring a suite.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    FeatureSyntax {
        path: String,
        line: usize,
        message: String,
    },

    #[error("{location}: invalid hook: {message}")]
    HookSyntax { location: String, message: String },

    #[error("{location}: invalid step definition: {message}")]
    StepDefinitionSyntax { location: String, message: String },

    #[error("invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("bad glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_syntax_display_carries_location() {
        let err = Error::FeatureSyntax {
            path: "features/login.feature".into(),
            line: 7,
            message: "unexpected line".into(),
        };
        assert_eq!(err.to_string(), "features/login.feature:7: unexpected line");
    }

    #[test]
    fn test_hook_syntax_display() {
        let err = Error::HookSyntax {
            location: "hooks.rb:3".into(),
            message: "missing `do`".into(),
        };
        assert_eq!(err.to_string(), "hooks.rb:3: invalid hook: missing `do`");
    }
}
