//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "bddscore",
    version,
    about = "Score Cucumber suites for maintainability smells",
    long_about = "bddscore — reads feature files, hooks and step definitions, applies a weighted rule catalog and reports a score per element.\n\nConfiguration precedence: CLI > bddscore.toml > defaults.",
    after_help = "Examples:\n  bddscore score\n  bddscore score --feature 'features/billing/**/*.feature' --threshold 50\n  bddscore rules --output json",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(
        about = "Show version",
        long_about = "Print the current bddscore version."
    )]
    Version,
    /// Score a suite
    #[command(
        about = "Score features, hooks and step definitions",
        long_about = "Build a model of every matched file, apply the rule catalog and print per-element scores. Exits 1 when a feature scores over the threshold.",
        after_help = "Examples:\n  bddscore score --output json\n  bddscore score --repo-root ../app --threshold 100"
    )]
    Score {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, help = "Feature glob, repeatable (default: features/**/*.feature)")]
        feature: Vec<String>,
        #[arg(long, allow_negative_numbers = true, help = "Fail when a feature's total score exceeds this")]
        threshold: Option<i64>,
    },
    /// List the rule catalog
    #[command(
        about = "List rules",
        long_about = "Print every rule with its weight after config overrides are applied."
    )]
    Rules {
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}
