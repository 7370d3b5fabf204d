//! bddscore CLI binary entry point.
//! Resolves configuration, runs the scan and prints results.

use bddscore::cli::{Cli, Commands};
use bddscore::config::{self, Effective};
use bddscore::grammar::LineGrammar;
use bddscore::rules::{apply_overrides, default_rules, Rule};
use bddscore::{output, scan};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("BDDSCORE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn settings(
    repo_root: Option<&str>,
    output: Option<&str>,
    features: &[String],
    threshold: Option<i64>,
) -> Effective {
    match config::resolve_effective(repo_root, output, features, threshold) {
        Ok(eff) => eff,
        Err(err) => {
            eprintln!("{} {}", output::error_prefix(output.unwrap_or("human")), err);
            std::process::exit(2);
        }
    }
}

fn rules_for(eff: &Effective) -> Vec<Rule> {
    let mut rules = default_rules();
    apply_overrides(&mut rules, &eff.rule_overrides);
    rules
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Score {
            repo_root,
            output,
            feature,
            threshold,
        } => {
            let eff = settings(repo_root.as_deref(), output.as_deref(), &feature, threshold);
            let rules = rules_for(&eff);
            let result = match scan::run_scan(&eff, &rules, &LineGrammar) {
                Ok(r) => r,
                Err(err) => {
                    eprintln!("{} {}", output::error_prefix(&eff.output), err);
                    std::process::exit(2);
                }
            };
            output::print_scan(&result, &eff.output);
            if result.summary.over_threshold > 0 {
                std::process::exit(1);
            }
        }
        Commands::Rules { repo_root, output } => {
            let eff = settings(repo_root.as_deref(), output.as_deref(), &[], None);
            output::print_rules(&rules_for(&eff), &eff.output);
        }
    }
}
