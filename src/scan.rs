//! Scan runner: discovers feature and support files and scores them.
//!
//! Feature files are independent of each other and are built, scored and
//! aggregated in parallel. Hooks need the whole suite as peers, so support
//! files are read first and scored together afterwards.

use crate::config::Effective;
use crate::error::{Error, Result};
use crate::grammar::GrammarAdapter;
use crate::models::ruby::{extract_blocks, BlockKind};
use crate::models::{
    Feature, FeatureScore, FileError, Hook, ScanResult, StepDefinition, Summary,
};
use crate::rules::Rule;
use crate::score::{score_feature, score_hooks, score_step_definitions};
use glob::glob;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Expand `patterns` relative to `root`; sorted and de-duplicated.
pub fn collect_files(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pat in patterns {
        let pattern = root.join(pat).to_string_lossy().to_string();
        for entry in glob(&pattern)? {
            match entry {
                Ok(p) if p.is_file() => files.push(p),
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "unreadable path skipped"),
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn display_path(root: &Path, path: &Path) -> String {
    pathdiff::diff_paths(path, root)
        .unwrap_or_else(|| path.to_path_buf())
        .to_string_lossy()
        .to_string()
}

fn file_error(file: String, err: &Error) -> FileError {
    tracing::warn!(file = %file, error = %err, "file skipped");
    FileError {
        file,
        message: err.to_string(),
    }
}

#[derive(Default)]
struct Support {
    hooks: Vec<Hook>,
    step_definitions: Vec<StepDefinition>,
    errors: Vec<FileError>,
}

fn read_support(root: &Path, files: &[PathBuf]) -> Support {
    let mut support = Support::default();
    for path in files {
        let rel = display_path(root, path);
        let source = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(source) => {
                let err = Error::Io {
                    path: path.clone(),
                    source,
                };
                support.errors.push(file_error(rel, &err));
                continue;
            }
        };
        for block in extract_blocks(&source) {
            let location = format!("{}:{}", rel, block.line);
            let parsed = match block.kind {
                BlockKind::Hook => {
                    Hook::parse(location, &block.lines).map(|h| support.hooks.push(h))
                }
                BlockKind::StepDefinition => StepDefinition::parse(location, &block.lines)
                    .map(|sd| support.step_definitions.push(sd)),
            };
            if let Err(err) = parsed {
                support.errors.push(file_error(rel.clone(), &err));
            }
        }
        tracing::debug!(file = %rel, "read support file");
    }
    support
}

/// Score every feature and support file the settings select.
pub fn run_scan(
    settings: &Effective,
    rules: &[Rule],
    adapter: &dyn GrammarAdapter,
) -> Result<ScanResult> {
    let root = &settings.repo_root;
    let feature_files = collect_files(root, &settings.features)?;
    let support_files = collect_files(root, &settings.support)?;

    let per_file: Vec<std::result::Result<FeatureScore, FileError>> = feature_files
        .par_iter()
        .map(|path| {
            let rel = display_path(root, path);
            match Feature::from_file(path, &rel, adapter) {
                Ok(feature) => {
                    tracing::debug!(file = %rel, "scoring feature");
                    Ok(score_feature(rules, &feature).to_feature_score())
                }
                Err(err) => Err(file_error(rel, &err)),
            }
        })
        .collect();

    let mut features = Vec::new();
    let mut errors = Vec::new();
    for outcome in per_file {
        match outcome {
            Ok(score) => features.push(score),
            Err(err) => errors.push(err),
        }
    }

    let support = read_support(root, &support_files);
    errors.extend(support.errors);
    let hooks: Vec<_> = score_hooks(rules, &support.hooks)
        .iter()
        .map(|s| s.to_target_score())
        .collect();
    let step_definitions: Vec<_> = score_step_definitions(rules, &support.step_definitions)
        .iter()
        .map(|s| s.to_target_score())
        .collect();

    let over_threshold = settings.threshold.map_or(0, |limit| {
        features.iter().filter(|f| f.total_score > limit).count()
    });
    let summary = Summary {
        files: feature_files.len() + support_files.len(),
        features: features.len(),
        scenarios: features.iter().map(|f| f.scenarios.len()).sum(),
        hooks: hooks.len(),
        step_definitions: step_definitions.len(),
        errors: errors.len(),
        total_score: features.iter().map(|f| f.total_score).sum::<i64>()
            + hooks.iter().map(|h| h.score).sum::<i64>()
            + step_definitions.iter().map(|s| s.score).sum::<i64>(),
        threshold: settings.threshold,
        over_threshold,
    };
    Ok(ScanResult {
        features,
        hooks,
        step_definitions,
        errors,
        summary,
    })
}
