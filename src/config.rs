//! Configuration discovery and effective settings resolution.
//!
//! bddscore reads `bddscore.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config.
//! Defaults:
//! - `features`: `["features/**/*.feature"]`
//! - `support`: `["features/**/*.rb"]`
//! - `output`: `human`
//! - `threshold`: none
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILES: [&str; 3] = ["bddscore.toml", "bddscore.yaml", "bddscore.yml"];
const DEFAULT_FEATURES: &str = "features/**/*.feature";
const DEFAULT_SUPPORT: &str = "features/**/*.rb";

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
/// Per-rule adjustment under `[rules.<id>]`.
pub struct RuleOverride {
    pub score: Option<i64>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `bddscore.toml|yaml`.
pub struct BddConfig {
    pub features: Option<Vec<String>>,
    pub support: Option<Vec<String>>,
    pub output: Option<String>,
    pub threshold: Option<i64>,
    #[serde(default)]
    pub rules: HashMap<String, RuleOverride>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub features: Vec<String>,
    pub support: Vec<String>,
    pub output: String,
    pub threshold: Option<i64>,
    pub rule_overrides: HashMap<String, RuleOverride>,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `bddscore.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|name| cur.join(name).exists()) {
            return cur.to_path_buf();
        }
        if cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `BddConfig` from `bddscore.toml` or `bddscore.yaml|yml` if present.
///
/// A config file that exists but cannot be read or parsed is an error.
pub fn load_config(root: &Path) -> Result<Option<BddConfig>> {
    for name in CONFIG_FILES {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }
        let s = fs::read_to_string(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        let parsed = if name.ends_with(".toml") {
            toml::from_str::<BddConfig>(&s).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str::<BddConfig>(&s).map_err(|e| e.to_string())
        };
        return parsed
            .map(Some)
            .map_err(|message| Error::Config { path, message });
    }
    Ok(None)
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(
    cli_repo_root: Option<&str>,
    cli_output: Option<&str>,
    cli_features: &[String],
    cli_threshold: Option<i64>,
) -> Result<Effective> {
    let start = PathBuf::from(cli_repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root)?.unwrap_or_default();
    tracing::debug!(root = %repo_root.display(), "resolved repository root");

    let features = if cli_features.is_empty() {
        cfg.features
            .unwrap_or_else(|| vec![DEFAULT_FEATURES.to_string()])
    } else {
        cli_features.to_vec()
    };
    let support = cfg
        .support
        .unwrap_or_else(|| vec![DEFAULT_SUPPORT.to_string()]);

    let output = cli_output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    Ok(Effective {
        repo_root,
        features,
        support,
        output,
        threshold: cli_threshold.or(cfg.threshold),
        rule_overrides: cfg.rules,
    })
}
