//! Configuration file loading for linkmend.
//!
//! Discovers and loads `linkmend.toml` from the repository root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use linkmend_core::settings::DEFAULT_COMMIT_MESSAGE;
use linkmend_domain::{ExtractOptions, ModelKinds};
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "linkmend.toml";

/// Top-level configuration from linkmend.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkmendConfig {
    /// What counts as a model and where its links live.
    pub models: ModelsConfig,

    /// Run behaviour.
    pub run: RunConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelsConfig {
    /// File extensions recognized as models, without the dot.
    pub extensions: Vec<String>,

    /// Elements whose text content is a link.
    pub link_elements: Vec<String>,

    /// Prefixes stripped from links before resolution.
    pub stale_prefixes: Vec<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        let extract = ExtractOptions::default();
        Self {
            extensions: ModelKinds::DEFAULT_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            link_elements: extract.link_elements,
            stale_prefixes: extract.stale_prefixes,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Glob patterns excluded from model enumeration.
    pub ignore: Vec<String>,

    /// Skip models with uncommitted changes.
    pub skip_dirty: bool,

    /// Commit fixed models at the end of a `--fix` run.
    pub commit: bool,

    pub commit_message: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            ignore: Vec::new(),
            skip_dirty: true,
            commit: true,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }
}

/// Discover the linkmend.toml config file.
///
/// Returns `None` if no config file is found in the repository root.
pub fn discover_config(repo_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = repo_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a linkmend.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<LinkmendConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<LinkmendConfig> {
    let config: LinkmendConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from repo root, or return default if not found.
pub fn load_or_default(repo_root: &Utf8Path) -> anyhow::Result<LinkmendConfig> {
    match discover_config(repo_root) {
        Some(path) => load_config(&path),
        None => Ok(LinkmendConfig::default()),
    }
}

/// CLI values that can override the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub ignore: Vec<String>,
    pub allow_dirty: bool,
    pub no_commit: bool,
    pub commit_message: Option<String>,
}

/// Configuration after CLI arguments were applied.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub extensions: Vec<String>,
    pub link_elements: Vec<String>,
    pub stale_prefixes: Vec<String>,
    /// Ignore globs (from config file, extended by CLI).
    pub ignore: Vec<String>,
    pub skip_dirty: bool,
    pub commit: bool,
    pub commit_message: String,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: LinkmendConfig,
}

impl ConfigMerger {
    pub fn new(config: LinkmendConfig) -> Self {
        Self { config }
    }

    /// CLI `--ignore` extends the config list; flags only ever switch behaviour off.
    pub fn merge(self, cli: &CliOverrides) -> MergedConfig {
        let LinkmendConfig { models, run } = self.config;

        let mut ignore = run.ignore;
        for pattern in &cli.ignore {
            if !ignore.contains(pattern) {
                ignore.push(pattern.clone());
            }
        }

        MergedConfig {
            extensions: models.extensions,
            link_elements: models.link_elements,
            stale_prefixes: models.stale_prefixes,
            ignore,
            skip_dirty: run.skip_dirty && !cli.allow_dirty,
            commit: run.commit && !cli.no_commit,
            commit_message: cli.commit_message.clone().unwrap_or(run.commit_message),
        }
    }
}
