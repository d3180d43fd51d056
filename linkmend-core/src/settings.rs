//! Clap-free settings for the fix pipeline.

use camino::Utf8PathBuf;
use linkmend_domain::{ExtractOptions, ModelFilter, ModelKinds};

pub const DEFAULT_COMMIT_MESSAGE: &str = "fix[by-script]: repair stale model links";

/// Settings for `run_fix`.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub repo_root: Utf8PathBuf,

    // Selection
    pub filter: ModelFilter,
    pub ignore: Vec<String>,
    pub extensions: Vec<String>,

    // Extraction
    pub link_elements: Vec<String>,
    pub stale_prefixes: Vec<String>,

    // Behaviour
    pub dry_run: bool,
    pub skip_dirty: bool,
    pub commit: bool,
    pub commit_message: String,
}

impl RunSettings {
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            link_elements: self.link_elements.clone(),
            stale_prefixes: self.stale_prefixes.clone(),
        }
    }

    pub fn model_kinds(&self) -> ModelKinds {
        ModelKinds::new(&self.extensions)
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        let extract = ExtractOptions::default();
        Self {
            repo_root: Utf8PathBuf::from("."),
            filter: ModelFilter::Universal,
            ignore: Vec::new(),
            extensions: ModelKinds::DEFAULT_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            link_elements: extract.link_elements,
            stale_prefixes: extract.stale_prefixes,
            dry_run: true,
            skip_dirty: true,
            commit: true,
            commit_message: DEFAULT_COMMIT_MESSAGE.to_string(),
        }
    }
}
