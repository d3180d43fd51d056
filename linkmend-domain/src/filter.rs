use crate::paths::normalize;
use camino::{Utf8Path, Utf8PathBuf};
use glob::{MatchOptions, Pattern, PatternError};
use std::collections::BTreeSet;

/// Selects which tracked paths take part in a run.
///
/// `Universal` contains every path and so filters nothing; it is what a
/// caller gets when no models were named explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ModelFilter {
    /// Named paths; a directory entry selects everything below it.
    Explicit { prefixes: BTreeSet<Utf8PathBuf> },
    #[default]
    Universal,
}

impl ModelFilter {
    /// Build an explicit filter from repo-relative paths.
    ///
    /// Paths that normalize to nothing (`.`) or escape the root are dropped,
    /// which can leave an explicit filter that contains nothing.
    pub fn explicit<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Utf8Path>,
    {
        let prefixes = paths
            .into_iter()
            .filter_map(|p| normalize(p.as_ref()))
            .collect();
        ModelFilter::Explicit { prefixes }
    }

    pub fn contains(&self, path: &Utf8Path) -> bool {
        match self {
            ModelFilter::Universal => true,
            ModelFilter::Explicit { prefixes } => prefixes.iter().any(|p| path.starts_with(p)),
        }
    }
}

/// Glob patterns excluding paths from model enumeration.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<Pattern>,
}

impl IgnoreRules {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_ignored(&self, path: &Utf8Path) -> bool {
        let opts = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::new()
        };
        self.patterns
            .iter()
            .any(|p| p.matches_with(path.as_str(), opts))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Recognizes model files by extension (case-insensitive).
#[derive(Debug, Clone)]
pub struct ModelKinds {
    extensions: BTreeSet<String>,
}

impl ModelKinds {
    pub const DEFAULT_EXTENSIONS: [&'static str; 4] =
        ["aird", "capella", "airdfragment", "capellafragment"];

    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn is_model(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.extensions.contains(&ext.to_ascii_lowercase()))
    }
}

impl Default for ModelKinds {
    fn default() -> Self {
        Self::new(&Self::DEFAULT_EXTENSIONS)
    }
}
