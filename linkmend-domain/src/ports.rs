use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::collections::BTreeMap;

/// Where model text comes from.
///
/// Paths are relative to [`RepoView::root`]. The fixer only ever reads
/// through this, so a whole run can be driven from memory in tests.
pub trait RepoView {
    fn root(&self) -> &Utf8Path;

    fn read_model(&self, model: &Utf8Path) -> anyhow::Result<String>;
}

/// Models read from the working copy on disk.
#[derive(Debug, Clone)]
pub struct FsRepoView {
    root: Utf8PathBuf,
}

impl FsRepoView {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }
}

impl RepoView for FsRepoView {
    fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn read_model(&self, model: &Utf8Path) -> anyhow::Result<String> {
        let path = self.root.join(model);
        let bytes = fs::read(&path)?;
        String::from_utf8(bytes).with_context(|| format!("model {} is not valid UTF-8", model))
    }
}

/// Models held in memory, keyed by repo-relative path.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepoView {
    root: Utf8PathBuf,
    models: BTreeMap<Utf8PathBuf, String>,
}

impl InMemoryRepoView {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            models: BTreeMap::new(),
        }
    }

    pub fn with_file(mut self, model: impl Into<Utf8PathBuf>, text: impl Into<String>) -> Self {
        self.insert(model, text);
        self
    }

    pub fn insert(&mut self, model: impl Into<Utf8PathBuf>, text: impl Into<String>) {
        self.models.insert(model.into(), text.into());
    }
}

impl RepoView for InMemoryRepoView {
    fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn read_model(&self, model: &Utf8Path) -> anyhow::Result<String> {
        self.models
            .get(model)
            .cloned()
            .with_context(|| format!("read {}: no such file", model))
    }
}
