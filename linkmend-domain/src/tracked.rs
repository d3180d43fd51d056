use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{BTreeMap, BTreeSet};

/// Snapshot of the tracked paths of one run, indexed by basename.
///
/// Built once before the first model is processed and never refreshed,
/// even after models are rewritten.
#[derive(Debug, Clone, Default)]
pub struct TrackedSet {
    paths: BTreeSet<Utf8PathBuf>,
    by_name: BTreeMap<String, Vec<Utf8PathBuf>>,
}

impl TrackedSet {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        let mut set = Self::default();
        for path in paths {
            set.insert(path.into());
        }
        set
    }

    fn insert(&mut self, path: Utf8PathBuf) {
        if let Some(name) = path.file_name() {
            let entry = self.by_name.entry(name.to_string()).or_default();
            if !entry.contains(&path) {
                entry.push(path.clone());
                entry.sort();
            }
        }
        self.paths.insert(path);
    }

    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.paths.contains(path)
    }

    /// Tracked paths whose final component equals `name`, sorted.
    pub fn with_basename(&self, name: &str) -> &[Utf8PathBuf] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Utf8PathBuf> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl<P: Into<Utf8PathBuf>> FromIterator<P> for TrackedSet {
    fn from_iter<T: IntoIterator<Item = P>>(iter: T) -> Self {
        Self::new(iter)
    }
}
