//! Port traits abstracting all I/O away from the pipeline.

use crate::error::RepositoryAccessError;
use camino::{Utf8Path, Utf8PathBuf};

/// Version-control queries and the final commit.
pub trait GitPort {
    /// Tracked files under `root`, relative to `root`.
    fn list_tracked(&self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, RepositoryAccessError>;

    /// True if `path` (relative to `cwd`) differs from `HEAD` in the index or work tree.
    fn is_file_dirty(&self, path: &Utf8Path, cwd: &Utf8Path)
    -> Result<bool, RepositoryAccessError>;

    fn stage(&self, root: &Utf8Path, paths: &[Utf8PathBuf]) -> Result<(), RepositoryAccessError>;

    /// Commit exactly `paths`; anything else already staged stays staged.
    fn commit(
        &self,
        root: &Utf8Path,
        paths: &[Utf8PathBuf],
        message: &str,
    ) -> Result<(), RepositoryAccessError>;
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
}
