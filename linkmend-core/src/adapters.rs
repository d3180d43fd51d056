//! Default shell- and filesystem-backed port implementations, plus in-memory fakes.

use crate::error::RepositoryAccessError;
use crate::ports::{GitPort, WritePort};
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::process::{Command, Output};
use tracing::debug;

/// Environment entry that keeps the pre-commit hook from re-running itself
/// on the commit it creates.
pub const HOOK_SKIP_ENV: (&str, &str) = ("SKIP", "fix-model-links");

/// Git operations via the `git` CLI.
#[derive(Debug, Clone, Default)]
pub struct ShellGitPort;

impl ShellGitPort {
    fn run(&self, cwd: &Utf8Path, args: &[&str]) -> Result<Output, RepositoryAccessError> {
        self.run_with_env(cwd, args, &[])
    }

    fn run_with_env(
        &self,
        cwd: &Utf8Path,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<Output, RepositoryAccessError> {
        debug!(cwd = cwd.as_str(), ?args, "git");
        Command::new("git")
            .args(args)
            .current_dir(cwd)
            .envs(env.iter().copied())
            .output()
            .map_err(|source| RepositoryAccessError::Spawn {
                command: args.join(" "),
                source,
            })
    }

    fn run_ok(&self, cwd: &Utf8Path, args: &[&str]) -> Result<Output, RepositoryAccessError> {
        let output = self.run(cwd, args)?;
        if !output.status.success() {
            return Err(failed(cwd, args, &output));
        }
        Ok(output)
    }

    fn has_head(&self, cwd: &Utf8Path) -> Result<bool, RepositoryAccessError> {
        let args = ["rev-parse", "--verify", "--quiet", "HEAD^{commit}"];
        let output = self.run(cwd, &args)?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(failed(cwd, &args, &output)),
        }
    }
}

fn failed(cwd: &Utf8Path, args: &[&str], output: &Output) -> RepositoryAccessError {
    RepositoryAccessError::Failed {
        command: args.join(" "),
        cwd: cwd.to_path_buf(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

impl GitPort for ShellGitPort {
    fn list_tracked(&self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, RepositoryAccessError> {
        let args = ["ls-files", "-cz"];
        let output = self.run_ok(root, &args)?;
        output
            .stdout
            .split(|b| *b == 0)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                std::str::from_utf8(entry)
                    .map(Utf8PathBuf::from)
                    .map_err(|_| RepositoryAccessError::NonUtf8Path {
                        command: args.join(" "),
                    })
            })
            .collect()
    }

    fn is_file_dirty(
        &self,
        path: &Utf8Path,
        cwd: &Utf8Path,
    ) -> Result<bool, RepositoryAccessError> {
        if !self.has_head(cwd)? {
            // Nothing to compare against.
            return Ok(true);
        }

        let args = ["diff", "--quiet", "HEAD", "--", path.as_str()];
        let output = self.run(cwd, &args)?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(failed(cwd, &args, &output)),
        }
    }

    fn stage(&self, root: &Utf8Path, paths: &[Utf8PathBuf]) -> Result<(), RepositoryAccessError> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(|p| p.as_str()));
        self.run_ok(root, &args).map(|_| ())
    }

    fn commit(
        &self,
        root: &Utf8Path,
        paths: &[Utf8PathBuf],
        message: &str,
    ) -> Result<(), RepositoryAccessError> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["commit", "--only", "-m", message, "--"];
        args.extend(paths.iter().map(|p| p.as_str()));
        let output = self.run_with_env(root, &args, &[HOOK_SKIP_ENV])?;
        if !output.status.success() {
            return Err(failed(root, &args, &output));
        }
        Ok(())
    }
}

/// Filesystem write operations. Replaces files atomically.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        linkmend_edit::write_atomic(path, contents)
    }
}

/// In-memory git for embedding and testing.
///
/// Staged paths and commit messages are recorded so tests can assert on them.
#[derive(Debug, Default)]
pub struct InMemoryGitPort {
    tracked: Vec<Utf8PathBuf>,
    dirty: BTreeSet<Utf8PathBuf>,
    staged: RefCell<Vec<Utf8PathBuf>>,
    commits: RefCell<Vec<String>>,
    committed: RefCell<Vec<Utf8PathBuf>>,
}

impl InMemoryGitPort {
    pub fn new<I, P>(tracked: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Utf8PathBuf>,
    {
        let mut tracked: Vec<Utf8PathBuf> = tracked.into_iter().map(Into::into).collect();
        tracked.sort();
        tracked.dedup();
        Self {
            tracked,
            ..Self::default()
        }
    }

    pub fn with_dirty(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.dirty.insert(path.into());
        self
    }

    pub fn staged(&self) -> Vec<Utf8PathBuf> {
        self.staged.borrow().clone()
    }

    pub fn commits(&self) -> Vec<String> {
        self.commits.borrow().clone()
    }

    pub fn committed(&self) -> Vec<Utf8PathBuf> {
        self.committed.borrow().clone()
    }
}

impl GitPort for InMemoryGitPort {
    fn list_tracked(&self, _root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, RepositoryAccessError> {
        Ok(self.tracked.clone())
    }

    fn is_file_dirty(
        &self,
        path: &Utf8Path,
        _cwd: &Utf8Path,
    ) -> Result<bool, RepositoryAccessError> {
        Ok(self.dirty.contains(path))
    }

    fn stage(&self, _root: &Utf8Path, paths: &[Utf8PathBuf]) -> Result<(), RepositoryAccessError> {
        self.staged.borrow_mut().extend(paths.iter().cloned());
        Ok(())
    }

    fn commit(
        &self,
        _root: &Utf8Path,
        paths: &[Utf8PathBuf],
        message: &str,
    ) -> Result<(), RepositoryAccessError> {
        self.commits.borrow_mut().push(message.to_string());
        self.committed.borrow_mut().extend(paths.iter().cloned());
        Ok(())
    }
}

/// Records writes instead of touching the filesystem.
#[derive(Debug, Default)]
pub struct InMemoryWritePort {
    files: RefCell<BTreeMap<Utf8PathBuf, Vec<u8>>>,
}

impl InMemoryWritePort {
    pub fn written(&self) -> BTreeMap<Utf8PathBuf, Vec<u8>> {
        self.files.borrow().clone()
    }
}

impl WritePort for InMemoryWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::process::Command;
    use tempfile::TempDir;

    fn run_git(root: &Utf8Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(root)
            .status()
            .expect("run git");
        assert!(status.success(), "git {:?} failed", args);
    }

    fn init_repo() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        run_git(&root, &["init", "-q"]);
        run_git(&root, &["config", "user.email", "test@example.com"]);
        run_git(&root, &["config", "user.name", "Test"]);
        run_git(&root, &["config", "commit.gpgsign", "false"]);
        (temp, root)
    }

    #[test]
    fn shell_git_lists_tracked_files_only() {
        let (_temp, root) = init_repo();
        std::fs::create_dir_all(root.join("m")).unwrap();
        std::fs::write(root.join("m/a b.aird"), "<a/>").unwrap();
        std::fs::write(root.join("untracked.aird"), "<a/>").unwrap();
        run_git(&root, &["add", "m"]);

        let tracked = ShellGitPort.list_tracked(&root).expect("list");
        assert_eq!(tracked, vec![Utf8PathBuf::from("m/a b.aird")]);
    }

    #[test]
    fn shell_git_outside_repository_is_an_access_error() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let err = ShellGitPort.list_tracked(&root).unwrap_err();
        assert!(matches!(err, RepositoryAccessError::Failed { .. }));
    }

    #[test]
    fn shell_git_reports_dirtiness_against_head() {
        let (_temp, root) = init_repo();
        std::fs::write(root.join("a.aird"), "<a/>").unwrap();
        run_git(&root, &["add", "a.aird"]);

        // No commit yet: everything counts as dirty.
        assert!(ShellGitPort.is_file_dirty(Utf8Path::new("a.aird"), &root).unwrap());

        run_git(&root, &["commit", "-q", "-m", "init"]);
        assert!(!ShellGitPort.is_file_dirty(Utf8Path::new("a.aird"), &root).unwrap());

        std::fs::write(root.join("a.aird"), "<b/>").unwrap();
        assert!(ShellGitPort.is_file_dirty(Utf8Path::new("a.aird"), &root).unwrap());

        run_git(&root, &["add", "a.aird"]);
        assert!(ShellGitPort.is_file_dirty(Utf8Path::new("a.aird"), &root).unwrap());
    }

    #[test]
    fn shell_git_stages_and_commits() {
        let (_temp, root) = init_repo();
        std::fs::write(root.join("a.aird"), "<a/>").unwrap();
        ShellGitPort
            .stage(&root, &[Utf8PathBuf::from("a.aird")])
            .expect("stage");
        ShellGitPort
            .commit(&root, &[Utf8PathBuf::from("a.aird")], "fix links")
            .expect("commit");

        let out = Command::new("git")
            .args(["log", "--format=%s"])
            .current_dir(&root)
            .output()
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "fix links");
        assert!(!ShellGitPort.is_file_dirty(Utf8Path::new("a.aird"), &root).unwrap());
    }

    #[test]
    fn shell_git_commits_only_the_given_paths() {
        let (_temp, root) = init_repo();
        std::fs::write(root.join("a.aird"), "<a/>").unwrap();
        std::fs::write(root.join("notes.txt"), "v1").unwrap();
        run_git(&root, &["add", "."]);
        run_git(&root, &["commit", "-q", "-m", "init"]);

        std::fs::write(root.join("a.aird"), "<b/>").unwrap();
        std::fs::write(root.join("notes.txt"), "v2").unwrap();
        run_git(&root, &["add", "notes.txt"]);
        ShellGitPort
            .commit(&root, &[Utf8PathBuf::from("a.aird")], "fix links")
            .expect("commit");

        let show = Command::new("git")
            .args(["show", "--name-only", "--format=", "HEAD"])
            .current_dir(&root)
            .output()
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&show.stdout).trim(), "a.aird");
        assert!(ShellGitPort.is_file_dirty(Utf8Path::new("notes.txt"), &root).unwrap());
    }

    #[test]
    fn fs_write_port_replaces_contents() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let target = root.join("a.aird");
        std::fs::write(&target, "old").unwrap();

        FsWritePort.write_file(&target, b"new").expect("write");
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn in_memory_git_records_stage_and_commit() {
        let git = InMemoryGitPort::new(["b.aird", "a.aird", "a.aird"]).with_dirty("b.aird");
        let root = Utf8Path::new("/repo");
        assert_eq!(
            git.list_tracked(root).unwrap(),
            vec![Utf8PathBuf::from("a.aird"), Utf8PathBuf::from("b.aird")]
        );
        assert!(git.is_file_dirty(Utf8Path::new("b.aird"), root).unwrap());
        assert!(!git.is_file_dirty(Utf8Path::new("a.aird"), root).unwrap());

        git.stage(root, &[Utf8PathBuf::from("a.aird")]).unwrap();
        git.commit(root, &[Utf8PathBuf::from("a.aird")], "msg").unwrap();
        assert_eq!(git.staged(), vec![Utf8PathBuf::from("a.aird")]);
        assert_eq!(git.commits(), vec!["msg".to_string()]);
        assert_eq!(git.committed(), vec![Utf8PathBuf::from("a.aird")]);
    }
}
