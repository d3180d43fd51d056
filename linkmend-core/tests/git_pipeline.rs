//! End-to-end pipeline runs against real git repositories.

use camino::{Utf8Path, Utf8PathBuf};
use linkmend_core::adapters::{FsWritePort, ShellGitPort};
use linkmend_core::pipeline::{FixOptions, fix_model, load_tracked_set, run_fix};
use linkmend_core::settings::RunSettings;
use linkmend_core::{FsRepoView, ModelFilter};
use linkmend_types::{FixOutcome, ModelStatus, RunVerdict, ToolInfo};
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

fn git_stdout(root: &Utf8Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .expect("run git");
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

fn write(root: &Utf8Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("mkdir");
    }
    std::fs::write(path, contents).expect("write");
}

fn read(root: &Utf8Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel)).expect("read")
}

/// A repository where `res/b.res` was moved to `lib/b.res` without updating links.
fn moved_resource_repo() -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
    run_git(&root, &["init", "-q"]);
    run_git(&root, &["config", "user.email", "test@example.com"]);
    run_git(&root, &["config", "user.name", "Test"]);
    run_git(&root, &["config", "commit.gpgsign", "false"]);

    write(
        &root,
        "docs/a.aird",
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<diagram>\n  <ref href=\"../res/b.res\"/>\n  <semanticResources>index:/model.capella</semanticResources>\n</diagram>\n",
    );
    write(&root, "docs/model.capella", "<model/>\n");
    write(&root, "lib/b.res", "resource\n");
    write(&root, "docs/clean.aird", "<diagram><ref href=\"model.capella\"/></diagram>\n");
    run_git(&root, &["add", "."]);
    run_git(&root, &["commit", "-q", "-m", "init"]);

    (temp, root)
}

fn tool() -> ToolInfo {
    ToolInfo {
        name: "linkmend".to_string(),
        version: None,
    }
}

fn settings(root: &Utf8Path) -> RunSettings {
    RunSettings {
        repo_root: root.to_path_buf(),
        dry_run: false,
        ..RunSettings::default()
    }
}

#[test]
fn fix_rewrites_links_and_commits() {
    let (_temp, root) = moved_resource_repo();
    let repo = FsRepoView::new(root.clone());

    let outcome = run_fix(&settings(&root), &repo, &ShellGitPort, &FsWritePort, tool())
        .expect("run fix");
    let report = outcome.report;

    // docs/model.capella is a model too, with no links.
    assert_eq!(report.summary.models, 3);
    assert_eq!(report.summary.fixed, 1);
    assert_eq!(report.summary.unchanged, 2);
    assert_eq!(report.summary.links_corrected, 2);
    assert_eq!(report.summary.verdict(), RunVerdict::Fixed);
    assert_eq!(report.committed, vec!["docs/a.aird".to_string()]);

    assert_eq!(
        read(&root, "docs/a.aird"),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<diagram>\n  <ref href=\"../lib/b.res\"/>\n  <semanticResources>model.capella</semanticResources>\n</diagram>\n"
    );
    assert_eq!(
        git_stdout(&root, &["log", "-1", "--format=%s"]),
        settings(&root).commit_message
    );
    assert_eq!(git_stdout(&root, &["status", "--porcelain"]), "");
}

#[test]
fn second_run_is_idempotent() {
    let (_temp, root) = moved_resource_repo();
    let repo = FsRepoView::new(root.clone());

    run_fix(&settings(&root), &repo, &ShellGitPort, &FsWritePort, tool()).expect("first run");
    let second =
        run_fix(&settings(&root), &repo, &ShellGitPort, &FsWritePort, tool()).expect("second run");

    assert_eq!(second.report.summary.unchanged, 3);
    assert_eq!(second.report.summary.verdict(), RunVerdict::Clean);
    assert!(second.report.committed.is_empty());
    assert!(second.patch.is_empty());
}

#[test]
fn fix_model_twice_returns_no_changes() {
    let (_temp, root) = moved_resource_repo();
    let repo = FsRepoView::new(root.clone());
    let tracked = load_tracked_set(&ShellGitPort, &root).expect("tracked");
    let options = FixOptions {
        dry_run: false,
        ..FixOptions::default()
    };
    let model = Utf8Path::new("docs/a.aird");

    let first = fix_model(&repo, &FsWritePort, model, &tracked, &options);
    let second = fix_model(&repo, &FsWritePort, model, &tracked, &options);

    assert_eq!(first.outcome(), Some(FixOutcome::Fixed));
    assert_eq!(second.outcome(), Some(FixOutcome::NoChanges));
    assert!(!second.written);
}

#[test]
fn dirty_models_are_skipped_untouched() {
    let (_temp, root) = moved_resource_repo();
    let edited = read(&root, "docs/a.aird").replace("<diagram>", "<diagram name=\"wip\">");
    write(&root, "docs/a.aird", &edited);
    let repo = FsRepoView::new(root.clone());

    let outcome = run_fix(&settings(&root), &repo, &ShellGitPort, &FsWritePort, tool())
        .expect("run fix");

    assert_eq!(outcome.report.models[0].path, "docs/a.aird");
    assert_eq!(outcome.report.models[0].status, ModelStatus::SkippedDirty);
    assert_eq!(outcome.report.summary.skipped_dirty, 1);
    assert_eq!(read(&root, "docs/a.aird"), edited);
    assert!(outcome.report.committed.is_empty());
}

#[test]
fn allow_dirty_processes_modified_models() {
    let (_temp, root) = moved_resource_repo();
    let edited = read(&root, "docs/a.aird").replace("<diagram>", "<diagram name=\"wip\">");
    write(&root, "docs/a.aird", &edited);
    let repo = FsRepoView::new(root.clone());
    let settings = RunSettings {
        skip_dirty: false,
        commit: false,
        ..settings(&root)
    };

    let outcome = run_fix(&settings, &repo, &ShellGitPort, &FsWritePort, tool()).expect("run fix");

    assert_eq!(outcome.report.summary.fixed, 1);
    assert!(read(&root, "docs/a.aird").contains("../lib/b.res"));
    assert!(read(&root, "docs/a.aird").contains("name=\"wip\""));
}

#[test]
fn explicit_filter_limits_the_run() {
    let (_temp, root) = moved_resource_repo();
    let repo = FsRepoView::new(root.clone());
    let settings = RunSettings {
        filter: ModelFilter::explicit(["docs/clean.aird"]),
        ..settings(&root)
    };

    let outcome = run_fix(&settings, &repo, &ShellGitPort, &FsWritePort, tool()).expect("run fix");

    assert_eq!(outcome.report.summary.models, 1);
    assert_eq!(outcome.report.models[0].path, "docs/clean.aird");
    assert!(read(&root, "docs/a.aird").contains("../res/b.res"));
}

#[test]
fn run_outside_repository_fails() {
    let temp = TempDir::new().expect("temp dir");
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
    let repo = FsRepoView::new(root.clone());

    let result = run_fix(&settings(&root), &repo, &ShellGitPort, &FsWritePort, tool());
    assert!(result.is_err());
}

#[test]
fn commit_leaves_unrelated_staged_changes_staged() {
    let (_temp, root) = moved_resource_repo();
    write(&root, "notes.txt", "work in progress\n");
    run_git(&root, &["add", "notes.txt"]);
    let repo = FsRepoView::new(root.clone());

    let outcome = run_fix(&settings(&root), &repo, &ShellGitPort, &FsWritePort, tool())
        .expect("run fix");

    assert_eq!(outcome.report.committed, vec!["docs/a.aird".to_string()]);
    assert_eq!(
        git_stdout(&root, &["show", "--name-only", "--format=", "HEAD"]),
        "docs/a.aird"
    );
    assert_eq!(
        git_stdout(&root, &["diff", "--cached", "--name-only"]),
        "notes.txt"
    );
}
