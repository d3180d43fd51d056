//! Core fix pipeline, extracted from the CLI.
//!
//! These entry points are I/O-agnostic: reads go through `RepoView`, git
//! queries through `GitPort` and writes through `WritePort`.

use crate::error::{RepositoryAccessError, ToolError};
use crate::ports::{GitPort, WritePort};
use crate::settings::RunSettings;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use linkmend_domain::{
    ExtractOptions, IgnoreRules, LinkReference, ModelFilter, ModelKinds, RepoView, Resolution,
    TrackedSet, extract_links, resolve,
};
use linkmend_edit::{Rewrite, apply_rewrites, render_patch};
use linkmend_types::{
    FixOutcome, LinkReport, LinkStatus, ModelReport, ModelStatus, RunInfo, RunReport, ToolInfo,
};
use tracing::{debug, info, warn};

/// Per-model knobs for `fix_model`.
#[derive(Debug, Clone)]
pub struct FixOptions {
    pub extract: ExtractOptions,
    /// Compute outcome and patch, but never write.
    pub dry_run: bool,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            extract: ExtractOptions::default(),
            dry_run: true,
        }
    }
}

/// Snapshot of every tracked path under `root`.
pub fn load_tracked_set(
    git: &dyn GitPort,
    root: &Utf8Path,
) -> Result<TrackedSet, RepositoryAccessError> {
    let tracked: TrackedSet = git.list_tracked(root)?.into_iter().collect();
    debug!(root = root.as_str(), count = tracked.len(), "loaded tracked set");
    Ok(tracked)
}

/// Tracked model files under `root` that `filter` contains and `ignore` does not match.
///
/// Sorted. With `ModelFilter::Universal` and no ignore rules this is every
/// tracked model.
pub fn find_tracked_models(
    git: &dyn GitPort,
    root: &Utf8Path,
    filter: &ModelFilter,
    ignore: &IgnoreRules,
    kinds: &ModelKinds,
) -> Result<Vec<Utf8PathBuf>, RepositoryAccessError> {
    let tracked = load_tracked_set(git, root)?;
    Ok(select_models(&tracked, filter, ignore, kinds))
}

fn select_models(
    tracked: &TrackedSet,
    filter: &ModelFilter,
    ignore: &IgnoreRules,
    kinds: &ModelKinds,
) -> Vec<Utf8PathBuf> {
    tracked
        .iter()
        .filter(|path| kinds.is_model(path))
        .filter(|path| filter.contains(path))
        .filter(|path| {
            let ignored = ignore.is_ignored(path);
            if ignored {
                debug!(path = path.as_str(), "ignored by pattern");
            }
            !ignored
        })
        .cloned()
        .collect()
}

/// True if `path` (relative to `cwd`) differs from `HEAD`.
pub fn is_file_dirty(
    git: &dyn GitPort,
    path: &Utf8Path,
    cwd: &Utf8Path,
) -> Result<bool, RepositoryAccessError> {
    git.is_file_dirty(path, cwd)
}

/// Repair the links of one model.
///
/// Never fails: read, parse and write problems turn into a `broken` report
/// carrying the error, so the run can continue with the next model.
pub fn fix_model(
    repo: &dyn RepoView,
    writer: &dyn WritePort,
    model_path: &Utf8Path,
    tracked: &TrackedSet,
    options: &FixOptions,
) -> ModelReport {
    let content = match repo.read_model(model_path) {
        Ok(content) => content,
        Err(err) => {
            warn!(model = model_path.as_str(), "cannot read model: {err:#}");
            return ModelReport::failed(model_path.as_str(), format!("{err:#}"));
        }
    };

    let links = match extract_links(model_path, &content, &options.extract) {
        Ok(links) => links,
        Err(err) => {
            warn!(model = model_path.as_str(), "cannot parse model: {err}");
            return ModelReport::failed(model_path.as_str(), format!("parse error: {err}"));
        }
    };

    let mut rewrites = Vec::new();
    let mut link_reports = Vec::with_capacity(links.len());
    for link in &links {
        let status = match resolve(link, model_path, tracked) {
            Resolution::Valid => LinkStatus::Valid,
            Resolution::External => LinkStatus::External,
            Resolution::Correction { replacement, .. } => {
                rewrites.push(Rewrite::new(link.span.clone(), replacement.clone()));
                LinkStatus::Corrected { replacement }
            }
            Resolution::Unresolvable(reason) => {
                warn!(
                    model = model_path.as_str(),
                    link = link.raw.as_str(),
                    ?reason,
                    "broken link"
                );
                LinkStatus::Broken { reason }
            }
        };
        link_reports.push(link_report(link, status));
    }

    let broken = link_reports
        .iter()
        .filter(|l| matches!(l.status, LinkStatus::Broken { .. }))
        .count();
    let outcome = FixOutcome::classify(rewrites.len(), broken);

    let mut report = ModelReport::new(model_path.as_str(), ModelStatus::Processed(outcome));
    report.links = link_reports;
    if rewrites.is_empty() {
        return report;
    }

    let updated = match apply_rewrites(&content, &rewrites) {
        Ok(updated) => updated,
        Err(err) => {
            warn!(model = model_path.as_str(), "cannot rewrite model: {err}");
            return ModelReport::failed(model_path.as_str(), err.to_string());
        }
    };
    report.patch = Some(render_patch(model_path, &content, &updated));

    if options.dry_run {
        info!(model = model_path.as_str(), "Not saving model without --fix");
        return report;
    }

    let abs = repo.root().join(model_path);
    match writer.write_file(&abs, updated.as_bytes()) {
        Ok(()) => {
            debug!(model = model_path.as_str(), "saved");
            report.written = true;
            report
        }
        Err(err) => {
            warn!(model = model_path.as_str(), "cannot save model: {err:#}");
            ModelReport::failed(model_path.as_str(), format!("{err:#}"))
        }
    }
}

fn link_report(link: &LinkReference, status: LinkStatus) -> LinkReport {
    LinkReport {
        raw: link.raw.clone(),
        offset: link.span.start,
        site: link.site.to_string(),
        target: link.target_path.as_ref().map(|p| p.to_string()),
        status,
    }
}

/// Outcome of `run_fix`.
pub struct RunOutcome {
    pub report: RunReport,
    /// Concatenated unified diff of every changed model.
    pub patch: String,
}

/// Run the whole fix: enumerate models, skip dirty ones, repair the rest and
/// commit the written models once at the end.
pub fn run_fix(
    settings: &RunSettings,
    repo: &dyn RepoView,
    git: &dyn GitPort,
    writer: &dyn WritePort,
    tool: ToolInfo,
) -> Result<RunOutcome, ToolError> {
    let started_at = Utc::now();
    let root = settings.repo_root.as_path();

    let ignore = IgnoreRules::new(&settings.ignore)
        .map_err(|err| ToolError::Settings(format!("invalid ignore pattern: {err}")))?;
    let kinds = settings.model_kinds();
    let options = FixOptions {
        extract: settings.extract_options(),
        dry_run: settings.dry_run,
    };

    let tracked = load_tracked_set(git, root)?;
    let models = select_models(&tracked, &settings.filter, &ignore, &kinds);
    info!(count = models.len(), "found tracked models");

    let mut report = RunReport::new(
        tool,
        RunInfo {
            started_at: Some(started_at),
            ended_at: None,
            root: root.to_string(),
            dry_run: settings.dry_run,
        },
    );
    let mut patch = String::new();
    let mut written = Vec::new();

    for model in &models {
        if settings.skip_dirty && is_file_dirty(git, model, root)? {
            warn!(model = model.as_str(), "model has uncommitted changes, skipping");
            report.push(ModelReport::new(model.as_str(), ModelStatus::SkippedDirty));
            continue;
        }

        info!(model = model.as_str(), "Loading model");
        let model_report = fix_model(repo, writer, model, &tracked, &options);
        log_outcome(&model_report);

        if let Some(p) = &model_report.patch {
            patch.push_str(p);
        }
        if model_report.written {
            written.push(model.clone());
        }
        report.push(model_report);
    }

    let changed = report.summary.fixed + report.summary.partially_fixed > 0;
    if changed && settings.dry_run {
        info!("Not committing changes without --fix");
    } else if !written.is_empty() && !settings.commit {
        info!("Not committing changes (--no-commit)");
    } else if !written.is_empty() {
        info!(count = written.len(), "Committing changes");
        git.stage(root, &written)?;
        git.commit(root, &written, &settings.commit_message)?;
        report.committed = written.iter().map(|p| p.to_string()).collect();
    }

    report.run.ended_at = Some(Utc::now());
    Ok(RunOutcome { report, patch })
}

fn log_outcome(report: &ModelReport) {
    let model = report.path.as_str();
    match report.outcome() {
        Some(FixOutcome::NoChanges) => info!(model, "Model is clean, not saving"),
        Some(FixOutcome::Fixed) => info!(model, "Model was fixed"),
        Some(FixOutcome::PartiallyFixed) => info!(model, "Model was partially fixed"),
        Some(FixOutcome::Broken) => info!(model, "No fixes available for model"),
        None => {}
    }
}

/// Write the JSON run report.
pub fn write_run_report(
    report: &RunReport,
    path: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("serialize run report")?;
    writer
        .write_file(path, json.as_bytes())
        .with_context(|| format!("write report {}", path))
}
