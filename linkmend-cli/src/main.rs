mod banner;
mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use config::{CliOverrides, ConfigMerger};
use linkmend_core::adapters::{FsWritePort, ShellGitPort};
use linkmend_core::pipeline::{run_fix, write_run_report};
use linkmend_core::settings::RunSettings;
use linkmend_core::{FsRepoView, ModelFilter};
use linkmend_types::{RunVerdict, ToolInfo};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "linkmend",
    version,
    about = "Repairs stale cross-file links in tracked model files."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check every tracked model and repair broken links (default: dry-run).
    Fix(FixArgs),
    /// Report broken links without writing anything.
    Check(CommonArgs),
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Repository root (default: current directory).
    #[arg(long, default_value = ".")]
    repo_root: Utf8PathBuf,

    /// Model file or directory to process, relative to the repository root.
    /// Repeatable; default: every tracked model.
    #[arg(short = 'm', long = "model")]
    models: Vec<Utf8PathBuf>,

    /// Process models that have uncommitted changes.
    #[arg(long, default_value_t = false)]
    allow_dirty: bool,

    /// Glob pattern of paths to leave alone (extends `run.ignore`).
    #[arg(long)]
    ignore: Vec<String>,

    /// Print the unified diff of all link rewrites to stdout.
    #[arg(long, default_value_t = false)]
    diff: bool,

    /// Write the JSON run report to this file.
    #[arg(long)]
    report: Option<Utf8PathBuf>,
}

#[derive(Debug, Args)]
struct FixArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Save fixed models. If omitted, runs a dry-run.
    #[arg(long, default_value_t = false)]
    fix: bool,

    /// Do not commit fixed models.
    #[arg(long, default_value_t = false)]
    no_commit: bool,

    /// Commit message to use when committing fixed models.
    #[arg(long)]
    commit_message: Option<String>,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(verdict) => {
            banner::print(verdict);
            ExitCode::from(verdict.exit_code())
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(1)
        }
    }
}

fn real_main() -> anyhow::Result<RunVerdict> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Fix(args) => {
            let overrides = CliOverrides {
                ignore: args.common.ignore.clone(),
                allow_dirty: args.common.allow_dirty,
                no_commit: args.no_commit,
                commit_message: args.commit_message,
            };
            execute(args.common, !args.fix, overrides)
        }
        Command::Check(common) => {
            let overrides = CliOverrides {
                ignore: common.ignore.clone(),
                allow_dirty: common.allow_dirty,
                ..CliOverrides::default()
            };
            execute(common, true, overrides)
        }
    }
}

fn execute(args: CommonArgs, dry_run: bool, overrides: CliOverrides) -> anyhow::Result<RunVerdict> {
    let repo_root = args.repo_root;

    // Load config file and merge with CLI arguments
    let file_config = config::load_or_default(&repo_root).context("load linkmend.toml config")?;
    let merged = ConfigMerger::new(file_config).merge(&overrides);
    debug!(
        "merged config: ignore={:?}, skip_dirty={}, commit={}",
        merged.ignore, merged.skip_dirty, merged.commit
    );

    let filter = if args.models.is_empty() {
        ModelFilter::Universal
    } else {
        ModelFilter::explicit(args.models.iter().map(|m| repo_relative(&repo_root, m)))
    };

    let settings = RunSettings {
        repo_root: repo_root.clone(),
        filter,
        ignore: merged.ignore,
        extensions: merged.extensions,
        link_elements: merged.link_elements,
        stale_prefixes: merged.stale_prefixes,
        dry_run,
        skip_dirty: merged.skip_dirty,
        commit: merged.commit,
        commit_message: merged.commit_message,
    };

    let repo = FsRepoView::new(repo_root.clone());
    let outcome = run_fix(&settings, &repo, &ShellGitPort, &FsWritePort, tool_info())
        .context("fix model links")?;

    if args.diff {
        print!("{}", outcome.patch);
    }
    if let Some(path) = &args.report {
        write_run_report(&outcome.report, path, &FsWritePort)?;
        info!("wrote report to {}", path);
    }

    let summary = &outcome.report.summary;
    info!(
        models = summary.models,
        fixed = summary.fixed,
        partially_fixed = summary.partially_fixed,
        broken = summary.broken,
        skipped_dirty = summary.skipped_dirty,
        "run finished"
    );
    Ok(summary.verdict())
}

/// Absolute `--model` paths under the repository root become repo-relative.
fn repo_relative(repo_root: &Utf8Path, model: &Utf8Path) -> Utf8PathBuf {
    model
        .strip_prefix(repo_root)
        .map(Utf8Path::to_path_buf)
        .unwrap_or_else(|_| model.to_path_buf())
}

fn tool_info() -> ToolInfo {
    ToolInfo {
        name: "linkmend".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}
