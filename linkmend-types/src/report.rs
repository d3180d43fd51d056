use crate::outcome::{FixOutcome, ModelStatus, RunVerdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,

    /// Repository root the run operated on.
    pub root: String,

    /// True when no model file was written.
    pub dry_run: bool,
}

/// Why a link could not be repaired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BrokenReason {
    /// No tracked file shares the target's basename.
    NotFound,
    /// Several tracked files share the basename; picking one would be a guess.
    Ambiguous { candidates: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LinkStatus {
    /// Target is tracked; no edit needed.
    Valid,
    /// Target was rewritten.
    Corrected { replacement: String },
    /// Link points outside the repository (URI scheme); left untouched.
    External,
    Broken { reason: BrokenReason },
}

/// One link occurrence inside a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkReport {
    /// Link text exactly as it appears in the model.
    pub raw: String,

    /// Byte offset of `raw` within the model content.
    pub offset: usize,

    /// Where the link was found, e.g. `@href` or `<semanticResources>`.
    pub site: String,

    /// Repo-relative target, when the link names a local path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    #[serde(flatten)]
    pub status: LinkStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReport {
    pub path: String,

    #[serde(flatten)]
    pub status: ModelStatus,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkReport>,

    /// True when the rewritten content was written to disk.
    #[serde(default)]
    pub written: bool,

    /// Unified diff of the rewrite, when one was computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,

    /// Parse or I/O failure that forced the model to `broken`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelReport {
    pub fn new(path: impl Into<String>, status: ModelStatus) -> Self {
        Self {
            path: path.into(),
            status,
            links: vec![],
            written: false,
            patch: None,
            error: None,
        }
    }

    /// A model that could not be processed at all.
    pub fn failed(path: impl Into<String>, error: impl Into<String>) -> Self {
        let mut report = Self::new(path, ModelStatus::Processed(FixOutcome::Broken));
        report.error = Some(error.into());
        report
    }

    pub fn outcome(&self) -> Option<FixOutcome> {
        self.status.outcome()
    }

    pub fn corrected_count(&self) -> usize {
        self.links
            .iter()
            .filter(|l| matches!(l.status, LinkStatus::Corrected { .. }))
            .count()
    }

    pub fn broken_count(&self) -> usize {
        self.links
            .iter()
            .filter(|l| matches!(l.status, LinkStatus::Broken { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub models: u64,
    pub unchanged: u64,
    pub fixed: u64,
    pub partially_fixed: u64,
    pub broken: u64,
    pub skipped_dirty: u64,
    pub links_corrected: u64,
    pub links_broken: u64,
}

impl RunSummary {
    pub fn record(&mut self, report: &ModelReport) {
        self.models += 1;
        match report.status {
            ModelStatus::SkippedDirty => self.skipped_dirty += 1,
            ModelStatus::Processed(FixOutcome::NoChanges) => self.unchanged += 1,
            ModelStatus::Processed(FixOutcome::Fixed) => self.fixed += 1,
            ModelStatus::Processed(FixOutcome::PartiallyFixed) => self.partially_fixed += 1,
            ModelStatus::Processed(FixOutcome::Broken) => self.broken += 1,
        }
        self.links_corrected += report.corrected_count() as u64;
        self.links_broken += report.broken_count() as u64;
    }

    pub fn verdict(&self) -> RunVerdict {
        if self.broken > 0 || self.partially_fixed > 0 {
            RunVerdict::Broken
        } else if self.fixed > 0 {
            RunVerdict::Fixed
        } else {
            RunVerdict::Clean
        }
    }
}

/// Everything one run produced; serialized for `--report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub schema: String,
    pub tool: ToolInfo,
    pub run: RunInfo,
    pub summary: RunSummary,

    #[serde(default)]
    pub models: Vec<ModelReport>,

    /// Paths committed at the end of the run, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub committed: Vec<String>,
}

impl RunReport {
    pub fn new(tool: ToolInfo, run: RunInfo) -> Self {
        Self {
            schema: crate::schema::LINKMEND_REPORT_V1.to_string(),
            tool,
            run,
            summary: RunSummary::default(),
            models: vec![],
            committed: vec![],
        }
    }

    pub fn push(&mut self, report: ModelReport) {
        self.summary.record(&report);
        self.models.push(report);
    }
}
