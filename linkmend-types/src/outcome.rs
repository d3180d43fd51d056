use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregate classification of one model after its links were processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixOutcome {
    /// Every link was already valid; nothing was rewritten.
    NoChanges,
    /// Corrections were applied and every link resolves now.
    Fixed,
    /// Some links were corrected, others are still broken.
    PartiallyFixed,
    /// Nothing could be corrected and at least one link is broken.
    Broken,
}

impl FixOutcome {
    /// Classify from the number of applied corrections and remaining broken links.
    pub fn classify(corrected: usize, broken: usize) -> Self {
        match (corrected > 0, broken > 0) {
            (false, false) => FixOutcome::NoChanges,
            (true, false) => FixOutcome::Fixed,
            (true, true) => FixOutcome::PartiallyFixed,
            (false, true) => FixOutcome::Broken,
        }
    }

    /// True when the model content was (or would be) rewritten.
    pub fn changed(self) -> bool {
        matches!(self, FixOutcome::Fixed | FixOutcome::PartiallyFixed)
    }

    /// True when at least one link is left broken.
    pub fn has_broken(self) -> bool {
        matches!(self, FixOutcome::PartiallyFixed | FixOutcome::Broken)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FixOutcome::NoChanges => "no_changes",
            FixOutcome::Fixed => "fixed",
            FixOutcome::PartiallyFixed => "partially_fixed",
            FixOutcome::Broken => "broken",
        }
    }
}

impl fmt::Display for FixOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-model result handed back to the caller.
///
/// A dirty-skip is deliberately not a `FixOutcome`: the links of a skipped
/// model were never looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "outcome", rename_all = "snake_case")]
pub enum ModelStatus {
    Processed(FixOutcome),
    SkippedDirty,
}

impl ModelStatus {
    pub fn outcome(self) -> Option<FixOutcome> {
        match self {
            ModelStatus::Processed(outcome) => Some(outcome),
            ModelStatus::SkippedDirty => None,
        }
    }
}

/// Verdict over a whole run; drives the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunVerdict {
    /// No model changed and none is broken.
    Clean,
    /// At least one model was fixed, none is left broken.
    Fixed,
    /// At least one model still has broken links.
    Broken,
}

impl RunVerdict {
    /// Exit status used by the hook: 0 clean, 1 fixed (verify before pushing), 2 broken.
    pub fn exit_code(self) -> u8 {
        match self {
            RunVerdict::Clean => 0,
            RunVerdict::Fixed => 1,
            RunVerdict::Broken => 2,
        }
    }
}
