//! Shared DTOs for the linkmend workspace.
//!
//! # Design constraints
//! - Report types are serialized to disk (`--report`), so keep changes additive.
//! - Outcome classification lives here so every crate agrees on it.

pub mod outcome;
pub mod report;

pub use outcome::{FixOutcome, ModelStatus, RunVerdict};
pub use report::{
    BrokenReason, LinkReport, LinkStatus, ModelReport, RunInfo, RunReport, RunSummary, ToolInfo,
};

/// Schema identifiers.
pub mod schema {
    pub const LINKMEND_REPORT_V1: &str = "linkmend.report.v1";
}
