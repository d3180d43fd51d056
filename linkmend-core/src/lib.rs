//! Embeddable core library for linkmend.
//!
//! Provides a clap-free, I/O-abstracted entry point for repairing stale links
//! in tracked model files.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`GitPort`](ports::GitPort): tracked files, per-file dirtiness, stage and commit
//! - [`WritePort`](ports::WritePort): replace model files
//!
//! Model reads go through the domain's [`RepoView`]. The [`adapters`] module
//! provides shell- and filesystem-backed implementations plus in-memory fakes.
//!
//! # Entry points
//!
//! - [`find_tracked_models`](pipeline::find_tracked_models): enumerate models
//! - [`fix_model`](pipeline::fix_model): repair one model
//! - [`run_fix`](pipeline::run_fix): the whole run, including the commit

pub mod adapters;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod settings;

pub use error::{RepositoryAccessError, ToolError};

// Re-export the domain's repo views so callers don't need linkmend-domain directly.
pub use linkmend_domain::{FsRepoView, InMemoryRepoView, ModelFilter, RepoView};
