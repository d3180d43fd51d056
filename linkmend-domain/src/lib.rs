//! Domain logic: find the links inside a model and decide what each one should point at.
//!
//! This crate owns *what* gets rewritten and why. It does not own *how* the
//! new text reaches the disk; that's the `linkmend-edit` crate.

mod error;
mod extract;
mod filter;
mod paths;
mod ports;
mod resolve;
mod target;
mod tracked;

pub use error::ModelParseError;
pub use extract::{ExtractOptions, LinkReference, LinkSite, extract_links};
pub use filter::{IgnoreRules, ModelFilter, ModelKinds};
pub use paths::{normalize, relative_link_path};
pub use ports::{FsRepoView, InMemoryRepoView, RepoView};
pub use resolve::{Resolution, resolve};
pub use target::LinkTarget;
pub use tracked::TrackedSet;
