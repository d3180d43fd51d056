//! Decide what each extracted link should point at.
//!
//! A broken link is only repaired when exactly one tracked file shares its
//! basename. Ambiguous matches stay broken: a silently wrong link is worse
//! than a visibly broken one.

use crate::extract::LinkReference;
use crate::paths::{percent_encode, relative_link_path, xml_escape};
use crate::target::LinkTarget;
use crate::tracked::TrackedSet;
use camino::{Utf8Path, Utf8PathBuf};
use linkmend_types::BrokenReason;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Target is tracked and the text needs no change.
    Valid,
    /// Replace the link text with `replacement`, which points at `target`.
    Correction {
        target: Utf8PathBuf,
        replacement: String,
    },
    /// URI with a scheme; out of scope.
    External,
    Unresolvable(BrokenReason),
}

/// Resolve one link of the model at `model_path` against the tracked snapshot.
pub fn resolve(link: &LinkReference, model_path: &Utf8Path, tracked: &TrackedSet) -> Resolution {
    let LinkTarget::Local {
        fragment,
        stripped_prefix,
        ..
    } = &link.target
    else {
        return Resolution::External;
    };

    let model_dir = model_path.parent().unwrap_or(Utf8Path::new(""));

    if let Some(path) = &link.target_path
        && tracked.contains(path)
    {
        if stripped_prefix.is_none() {
            return Resolution::Valid;
        }
        debug!(link = link.raw.as_str(), "dropping stale prefix");
        return correction(link, model_dir, path, fragment.as_deref());
    }

    let Some(name) = link.target_basename() else {
        return Resolution::Unresolvable(BrokenReason::NotFound);
    };

    match tracked.with_basename(name) {
        [] => {
            debug!(link = link.raw.as_str(), "no tracked file named {name}");
            Resolution::Unresolvable(BrokenReason::NotFound)
        }
        [only] => correction(link, model_dir, only, fragment.as_deref()),
        many => {
            debug!(
                link = link.raw.as_str(),
                candidates = many.len(),
                "ambiguous basename, leaving link alone"
            );
            Resolution::Unresolvable(BrokenReason::Ambiguous {
                candidates: many.iter().map(|p| p.to_string()).collect(),
            })
        }
    }
}

fn correction(
    link: &LinkReference,
    model_dir: &Utf8Path,
    target: &Utf8Path,
    fragment: Option<&str>,
) -> Resolution {
    let rel = relative_link_path(target, model_dir);
    let mut replacement = xml_escape(&percent_encode(&rel), link.site.quote());
    if let Some(fragment) = fragment {
        replacement.push_str(fragment);
    }

    if replacement == link.raw {
        return Resolution::Valid;
    }

    debug!(
        link = link.raw.as_str(),
        replacement = replacement.as_str(),
        "proposing correction"
    );
    Resolution::Correction {
        target: target.to_path_buf(),
        replacement,
    }
}
