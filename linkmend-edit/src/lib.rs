//! Edit engine for linkmend.
//!
//! Responsibilities:
//! - Splice replacement text into exact byte spans, leaving every other byte alone.
//! - Generate a unified diff preview.
//! - Replace files on disk without exposing half-written content.

mod error;

pub use error::{EditError, EditResult};

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use diffy::PatchFormatter;
use fs_err as fs;
use std::ops::Range;
use tracing::trace;

/// Replace the bytes in `span` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub span: Range<usize>,
    pub replacement: String,
}

impl Rewrite {
    pub fn new(span: Range<usize>, replacement: impl Into<String>) -> Self {
        Self {
            span,
            replacement: replacement.into(),
        }
    }
}

/// Apply `rewrites` to `content`.
///
/// Rewrites must be in document order and must not overlap. Bytes outside
/// the spans are copied through unchanged.
pub fn apply_rewrites(content: &str, rewrites: &[Rewrite]) -> EditResult<String> {
    let mut out = String::with_capacity(content.len());
    let mut cursor = 0usize;
    let mut prev: Option<&Range<usize>> = None;

    for rw in rewrites {
        let span = &rw.span;
        if span.start > span.end
            || span.end > content.len()
            || !content.is_char_boundary(span.start)
            || !content.is_char_boundary(span.end)
        {
            return Err(EditError::InvalidSpan {
                start: span.start,
                end: span.end,
                len: content.len(),
            });
        }
        if let Some(first) = prev
            && span.start < first.end
        {
            return Err(EditError::Overlap {
                first: first.clone(),
                second: span.clone(),
            });
        }

        trace!(start = span.start, end = span.end, "splice");
        out.push_str(&content[cursor..span.start]);
        out.push_str(&rw.replacement);
        cursor = span.end;
        prev = Some(span);
    }

    out.push_str(&content[cursor..]);
    Ok(out)
}

/// Unified diff of one file, in `git diff` layout. Empty when nothing changed.
pub fn render_patch(path: &Utf8Path, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("diff --git a/{0} b/{0}\n", path));
    out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", path));

    let patch = diffy::create_patch(before, after);
    let formatted = PatchFormatter::new().fmt_patch(&patch).to_string();
    // diffy repeats the header lines; keep only the hunks.
    let hunks = formatted
        .find("\n@@")
        .map(|idx| &formatted[idx + 1..])
        .unwrap_or(formatted.as_str());
    out.push_str(hunks);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Replace `path` with `bytes` via a sibling temp file and a rename.
///
/// Readers see either the old content or the new one, never a partial file.
pub fn write_atomic(path: &Utf8Path, bytes: &[u8]) -> anyhow::Result<()> {
    let tmp = temp_sibling(path);
    fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp))?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err).with_context(|| format!("replace {}", path));
    }
    Ok(())
}

fn temp_sibling(path: &Utf8Path) -> Utf8PathBuf {
    let name = path.file_name().unwrap_or("model");
    path.with_file_name(format!(".{name}.linkmend-tmp"))
}
