//! Error types for linkmend-edit.

use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    /// A rewrite span reaches past the end of the content or splits a character.
    #[error("rewrite span {start}..{end} is not a valid range of {len}-byte content")]
    InvalidSpan { start: usize, end: usize, len: usize },

    /// Two rewrites touch the same bytes, or were not given in document order.
    #[error("rewrite span {second:?} overlaps or precedes {first:?}")]
    Overlap {
        first: Range<usize>,
        second: Range<usize>,
    },
}

pub type EditResult<T> = Result<T, EditError>;

#[cfg(test)]
mod tests {
    use super::EditError;

    #[test]
    fn overlap_display_names_both_spans() {
        let err = EditError::Overlap {
            first: 2..6,
            second: 4..8,
        };
        let msg = err.to_string();
        assert!(msg.contains("4..8"));
        assert!(msg.contains("2..6"));
    }
}
