use thiserror::Error;

/// A model whose markup is too damaged to rewrite safely.
///
/// The fixer never writes a model that produced one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelParseError {
    #[error("unterminated {construct} starting at byte {offset}")]
    Unterminated {
        construct: &'static str,
        offset: usize,
    },

    #[error("malformed tag at byte {offset}")]
    MalformedTag { offset: usize },

    #[error("unterminated value of attribute '{attribute}' starting at byte {offset}")]
    UnterminatedAttribute { attribute: String, offset: usize },

    #[error("<{element}> link element opened at byte {offset} is never closed")]
    UnclosedLinkElement { element: String, offset: usize },
}

impl ModelParseError {
    /// Byte offset the problem was detected at.
    pub fn offset(&self) -> usize {
        match self {
            ModelParseError::Unterminated { offset, .. }
            | ModelParseError::MalformedTag { offset }
            | ModelParseError::UnterminatedAttribute { offset, .. }
            | ModelParseError::UnclosedLinkElement { offset, .. } => *offset,
        }
    }
}
