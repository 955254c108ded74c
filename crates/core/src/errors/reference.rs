//! Errors produced while decoding reference strings

/// Reasons a reference string could not be decoded into a locator.
///
/// Every variant except `UnknownPrefix` describes a structurally malformed
/// locator and renders with a `malformed reference` prefix.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("value does not start with a recognized reference prefix")]
    UnknownPrefix,

    #[error("malformed reference: {0}")]
    Unparseable(String),

    #[error("malformed reference: locator must start with '/'")]
    MissingLeadingSeparator,

    #[error("malformed reference: expected {expected} path segments, found {found}")]
    SegmentCount { expected: usize, found: usize },

    #[error("malformed reference: expected '{expected}' at segment {position}, found '{found}'")]
    UnexpectedSegment {
        position: usize,
        expected: &'static str,
        found: String,
    },

    #[error("malformed reference: {field} must not be empty")]
    EmptyField { field: &'static str },
}

impl ReferenceError {
    /// Whether the reference had a recognized prefix but a broken locator
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        !matches!(self, ReferenceError::UnknownPrefix)
    }
}
