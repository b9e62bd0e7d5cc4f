//! Error kinds for the text engine.

use thiserror::Error;

/// The only error kind the text engine can raise on its own.
///
/// Algorithmic degradations — a bisect timeout, a skipped half-match, a
/// partial fuzzy apply — are documented quality reductions, not errors; they
/// never surface through this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DmpError {
    /// An input was absent (in the sense of malformed/unusable) or an
    /// encoded representation (a delta token, a patch header) could not be
    /// parsed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DmpError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }
}
