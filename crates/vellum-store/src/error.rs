//! Error kinds for the revision store.

use thiserror::Error;

use crate::snapshot::RevId;

/// Failures the store can report to a caller.
///
/// `PatchUnapplicable` from the conceptual error table has no variant here:
/// a patch apply failure is soft and reported per-hunk through the
/// `Vec<bool>` half of the `(String, Vec<bool>)` tuple
/// [`vellum_text::PatchEngine::apply`] returns, never as an `Err`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `rev` is not a key of the snapshot graph.
    #[error("revision not found: {0}")]
    RevisionNotFound(RevId),
    /// No revision in `history` has `created_at <= date`.
    #[error("no revision before the requested date")]
    NoRevisionBeforeDate,
    /// The store has no snapshots at all yet.
    #[error("store has no snapshots yet")]
    EmptyStore,
    /// The external value codec failed to encode or decode.
    #[error("codec failure: {0}")]
    Codec(#[from] crate::codec::CodecError),
    /// The external blob compressor failed to encode or decode.
    #[error("compressor failure: {0}")]
    Compressor(#[from] crate::compressor::CompressorError),
    /// The text engine rejected a malformed delta or patch-text blob.
    #[error("diff engine failure: {0}")]
    Diff(#[from] vellum_text::DmpError),
}
