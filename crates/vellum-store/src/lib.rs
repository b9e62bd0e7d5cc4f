//! An in-memory revision store for serializable values: successive
//! snapshots, on-demand reconstruction of any prior snapshot, and portable
//! patch exchange between stores. Older snapshots are rewritten as reverse
//! deltas against newer ones whenever that shrinks total storage.
//!
//! Built on [`vellum_text`] for the diff/match/patch engine. The caller
//! supplies a [`Codec`] for their value type and a [`BlobCompressor`] for
//! the delta payloads; [`RepositoryFacade`] ties them to a
//! [`SnapshotGraph`].

mod blob_store;
mod codec;
mod compressor;
mod error;
mod facade;
mod graph;
mod snapshot;

pub use blob_store::{BlobStore, BlobStoreError};
pub use codec::{Codec, CodecError, JsonCodec, PlainTextCodec};
pub use compressor::{BlobCompressor, CompressorError, NoopCompressor, RunLengthCompressor};
pub use error::StoreError;
pub use facade::RepositoryFacade;
pub use graph::{SnapshotGraph, NEAREST_RANGE};
pub use snapshot::{RevId, Snapshot, SnapshotBody};
