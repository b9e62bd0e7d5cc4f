//! The `BlobStore` external-collaborator boundary: persisting an entire
//! store to a container format. Out of scope for the core (see the crate
//! root docs) — this module only fixes the interface shape a host would
//! implement against; no adapter ships here.

use thiserror::Error;

/// Saves and loads an opaque byte-serialized store snapshot. A concrete
/// implementation (a file on disk, an object store, ...) is the caller's
/// responsibility, not the core's.
pub trait BlobStore {
    fn save(&self, bytes: &[u8]) -> Result<(), BlobStoreError>;
    fn load(&self) -> Result<Vec<u8>, BlobStoreError>;
}

#[derive(Debug, Error)]
#[error("blob store error: {0}")]
pub struct BlobStoreError(pub String);
