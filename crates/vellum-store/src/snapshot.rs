//! [`RevId`] and [`Snapshot`]: the keyed, timestamped values a
//! [`crate::graph::SnapshotGraph`] stores.

use std::fmt;

use chrono::{DateTime, Utc};
use sha1::{Digest, Sha1};

/// A revision fingerprint: the hex-lowercase SHA-1 of a snapshot's
/// Codec-encoded text. Two snapshots with byte-equal encoded text share a
/// `RevId`, by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RevId([u8; 20]);

impl RevId {
    /// Hash `text`'s UTF-8 bytes into a revision id.
    pub fn of(text: &str) -> Self {
        let digest = Sha1::digest(text.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for RevId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// A value the [`crate::graph::SnapshotGraph`] keeps under a [`RevId`]: the
/// full text (`Complete`) or a patch that reconstructs it from a newer
/// snapshot's text (`Delta`). Shares no state between the two bodies beyond
/// `revision` and `created_at`.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub revision: RevId,
    pub created_at: DateTime<Utc>,
    pub body: SnapshotBody,
}

#[derive(Debug, Clone)]
pub enum SnapshotBody {
    /// The full, directly decodable text.
    Complete { text: String },
    /// A compressed, serialized patch that reconstructs this snapshot's
    /// text when applied to `future_rev`'s resolved text.
    Delta { future_rev: RevId, compressed_patch: Vec<u8> },
}

impl Snapshot {
    pub fn complete(revision: RevId, created_at: DateTime<Utc>, text: String) -> Self {
        Self { revision, created_at, body: SnapshotBody::Complete { text } }
    }

    pub fn delta(
        revision: RevId,
        created_at: DateTime<Utc>,
        future_rev: RevId,
        compressed_patch: Vec<u8>,
    ) -> Self {
        Self { revision, created_at, body: SnapshotBody::Delta { future_rev, compressed_patch } }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.body, SnapshotBody::Complete { .. })
    }

    /// Storage footprint used by `size()` and the compaction size check:
    /// `|text|` for a `Complete`, `|compressed_patch|` for a `Delta`.
    pub fn byte_size(&self) -> usize {
        match &self.body {
            SnapshotBody::Complete { text } => text.len(),
            SnapshotBody::Delta { compressed_patch, .. } => compressed_patch.len(),
        }
    }
}
