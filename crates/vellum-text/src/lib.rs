//! Character-level text diffing, fuzzy matching, and patching.
//!
//! [`DiffEngine`] computes [`EditScript`]s between two strings. [`MatchEngine`]
//! locates an approximate substring match. [`PatchEngine`] builds localized,
//! relocatable [`Patch`] hunks from a diff and re-applies them against drifted
//! text. [`delta`] and [`patch_codec`] give each of those a compact textual
//! form for transport or storage.
//!
//! Every offset in every type here is a `char` offset, never a byte offset.

mod cleanup;
mod delta;
mod diff;
mod error;
mod match_engine;
mod op;
mod patch;
mod patch_codec;
mod percent;

pub use cleanup::{boundary_score, cleanup_efficiency, cleanup_merge, cleanup_semantic, cleanup_semantic_lossless};
pub use delta::{from_delta, to_delta};
pub use diff::{DiffEngine, DiffOptions};
pub use error::DmpError;
pub use match_engine::{MatchEngine, MatchOptions};
pub use op::{Edit, EditScript, EditScriptExt, Op, Patch, PatchList};
pub use patch::{PatchEngine, PatchOptions};
pub use patch_codec::PatchCodec;
