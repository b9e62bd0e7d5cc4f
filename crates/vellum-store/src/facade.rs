//! [`RepositoryFacade`]: the operations a caller sees — snapshot, restore,
//! diff between two revisions, apply an externally-produced patch — layered
//! over a [`SnapshotGraph`] of opaque text and a [`Codec`] for the caller's
//! value type.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use vellum_text::PatchCodec;

use crate::codec::Codec;
use crate::compressor::BlobCompressor;
use crate::error::StoreError;
use crate::graph::SnapshotGraph;
use crate::snapshot::RevId;

/// A versioned store of `V` values, encoded to text by `Cd` and compacted
/// with `Cm`.
pub struct RepositoryFacade<V, Cd, Cm>
where
    Cd: Codec<V>,
    Cm: BlobCompressor,
{
    graph: SnapshotGraph<Cm>,
    codec: Cd,
    _value: PhantomData<V>,
}

impl<V, Cd, Cm> RepositoryFacade<V, Cd, Cm>
where
    Cd: Codec<V>,
    Cm: BlobCompressor,
{
    pub fn new(codec: Cd, graph: SnapshotGraph<Cm>) -> Self {
        Self { graph, codec, _value: PhantomData }
    }

    /// Encode `value`, append it as a new revision, and let the graph try
    /// to compact its immediate predecessor. Returns the new revision id.
    pub fn make_snapshot(&mut self, value: &V, now: DateTime<Utc>) -> Result<RevId, StoreError> {
        let text = self.codec.encode(value)?;
        self.graph.append(text, now)
    }

    /// Decode the value stored at `rev`.
    pub fn restore_snapshot(&self, rev: RevId) -> Result<V, StoreError> {
        let text = self.graph.resolve_text(rev)?;
        Ok(self.codec.decode(&text)?)
    }

    /// Apply an externally-produced patch (in the same portable patch-text
    /// format `patch_between` returns) to the latest revision, snapshot the
    /// result, and return the resulting value. Per-hunk fuzzy-apply
    /// failures are absorbed silently, matching `PatchEngine::apply`'s
    /// soft-failure contract — the caller only sees the resulting value.
    pub fn apply_patch(&mut self, patch_text: &str, now: DateTime<Utc>) -> Result<V, StoreError> {
        let latest_rev = self.graph.latest_rev().ok_or(StoreError::EmptyStore)?;
        let latest_text = self.graph.resolve_text(latest_rev)?;
        let patches = PatchCodec::from_text(patch_text)?;
        let (new_text, _results) = self.graph.patch_engine().apply(&patches, &latest_text);

        self.graph.append(new_text.clone(), now)?;
        Ok(self.codec.decode(&new_text)?)
    }

    /// Diff the texts at `rev1` and `rev2`, returning the compressed
    /// portable patch-text form (applying it to `rev1`'s text yields
    /// `rev2`'s text).
    pub fn patch_between(&self, rev1: RevId, rev2: RevId) -> Result<Vec<u8>, StoreError> {
        let text1 = self.graph.resolve_text(rev1)?;
        let text2 = self.graph.resolve_text(rev2)?;
        let patches = self.graph.patch_engine().make(&text1, &text2);
        let patch_text = PatchCodec::to_text(&patches);
        Ok(self.graph.compressor().compress(&patch_text)?)
    }

    /// The decompressed, portable patch-text form of `patch_between` —
    /// what `apply_patch` expects to receive.
    pub fn patch_between_text(&self, rev1: RevId, rev2: RevId) -> Result<String, StoreError> {
        let text1 = self.graph.resolve_text(rev1)?;
        let text2 = self.graph.resolve_text(rev2)?;
        let patches = self.graph.patch_engine().make(&text1, &text2);
        Ok(PatchCodec::to_text(&patches))
    }

    pub fn latest_rev(&self) -> Option<RevId> {
        self.graph.latest_rev()
    }

    pub fn latest_snapshot(&self) -> Result<V, StoreError> {
        let rev = self.graph.latest_rev().ok_or(StoreError::EmptyStore)?;
        self.restore_snapshot(rev)
    }

    pub fn history(&self) -> &[RevId] {
        self.graph.history()
    }

    pub fn revision_before(&self, date: DateTime<Utc>) -> Result<RevId, StoreError> {
        self.graph.revision_before(date)
    }

    /// Total storage footprint across all snapshots. For interoperability,
    /// prefer `|patch_between_text(...)|` over this for judging an
    /// externally exchanged patch's size: this figure is computed against
    /// each snapshot's compressed form, which is only ever meaningful
    /// within one store's choice of `BlobCompressor`.
    pub fn size(&self) -> usize {
        self.graph.size()
    }

    /// Run the graph's offline delta-compaction optimization pass.
    pub fn optimize(&mut self) -> Result<(), StoreError> {
        self.graph.optimize()
    }

    pub fn graph(&self) -> &SnapshotGraph<Cm> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PlainTextCodec;
    use crate::compressor::NoopCompressor;
    use vellum_text::{DiffEngine, DiffOptions, MatchEngine, MatchOptions, PatchEngine, PatchOptions};

    fn repo() -> RepositoryFacade<String, PlainTextCodec, NoopCompressor> {
        let patch_engine = PatchEngine::new(
            DiffEngine::new(DiffOptions::default()),
            MatchEngine::new(MatchOptions::default()),
            32,
            PatchOptions::default(),
        );
        let graph = SnapshotGraph::new(NoopCompressor, patch_engine);
        RepositoryFacade::new(PlainTextCodec, graph)
    }

    #[test]
    fn delta_compaction_scenario_restores_and_applies_correctly() {
        let mut repo = repo();
        let s1 = "Wow".to_string();
        let s2 = "World of Warcraft".to_string();
        let s3 = format!("{s2}\n2");
        let s4 = format!("{s2}\n3");
        let s5 = "Wow\n3".to_string();

        let rev1 = repo.make_snapshot(&s1, Utc::now()).unwrap();
        let rev2 = repo.make_snapshot(&s2, Utc::now()).unwrap();
        let _rev3 = repo.make_snapshot(&s3, Utc::now()).unwrap();
        let _rev4 = repo.make_snapshot(&s4, Utc::now()).unwrap();
        let _rev5 = repo.make_snapshot(&s5, Utc::now()).unwrap();

        assert_eq!(repo.restore_snapshot(rev1).unwrap(), "Wow");

        // patch_between(s1, s2) carries "Wow" -> "World of Warcraft" with
        // context; fuzzy-applied against the current latest (s5, which also
        // contains "Wow") it rewrites just that occurrence, landing on s4.
        let patch_text = repo.patch_between_text(rev1, rev2).unwrap();
        let applied = repo.apply_patch(&patch_text, Utc::now()).unwrap();
        assert_eq!(applied, s4);
        assert_eq!(repo.latest_snapshot().unwrap(), s4);
    }

    #[test]
    fn restore_of_unknown_revision_fails() {
        let repo = repo();
        let bogus = crate::snapshot::RevId::of("never snapshotted");
        assert!(matches!(repo.restore_snapshot(bogus), Err(StoreError::RevisionNotFound(_))));
    }

    #[test]
    fn latest_snapshot_reflects_most_recent_append() {
        let mut repo = repo();
        repo.make_snapshot(&"first".to_string(), Utc::now()).unwrap();
        repo.make_snapshot(&"second".to_string(), Utc::now()).unwrap();
        assert_eq!(repo.latest_snapshot().unwrap(), "second");
    }
}
