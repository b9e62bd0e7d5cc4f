//! [`SnapshotGraph`]: an append-only history of revisions, each a
//! [`Snapshot`] that is either the full text or a reverse delta pointing
//! forward to a newer revision whose resolved text it patches against.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;
use vellum_text::{PatchCodec, PatchEngine};

use crate::compressor::BlobCompressor;
use crate::error::StoreError;
use crate::snapshot::{RevId, Snapshot, SnapshotBody};

/// How many subsequent revisions the offline optimization pass considers as
/// a rewrite target for a given revision.
pub const NEAREST_RANGE: usize = 12;

/// The revision graph: `history` gives the append order; `snapshots` maps
/// each `RevId` to its stored body. Every `Delta`'s `future_rev` names an
/// entry later in `history`, so the forward chain is acyclic by
/// construction and always terminates at the final, always-`Complete`
/// entry.
pub struct SnapshotGraph<C: BlobCompressor> {
    history: Vec<RevId>,
    snapshots: HashMap<RevId, Snapshot>,
    compressor: C,
    patch_engine: PatchEngine,
}

impl<C: BlobCompressor> SnapshotGraph<C> {
    pub fn new(compressor: C, patch_engine: PatchEngine) -> Self {
        Self { history: Vec::new(), snapshots: HashMap::new(), compressor, patch_engine }
    }

    pub fn history(&self) -> &[RevId] {
        &self.history
    }

    pub fn latest_rev(&self) -> Option<RevId> {
        self.history.last().copied()
    }

    pub fn compressor(&self) -> &C {
        &self.compressor
    }

    pub fn patch_engine(&self) -> &PatchEngine {
        &self.patch_engine
    }

    fn snapshot(&self, rev: RevId) -> Result<&Snapshot, StoreError> {
        self.snapshots.get(&rev).ok_or(StoreError::RevisionNotFound(rev))
    }

    /// Append `text` as a new `Complete` revision, then try to shrink the
    /// immediate predecessor by rewriting it as a reverse delta against
    /// this one. Compaction never fails the append: if it can't beat the
    /// predecessor's current size, the predecessor is left untouched.
    pub fn append(&mut self, text: String, now: DateTime<Utc>) -> Result<RevId, StoreError> {
        let rev = RevId::of(&text);
        self.snapshots.insert(rev, Snapshot::complete(rev, now, text.clone()));
        self.history.push(rev);

        if self.history.len() > 1 {
            let prev = self.history[self.history.len() - 2];
            if prev != rev {
                self.try_compact(prev, rev, &text)?;
            }
        }

        Ok(rev)
    }

    /// Rewrites `prev`'s snapshot as `Delta{future_rev: rev, ...}` if the
    /// compressed reverse patch is smaller than `prev`'s current footprint.
    fn try_compact(&mut self, prev: RevId, rev: RevId, new_text: &str) -> Result<(), StoreError> {
        let prev_text = self.resolve_text(prev)?;
        let prev_size = self.snapshot(prev)?.byte_size();
        let prev_created_at = self.snapshot(prev)?.created_at;

        let patches = self.patch_engine.make(new_text, &prev_text);
        let patch_text = PatchCodec::to_text(&patches);
        let compressed = self.compressor.compress(&patch_text)?;

        if compressed.len() < prev_size {
            debug!(%prev, %rev, old_size = prev_size, new_size = compressed.len(), "compacted predecessor into reverse delta");
            self.snapshots.insert(prev, Snapshot::delta(prev, prev_created_at, rev, compressed));
        }

        Ok(())
    }

    /// Resolve `rev` to its full text, walking forward through any chain of
    /// `Delta`s to the nearest `Complete` and applying patches back down.
    pub fn resolve_text(&self, rev: RevId) -> Result<String, StoreError> {
        let snapshot = self.snapshot(rev)?;
        match &snapshot.body {
            SnapshotBody::Complete { text } => Ok(text.clone()),
            SnapshotBody::Delta { future_rev, compressed_patch } => {
                let future_text = self.resolve_text(*future_rev)?;
                let patch_text = self.compressor.decompress(compressed_patch)?;
                let patches = PatchCodec::from_text(&patch_text)?;
                let (applied, _results) = self.patch_engine.apply(&patches, &future_text);
                Ok(applied)
            }
        }
    }

    /// The last revision in `history` whose `created_at <= date`.
    pub fn revision_before(&self, date: DateTime<Utc>) -> Result<RevId, StoreError> {
        self.history
            .iter()
            .rev()
            .find(|rev| self.snapshots.get(rev).is_some_and(|s| s.created_at <= date))
            .copied()
            .ok_or(StoreError::NoRevisionBeforeDate)
    }

    /// Total storage footprint across all snapshots.
    pub fn size(&self) -> usize {
        self.snapshots.values().map(Snapshot::byte_size).sum()
    }

    /// Offline pass: for each revision, consider rewriting it as a `Delta`
    /// against any of the next `NEAREST_RANGE - 1` revisions in `history`
    /// (insertion order, never hash-map iteration order), adopting
    /// whichever candidate yields the smallest snapshot strictly smaller
    /// than the current one.
    pub fn optimize(&mut self) -> Result<(), StoreError> {
        for i in 0..self.history.len() {
            let rev = self.history[i];
            let current_size = self.snapshot(rev)?.byte_size();
            let current_text = self.resolve_text(rev)?;

            let upper = (i + NEAREST_RANGE).min(self.history.len());
            let mut best: Option<(RevId, Vec<u8>, usize)> = None;

            for &target in &self.history[i + 1..upper] {
                let target_text = self.resolve_text(target)?;
                let patches = self.patch_engine.make(&current_text, &target_text);
                let patch_text = PatchCodec::to_text(&patches);
                let compressed = self.compressor.compress(&patch_text)?;
                let candidate_size = compressed.len();

                let better = match &best {
                    Some((_, _, best_size)) => candidate_size < *best_size,
                    None => candidate_size < current_size,
                };
                if better {
                    best = Some((target, compressed, candidate_size));
                }
            }

            if let Some((target, compressed, _)) = best {
                let created_at = self.snapshot(rev)?.created_at;
                debug!(%rev, %target, "optimization pass rewrote revision as a delta");
                self.snapshots.insert(rev, Snapshot::delta(rev, created_at, target, compressed));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::NoopCompressor;
    use vellum_text::{DiffEngine, DiffOptions, MatchEngine, MatchOptions, PatchOptions};

    fn patch_engine() -> PatchEngine {
        PatchEngine::new(
            DiffEngine::new(DiffOptions::default()),
            MatchEngine::new(MatchOptions::default()),
            32,
            PatchOptions::default(),
        )
    }

    #[test]
    fn single_append_is_complete_and_resolves_to_its_own_text() {
        let mut graph = SnapshotGraph::new(NoopCompressor, patch_engine());
        let rev = graph.append("hello".to_string(), Utc::now()).unwrap();
        assert_eq!(graph.resolve_text(rev).unwrap(), "hello");
        assert!(graph.snapshot(rev).unwrap().is_complete());
    }

    #[test]
    fn every_revision_in_history_resolves_to_text_whose_hash_is_its_own_rev() {
        let mut graph = SnapshotGraph::new(NoopCompressor, patch_engine());
        let texts = ["alpha", "alpha beta", "alpha beta gamma", "alpha beta gamma delta"];
        for t in texts {
            graph.append(t.to_string(), Utc::now()).unwrap();
        }
        for &rev in graph.history() {
            let text = graph.resolve_text(rev).unwrap();
            assert_eq!(RevId::of(&text), rev);
        }
    }

    #[test]
    fn revision_before_finds_the_latest_snapshot_not_after_the_date() {
        let mut graph = SnapshotGraph::new(NoopCompressor, patch_engine());
        let t1 = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let t2 = DateTime::parse_from_rfc3339("2026-01-02T00:00:00Z").unwrap().with_timezone(&Utc);
        let t3 = DateTime::parse_from_rfc3339("2026-01-03T00:00:00Z").unwrap().with_timezone(&Utc);
        let between = DateTime::parse_from_rfc3339("2026-01-02T12:00:00Z").unwrap().with_timezone(&Utc);

        let rev1 = graph.append("one".to_string(), t1).unwrap();
        let rev2 = graph.append("two".to_string(), t2).unwrap();
        let _rev3 = graph.append("three".to_string(), t3).unwrap();

        assert_eq!(graph.revision_before(between).unwrap(), rev2);
        let _ = rev1;
    }

    #[test]
    fn revision_before_fails_when_every_snapshot_postdates_the_query() {
        let mut graph = SnapshotGraph::new(NoopCompressor, patch_engine());
        let later = DateTime::parse_from_rfc3339("2026-01-02T00:00:00Z").unwrap().with_timezone(&Utc);
        let earlier = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        graph.append("only".to_string(), later).unwrap();
        assert!(matches!(graph.revision_before(earlier), Err(StoreError::NoRevisionBeforeDate)));
    }

    #[test]
    fn size_never_exceeds_sum_of_complete_texts() {
        let mut graph = SnapshotGraph::new(NoopCompressor, patch_engine());
        let texts = ["The quick brown fox", "The quick brown fox jumps", "The quick brown fox jumps over the dog"];
        let naive_total: usize = texts.iter().map(|t| t.len()).sum();
        for t in texts {
            graph.append(t.to_string(), Utc::now()).unwrap();
        }
        assert!(graph.size() <= naive_total);
    }

    #[test]
    fn optimize_never_breaks_resolution() {
        let mut graph = SnapshotGraph::new(NoopCompressor, patch_engine());
        for i in 0..5 {
            graph.append(format!("revision number {i} with shared boilerplate text"), Utc::now()).unwrap();
        }
        graph.optimize().unwrap();
        for &rev in graph.history() {
            let text = graph.resolve_text(rev).unwrap();
            assert_eq!(RevId::of(&text), rev);
        }
    }
}
