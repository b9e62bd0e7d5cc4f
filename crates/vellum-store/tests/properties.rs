//! Properties of the snapshot graph that should hold for any sequence of
//! appended texts, independent of which particular strings they are.

use chrono::Utc;
use proptest::prelude::*;
use vellum_store::{NoopCompressor, RevId, SnapshotGraph};
use vellum_text::{DiffEngine, DiffOptions, MatchEngine, MatchOptions, PatchEngine, PatchOptions};

fn patch_engine() -> PatchEngine {
    PatchEngine::new(
        DiffEngine::new(DiffOptions::default()),
        MatchEngine::new(MatchOptions::default()),
        32,
        PatchOptions::default(),
    )
}

fn arb_texts() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Z0-9 .,\n]{0,30}", 1..8)
}

proptest! {
    #[test]
    fn every_appended_revision_resolves_to_text_hashing_back_to_its_own_id(texts in arb_texts()) {
        let mut graph = SnapshotGraph::new(NoopCompressor, patch_engine());
        for t in &texts {
            graph.append(t.clone(), Utc::now()).unwrap();
        }
        for &rev in graph.history() {
            let resolved = graph.resolve_text(rev).unwrap();
            prop_assert_eq!(RevId::of(&resolved), rev);
        }
    }

    #[test]
    fn optimize_never_increases_total_size_and_preserves_resolution(texts in arb_texts()) {
        let mut graph = SnapshotGraph::new(NoopCompressor, patch_engine());
        for t in &texts {
            graph.append(t.clone(), Utc::now()).unwrap();
        }
        let before = graph.size();
        graph.optimize().unwrap();
        prop_assert!(graph.size() <= before);
        for &rev in graph.history() {
            let resolved = graph.resolve_text(rev).unwrap();
            prop_assert_eq!(RevId::of(&resolved), rev);
        }
    }
}
