//! End-to-end scenarios against the public `RepositoryFacade` API.

use chrono::{DateTime, Utc};
use vellum_store::{
    JsonCodec, NoopCompressor, PlainTextCodec, RepositoryFacade, RunLengthCompressor, SnapshotGraph,
};
use vellum_text::{DiffEngine, DiffOptions, MatchEngine, MatchOptions, PatchEngine, PatchOptions};

fn patch_engine() -> PatchEngine {
    PatchEngine::new(
        DiffEngine::new(DiffOptions::default()),
        MatchEngine::new(MatchOptions::default()),
        32,
        PatchOptions::default(),
    )
}

fn text_repo() -> RepositoryFacade<String, PlainTextCodec, RunLengthCompressor> {
    let graph = SnapshotGraph::new(RunLengthCompressor, patch_engine());
    RepositoryFacade::new(PlainTextCodec, graph)
}

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

#[test]
fn delta_compaction_survives_restore_and_fuzzy_apply() {
    let mut repo = text_repo();
    let s1 = "Wow".to_string();
    let s2 = "World of Warcraft".to_string();
    let s3 = format!("{s2}\n2");
    let s4 = format!("{s2}\n3");
    let s5 = "Wow\n3".to_string();

    let rev1 = repo.make_snapshot(&s1, at("2026-01-01T00:00:00Z")).unwrap();
    let rev2 = repo.make_snapshot(&s2, at("2026-01-02T00:00:00Z")).unwrap();
    repo.make_snapshot(&s3, at("2026-01-03T00:00:00Z")).unwrap();
    repo.make_snapshot(&s4, at("2026-01-04T00:00:00Z")).unwrap();
    repo.make_snapshot(&s5, at("2026-01-05T00:00:00Z")).unwrap();

    assert_eq!(repo.restore_snapshot(rev1).unwrap(), s1);
    assert_eq!(repo.restore_snapshot(rev2).unwrap(), s2);

    let patch_text = repo.patch_between_text(rev1, rev2).unwrap();
    let applied = repo.apply_patch(&patch_text, at("2026-01-06T00:00:00Z")).unwrap();
    assert_eq!(applied, s4);
    assert_eq!(repo.latest_snapshot().unwrap(), s4);

    for &rev in repo.history() {
        assert!(repo.restore_snapshot(rev).is_ok());
    }
}

#[test]
fn revision_before_a_given_date_finds_the_latest_eligible_snapshot() {
    let mut repo = text_repo();
    let rev1 = repo.make_snapshot(&"one".to_string(), at("2026-01-01T00:00:00Z")).unwrap();
    let rev2 = repo.make_snapshot(&"two".to_string(), at("2026-01-02T00:00:00Z")).unwrap();
    repo.make_snapshot(&"three".to_string(), at("2026-01-03T00:00:00Z")).unwrap();

    assert_eq!(repo.revision_before(at("2026-01-02T12:00:00Z")).unwrap(), rev2);
    assert_eq!(repo.revision_before(at("2026-01-01T00:00:00Z")).unwrap(), rev1);
    assert!(repo.revision_before(at("2025-12-31T00:00:00Z")).is_err());
}

#[test]
fn json_codec_round_trips_structured_values_through_the_graph() {
    #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug, Clone)]
    struct Doc {
        title: String,
        body: String,
        version: u32,
    }

    let graph = SnapshotGraph::new(NoopCompressor, patch_engine());
    let mut repo: RepositoryFacade<Doc, JsonCodec<Doc>, NoopCompressor> =
        RepositoryFacade::new(JsonCodec::new(), graph);

    let v1 = Doc { title: "Draft".into(), body: "Once upon a time".into(), version: 1 };
    let v2 = Doc { title: "Draft".into(), body: "Once upon a midnight".into(), version: 2 };

    let rev1 = repo.make_snapshot(&v1, Utc::now()).unwrap();
    let rev2 = repo.make_snapshot(&v2, Utc::now()).unwrap();

    assert_eq!(repo.restore_snapshot(rev1).unwrap(), v1);
    assert_eq!(repo.restore_snapshot(rev2).unwrap(), v2);
}

#[test]
fn optimize_shrinks_or_preserves_total_size_without_breaking_resolution() {
    let mut repo = text_repo();
    for i in 0..8 {
        let text = format!("chapter one shared boilerplate, revision {i}, more shared boilerplate text");
        repo.make_snapshot(&text, Utc::now()).unwrap();
    }
    let before = repo.size();
    repo.optimize().unwrap();
    let after = repo.size();
    assert!(after <= before);

    for &rev in repo.history() {
        assert!(repo.restore_snapshot(rev).is_ok());
    }
}
