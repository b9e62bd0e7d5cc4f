//! End-to-end scenarios exercising the public API as a caller would.

use vellum_text::{
    from_delta, to_delta, DiffEngine, DiffOptions, Edit, MatchEngine, MatchOptions, PatchEngine, PatchOptions,
};

fn patch_engine() -> PatchEngine {
    PatchEngine::new(
        DiffEngine::new(DiffOptions::default()),
        MatchEngine::new(MatchOptions::default()),
        32,
        PatchOptions::default(),
    )
}

#[test]
fn fuzzy_apply_against_a_drifted_source() {
    let engine = patch_engine();
    let text1 = "The quick brown fox jumps over the lazy dog.";
    let text2 = "That quick brown fox jumped over a lazy dog.";
    let patches = engine.make(text1, text2);

    let drifted = "The quick red rabbit jumps over the tired tiger.";
    let (result, applied) = engine.apply(&patches, drifted);

    assert_eq!(result, "That quick red rabbit jumped over a tired tiger.");
    assert_eq!(applied, vec![true, true]);
}

#[test]
fn unicode_delta_round_trip() {
    let script = vec![
        Edit::equal("\u{0680} \u{0000} \t %"),
        Edit::delete("\u{0681} \u{0001} \n ^"),
        Edit::insert("\u{0682} \u{0002} \\ |"),
    ];
    let delta = to_delta(&script);
    assert_eq!(delta, "=7\t-7\t+%DA%82 %02 %5C %7C");

    use vellum_text::EditScriptExt;
    let text1 = script.text1();
    let reconstructed = from_delta(&text1, &delta).unwrap();
    assert_eq!(reconstructed, script);
}

#[test]
fn patch_text_matches_the_canonical_rendering() {
    use vellum_text::PatchCodec;

    let engine = patch_engine();
    let text1 = "The quick brown fox jumps over the lazy dog.";
    let text2 = "That quick brown fox jumped over a lazy dog.";
    let patches = engine.make(text1, text2);
    let rendered = PatchCodec::to_text(&patches);

    assert_eq!(
        rendered,
        "@@ -1,11 +1,12 @@\n Th\n-e\n+at\n  quick b\n@@ -22,18 +22,17 @@\n jump\n-s\n+ed\n  over \n-the\n+a\n  laz\n"
    );
}

#[test]
fn oversized_deletion_is_split_into_several_relocatable_patches() {
    let engine = PatchEngine::new(
        DiffEngine::new(DiffOptions::default()),
        MatchEngine::new(MatchOptions { match_max_bits: 32, ..MatchOptions::default() }),
        32,
        PatchOptions::default(),
    );

    let x = format!("{}9012", "1234567890123456789012345678");
    let y = String::new();
    let patches = engine.make(&x, &y);

    assert!(patches.len() >= 3);

    use vellum_text::PatchCodec;
    let rendered = PatchCodec::to_text(&patches);
    assert!(rendered.starts_with("@@ -1,32 +1,4 @@\n-1234567890123456789012345678\n 9012\n"));
}

#[test]
fn apply_round_trip_matches_after_patch_text_serialization() {
    use vellum_text::PatchCodec;

    let engine = patch_engine();
    let text1 = "alpha\nbeta\ngamma\ndelta\n".repeat(4);
    let mut text2 = text1.clone();
    text2 = text2.replacen("beta", "BETA", 1);

    let patches = engine.make(&text1, &text2);
    let rendered = PatchCodec::to_text(&patches);
    let reparsed = PatchCodec::from_text(&rendered).unwrap();

    let direct = engine.apply(&patches, &text1);
    let via_text = engine.apply(&reparsed, &text1);
    assert_eq!(direct, via_text);
}
