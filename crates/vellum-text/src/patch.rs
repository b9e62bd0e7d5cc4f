//! Localized patches: computing them from two texts or an edit script,
//! adding surrounding context, padding/splitting for `apply`'s fuzzy
//! relocation, and applying them back onto a (possibly drifted) text.

use crate::cleanup::{cleanup_efficiency, cleanup_semantic, cleanup_semantic_lossless};
use crate::diff::DiffEngine;
use crate::match_engine::MatchEngine;
use crate::op::{Edit, EditScriptExt, Op, Patch, PatchList};

/// Tunables for [`PatchEngine`].
#[derive(Debug, Clone, Copy)]
pub struct PatchOptions {
    /// Chars of context kept on each side of a patch, and the unit `make`
    /// uses to decide whether a short equality is worth splitting a patch
    /// over.
    pub patch_margin: usize,
    /// When `apply` must re-diff a patch's expected text against what it
    /// actually found, a normalized Levenshtein distance above this
    /// fraction makes the hunk's partial application fail outright rather
    /// than apply a barely-related rewrite.
    pub patch_delete_threshold: f64,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self { patch_margin: 4, patch_delete_threshold: 0.5 }
    }
}

/// Builds and applies [`Patch`] hunks.
#[derive(Debug, Clone)]
pub struct PatchEngine {
    diff: DiffEngine,
    match_engine: MatchEngine,
    match_max_bits: usize,
    options: PatchOptions,
}

impl PatchEngine {
    pub fn new(diff: DiffEngine, match_engine: MatchEngine, match_max_bits: usize, options: PatchOptions) -> Self {
        Self { diff, match_engine, match_max_bits, options }
    }

    /// Diff `text1` against `text2`, then build a patch list from the
    /// result. For non-trivial scripts this first runs `cleanup_semantic`
    /// and `cleanup_efficiency`, since a patch built straight off the raw
    /// bisect output tends to fragment into more hunks than necessary.
    pub fn make(&self, text1: &str, text2: &str) -> PatchList {
        let mut script = self.diff.diff(text1, text2, true);
        if script.len() > 2 {
            cleanup_semantic(&mut script);
            cleanup_efficiency(&mut script, self.diff.options().edit_cost);
        }
        self.make_from_script(text1, &script)
    }

    /// Build a patch list from an already-computed edit script against its
    /// source text.
    pub fn make_from_script(&self, text1: &str, script: &[Edit]) -> PatchList {
        let mut patches = PatchList::new();
        if script.is_empty() {
            return patches;
        }

        let text1_chars: Vec<char> = text1.chars().collect();
        let mut patch = Patch::empty();
        let mut char_count1 = 0usize;
        let mut char_count2 = 0usize;
        let mut prepatch_text: Vec<char> = text1_chars.clone();
        let mut postpatch_text: Vec<char> = text1_chars;

        for (i, edit) in script.iter().enumerate() {
            if patch.edits.is_empty() && edit.op != Op::Equal {
                patch.start1 = char_count1;
                patch.start2 = char_count2;
            }

            match edit.op {
                Op::Insert => {
                    patch.edits.push(edit.clone());
                    patch.length2 += edit.char_len();
                    splice_chars(&mut postpatch_text, char_count2, 0, &edit.text);
                }
                Op::Delete => {
                    patch.length1 += edit.char_len();
                    patch.edits.push(edit.clone());
                    let removed = edit.char_len();
                    splice_chars_remove(&mut postpatch_text, char_count2, removed);
                }
                Op::Equal => {
                    let margin2 = 2 * self.options.patch_margin;
                    if edit.char_len() <= margin2 && !patch.edits.is_empty() && i + 1 != script.len() {
                        patch.edits.push(edit.clone());
                        patch.length1 += edit.char_len();
                        patch.length2 += edit.char_len();
                    }
                    if edit.char_len() >= margin2 && !patch.edits.is_empty() {
                        self.add_context(&mut patch, &prepatch_text);
                        patches.push(std::mem::replace(&mut patch, Patch::empty()));
                        prepatch_text = postpatch_text.clone();
                        char_count1 = char_count2;
                    }
                }
            }

            if edit.op != Op::Insert {
                char_count1 += edit.char_len();
            }
            if edit.op != Op::Delete {
                char_count2 += edit.char_len();
            }
        }

        if !patch.edits.is_empty() {
            self.add_context(&mut patch, &prepatch_text);
            patches.push(patch);
        }

        patches
    }

    /// Extends a patch's edits with surrounding equal context from `text`
    /// (up to `patch_margin` chars each side, widened if the immediate
    /// context string is ambiguous — appears more than once in `text`).
    fn add_context(&self, patch: &mut Patch, text: &[char]) {
        if text.is_empty() {
            return;
        }

        let mut padding = 0usize;
        let slice_of = |start: isize, len: usize| -> Vec<char> {
            let start = start.max(0) as usize;
            let end = (start + len).min(text.len());
            if start >= end {
                Vec::new()
            } else {
                text[start..end].to_vec()
            }
        };

        let mut pattern = slice_of(patch.start2 as isize, patch.length1);
        while count_occurrences(text, &pattern) > 1
            && pattern.len() < self.match_max_bits.saturating_sub(2 * self.options.patch_margin)
        {
            padding += self.options.patch_margin;
            pattern = slice_of(
                patch.start2 as isize - padding as isize,
                patch.length1 + 2 * padding,
            );
            if pattern.is_empty() {
                break;
            }
        }
        padding += self.options.patch_margin;

        let prefix_len = padding.min(patch.start2);
        let prefix_start = patch.start2 - prefix_len;
        let prefix_end = patch.start2.min(text.len());
        let prefix: Vec<char> =
            if prefix_start < prefix_end { text[prefix_start..prefix_end].to_vec() } else { Vec::new() };

        if !prefix.is_empty() {
            patch.edits.insert(0, Edit::equal(prefix.iter().collect::<String>()));
        }

        let suffix_start = (patch.start2 + patch.length1).min(text.len());
        let suffix_end = (suffix_start + padding).min(text.len());
        let suffix: Vec<char> = text[suffix_start..suffix_end].to_vec();
        if !suffix.is_empty() {
            patch.edits.push(Edit::equal(suffix.iter().collect::<String>()));
        }

        patch.start1 -= prefix.len();
        patch.start2 -= prefix.len();
        patch.length1 += prefix.len() + suffix.len();
        patch.length2 += prefix.len() + suffix.len();
    }

    /// Apply `patches` to `text`, relocating each hunk by fuzzy match when
    /// its recorded offset has drifted. Never fails outright: returns the
    /// resulting text alongside one bool per patch recording whether that
    /// hunk applied.
    pub fn apply(&self, patches: &PatchList, text: &str) -> (String, Vec<bool>) {
        if patches.is_empty() {
            return (text.to_string(), Vec::new());
        }

        let mut patches = patches.to_vec();
        let null_padding = self.add_padding(&mut patches);
        let mut chars: Vec<char> = null_padding.chars().chain(text.chars()).chain(null_padding.chars()).collect();
        self.split_max(&mut patches);

        let mut delta: isize = 0;
        let mut results = Vec::with_capacity(patches.len());

        for patch in &patches {
            let expected_loc = (patch.start2 as isize + delta).max(0) as usize;
            let text1 = patch.edits.text1();
            let text1_chars: Vec<char> = text1.chars().collect();

            let mut end_loc: Option<usize> = None;
            let start_loc = if text1_chars.len() > self.match_max_bits {
                let head: String = text1_chars[..self.match_max_bits].iter().collect();
                match self.find_in_chars(&chars, &head, expected_loc) {
                    Some(s) => {
                        let tail_start = text1_chars.len() - self.match_max_bits;
                        let tail: String = text1_chars[tail_start..].iter().collect();
                        let tail_expected = expected_loc + tail_start;
                        match self.find_in_chars(&chars, &tail, tail_expected) {
                            Some(e) if e >= s => {
                                end_loc = Some(e);
                                Some(s)
                            }
                            _ => None,
                        }
                    }
                    None => None,
                }
            } else {
                self.find_in_chars(&chars, &text1, expected_loc)
            };

            let Some(start_loc) = start_loc else {
                results.push(false);
                delta -= patch.length2 as isize - patch.length1 as isize;
                continue;
            };

            results.push(true);
            delta = start_loc as isize - expected_loc as isize;

            let text2_chars: Vec<char> = if let Some(end_loc) = end_loc {
                let end = (end_loc + self.match_max_bits).min(chars.len());
                chars[start_loc.min(chars.len())..end].to_vec()
            } else {
                let end = (start_loc + text1_chars.len()).min(chars.len());
                chars[start_loc.min(chars.len())..end].to_vec()
            };

            if text1_chars == text2_chars {
                let text2 = patch.edits.text2();
                splice_chars_remove(&mut chars, start_loc, text1_chars.len());
                splice_chars(&mut chars, start_loc, 0, &text2);
            } else {
                let text1_str: String = text1_chars.iter().collect();
                let text2_str: String = text2_chars.iter().collect();
                let mut sub_script = self.diff.diff(&text1_str, &text2_str, false);

                if text1_chars.len() > self.match_max_bits
                    && (sub_script.levenshtein() as f64 / text1_chars.len() as f64)
                        > self.options.patch_delete_threshold
                {
                    *results.last_mut().unwrap() = false;
                } else {
                    cleanup_semantic_lossless(&mut sub_script);
                    let mut index1 = 0usize;
                    for edit in &patch.edits {
                        if edit.op != Op::Equal {
                            let index2 = sub_script.x_index(index1);
                            match edit.op {
                                Op::Insert => {
                                    splice_chars(&mut chars, start_loc + index2, 0, &edit.text);
                                }
                                Op::Delete => {
                                    let del_end = sub_script.x_index(index1 + edit.char_len());
                                    let remove_len = del_end.saturating_sub(index2);
                                    splice_chars_remove(&mut chars, start_loc + index2, remove_len);
                                }
                                Op::Equal => unreachable!(),
                            }
                        }
                        if edit.op != Op::Delete {
                            index1 += edit.char_len();
                        }
                    }
                }
            }
        }

        let pad_len = null_padding.chars().count();
        let result: String = chars[pad_len..chars.len() - pad_len].iter().collect();
        (result, results)
    }

    fn find_in_chars(&self, chars: &[char], pattern: &str, loc: usize) -> Option<usize> {
        let text: String = chars.iter().collect();
        self.match_engine.find(&text, pattern, loc)
    }

    /// Prepends/appends a patch list with a synthetic low-codepoint padding
    /// string so `apply`'s fuzzy matcher has room to operate even when a
    /// patch's hunk sits at the very start or end of the text. Returns the
    /// padding string used.
    fn add_padding(&self, patches: &mut PatchList) -> String {
        let padding_len = self.options.patch_margin;
        let null_padding: String = (1..=padding_len as u32).filter_map(char::from_u32).collect();

        for patch in patches.iter_mut() {
            patch.start1 += padding_len;
            patch.start2 += padding_len;
        }

        if let Some(first) = patches.first_mut() {
            if first.edits.is_empty() || first.edits[0].op != Op::Equal {
                first.edits.insert(0, Edit::equal(null_padding.clone()));
                first.start1 -= padding_len;
                first.start2 -= padding_len;
                first.length1 += padding_len;
                first.length2 += padding_len;
            } else if padding_len > first.edits[0].char_len() {
                let extra = padding_len - first.edits[0].char_len();
                let pad_tail: String = null_padding.chars().skip(first.edits[0].char_len()).collect();
                first.edits[0].text = format!("{pad_tail}{}", first.edits[0].text);
                first.start1 -= extra;
                first.start2 -= extra;
                first.length1 += extra;
                first.length2 += extra;
            }
        }

        if let Some(last) = patches.last_mut() {
            let last_idx = last.edits.len().wrapping_sub(1);
            if last.edits.is_empty() || last.edits[last_idx].op != Op::Equal {
                last.edits.push(Edit::equal(null_padding.clone()));
                last.length1 += padding_len;
                last.length2 += padding_len;
            } else if padding_len > last.edits[last_idx].char_len() {
                let extra = padding_len - last.edits[last_idx].char_len();
                let pad_head: String = null_padding.chars().take(extra).collect();
                last.edits[last_idx].text.push_str(&pad_head);
                last.length1 += extra;
                last.length2 += extra;
            }
        }

        null_padding
    }

    /// Splits any patch whose `length1` exceeds `match_max_bits` into
    /// several smaller, independently-relocatable patches, each carrying
    /// `patch_margin` chars of overlap context with its neighbors.
    pub fn split_max(&self, patches: &mut PatchList) {
        let patch_size = self.match_max_bits;
        let mut x = 0usize;
        while x < patches.len() {
            if patches[x].length1 <= patch_size {
                x += 1;
                continue;
            }

            let mut bigpatch = patches.remove(x);
            let mut start1 = bigpatch.start1;
            let mut start2 = bigpatch.start2;
            let mut precontext = String::new();
            let mut insert_at = x;

            while !bigpatch.edits.is_empty() {
                let mut patch = Patch::empty();
                let mut empty = true;
                patch.start1 = start1.saturating_sub(precontext.chars().count());
                patch.start2 = start2.saturating_sub(precontext.chars().count());

                if !precontext.is_empty() {
                    patch.length1 = precontext.chars().count();
                    patch.length2 = precontext.chars().count();
                    patch.edits.push(Edit::equal(precontext.clone()));
                }

                while !bigpatch.edits.is_empty()
                    && patch.length1 < patch_size.saturating_sub(self.options.patch_margin)
                {
                    let op = bigpatch.edits[0].op;
                    let full_len = bigpatch.edits[0].char_len();

                    if op == Op::Insert {
                        let edit = bigpatch.edits.remove(0);
                        patch.length2 += edit.char_len();
                        start2 += edit.char_len();
                        patch.edits.push(edit);
                        empty = false;
                    } else if op == Op::Delete
                        && patch.edits.len() == 1
                        && patch.edits[0].op == Op::Equal
                        && full_len > 2 * patch_size
                    {
                        let edit = bigpatch.edits.remove(0);
                        patch.length1 += edit.char_len();
                        start1 += edit.char_len();
                        empty = false;
                        patch.edits.push(edit);
                    } else {
                        let take_len = patch_size.saturating_sub(patch.length1 + self.options.patch_margin);
                        let take_len = take_len.min(full_len);
                        let text: String = bigpatch.edits[0].text.chars().take(take_len).collect();

                        patch.length1 += take_len;
                        start1 += take_len;
                        if op == Op::Equal {
                            patch.length2 += take_len;
                            start2 += take_len;
                        } else {
                            empty = false;
                        }
                        patch.edits.push(Edit { op, text: text.clone() });

                        if take_len == full_len {
                            bigpatch.edits.remove(0);
                        } else {
                            bigpatch.edits[0].text =
                                bigpatch.edits[0].text.chars().skip(take_len).collect();
                        }
                    }
                }

                precontext = patch.edits.text2();
                let pc_len = precontext.chars().count();
                let margin = self.options.patch_margin;
                precontext = if pc_len > margin {
                    precontext.chars().skip(pc_len - margin).collect()
                } else {
                    precontext
                };

                let postcontext_full = bigpatch.edits.text1();
                let postcontext: String = postcontext_full.chars().take(self.options.patch_margin).collect();
                if !postcontext.is_empty() {
                    patch.length1 += postcontext.chars().count();
                    patch.length2 += postcontext.chars().count();
                    if let Some(last) = patch.edits.last_mut() {
                        if last.op == Op::Equal {
                            last.text.push_str(&postcontext);
                        } else {
                            patch.edits.push(Edit::equal(postcontext));
                        }
                    } else {
                        patch.edits.push(Edit::equal(postcontext));
                    }
                }

                if !empty {
                    patches.insert(insert_at, patch);
                    insert_at += 1;
                }
            }

            x = insert_at;
        }
    }

    pub fn deep_copy(patches: &PatchList) -> PatchList {
        patches.to_vec()
    }
}

fn splice_chars(chars: &mut Vec<char>, at: usize, remove: usize, insert: &str) {
    let at = at.min(chars.len());
    let end = (at + remove).min(chars.len());
    chars.splice(at..end, insert.chars());
}

fn splice_chars_remove(chars: &mut Vec<char>, at: usize, remove: usize) {
    let at = at.min(chars.len());
    let end = (at + remove).min(chars.len());
    chars.drain(at..end);
}

fn count_occurrences(haystack: &[char], needle: &[char]) -> usize {
    if needle.is_empty() || needle.len() > haystack.len() {
        return 0;
    }
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffOptions;
    use crate::match_engine::MatchOptions;

    fn engine() -> PatchEngine {
        PatchEngine::new(
            DiffEngine::new(DiffOptions::default()),
            MatchEngine::new(MatchOptions::default()),
            32,
            PatchOptions::default(),
        )
    }

    #[test]
    fn make_then_apply_round_trips_exactly_on_unmodified_source() {
        let engine = engine();
        let text1 = "The quick brown fox jumps over the lazy dog.";
        let text2 = "The quick brown fox leaps over the lazy dog!";
        let patches = engine.make(text1, text2);
        let (result, applied) = engine.apply(&patches, text1);
        assert_eq!(result, text2);
        assert!(applied.iter().all(|&b| b));
    }

    #[test]
    fn apply_tolerates_minor_drift_in_the_base_text() {
        let engine = engine();
        let text1 = "The quick brown fox jumps over the lazy dog. ".repeat(3);
        let mut text2 = text1.clone();
        text2 = text2.replacen("jumps", "leaps", 1);
        let patches = engine.make(&text1, &text2);

        let drifted = text1.replacen("lazy dog", "sleepy dog", 1);
        let (_result, applied) = engine.apply(&patches, &drifted);
        assert!(applied.iter().any(|&b| b));
    }

    #[test]
    fn apply_on_empty_patch_list_returns_input_unchanged() {
        let engine = engine();
        let (result, applied) = engine.apply(&PatchList::new(), "unchanged");
        assert_eq!(result, "unchanged");
        assert!(applied.is_empty());
    }

    #[test]
    fn split_max_breaks_oversized_deletion_into_several_patches() {
        let engine = PatchEngine::new(
            DiffEngine::new(DiffOptions::default()),
            MatchEngine::new(MatchOptions { match_max_bits: 32, ..MatchOptions::default() }),
            32,
            PatchOptions::default(),
        );
        let text1 = "y".repeat(70);
        let text2 = String::new();
        let patches = engine.make(&text1, &text2);
        assert!(patches.len() > 1, "expected split_max to produce multiple hunks");
    }
}
