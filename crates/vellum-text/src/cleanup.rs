//! Edit-script cleanup passes: `cleanup_merge`, `cleanup_semantic`,
//! `cleanup_semantic_lossless`, and `cleanup_efficiency`.

use crate::op::{Edit, EditScript, Op};

/// Reorders and merges adjacent edits: runs of delete+insert are split into
/// a common prefix/suffix folded into neighboring equalities plus a single
/// delete and a single insert; adjacent equalities are fused; and a short
/// edit sandwiched between two equalities is shifted to the side that lets
/// it merge with a neighbor, when such a shift doesn't change `text2`.
pub fn cleanup_merge(script: &mut EditScript) {
    script.push(Edit::equal(""));

    let mut pointer = 0usize;
    let mut count_delete = 0usize;
    let mut count_insert = 0usize;
    let mut text_delete = String::new();
    let mut text_insert = String::new();

    while pointer < script.len() {
        match script[pointer].op {
            Op::Insert => {
                count_insert += 1;
                text_insert.push_str(&script[pointer].text);
                pointer += 1;
            }
            Op::Delete => {
                count_delete += 1;
                text_delete.push_str(&script[pointer].text);
                pointer += 1;
            }
            Op::Equal => {
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        let common_prefix = common_prefix_chars(&text_insert, &text_delete);
                        if common_prefix > 0 {
                            let prefix_text: String = text_insert.chars().take(common_prefix).collect();
                            let x = pointer as isize - count_delete as isize - count_insert as isize - 1;
                            if x >= 0 && script[x as usize].op == Op::Equal {
                                script[x as usize].text.push_str(&prefix_text);
                            } else {
                                script.insert(0, Edit::equal(prefix_text));
                                pointer += 1;
                            }
                            text_insert = drop_prefix_chars(&text_insert, common_prefix);
                            text_delete = drop_prefix_chars(&text_delete, common_prefix);
                        }
                        let common_suffix = common_suffix_chars(&text_insert, &text_delete);
                        if common_suffix > 0 {
                            let suffix_text = take_suffix_chars(&text_insert, common_suffix);
                            script[pointer].text = format!("{suffix_text}{}", script[pointer].text);
                            text_insert = drop_suffix_chars(&text_insert, common_suffix);
                            text_delete = drop_suffix_chars(&text_delete, common_suffix);
                        }
                    }

                    let mut replacement = Vec::with_capacity(2);
                    if !text_delete.is_empty() {
                        replacement.push(Edit::delete(text_delete.clone()));
                    }
                    if !text_insert.is_empty() {
                        replacement.push(Edit::insert(text_insert.clone()));
                    }

                    let start = pointer - count_delete - count_insert;
                    let replaced = count_delete + count_insert;
                    script.splice(start..start + replaced, replacement.iter().cloned());
                    pointer = start + replacement.len() + 1;
                } else if pointer != 0 && script[pointer - 1].op == Op::Equal {
                    let moved = script.remove(pointer);
                    script[pointer - 1].text.push_str(&moved.text);
                } else {
                    pointer += 1;
                }
                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }

    if script.last().is_some_and(|e| e.text.is_empty()) {
        script.pop();
    }

    // Second pass: slide a single edit across a shared boundary with an
    // adjacent equality so two equalities can fuse.
    let mut changes = false;
    let mut pointer = 1isize;
    while pointer < script.len() as isize - 1 {
        let p = pointer as usize;
        if script[p - 1].op == Op::Equal && script[p + 1].op == Op::Equal {
            let prev_text = script[p - 1].text.clone();
            let next_text = script[p + 1].text.clone();
            if script[p].text.ends_with(&prev_text) {
                let new_mid_len = script[p].text.chars().count() - prev_text.chars().count();
                let mid_prefix: String = script[p].text.chars().take(new_mid_len).collect();
                script[p].text = format!("{prev_text}{mid_prefix}");
                script[p + 1].text = format!("{prev_text}{next_text}");
                script.remove(p - 1);
                changes = true;
            } else if script[p].text.starts_with(&next_text) {
                let next_len = next_text.chars().count();
                let mid_tail: String = script[p].text.chars().skip(next_len).collect();
                script[p - 1].text = format!("{prev_text}{next_text}");
                script[p].text = format!("{mid_tail}{next_text}");
                script.remove(p + 1);
                changes = true;
            } else {
                pointer += 1;
            }
        } else {
            pointer += 1;
        }
    }

    if changes {
        cleanup_merge(script);
    }
}

fn common_prefix_chars(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

fn common_suffix_chars(a: &str, b: &str) -> usize {
    a.chars().rev().zip(b.chars().rev()).take_while(|(x, y)| x == y).count()
}

fn drop_prefix_chars(s: &str, n: usize) -> String {
    s.chars().skip(n).collect()
}

fn drop_suffix_chars(s: &str, n: usize) -> String {
    let total = s.chars().count();
    s.chars().take(total - n).collect()
}

fn take_suffix_chars(s: &str, n: usize) -> String {
    let total = s.chars().count();
    s.chars().skip(total - n).collect()
}

/// Strips edits too small to be meaningful to a human reader: a short
/// equality wedged between a delete and an insert that together dwarf it is
/// folded into the surrounding delete/insert, even though that loses the
/// minimality guarantee `cleanup_merge` alone preserves.
pub fn cleanup_semantic(script: &mut EditScript) {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut pointer = 0usize;
    let mut length_insertions1 = 0usize;
    let mut length_deletions1 = 0usize;
    let mut length_insertions2 = 0usize;
    let mut length_deletions2 = 0usize;

    while pointer < script.len() {
        if script[pointer].op == Op::Equal {
            equalities.push(pointer);
            length_insertions1 = length_insertions2;
            length_deletions1 = length_deletions2;
            length_insertions2 = 0;
            length_deletions2 = 0;
            last_equality = Some(script[pointer].text.clone());
        } else {
            if script[pointer].op == Op::Insert {
                length_insertions2 += script[pointer].char_len();
            } else {
                length_deletions2 += script[pointer].char_len();
            }
            if let Some(eq) = &last_equality {
                let eq_len = eq.chars().count();
                if eq_len <= length_insertions1.max(length_deletions1)
                    && eq_len <= length_insertions2.max(length_deletions2)
                {
                    let idx = *equalities.last().unwrap();
                    script[idx] = Edit::delete(eq.clone());
                    script.insert(idx + 1, Edit::insert(eq.clone()));
                    equalities.pop();
                    if let Some(&prev) = equalities.last() {
                        equalities.pop();
                        pointer = prev;
                    } else {
                        pointer = 0;
                    }
                    length_insertions1 = 0;
                    length_deletions1 = 0;
                    length_insertions2 = 0;
                    length_deletions2 = 0;
                    last_equality = None;
                    changes = true;
                    continue;
                }
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(script);
    }

    cleanup_semantic_overlap(script);
}

/// Eliminates dual deletion/insertion overlaps: whenever a delete's tail
/// matches an adjoining insert's head by `k >= 1` characters (or vice
/// versa), that overlap is extracted as an equality at the shared boundary.
fn cleanup_semantic_overlap(script: &mut EditScript) {
    let mut pointer = 1usize;
    while pointer < script.len() {
        if pointer >= 1
            && script[pointer - 1].op == Op::Delete
            && script[pointer].op == Op::Insert
        {
            let deletion = script[pointer - 1].text.clone();
            let insertion = script[pointer].text.clone();
            let overlap_len1 = common_overlap(&deletion, &insertion);
            let overlap_len2 = common_overlap(&insertion, &deletion);

            if overlap_len1 >= overlap_len2 {
                if overlap_len1 > 0 {
                    let del_chars = deletion.chars().count();
                    let overlap_text: String =
                        deletion.chars().skip(del_chars - overlap_len1).collect();
                    let new_delete: String = deletion.chars().take(del_chars - overlap_len1).collect();
                    let ins_chars = insertion.chars().count();
                    let new_insert: String = insertion.chars().skip(overlap_len1).collect();

                    script[pointer - 1].text = new_delete;
                    script[pointer].text = new_insert;
                    let _ = ins_chars;
                    script.insert(pointer, Edit::equal(overlap_text));
                    pointer += 1;
                }
            } else if overlap_len2 > 0 {
                let ins_chars = insertion.chars().count();
                let overlap_text: String = insertion.chars().take(overlap_len2).collect();
                let new_insert: String = insertion.chars().skip(overlap_len2).collect();
                let del_chars = deletion.chars().count();
                let new_delete: String = deletion.chars().take(del_chars - overlap_len2).collect();
                let _ = ins_chars;

                script[pointer - 1].text = new_insert;
                script[pointer].text = new_delete;
                script[pointer - 1].op = Op::Insert;
                script[pointer].op = Op::Delete;
                script.insert(pointer, Edit::equal(overlap_text));
                pointer += 1;
            }
        }
        pointer += 1;
    }
}

/// Length of the longest suffix of `a` that is also a prefix of `b`.
fn common_overlap(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let max_len = a_chars.len().min(b_chars.len());
    if max_len == 0 {
        return 0;
    }
    for len in (1..=max_len).rev() {
        if a_chars[a_chars.len() - len..] == b_chars[..len] {
            return len;
        }
    }
    0
}

/// Shifts each edit's boundary toward the nearest natural break point
/// (paragraph > line > sentence > word > none), scored by
/// [`boundary_score`], so diffs read as whole-token changes instead of
/// splitting mid-word.
pub fn cleanup_semantic_lossless(script: &mut EditScript) {
    let mut pointer = 1isize;
    while pointer < script.len() as isize - 1 {
        let p = pointer as usize;
        if script[p - 1].op == Op::Equal && script[p + 1].op == Op::Equal {
            let mut equality1 = script[p - 1].text.clone();
            let mut edit_text = script[p].text.clone();
            let mut equality2 = script[p + 1].text.clone();

            let common_len = common_suffix_str(&equality1, &edit_text);
            if common_len > 0 {
                let shifted = take_suffix_str(&edit_text, common_len);
                equality1 = drop_suffix_str(&equality1, common_len);
                edit_text = format!("{shifted}{}", drop_suffix_str(&edit_text, common_len));
                equality2 = format!("{shifted}{equality2}");
            }

            let mut best_equality1 = equality1.clone();
            let mut best_edit = edit_text.clone();
            let mut best_equality2 = equality2.clone();
            let mut best_score = boundary_score(&equality1, &edit_text) + boundary_score(&edit_text, &equality2);

            let mut eq1 = equality1;
            let mut edit = edit_text;
            let mut eq2 = equality2;
            while !edit.is_empty() && !eq2.is_empty() {
                let first = edit.chars().next().unwrap();
                if eq2.chars().next() != Some(first) {
                    break;
                }
                eq1.push(first);
                edit = edit.chars().skip(1).chain(eq2.chars().take(1)).collect();
                eq2 = eq2.chars().skip(1).collect();
                let score = boundary_score(&eq1, &edit) + boundary_score(&edit, &eq2);
                if score >= best_score {
                    best_score = score;
                    best_equality1 = eq1.clone();
                    best_edit = edit.clone();
                    best_equality2 = eq2.clone();
                }
            }

            if script[p - 1].text != best_equality1 {
                if best_equality1.is_empty() {
                    script.remove(p - 1);
                    pointer -= 1;
                } else {
                    script[p - 1].text = best_equality1;
                }
                script[p].text = best_edit;
                if best_equality2.is_empty() {
                    script.remove(p + 1);
                } else {
                    script[p + 1].text = best_equality2;
                }
            }
        }
        pointer += 1;
    }
}

fn common_suffix_str(a: &str, b: &str) -> usize {
    a.chars().rev().zip(b.chars().rev()).take_while(|(x, y)| x == y).count()
}

fn take_suffix_str(s: &str, n: usize) -> String {
    let total = s.chars().count();
    s.chars().skip(total - n).collect()
}

fn drop_suffix_str(s: &str, n: usize) -> String {
    let total = s.chars().count();
    s.chars().take(total - n).collect()
}

/// Score for a candidate boundary between `one` and `two`: `5` when either
/// side is empty; otherwise a cumulative count (0..5) of how many of these
/// hold for the boundary characters — non-alphanumeric, whitespace, control
/// character, blank-line break.
pub fn boundary_score(one: &str, two: &str) -> u8 {
    if one.is_empty() || two.is_empty() {
        return 5;
    }
    let char1 = one.chars().last().unwrap();
    let char2 = two.chars().next().unwrap();

    let non_alnum1 = !char1.is_alphanumeric();
    let non_alnum2 = !char2.is_alphanumeric();
    let whitespace1 = char1.is_whitespace();
    let whitespace2 = char2.is_whitespace();
    let control1 = char1.is_control();
    let control2 = char2.is_control();
    let blank_line = (matches!(char1, '\n' | '\r') && one.trim_end_matches(['\n', '\r']).ends_with(['\n', '\r']))
        || (matches!(char2, '\n' | '\r')
            && two.trim_start_matches(['\n', '\r']).starts_with(['\n', '\r']));

    (non_alnum1 || non_alnum2) as u8
        + (whitespace1 || whitespace2) as u8
        + (control1 || control2) as u8
        + blank_line as u8
}

/// Reduces operation count at a slight minimality cost: short equalities
/// (shorter than `edit_cost`, unless at an endpoint) surrounded by edits of
/// the same kind on the other side are folded away, so a fragmented script
/// collapses into fewer, larger edits.
pub fn cleanup_efficiency(script: &mut EditScript, edit_cost: u16) {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut pointer = 0usize;
    let mut pre_ins = false;
    let mut pre_del = false;
    let mut post_ins = false;
    let mut post_del = false;

    while pointer < script.len() {
        if script[pointer].op == Op::Equal {
            if script[pointer].char_len() < edit_cost as usize
                && (post_ins || post_del)
            {
                equalities.push(pointer);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = Some(script[pointer].text.clone());
            } else {
                equalities.clear();
                last_equality = None;
            }
            post_ins = false;
            post_del = false;
        } else {
            if script[pointer].op == Op::Delete {
                post_del = true;
            } else {
                post_ins = true;
            }

            if let Some(eq) = last_equality.clone() {
                let should_fold = (pre_ins && pre_del && post_ins && post_del)
                    || (eq.chars().count() < edit_cost as usize / 2
                        && [pre_ins, pre_del, post_ins, post_del].iter().filter(|b| **b).count() == 3);
                if should_fold {
                    let idx = *equalities.last().unwrap();
                    script[idx] = Edit::delete(eq.clone());
                    script.insert(idx + 1, Edit::insert(eq));
                    equalities.pop();
                    last_equality = None;
                    if pre_ins && pre_del {
                        post_ins = true;
                        post_del = true;
                        equalities.clear();
                    } else {
                        if let Some(&prev) = equalities.last() {
                            equalities.pop();
                            pointer = prev;
                        } else {
                            pointer = 0;
                        }
                        post_ins = false;
                        post_del = false;
                    }
                    changes = true;
                    continue;
                }
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(script);
    }
}
