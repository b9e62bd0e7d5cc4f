//! The Myers-bisect diff engine.
//!
//! Operates on `char` slices throughout so offsets stay "character offsets",
//! matching the rest of the engine's contract. Absent-input validation from
//! the original spec collapses away here: a Rust `&str` cannot be null, so
//! [`DiffEngine::diff`] is infallible — there is nothing left for
//! [`crate::error::DmpError::InvalidArgument`] to report.

use std::time::{Duration, Instant};

use crate::op::{Edit, EditScript, Op};

/// Tunables for [`DiffEngine`].
#[derive(Debug, Clone, Copy)]
pub struct DiffOptions {
    /// Wall-clock budget for [`DiffEngine::diff`]. `<= 0.0` means unbounded:
    /// no timeout, and `half_match` insists on optimality instead of taking
    /// the cheap exit.
    pub timeout_seconds: f64,
    /// Small positive integer used by `cleanup_efficiency` to decide whether
    /// a short equality is worth eliminating.
    pub edit_cost: u16,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self { timeout_seconds: 1.0, edit_cost: 4 }
    }
}

/// Computes edit scripts between two texts.
#[derive(Debug, Clone)]
pub struct DiffEngine {
    options: DiffOptions,
}

impl DiffEngine {
    pub fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DiffOptions {
        &self.options
    }

    /// Compute an edit script transforming `text1` into `text2`.
    ///
    /// `check_lines` enables the line-mode fast path for large inputs; pass
    /// `false` when diffing already-short strings (as the line-mode
    /// character-level refinement step does) to avoid redundant line
    /// tokenization.
    pub fn diff(&self, text1: &str, text2: &str, check_lines: bool) -> EditScript {
        if text1 == text2 {
            if text1.is_empty() {
                return Vec::new();
            }
            return vec![Edit::equal(text1)];
        }

        let deadline = self.deadline();
        let a: Vec<char> = text1.chars().collect();
        let b: Vec<char> = text2.chars().collect();

        let common_prefix = common_prefix_len(&a, &b);
        let prefix: Vec<char> = a[..common_prefix].to_vec();
        let a = &a[common_prefix..];
        let b = &b[common_prefix..];

        let common_suffix = common_suffix_len(a, b);
        let suffix: Vec<char> = a[a.len() - common_suffix..].to_vec();
        let a = &a[..a.len() - common_suffix];
        let b = &b[..b.len() - common_suffix];

        let mut script = self.compute(a, b, check_lines, deadline);

        if !prefix.is_empty() {
            script.insert(0, Edit::equal(prefix.into_iter().collect::<String>()));
        }
        if !suffix.is_empty() {
            script.push(Edit::equal(suffix.into_iter().collect::<String>()));
        }

        crate::cleanup::cleanup_merge(&mut script);
        script
    }

    fn deadline(&self) -> Option<Instant> {
        if self.options.timeout_seconds <= 0.0 {
            None
        } else {
            Some(Instant::now() + Duration::from_secs_f64(self.options.timeout_seconds))
        }
    }

    fn compute(
        &self,
        text1: &[char],
        text2: &[char],
        check_lines: bool,
        deadline: Option<Instant>,
    ) -> EditScript {
        if text1.is_empty() {
            return if text2.is_empty() {
                Vec::new()
            } else {
                vec![Edit::insert(text2.iter().collect::<String>())]
            };
        }
        if text2.is_empty() {
            return vec![Edit::delete(text1.iter().collect::<String>())];
        }

        let (longer, shorter, longer_is_text1) =
            if text1.len() > text2.len() { (text1, text2, true) } else { (text2, text1, false) };

        if let Some(pos) = find_subsequence(longer, shorter) {
            let op = if longer_is_text1 { Op::Delete } else { Op::Insert };
            let mut script = Vec::with_capacity(3);
            if pos > 0 {
                script.push(Edit { op, text: longer[..pos].iter().collect() });
            }
            script.push(Edit::equal(shorter.iter().collect::<String>()));
            if pos + shorter.len() < longer.len() {
                script.push(Edit { op, text: longer[pos + shorter.len()..].iter().collect() });
            }
            return script;
        }

        if shorter.len() == 1 {
            return vec![
                Edit::delete(text1.iter().collect::<String>()),
                Edit::insert(text2.iter().collect::<String>()),
            ];
        }

        if let Some((prefix1, suffix1, prefix2, suffix2, mid)) = self.half_match(text1, text2) {
            let script1 = self.diff_chars(&prefix1, &prefix2, check_lines, deadline);
            let script2 = self.diff_chars(&suffix1, &suffix2, check_lines, deadline);
            let mut script = script1;
            script.push(Edit::equal(mid.into_iter().collect::<String>()));
            script.extend(script2);
            return script;
        }

        if check_lines && text1.len() > 100 && text2.len() > 100 {
            return self.line_mode(text1, text2, deadline);
        }

        self.bisect(text1, text2, deadline)
    }

    fn diff_chars(
        &self,
        text1: &[char],
        text2: &[char],
        check_lines: bool,
        deadline: Option<Instant>,
    ) -> EditScript {
        self.compute(text1, text2, check_lines, deadline)
    }

    /// Splits the problem at a shared substring at least half the length of
    /// the longer text. Returns `None` when unbounded time is requested
    /// (optimality over speed), the shorter text is too small relative to
    /// the longer, or no adequate seed extends far enough.
    fn half_match(
        &self,
        text1: &[char],
        text2: &[char],
    ) -> Option<(Vec<char>, Vec<char>, Vec<char>, Vec<char>, Vec<char>)> {
        if self.options.timeout_seconds <= 0.0 {
            return None;
        }

        let (longer, shorter, swapped) =
            if text1.len() > text2.len() { (text1, text2, false) } else { (text2, text1, true) };

        if longer.len() < 4 || shorter.len() * 2 < longer.len() {
            return None;
        }

        let quarter = longer.len().div_ceil(4);
        let half = longer.len().div_ceil(2);

        let hm1 = half_match_i(longer, shorter, quarter);
        let hm2 = half_match_i(longer, shorter, half);

        let best = match (hm1, hm2) {
            (None, None) => None,
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (Some(a), Some(b)) => {
                if a.4.len() > b.4.len() {
                    Some(a)
                } else {
                    Some(b)
                }
            }
        }?;

        let (long_prefix, long_suffix, short_prefix, short_suffix, mid) = best;
        if swapped {
            Some((short_prefix, short_suffix, long_prefix, long_suffix, mid))
        } else {
            Some((long_prefix, long_suffix, short_prefix, short_suffix, mid))
        }
    }

    /// Tokenizes to lines, diffs the resulting code-point strings, expands
    /// back to line text, cleans up semantically, then re-diffs each
    /// adjacent delete+insert pair at character level.
    fn line_mode(&self, text1: &[char], text2: &[char], deadline: Option<Instant>) -> EditScript {
        let s1: String = text1.iter().collect();
        let s2: String = text2.iter().collect();

        let mut line_map: Vec<String> = vec![String::new()]; // index 0 reserved blank
        let mut line_hash: std::collections::HashMap<String, u32> = std::collections::HashMap::new();

        let codes1 = lines_to_chars(&s1, &mut line_map, &mut line_hash);
        let codes2 = lines_to_chars(&s2, &mut line_map, &mut line_hash);

        let code_chars1: Vec<char> = codes1.chars().collect();
        let code_chars2: Vec<char> = codes2.chars().collect();
        let mut script = self.compute(&code_chars1, &code_chars2, false, deadline);

        // Expand code points back to their line text.
        for edit in &mut script {
            let mut expanded = String::new();
            for code in edit.text.chars() {
                expanded.push_str(&line_map[code as usize]);
            }
            edit.text = expanded;
        }

        crate::cleanup::cleanup_semantic(&mut script);

        // Re-diff adjacent delete+insert runs at character granularity.
        let mut result = Vec::with_capacity(script.len());
        let mut i = 0;
        while i < script.len() {
            if script[i].op == Op::Delete
                && i + 1 < script.len()
                && script[i + 1].op == Op::Insert
            {
                let deleted = std::mem::take(&mut script[i].text);
                let inserted = std::mem::take(&mut script[i + 1].text);
                let sub = self.diff(&deleted, &inserted, false);
                result.extend(sub);
                i += 2;
            } else {
                result.push(script[i].clone());
                i += 1;
            }
        }
        result
    }

    /// Myers O(ND) middle-snake search with a time budget.
    ///
    /// Searches forward from `(0, 0)` and backward from `(len1, len2)` in
    /// lockstep; `v1`/`v2` hold the furthest-reaching x-coordinate for each
    /// diagonal `k` of each front, offset by `v_offset` so negative `k`
    /// indexes validly. `-1` marks a diagonal not yet reached.
    fn bisect(&self, text1: &[char], text2: &[char], deadline: Option<Instant>) -> EditScript {
        let (len1, len2) = (text1.len() as isize, text2.len() as isize);
        let max_d = ((len1 + len2 + 1) / 2) as isize;
        let v_offset = max_d;
        let v_len = (2 * max_d) as usize;
        let mut v1 = vec![-1isize; v_len];
        let mut v2 = vec![-1isize; v_len];
        v1[(v_offset + 1) as usize] = 0;
        v2[(v_offset + 1) as usize] = 0;

        let delta = len1 - len2;
        // An odd delta means the forward and backward fronts pass through
        // diagonals of opposite parity each step, so only the forward path
        // can detect the crossing front's overlap (and vice versa).
        let front = delta % 2 != 0;

        let mut k1start = 0isize;
        let mut k1end = 0isize;
        let mut k2start = 0isize;
        let mut k2end = 0isize;

        for d in 0..max_d {
            if let Some(deadline) = deadline {
                if Instant::now() > deadline {
                    break;
                }
            }

            let mut k1 = -d + k1start;
            while k1 <= d - k1end {
                let k1_offset = (v_offset + k1) as usize;
                let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                    v1[k1_offset + 1]
                } else {
                    v1[k1_offset - 1] + 1
                };
                let mut y1 = x1 - k1;
                while x1 < len1 && y1 < len2 && text1[x1 as usize] == text2[y1 as usize] {
                    x1 += 1;
                    y1 += 1;
                }
                v1[k1_offset] = x1;

                if x1 > len1 {
                    k1end += 2;
                } else if y1 > len2 {
                    k1start += 2;
                } else if front {
                    let k2_offset = v_offset + delta - k1;
                    if (0..v_len as isize).contains(&k2_offset) && v2[k2_offset as usize] != -1 {
                        let x2 = len1 - v2[k2_offset as usize];
                        if x1 >= x2 {
                            return self.bisect_split(text1, text2, x1 as usize, y1 as usize, deadline);
                        }
                    }
                }
                k1 += 2;
            }

            let mut k2 = -d + k2start;
            while k2 <= d - k2end {
                let k2_offset = (v_offset + k2) as usize;
                let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                    v2[k2_offset + 1]
                } else {
                    v2[k2_offset - 1] + 1
                };
                let mut y2 = x2 - k2;
                while x2 < len1
                    && y2 < len2
                    && text1[(len1 - x2 - 1) as usize] == text2[(len2 - y2 - 1) as usize]
                {
                    x2 += 1;
                    y2 += 1;
                }
                v2[k2_offset] = x2;

                if x2 > len1 {
                    k2end += 2;
                } else if y2 > len2 {
                    k2start += 2;
                } else if !front {
                    let k1_offset = v_offset + delta - k2;
                    if (0..v_len as isize).contains(&k1_offset) && v1[k1_offset as usize] != -1 {
                        let x1 = v1[k1_offset as usize];
                        let y1 = v_offset + x1 - k1_offset;
                        let x2_mirror = len1 - x2;
                        if x1 >= x2_mirror {
                            return self.bisect_split(text1, text2, x1 as usize, y1 as usize, deadline);
                        }
                    }
                }
                k2 += 2;
            }
        }

        // Deadline expired before a middle snake was found: degrade to the
        // trivial two-edit script.
        vec![
            Edit::delete(text1.iter().collect::<String>()),
            Edit::insert(text2.iter().collect::<String>()),
        ]
    }

    fn bisect_split(
        &self,
        text1: &[char],
        text2: &[char],
        x: usize,
        y: usize,
        deadline: Option<Instant>,
    ) -> EditScript {
        let (text1a, text1b) = text1.split_at(x);
        let (text2a, text2b) = text2.split_at(y);
        let mut script = self.compute(text1a, text2a, false, deadline);
        script.extend(self.compute(text1b, text2b, false, deadline));
        script
    }
}

/// Seeds a half-match search at `start` within `longer` (the position of a
/// `⌈longer/4⌉`-length probe), extending any hit to the full common
/// substring. Returns `(long_prefix, long_suffix, short_prefix, short_suffix,
/// common_mid)` or `None`.
fn half_match_i(
    longer: &[char],
    shorter: &[char],
    start: usize,
) -> Option<(Vec<char>, Vec<char>, Vec<char>, Vec<char>, Vec<char>)> {
    let seed_len = longer.len() / 4;
    if seed_len == 0 || start + seed_len > longer.len() {
        return None;
    }
    let seed = &longer[start..start + seed_len];

    let mut best_common: Vec<char> = Vec::new();
    let mut best_long_start = 0usize;
    let mut best_short_start = 0usize;

    let mut search_from = 0usize;
    while let Some(found) = find_subsequence(&shorter[search_from..], seed) {
        let j = search_from + found;
        let prefix_len = common_suffix_len(&longer[..start], &shorter[..j]);
        let suffix_len = common_prefix_len(&longer[start..], &shorter[j..]);

        if best_common.len() < prefix_len + suffix_len {
            best_long_start = start - prefix_len;
            best_short_start = j - prefix_len;
            best_common = longer[best_long_start..start + suffix_len].to_vec();
        }
        search_from = j + 1;
    }

    if best_common.len() * 2 >= longer.len() {
        let long_prefix = longer[..best_long_start].to_vec();
        let long_suffix = longer[best_long_start + best_common.len()..].to_vec();
        let short_prefix = shorter[..best_short_start].to_vec();
        let short_suffix = shorter[best_short_start + best_common.len()..].to_vec();
        Some((long_prefix, long_suffix, short_prefix, short_suffix, best_common))
    } else {
        None
    }
}

fn common_prefix_len(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

fn common_suffix_len(a: &[char], b: &[char]) -> usize {
    a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count()
}

/// Returns the position of `needle` in `haystack`, or `None`. Used both for
/// the "shorter is a substring of longer" fast path and half-match seeding.
fn find_subsequence(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Maps each distinct line of `text` to a unique code point (interned in
/// `line_map`/`line_hash`), returning the resulting code-point string.
fn lines_to_chars(
    text: &str,
    line_map: &mut Vec<String>,
    line_hash: &mut std::collections::HashMap<String, u32>,
) -> String {
    let mut result = String::new();
    for line in split_keep_newline(text) {
        let code = *line_hash.entry(line.to_string()).or_insert_with(|| {
            line_map.push(line.to_string());
            (line_map.len() - 1) as u32
        });
        result.push(char::from_u32(code).unwrap_or('\u{0}'));
    }
    result
}

/// Splits `text` into lines, each retaining its trailing `\n` (the final
/// fragment may lack one).
fn split_keep_newline(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            out.push(&text[start..=i]);
            start = i + 1;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}
