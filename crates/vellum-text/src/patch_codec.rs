//! GNU-unidiff-shaped textual rendering of a [`PatchList`]: a
//! `@@ -start1,length1 +start2,length2 @@` header per hunk followed by one
//! line per edit (` `/`-`/`+` prefix, percent-encoded body).

use crate::error::DmpError;
use crate::op::{Edit, Op, Patch, PatchList};
use crate::percent;

/// Serializes and parses the unidiff-style patch text format.
pub struct PatchCodec;

impl PatchCodec {
    /// Render `patches` as patch text. Each hunk ends its body lines with
    /// `\n`; an empty `patches` list renders to the empty string.
    pub fn to_text(patches: &[Patch]) -> String {
        let mut out = String::new();
        for patch in patches {
            out.push_str(&Self::header(patch));
            for edit in &patch.edits {
                let sign = match edit.op {
                    Op::Insert => '+',
                    Op::Delete => '-',
                    Op::Equal => ' ',
                };
                out.push(sign);
                out.push_str(&percent::encode(&edit.text));
                out.push('\n');
            }
        }
        out
    }

    fn header(patch: &Patch) -> String {
        let coords1 = Self::coords(patch.start1, patch.length1);
        let coords2 = Self::coords(patch.start2, patch.length2);
        format!("@@ -{coords1} +{coords2} @@\n")
    }

    fn coords(start: usize, length: usize) -> String {
        match length {
            0 => format!("{start},0"),
            1 => format!("{}", start + 1),
            n => format!("{},{n}", start + 1),
        }
    }

    /// Parse patch text back into a [`PatchList`]. Fails with
    /// [`DmpError::InvalidArgument`] on a malformed header, an edit line
    /// with no recognized op prefix, or a percent-decode failure.
    pub fn from_text(text: &str) -> Result<PatchList, DmpError> {
        let mut patches = PatchList::new();
        if text.is_empty() {
            return Ok(patches);
        }

        let mut lines: Vec<&str> = text.split('\n').collect();
        // A trailing '\n' produces one spurious empty final element.
        if lines.last() == Some(&"") {
            lines.pop();
        }
        let mut i = 0usize;

        while i < lines.len() {
            let (start1, length1, start2, length2) = Self::parse_header(lines[i])?;
            i += 1;

            let mut patch = Patch::empty();
            patch.start1 = start1;
            patch.length1 = length1;
            patch.start2 = start2;
            patch.length2 = length2;

            while i < lines.len() && !lines[i].starts_with("@@") {
                let line = lines[i];
                if line.is_empty() {
                    i += 1;
                    continue;
                }
                let sign = line.as_bytes()[0];
                let body = percent::decode(&line[1..])?;
                let edit = match sign {
                    b'+' => Edit::insert(body),
                    b'-' => Edit::delete(body),
                    b' ' => Edit::equal(body),
                    _ => {
                        return Err(DmpError::invalid(format!(
                            "unrecognized patch line prefix {:?}",
                            line.chars().next()
                        )))
                    }
                };
                patch.edits.push(edit);
                i += 1;
            }

            patches.push(patch);
        }

        Ok(patches)
    }

    /// Parses `@@ -start1[,length1] +start2[,length2] @@`.
    fn parse_header(line: &str) -> Result<(usize, usize, usize, usize), DmpError> {
        let body = line
            .strip_prefix("@@ -")
            .and_then(|s| s.strip_suffix(" @@"))
            .ok_or_else(|| DmpError::invalid(format!("malformed patch header {line:?}")))?;

        let (left, right) = body
            .split_once(" +")
            .ok_or_else(|| DmpError::invalid(format!("malformed patch header {line:?}")))?;

        let (start1, length1) = Self::parse_range(left, line)?;
        let (start2, length2) = Self::parse_range(right, line)?;
        Ok((start1, length1, start2, length2))
    }

    /// Parses one `start[,length]` range, applying the unidiff convention
    /// that an omitted length means 1 and a 1-based `start` is decremented
    /// to 0-based — except when length is explicitly `0`, where `start`
    /// stays as written (it names the insertion point, not a consumed char).
    fn parse_range(range: &str, line: &str) -> Result<(usize, usize), DmpError> {
        let invalid = || DmpError::invalid(format!("malformed patch header {line:?}"));
        match range.split_once(',') {
            None => {
                let start: usize = range.parse().map_err(|_| invalid())?;
                Ok((start.saturating_sub(1), 1))
            }
            Some((start_str, length_str)) => {
                let start: usize = start_str.parse().map_err(|_| invalid())?;
                let length: usize = length_str.parse().map_err(|_| invalid())?;
                if length == 0 {
                    Ok((start, 0))
                } else {
                    Ok((start.saturating_sub(1), length))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::Edit;

    #[test]
    fn renders_the_quick_brown_fox_patch() {
        let mut patch = Patch::empty();
        patch.start1 = 0;
        patch.length1 = 21;
        patch.start2 = 0;
        patch.length2 = 21;
        patch.edits = vec![
            Edit::equal("The "),
            Edit::delete("quick"),
            Edit::insert("slow"),
            Edit::equal(" brown fox jumps."),
        ];
        let text = PatchCodec::to_text(&[patch]);
        assert_eq!(
            text,
            "@@ -1,21 +1,20 @@\n The \n-quick\n+slow\n  brown fox jumps.\n"
        );
    }

    #[test]
    fn round_trips_header_and_body_through_from_text() {
        let mut patch = Patch::empty();
        patch.start1 = 5;
        patch.length1 = 3;
        patch.start2 = 5;
        patch.length2 = 3;
        patch.edits = vec![Edit::equal("abc")];
        let rendered = PatchCodec::to_text(&[patch.clone()]);
        let parsed = PatchCodec::from_text(&rendered).unwrap();
        assert_eq!(parsed, vec![patch]);
    }

    #[test]
    fn zero_length_hunk_keeps_start_as_written() {
        let mut patch = Patch::empty();
        patch.start1 = 10;
        patch.length1 = 0;
        patch.start2 = 10;
        patch.length2 = 2;
        patch.edits = vec![Edit::insert("XY")];
        let text = PatchCodec::to_text(&[patch]);
        assert!(text.starts_with("@@ -10,0 +11,2 @@\n"));
    }

    #[test]
    fn empty_patch_list_renders_to_empty_string() {
        assert_eq!(PatchCodec::to_text(&PatchList::new()), "");
        assert_eq!(PatchCodec::from_text("").unwrap(), PatchList::new());
    }

    #[test]
    fn rejects_malformed_header() {
        assert!(PatchCodec::from_text("not a header\n").is_err());
    }
}
