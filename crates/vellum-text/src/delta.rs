//! Compact textual serialization of an [`EditScript`]: a tab-separated
//! sequence of `=n` (equal run of `n` chars), `-n` (delete `n` chars), and
//! `+text` (insert percent-encoded `text`) tokens.

use crate::error::DmpError;
use crate::op::{Edit, EditScript};
use crate::percent;

/// Render `script` as a delta string. `+`-tokens carry [`percent::encode`]d
/// text; `=`/`-` tokens carry only a character count, since the source text
/// (`text1`) is assumed available to whoever holds the delta.
pub fn to_delta(script: &[Edit]) -> String {
    script
        .iter()
        .map(|edit| match edit.op {
            crate::op::Op::Equal => format!("={}", edit.char_len()),
            crate::op::Op::Delete => format!("-{}", edit.char_len()),
            crate::op::Op::Insert => format!("+{}", percent::encode(&edit.text)),
        })
        .collect::<Vec<_>>()
        .join("\t")
}

/// Reconstruct an [`EditScript`] from a delta string and the `text1` it was
/// computed against. Fails with [`DmpError::InvalidArgument`] when a token
/// is malformed, a count is negative or non-numeric, or the deltas'
/// `=`/`-` counts don't sum to `text1`'s length.
pub fn from_delta(text1: &str, delta: &str) -> Result<EditScript, DmpError> {
    let chars: Vec<char> = text1.chars().collect();
    let mut pointer = 0usize;
    let mut script = EditScript::new();

    if delta.is_empty() {
        if chars.is_empty() {
            return Ok(script);
        }
        return Err(DmpError::invalid("delta is empty but text1 is not"));
    }

    for token in delta.split('\t') {
        if token.is_empty() {
            continue;
        }
        let (tag, rest) = token.split_at(1);
        match tag {
            "+" => {
                let text = percent::decode(rest)?;
                script.push(Edit::insert(text));
            }
            "=" | "-" => {
                let count: usize = rest
                    .parse()
                    .map_err(|_| DmpError::invalid(format!("invalid count in token {token:?}")))?;
                if pointer + count > chars.len() {
                    return Err(DmpError::invalid(format!(
                        "delta token {token:?} overruns text1 (len {})",
                        chars.len()
                    )));
                }
                let slice: String = chars[pointer..pointer + count].iter().collect();
                pointer += count;
                if tag == "=" {
                    script.push(Edit::equal(slice));
                } else {
                    script.push(Edit::delete(slice));
                }
            }
            other => {
                return Err(DmpError::invalid(format!("unrecognized delta token tag {other:?}")));
            }
        }
    }

    if pointer != chars.len() {
        return Err(DmpError::invalid(format!(
            "delta consumed {pointer} of {} chars of text1",
            chars.len()
        )));
    }

    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::EditScriptExt;

    #[test]
    fn round_trips_a_simple_script() {
        let script = vec![Edit::equal("ab"), Edit::delete("cd"), Edit::insert("ef")];
        let delta = to_delta(&script);
        assert_eq!(delta, "=2\t-2\t+ef");
        let text1 = script.text1();
        assert_eq!(from_delta(&text1, &delta).unwrap(), script);
    }

    #[test]
    fn round_trips_unicode_insert_text() {
        let script = vec![Edit::equal("\u{0682} \u{0002} \\ |")];
        let delta = to_delta(&script);
        assert_eq!(delta, "=7");

        let insert_only = vec![Edit::insert("\u{0682} \u{0002} \\ |")];
        let insert_delta = to_delta(&insert_only);
        assert_eq!(insert_delta, "+%DA%82 %02 %5C %7C");
        assert_eq!(from_delta("", &insert_delta).unwrap(), insert_only);
    }

    #[test]
    fn rejects_count_overrunning_text1() {
        assert!(from_delta("ab", "=5").is_err());
    }

    #[test]
    fn rejects_unconsumed_text1_remainder() {
        assert!(from_delta("abcdef", "=2").is_err());
    }

    #[test]
    fn rejects_unrecognized_tag() {
        assert!(from_delta("ab", "*2").is_err());
    }

    #[test]
    fn empty_delta_and_empty_text1_round_trip() {
        assert_eq!(from_delta("", "").unwrap(), EditScript::new());
        assert_eq!(to_delta(&[]), "");
    }
}
