//! Percent-encoding shared by [`crate::delta`] and [`crate::patch_codec`].
//!
//! The safe set is wider than `encodeURIComponent`'s: letters, digits, and
//! `-_.!~*'();/?:@&=$,#` pass through literally, as does a plain space. A
//! literal `+` is always escaped to `%2B` — this is what keeps a `+` inside
//! insert text from reading as the `+`-prefixed insert token when a delta or
//! patch body is scanned. Every other byte becomes `%HH` uppercase hex.

use crate::error::DmpError;

fn is_safe(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' | b';' | b'/' | b'?'
                | b':' | b'@' | b'&' | b'=' | b'$' | b',' | b'#'
        )
}

/// Percent-encode `text` per the scheme above.
pub fn encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for byte in text.as_bytes() {
        match *byte {
            b' ' => out.push(' '),
            b'+' => out.push_str("%2B"),
            b if is_safe(b) => out.push(b as char),
            b => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Reverse [`encode`]. Fails with [`DmpError::InvalidArgument`] on a
/// malformed `%HH` escape or a result that is not valid UTF-8.
pub fn decode(text: &str) -> Result<String, DmpError> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .ok_or_else(|| DmpError::invalid("truncated percent-escape"))?;
            let hex_str = std::str::from_utf8(hex)
                .map_err(|_| DmpError::invalid("non-ASCII percent-escape"))?;
            let value = u8::from_str_radix(hex_str, 16)
                .map_err(|_| DmpError::invalid(format!("malformed percent-escape %{hex_str}")))?;
            out.push(value);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| DmpError::invalid("percent-decoded bytes are not UTF-8"))
}
