//! The `Codec` external-collaborator boundary: user value ⇄ canonical text.

use thiserror::Error;

/// Maps a user value to and from canonical text.
///
/// Contract: deterministic, and equal values must yield byte-equal
/// encodings — revision identity ([`crate::snapshot::RevId`]) is a hash of
/// this output, so two encodings of "the same" value that differ even in
/// whitespace are, as far as the store is concerned, different values.
pub trait Codec<V> {
    /// Encode `value` to canonical text.
    fn encode(&self, value: &V) -> Result<String, CodecError>;
    /// Decode `text` back to a value. `decode(encode(v))` must equal `v`
    /// for every `v` the store will accept.
    fn decode(&self, text: &str) -> Result<V, CodecError>;
}

/// Failure surfaced from a [`Codec`] implementation.
#[derive(Debug, Error)]
#[error("codec error: {0}")]
pub struct CodecError(pub String);

impl CodecError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Reference [`Codec`] adapter for any `V` that round-trips through JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec<V> {
    _marker: std::marker::PhantomData<V>,
}

impl<V> JsonCodec<V> {
    pub fn new() -> Self {
        Self { _marker: std::marker::PhantomData }
    }
}

impl<V> Codec<V> for JsonCodec<V>
where
    V: serde::Serialize + serde::de::DeserializeOwned,
{
    fn encode(&self, value: &V) -> Result<String, CodecError> {
        serde_json::to_string(value).map_err(|e| CodecError::new(e.to_string()))
    }

    fn decode(&self, text: &str) -> Result<V, CodecError> {
        serde_json::from_str(text).map_err(|e| CodecError::new(e.to_string()))
    }
}

/// Trivial [`Codec`] for plain strings: the "value" and the canonical text
/// are identical, so `encode`/`decode` can never fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextCodec;

impl Codec<String> for PlainTextCodec {
    fn encode(&self, value: &String) -> Result<String, CodecError> {
        Ok(value.clone())
    }

    fn decode(&self, text: &str) -> Result<String, CodecError> {
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Doc {
        title: String,
        body: String,
    }

    #[test]
    fn json_codec_round_trips() {
        let codec = JsonCodec::<Doc>::new();
        let doc = Doc { title: "t".into(), body: "b".into() };
        let text = codec.encode(&doc).unwrap();
        assert_eq!(codec.decode(&text).unwrap(), doc);
    }

    #[test]
    fn plain_text_codec_is_identity() {
        let codec = PlainTextCodec;
        let text = codec.encode(&"hello".to_string()).unwrap();
        assert_eq!(text, "hello");
        assert_eq!(codec.decode(&text).unwrap(), "hello");
    }
}
