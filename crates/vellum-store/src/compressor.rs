//! The `BlobCompressor` external-collaborator boundary: opaque text ⇄
//! opaque compressed text.

use thiserror::Error;

/// Compresses and decompresses an opaque blob (a serialized patch, in
/// practice). Contract: lossless, and idempotent on the compressed form for
/// a fixed version tag — compressing an already-compressed blob of the same
/// version must reproduce it unchanged.
pub trait BlobCompressor {
    fn compress(&self, text: &str) -> Result<Vec<u8>, CompressorError>;
    fn decompress(&self, bytes: &[u8]) -> Result<String, CompressorError>;
}

/// Failure surfaced from a [`BlobCompressor`] implementation.
#[derive(Debug, Error)]
#[error("compressor error: {0}")]
pub struct CompressorError(pub String);

impl CompressorError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

const RLE_MAGIC: u8 = 0xB1;
const MAX_RUN: usize = 255;

/// Byte-oriented run-length compressor: `[MAGIC, (run_len: u8, byte)*]`.
/// Cheap and exact for the repetitive boilerplate typical of patch-text
/// headers and equal-run tokens; a blob with little repetition can come out
/// larger than the input, which is acceptable since callers only adopt a
/// compacted form when it measures smaller (see `RepositoryFacade`).
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLengthCompressor;

impl BlobCompressor for RunLengthCompressor {
    fn compress(&self, text: &str) -> Result<Vec<u8>, CompressorError> {
        let bytes = text.as_bytes();
        let mut out = Vec::with_capacity(bytes.len() + 1);
        out.push(RLE_MAGIC);

        let mut i = 0;
        while i < bytes.len() {
            let byte = bytes[i];
            let mut run = 1usize;
            while i + run < bytes.len() && bytes[i + run] == byte && run < MAX_RUN {
                run += 1;
            }
            out.push(run as u8);
            out.push(byte);
            i += run;
        }
        Ok(out)
    }

    fn decompress(&self, bytes: &[u8]) -> Result<String, CompressorError> {
        let Some((&magic, rest)) = bytes.split_first() else {
            return Ok(String::new());
        };
        if magic != RLE_MAGIC {
            return Err(CompressorError::new(format!("unrecognized magic byte {magic:#04x}")));
        }
        if rest.len() % 2 != 0 {
            return Err(CompressorError::new("truncated run-length stream"));
        }

        let mut out = Vec::with_capacity(rest.len());
        for pair in rest.chunks_exact(2) {
            let [run, byte] = [pair[0], pair[1]];
            out.extend(std::iter::repeat(byte).take(run as usize));
        }
        String::from_utf8(out).map_err(|e| CompressorError::new(e.to_string()))
    }
}

/// Pass-through compressor, useful for tests and for callers who want to
/// store patch text uncompressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCompressor;

impl BlobCompressor for NoopCompressor {
    fn compress(&self, text: &str) -> Result<Vec<u8>, CompressorError> {
        Ok(text.as_bytes().to_vec())
    }

    fn decompress(&self, bytes: &[u8]) -> Result<String, CompressorError> {
        String::from_utf8(bytes.to_vec()).map_err(|e| CompressorError::new(e.to_string()))
    }
}
