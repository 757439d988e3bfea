//! LZ4 block format via `lz4_flex`, with the uncompressed size prepended.
//!
//! `lz4_flex` has a single speed-oriented mode, so both quality levels produce
//! the same output.

use super::Finisher;
use crate::config::CompressionLevel;
use crate::error::DeltaCodecError;

#[derive(Debug, Default, Clone, Copy)]
pub struct Lz4Finisher;

impl Finisher for Lz4Finisher {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn compress(&self, input: &[u8], _level: CompressionLevel) -> Result<Vec<u8>, DeltaCodecError> {
        Ok(lz4_flex::compress_prepend_size(input))
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, DeltaCodecError> {
        lz4_flex::decompress_size_prepended(input).map_err(|e| DeltaCodecError::Finisher {
            finisher: "lz4",
            message: e.to_string(),
        })
    }
}
