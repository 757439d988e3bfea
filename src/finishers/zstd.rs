//! Zstandard, delegating to the size-prefixed zstd kernel.

use super::Finisher;
use crate::config::CompressionLevel;
use crate::error::DeltaCodecError;
use crate::kernels;

/// zstd level used for `CompressionLevel::Optimal`.
const OPTIMAL_LEVEL: i32 = 19;
/// zstd level used for `CompressionLevel::Fastest`.
const FASTEST_LEVEL: i32 = 1;

#[derive(Debug, Default, Clone, Copy)]
pub struct ZstdFinisher;

impl Finisher for ZstdFinisher {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn compress(&self, input: &[u8], level: CompressionLevel) -> Result<Vec<u8>, DeltaCodecError> {
        let level = match level {
            CompressionLevel::Optimal => OPTIMAL_LEVEL,
            CompressionLevel::Fastest | CompressionLevel::NoCompression => FASTEST_LEVEL,
        };
        kernels::zstd::encode(input, level)
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, DeltaCodecError> {
        kernels::zstd::decode(input)
    }
}
