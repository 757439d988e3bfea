// In: src/bridge/stateless_api.rs

//! One-shot helpers over a default-configured codec, for callers that do not
//! need to keep a `DeltaCodec` around.

use std::sync::Arc;

use crate::block_pipeline::frame::peek_frame_info;
use crate::bridge::codec::DeltaCodec;
use crate::bridge::format::FrameInfo;
use crate::config::{CodecConfig, CompressionLevel};
use crate::error::DeltaCodecError;
use crate::frame_pipeline::EncodingArgs;
use crate::traits::DeltaValue;

fn default_codec() -> Result<DeltaCodec, DeltaCodecError> {
    DeltaCodec::new(Arc::new(CodecConfig::default()))
}

/// Encodes one column with the default configuration.
pub fn encode_column<T: DeltaValue>(
    values: &[T],
    num_blocks: usize,
    level: CompressionLevel,
) -> Result<Vec<u8>, DeltaCodecError> {
    default_codec()?.encode(&EncodingArgs::new(values, num_blocks, level))
}

/// Decodes a column written by `encode_column` (or any default-finisher codec).
pub fn decode_column<T: DeltaValue>(bytes: &[u8]) -> Result<Vec<T>, DeltaCodecError> {
    default_codec()?.decode(bytes)
}

/// Analyzes an encoded frame without decompressing any payload.
pub fn analyze_frame(bytes: &[u8]) -> Result<FrameInfo, DeltaCodecError> {
    peek_frame_info(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_frame_after_encoding() {
        // 1. Arrange: a column with an obvious step.
        let values: Vec<i32> = (0..1_000).map(|i| 500 + i * 10).collect();

        // 2. Act: encode it with the stateless helper.
        let bytes = encode_column(&values, 4, CompressionLevel::Optimal).unwrap();

        // 3. Act: analyze the result.
        let info = analyze_frame(&bytes).unwrap();

        // 4. Assert: the headers describe what was written.
        assert_eq!(info.total_size, bytes.len());
        assert_eq!(info.num_vectors, 1);
        assert_eq!(info.num_blocks_per_vector, 4);
        assert_eq!(info.element_count(), 1_000);
        assert!(!info.null_transform);
        let first = &info.vectors[0][0];
        assert_eq!(first.anchor, "500");
        assert_eq!(first.factor.as_deref(), Some("10"));
        assert!(info.to_json().contains("\"Int32\""));

        assert_eq!(decode_column::<i32>(&bytes).unwrap(), values);
    }
}
