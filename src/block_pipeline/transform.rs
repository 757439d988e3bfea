//! One block in, one `DeltaBlockState` out, and back.
//!
//! Encoding is `values -> DeltaValue::encode_deltas -> finisher`, decoding is the
//! exact reverse. The anchor is the block's first value (the type's default for
//! an empty block) and is stored verbatim in the header.

use std::borrow::Cow;

use crate::config::{CompressionLevel, TransformKind};
use crate::error::DeltaCodecError;
use crate::traits::{DeltaEncoding, DeltaValue};
use crate::utils::len_to_u32;

use super::block_state::{DeltaBlockState, DeltaFlags};
use super::context::{BlockSettings, PipelineContext};

/// Encodes one block.
///
/// # Errors
/// * `InvalidArgument` if the block holds more than `u32::MAX` values.
/// * `TransformFailure` from the delta transform.
/// * `Finisher` if compression fails.
pub fn encode_block<T: DeltaValue>(
    values: &[T],
    block_index: u32,
    settings: &BlockSettings<T>,
    ctx: &PipelineContext,
) -> Result<DeltaBlockState<T>, DeltaCodecError> {
    let element_count = len_to_u32(values.len(), "block element count")?;
    let anchor = values.first().cloned().unwrap_or_default();

    let encoding = match ctx.transform {
        TransformKind::Delta => T::encode_deltas(
            values,
            &anchor,
            settings.granularity.as_ref(),
            settings.monotonicity,
        )?,
        TransformKind::Null => {
            let mut bytes = Vec::new();
            T::encode_raw(values, &mut bytes);
            DeltaEncoding::plain(bytes)
        }
    };
    let unfinished_len = encoding.bytes.len();

    let payload = match settings.level {
        CompressionLevel::NoCompression => encoding.bytes,
        level => ctx.finisher.compress(&encoding.bytes, level)?,
    };

    log_metric!(
        "event"="encode_block",
        "type"=T::DATA_TYPE,
        "block"=block_index,
        "count"=element_count,
        "delta_bytes"=unfinished_len,
        "finished_bytes"=payload.len()
    );

    Ok(DeltaBlockState {
        block_index,
        element_count,
        anchor,
        factor: encoding.factor,
        flags: DeltaFlags {
            data_type: T::DATA_TYPE,
            level: settings.level,
            monotonicity: encoding.monotonicity,
        },
        payload,
    })
}

/// Decodes one block. The transform is frame-wide, so it comes from `ctx`
/// rather than the block.
///
/// # Errors
/// * `Finisher` if decompression fails.
/// * `CorruptData` if the delta stream is inconsistent with the header.
pub fn decode_block<T: DeltaValue>(
    state: &DeltaBlockState<T>,
    ctx: &PipelineContext,
) -> Result<Vec<T>, DeltaCodecError> {
    let count = state.element_count as usize;

    let unfinished: Cow<'_, [u8]> = match state.flags.level {
        CompressionLevel::NoCompression => Cow::Borrowed(&state.payload),
        _ => Cow::Owned(ctx.finisher.decompress(&state.payload)?),
    };

    let values = match ctx.transform {
        TransformKind::Delta => T::decode_deltas(
            &state.anchor,
            state.factor.as_ref(),
            state.flags.monotonicity,
            count,
            &unfinished,
        )?,
        TransformKind::Null => T::decode_raw(count, &unfinished)?,
    };

    if values.len() != count {
        return Err(DeltaCodecError::CorruptData(format!(
            "block {} decoded to {} values but declares {}",
            state.block_index,
            values.len(),
            count
        )));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FinisherKind, Monotonicity};
    use crate::finishers::finisher_for;

    fn ctx(transform: TransformKind) -> PipelineContext {
        PipelineContext::new(finisher_for(FinisherKind::Zstd), transform)
    }

    fn settings<T: DeltaValue>(level: CompressionLevel, monotonicity: Monotonicity) -> BlockSettings<T> {
        BlockSettings {
            level,
            granularity: None,
            monotonicity,
        }
    }

    #[test]
    fn test_block_roundtrip_all_levels() {
        let values: Vec<i64> = (0..1_000).map(|i| 1_700_000_000_000 + i * 1_000).collect();
        for transform in [TransformKind::Delta, TransformKind::Null] {
            for level in [
                CompressionLevel::Optimal,
                CompressionLevel::Fastest,
                CompressionLevel::NoCompression,
            ] {
                let ctx = ctx(transform);
                let s = settings::<i64>(level, Monotonicity::Increasing);
                let state = encode_block(&values, 7, &s, &ctx).unwrap();
                assert_eq!(state.block_index, 7);
                assert_eq!(state.element_count, 1_000);
                assert_eq!(state.anchor, values[0]);
                assert_eq!(decode_block(&state, &ctx).unwrap(), values);
            }
        }
    }

    #[test]
    fn test_anchor_and_factor_are_recorded() {
        let values: Vec<i64> = vec![100, 150, 250, 200];
        let state = encode_block(
            &values,
            0,
            &settings(CompressionLevel::NoCompression, Monotonicity::None),
            &ctx(TransformKind::Delta),
        )
        .unwrap();
        assert_eq!(state.anchor, 100);
        assert_eq!(state.factor, Some(50));
        assert_eq!(state.flags.monotonicity, Monotonicity::None);
    }

    #[test]
    fn test_empty_block_uses_default_anchor() {
        let state = encode_block::<i32>(
            &[],
            2,
            &settings(CompressionLevel::Fastest, Monotonicity::Increasing),
            &ctx(TransformKind::Delta),
        )
        .unwrap();
        assert_eq!(state.anchor, 0);
        assert_eq!(state.element_count, 0);
        assert!(decode_block(&state, &ctx(TransformKind::Delta)).unwrap().is_empty());
    }

    #[test]
    fn test_unhonoured_hint_is_recorded_as_none() {
        let values: Vec<i32> = vec![5, 4, 6];
        let state = encode_block(
            &values,
            0,
            &settings(CompressionLevel::Fastest, Monotonicity::Increasing),
            &ctx(TransformKind::Delta),
        )
        .unwrap();
        assert_eq!(state.flags.monotonicity, Monotonicity::None);
        assert_eq!(decode_block(&state, &ctx(TransformKind::Delta)).unwrap(), values);
    }

    #[test]
    fn test_corrupt_payload_is_an_error() {
        let values: Vec<i64> = (0..64).collect();
        let ctx = ctx(TransformKind::Delta);
        let mut state = encode_block(
            &values,
            0,
            &settings(CompressionLevel::Optimal, Monotonicity::None),
            &ctx,
        )
        .unwrap();
        state.payload.truncate(state.payload.len() / 2);
        assert!(decode_block(&state, &ctx).is_err());
    }
}
