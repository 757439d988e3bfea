//! Fans the blocks of one vector out across the rayon pool and gathers them
//! back in block-index order.
//!
//! Each block task owns its output buffer, so no task ever touches another
//! task's data. The first failure aborts the vector; the error is tagged with
//! the stage, vector, and block that produced it.

use rayon::prelude::*;

use crate::error::DeltaCodecError;
use crate::traits::DeltaValue;

use super::block_state::DeltaBlockState;
use super::context::{BlockSettings, PipelineContext};
use super::partition::BlockRange;
use super::transform::{decode_block, encode_block};

/// Clamps a requested block count into `1..=max`.
pub fn clamp_num_blocks(requested: usize, max: usize) -> usize {
    requested.clamp(1, max.max(1))
}

fn tagged(stage: &'static str, vector: usize, block: usize) -> impl Fn(DeltaCodecError) -> DeltaCodecError {
    move |e| {
        let e = e.in_block(stage, vector, block);
        log::error!("{}", e);
        e
    }
}

/// Encodes and serializes every block of one vector.
///
/// Returns one serialized block per range, in range order.
pub fn encode_vector<T: DeltaValue>(
    values: &[T],
    ranges: &[BlockRange],
    settings: &BlockSettings<T>,
    ctx: &PipelineContext,
    vector: usize,
) -> Result<Vec<Vec<u8>>, DeltaCodecError> {
    let blocks = ranges
        .par_iter()
        .enumerate()
        .map(|(i, range)| {
            let on_error = tagged("encode", vector, i);
            let block = values.get(range.as_range()).ok_or_else(|| {
                on_error(DeltaCodecError::InternalError(format!(
                    "range {:?} exceeds a vector of {} values",
                    range,
                    values.len()
                )))
            })?;
            let index = u32::try_from(i).map_err(|_| {
                on_error(DeltaCodecError::InvalidArgument(format!("block index {} exceeds u32", i)))
            })?;
            encode_block(block, index, settings, ctx)
                .and_then(|state| state.to_bytes())
                .map_err(&on_error)
        })
        .collect::<Result<Vec<Vec<u8>>, DeltaCodecError>>()?;

    log_metric!(
        "event"="encode_vector",
        "vector"=vector,
        "type"=T::DATA_TYPE,
        "blocks"=blocks.len(),
        "bytes"=blocks.iter().map(Vec::len).sum::<usize>()
    );
    Ok(blocks)
}

/// Deserializes and decodes every block of one vector, then concatenates them
/// by the block index each one records.
///
/// # Errors
/// `CorruptData` if a recorded index is out of range or appears twice, on top
/// of any per-block failure.
pub fn decode_vector<T: DeltaValue>(
    blocks: &[&[u8]],
    ctx: &PipelineContext,
    vector: usize,
) -> Result<Vec<T>, DeltaCodecError> {
    let decoded = blocks
        .par_iter()
        .enumerate()
        .map(|(i, bytes)| {
            let on_error = tagged("decode", vector, i);
            let state = DeltaBlockState::<T>::from_bytes(bytes).map_err(&on_error)?;
            let values = decode_block(&state, ctx).map_err(&on_error)?;
            Ok((state.block_index, values))
        })
        .collect::<Result<Vec<(u32, Vec<T>)>, DeltaCodecError>>()?;

    let mut slots: Vec<Option<Vec<T>>> = (0..blocks.len()).map(|_| None).collect();
    for (index, values) in decoded {
        let slot = slots.get_mut(index as usize).ok_or_else(|| {
            DeltaCodecError::CorruptData(format!(
                "vector {} has a block index {} outside 0..{}",
                vector,
                index,
                blocks.len()
            ))
        })?;
        if slot.replace(values).is_some() {
            return Err(DeltaCodecError::CorruptData(format!(
                "vector {} contains block index {} twice",
                vector, index
            )));
        }
    }

    let total: usize = slots.iter().flatten().map(Vec::len).sum();
    let mut out = Vec::with_capacity(total);
    for (index, slot) in slots.into_iter().enumerate() {
        let values = slot.ok_or_else(|| {
            DeltaCodecError::CorruptData(format!("vector {} is missing block {}", vector, index))
        })?;
        out.extend(values);
    }
    Ok(out)
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
