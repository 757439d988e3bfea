// In: src/frame_pipeline/vectors.rs

use std::borrow::Cow;
use std::sync::Arc;

use rayon::prelude::*;

use super::VectorEncoder;
use crate::block_pipeline::frame::{read_encoded_blocks, write_encoded_blocks, EncodedFrame};
use crate::block_pipeline::orchestrator::{clamp_num_blocks, decode_vector, encode_vector};
use crate::block_pipeline::{BlockRange, BlockSettings, OrderedRangeFactory, PipelineContext};
use crate::bridge::format::{FRAME_FLAG_NULL_TRANSFORM, MAX_VECTORS_PER_FRAME};
use crate::config::{ColumnSettings, TransformKind};
use crate::error::DeltaCodecError;
use crate::finishers::Finisher;
use crate::traits::DeltaValue;
use crate::types::DeltaDataType;
use crate::utils::len_to_u32;

//==================================================================================
// 1. The Typed Vector
//==================================================================================

/// A column of `T` together with its resolved settings. Borrows the caller's
/// slice when it can and owns values extracted from records.
pub struct TypedVector<'a, T: DeltaValue> {
    values: Cow<'a, [T]>,
    settings: BlockSettings<T>,
}

impl<'a, T: DeltaValue> TypedVector<'a, T> {
    /// # Errors
    /// `InvalidArgument` if the granularity does not apply to `T`.
    pub fn borrowed(values: &'a [T], settings: &ColumnSettings) -> Result<Self, DeltaCodecError> {
        Ok(Self {
            values: Cow::Borrowed(values),
            settings: BlockSettings::resolve(settings)?,
        })
    }

    /// # Errors
    /// `InvalidArgument` if the granularity does not apply to `T`.
    pub fn owned(values: Vec<T>, settings: &ColumnSettings) -> Result<Self, DeltaCodecError> {
        Ok(Self {
            values: Cow::Owned(values),
            settings: BlockSettings::resolve(settings)?,
        })
    }
}

impl<T: DeltaValue> VectorEncoder for TypedVector<'_, T> {
    fn data_type(&self) -> DeltaDataType {
        T::DATA_TYPE
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn raw_size(&self) -> usize {
        self.values.iter().map(DeltaValue::raw_size).sum()
    }

    fn encode_blocks(
        &self,
        ranges: &[BlockRange],
        ctx: &PipelineContext,
        vector: usize,
    ) -> Result<Vec<Vec<u8>>, DeltaCodecError> {
        encode_vector(&self.values, ranges, &self.settings, ctx, vector)
    }
}

//==================================================================================
// 2. Frame Encoding
//==================================================================================

/// Encodes every vector into one frame.
///
/// All vectors must share a length; they are partitioned once and every
/// (vector, block) pair is encoded as an independent task.
///
/// # Errors
/// `InvalidArgument` for an empty vector list, more than 255 vectors, or
/// vectors of different lengths. Any block failure aborts the whole frame.
pub fn encode_frame(
    vectors: &[Box<dyn VectorEncoder + '_>],
    requested_blocks: usize,
    max_blocks: usize,
    ctx: &PipelineContext,
) -> Result<Vec<u8>, DeltaCodecError> {
    // 1. Validating
    let Some(first) = vectors.first() else {
        return Err(DeltaCodecError::InvalidArgument(
            "a frame needs at least one vector".to_string(),
        ));
    };
    if vectors.len() > MAX_VECTORS_PER_FRAME {
        return Err(DeltaCodecError::InvalidArgument(format!(
            "a frame holds at most {} vectors, got {}",
            MAX_VECTORS_PER_FRAME,
            vectors.len()
        )));
    }
    let len = first.len();
    if let Some((v, other)) = vectors.iter().enumerate().find(|(_, candidate)| candidate.len() != len) {
        return Err(DeltaCodecError::InvalidArgument(format!(
            "vector {} ({}) has {} values, vector 0 has {}",
            v,
            other.data_type(),
            other.len(),
            len
        )));
    }

    // 2. Partitioning
    let num_blocks = clamp_num_blocks(requested_blocks, max_blocks);
    let header_blocks = len_to_u32(num_blocks, "blocks per vector")?;
    let ranges = OrderedRangeFactory::create(0, len, num_blocks)?;
    log::debug!(
        "encoding frame: {} vectors x {} blocks, {} values per vector",
        vectors.len(),
        num_blocks,
        len
    );

    // 3. Transforming and compressing
    let blocks_by_vector = vectors
        .par_iter()
        .enumerate()
        .map(|(v, vector)| vector.encode_blocks(&ranges, ctx, v))
        .collect::<Result<Vec<_>, DeltaCodecError>>()?;

    // 4. Framing
    let flags = match ctx.transform {
        TransformKind::Delta => 0,
        TransformKind::Null => FRAME_FLAG_NULL_TRANSFORM,
    };
    let bytes = write_encoded_blocks(header_blocks, flags, &blocks_by_vector)?;

    log_metric!(
        "event"="encode_frame",
        "vectors"=vectors.len(),
        "blocks"=num_blocks,
        "values"=len,
        "raw_bytes"=vectors.iter().map(|v| v.raw_size()).sum::<usize>(),
        "frame_bytes"=bytes.len()
    );
    Ok(bytes)
}

//==================================================================================
// 3. Frame Decoding
//==================================================================================

/// A deframed, validated frame whose vectors can be decoded independently.
pub struct FrameReader<'a> {
    frame: EncodedFrame<'a>,
    ctx: PipelineContext,
}

impl<'a> FrameReader<'a> {
    /// Deframes `bytes`, which must hold exactly `expected_vectors` vectors. The
    /// transform is taken from the frame flags.
    pub fn open(
        bytes: &'a [u8],
        expected_vectors: usize,
        finisher: Arc<dyn Finisher>,
    ) -> Result<Self, DeltaCodecError> {
        let frame = read_encoded_blocks(bytes, expected_vectors)?;
        let transform = if frame.header.is_null_transform() {
            TransformKind::Null
        } else {
            TransformKind::Delta
        };
        log::debug!(
            "decoding frame: {} vectors x {} blocks, {:?} transform",
            frame.header.num_vectors,
            frame.header.num_blocks_per_vector,
            transform
        );
        Ok(Self {
            frame,
            ctx: PipelineContext::new(finisher, transform),
        })
    }

    pub fn num_vectors(&self) -> usize {
        self.frame.vectors.len()
    }

    pub fn num_blocks_per_vector(&self) -> u32 {
        self.frame.header.num_blocks_per_vector
    }

    /// Decodes vector `vector` as a column of `T`.
    ///
    /// # Errors
    /// `InvalidArgument` for an out-of-range vector, `TypeMismatch` (wrapped in
    /// `BlockFailure`) if the vector was written for another type.
    pub fn decode_vector<T: DeltaValue>(&self, vector: usize) -> Result<Vec<T>, DeltaCodecError> {
        let blocks = self.frame.vectors.get(vector).ok_or_else(|| {
            DeltaCodecError::InvalidArgument(format!(
                "vector {} requested from a frame of {}",
                vector,
                self.num_vectors()
            ))
        })?;
        decode_vector(blocks, &self.ctx, vector)
    }
}
