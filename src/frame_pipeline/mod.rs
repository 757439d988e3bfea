//! This module defines the highest-level processing pipeline: turning one or
//! more columns into a single multi-vector frame, and back. It drives the
//! lower-level `block_pipeline` once per vector, with every vector sharing the
//! same block ranges.

use crate::block_pipeline::{BlockRange, PipelineContext};
use crate::error::DeltaCodecError;
use crate::types::DeltaDataType;

//==================================================================================
// 1. Module Declarations
//==================================================================================

pub mod args;
pub mod schema;
mod vectors;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================

pub use self::args::{EncodingArgs, EncodingDescriptor, MapEncodingArgs, RecordEncodingArgs};
pub use self::schema::{decode_records, encode_records, ColumnBuilder, ColumnHandle, RecordSchema};
pub use self::vectors::{encode_frame, FrameReader, TypedVector};

/// **CONTRACT:** One column, type-erased, ready to be split into blocks.
///
/// `encode_frame` only needs the length to partition and a way to encode the
/// shared ranges; everything type-specific stays behind this trait.
pub trait VectorEncoder: Send + Sync {
    fn data_type(&self) -> DeltaDataType;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// In-memory size of the values, for `RawBytes` reporting.
    fn raw_size(&self) -> usize;

    /// Encodes one serialized block per range, in range order.
    fn encode_blocks(
        &self,
        ranges: &[BlockRange],
        ctx: &PipelineContext,
        vector: usize,
    ) -> Result<Vec<Vec<u8>>, DeltaCodecError>;
}

#[cfg(test)]
mod tests;
