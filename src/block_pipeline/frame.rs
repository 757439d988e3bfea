//! The frame envelope: a fixed header followed by every block of every vector,
//! each prefixed by its length.
//!
//! ```text
//! ["DLTC"][version u16][blocks per vector u32][vector count u8][flags u16]
//! for v in vectors, for b in blocks: [block length u32][block bytes]
//! ```
//!
//! Vectors are written in order and each vector's blocks in block-index order.
//! Reading is zero-copy: blocks come back as slices of the input.

use std::io::Cursor;

use crate::bridge::format::{
    FrameInfo, FRAME_FLAG_NULL_TRANSFORM, FRAME_FORMAT_VERSION, FRAME_HEADER_SIZE, FRAME_MAGIC,
    KNOWN_FRAME_FLAGS, MAX_VECTORS_PER_FRAME,
};
use crate::error::DeltaCodecError;
use crate::utils::{len_to_u32, remaining, take_array, take_bytes};

use super::block_state::peek_block;

/// The parsed fixed header of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u16,
    pub num_blocks_per_vector: u32,
    pub num_vectors: u8,
    pub flags: u16,
}

impl FrameHeader {
    pub fn is_null_transform(&self) -> bool {
        self.flags & FRAME_FLAG_NULL_TRANSFORM != 0
    }
}

/// A frame split into per-vector block slices.
#[derive(Debug, Clone)]
pub struct EncodedFrame<'a> {
    pub header: FrameHeader,
    /// `vectors[v][b]` is the serialized block `b` of vector `v`.
    pub vectors: Vec<Vec<&'a [u8]>>,
}

fn format_error(message: impl Into<String>) -> DeltaCodecError {
    DeltaCodecError::FormatError(message.into())
}

//==================================================================================
// 1. Writer
//==================================================================================

/// Wraps serialized blocks in a frame.
///
/// # Errors
/// `InvalidArgument` if there are no vectors, more than 255 vectors, a vector
/// whose block count differs from `num_blocks`, or a block too large for its
/// `u32` length prefix.
pub fn write_encoded_blocks(
    num_blocks: u32,
    flags: u16,
    blocks_by_vector: &[Vec<Vec<u8>>],
) -> Result<Vec<u8>, DeltaCodecError> {
    if blocks_by_vector.is_empty() || blocks_by_vector.len() > MAX_VECTORS_PER_FRAME {
        return Err(DeltaCodecError::InvalidArgument(format!(
            "a frame holds 1 to {} vectors, got {}",
            MAX_VECTORS_PER_FRAME,
            blocks_by_vector.len()
        )));
    }
    if let Some((v, blocks)) = blocks_by_vector
        .iter()
        .enumerate()
        .find(|(_, blocks)| blocks.len() != num_blocks as usize)
    {
        return Err(DeltaCodecError::InvalidArgument(format!(
            "vector {} has {} blocks, the frame declares {}",
            v,
            blocks.len(),
            num_blocks
        )));
    }

    let body_size: usize = blocks_by_vector
        .iter()
        .flatten()
        .map(|block| block.len() + 4)
        .sum();
    let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + body_size);
    buf.extend_from_slice(FRAME_MAGIC);
    buf.extend_from_slice(&FRAME_FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&num_blocks.to_le_bytes());
    buf.push(blocks_by_vector.len() as u8);
    buf.extend_from_slice(&flags.to_le_bytes());

    for block in blocks_by_vector.iter().flatten() {
        let len = len_to_u32(block.len(), "serialized block")?;
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(block);
    }
    Ok(buf)
}

//==================================================================================
// 2. Reader
//==================================================================================

/// Parses and validates the fixed header.
pub fn read_frame_header(bytes: &[u8]) -> Result<FrameHeader, DeltaCodecError> {
    if bytes.len() < FRAME_HEADER_SIZE {
        return Err(format_error(format!(
            "frame is too small to be valid. Minimum size: {}, got: {}",
            FRAME_HEADER_SIZE,
            bytes.len()
        )));
    }
    let mut cursor = Cursor::new(bytes);
    let truncated = || format_error("frame header truncated");

    let magic = take_array::<4>(&mut cursor).ok_or_else(truncated)?;
    if magic != *FRAME_MAGIC {
        return Err(format_error("invalid frame magic number"));
    }
    let version = take_array::<2>(&mut cursor)
        .map(u16::from_le_bytes)
        .ok_or_else(truncated)?;
    if version != FRAME_FORMAT_VERSION {
        return Err(format_error(format!(
            "unsupported frame version: expected {}, got {}",
            FRAME_FORMAT_VERSION, version
        )));
    }
    let num_blocks_per_vector = take_array::<4>(&mut cursor)
        .map(u32::from_le_bytes)
        .ok_or_else(truncated)?;
    let [num_vectors] = take_array::<1>(&mut cursor).ok_or_else(truncated)?;
    let flags = take_array::<2>(&mut cursor)
        .map(u16::from_le_bytes)
        .ok_or_else(truncated)?;

    if num_blocks_per_vector == 0 {
        return Err(format_error("frame declares zero blocks per vector"));
    }
    if num_vectors == 0 {
        return Err(format_error("frame declares zero vectors"));
    }
    if flags & !KNOWN_FRAME_FLAGS != 0 {
        return Err(format_error(format!("unsupported frame flags {:#06x}", flags)));
    }

    Ok(FrameHeader {
        version,
        num_blocks_per_vector,
        num_vectors,
        flags,
    })
}

/// Splits a frame into block slices.
///
/// # Errors
/// `FormatError` if the header is invalid, the vector count differs from
/// `expected_vectors`, a length prefix runs past the end, or bytes remain after
/// the last block.
pub fn read_encoded_blocks(
    bytes: &[u8],
    expected_vectors: usize,
) -> Result<EncodedFrame<'_>, DeltaCodecError> {
    let header = read_frame_header(bytes)?;
    if header.num_vectors as usize != expected_vectors {
        return Err(format_error(format!(
            "frame holds {} vectors, {} were expected",
            header.num_vectors, expected_vectors
        )));
    }

    let mut cursor = Cursor::new(bytes);
    cursor.set_position(FRAME_HEADER_SIZE as u64);

    // SECURITY: Every block costs at least its 4-byte prefix. Reject declared
    // counts the buffer cannot possibly hold before allocating for them.
    let num_blocks = header.num_blocks_per_vector as usize;
    let total_blocks = num_blocks.saturating_mul(expected_vectors);
    if total_blocks.saturating_mul(4) > remaining(&cursor) {
        return Err(format_error(format!(
            "frame declares {} blocks but only {} bytes follow the header",
            total_blocks,
            remaining(&cursor)
        )));
    }

    let mut vectors = Vec::with_capacity(expected_vectors);
    for v in 0..expected_vectors {
        let mut blocks = Vec::with_capacity(num_blocks);
        for b in 0..num_blocks {
            let truncated =
                || format_error(format!("frame truncated at block {} of vector {}", b, v));
            let len = take_array::<4>(&mut cursor)
                .map(u32::from_le_bytes)
                .ok_or_else(truncated)?;
            let block = take_bytes(&mut cursor, len as usize).ok_or_else(truncated)?;
            blocks.push(block);
        }
        vectors.push(blocks);
    }

    if remaining(&cursor) != 0 {
        return Err(format_error(format!(
            "{} trailing bytes after the last block",
            remaining(&cursor)
        )));
    }

    Ok(EncodedFrame { header, vectors })
}

/// Describes every block of a frame without decompressing any payload.
pub fn peek_frame_info(bytes: &[u8]) -> Result<FrameInfo, DeltaCodecError> {
    let header = read_frame_header(bytes)?;
    let frame = read_encoded_blocks(bytes, header.num_vectors as usize)?;

    let vectors = frame
        .vectors
        .iter()
        .map(|blocks| blocks.iter().map(|block| peek_block(block)).collect())
        .collect::<Result<Vec<Vec<_>>, _>>()?;

    Ok(FrameInfo {
        version: header.version,
        num_blocks_per_vector: header.num_blocks_per_vector,
        num_vectors: header.num_vectors,
        null_transform: header.is_null_transform(),
        total_size: bytes.len(),
        vectors,
    })
}
