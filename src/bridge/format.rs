// In: src/bridge/format.rs

//! Defines all on-wire structures and constants for the deltacodec format.
//! This is the single source of truth for both the frame envelope and the
//! individual block layout, plus the descriptive structs `analyze` returns.

use serde::{Deserialize, Serialize};

use crate::config::{CompressionLevel, Monotonicity};
use crate::types::DeltaDataType;

//==================================================================================
// I. Frame-Level Format
//==================================================================================

/// The magic number identifying a deltacodec frame.
pub const FRAME_MAGIC: &[u8; 4] = b"DLTC";
/// The current version of the frame format.
pub const FRAME_FORMAT_VERSION: u16 = 1;
/// magic (4) + version (2) + blocks per vector (4) + vector count (1) + flags (2).
pub const FRAME_HEADER_SIZE: usize = 13;
/// Every block of the frame was written with the identity transform.
pub const FRAME_FLAG_NULL_TRANSFORM: u16 = 0x0001;
/// Flag bits this version understands. Anything else is rejected on read.
pub const KNOWN_FRAME_FLAGS: u16 = FRAME_FLAG_NULL_TRANSFORM;
/// The vector count is stored in a single byte.
pub const MAX_VECTORS_PER_FRAME: usize = u8::MAX as usize;

//==================================================================================
// II. Block-Level Format
//==================================================================================

/// type tag (1) + level (1) + monotonicity (1) + block index (4) + element count (4).
pub const BLOCK_FIXED_HEADER_SIZE: usize = 11;

//==================================================================================
// III. Analysis Results
//==================================================================================

/// A decoded block header, as reported by `DeltaCodec::analyze`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BlockInfo {
    pub data_type: DeltaDataType,
    pub level: CompressionLevel,
    pub monotonicity: Monotonicity,
    pub block_index: u32,
    pub element_count: u32,
    /// `Debug` rendering of the anchor.
    pub anchor: String,
    /// `Debug` rendering of the factor, when the block has one.
    pub factor: Option<String>,
    pub header_size: usize,
    pub payload_size: usize,
}

/// The structure of an encoded frame, without decoding any payload.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FrameInfo {
    pub version: u16,
    pub num_blocks_per_vector: u32,
    pub num_vectors: u8,
    pub null_transform: bool,
    pub total_size: usize,
    /// `vectors[v][b]` describes block `b` of vector `v`.
    pub vectors: Vec<Vec<BlockInfo>>,
}

impl FrameInfo {
    pub fn element_count(&self) -> usize {
        self.vectors
            .first()
            .map(|blocks| blocks.iter().map(|b| b.element_count as usize).sum())
            .unwrap_or(0)
    }

    /// Pretty JSON, for logging.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}
