//! Defines the self-describing wire layout for a single encoded block.
//! This module is the single source of truth for serializing and deserializing
//! a `DeltaBlockState`, and for reading a block header without its type known
//! up front.
//!
//! Layout (little-endian):
//!
//! ```text
//! [type tag u8][level u8][monotonicity u8][block index u32][element count u32]
//! [anchor: scalar form][has factor u8][factor: scalar form, if present]
//! [payload length u32][payload]
//! ```

use std::io::Cursor;

use crate::bridge::format::{BlockInfo, BLOCK_FIXED_HEADER_SIZE};
use crate::config::{CompressionLevel, Monotonicity};
use crate::error::DeltaCodecError;
use crate::traits::DeltaValue;
use crate::types::DeltaDataType;
use crate::utils::{len_to_u32, remaining, take_array, take_bytes};

//==================================================================================
// Public Structs
//==================================================================================

/// The three one-byte flags at the head of every block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaFlags {
    pub data_type: DeltaDataType,
    pub level: CompressionLevel,
    /// The monotonicity the stream was written with, not the caller's hint.
    pub monotonicity: Monotonicity,
}

impl DeltaFlags {
    pub fn to_bytes(self) -> [u8; 3] {
        [
            self.data_type.tag(),
            self.level.to_flag(),
            self.monotonicity.to_flag(),
        ]
    }

    pub fn from_bytes(bytes: [u8; 3]) -> Result<Self, DeltaCodecError> {
        Ok(Self {
            data_type: DeltaDataType::from_tag(bytes[0])?,
            level: CompressionLevel::from_flag(bytes[1])?,
            monotonicity: Monotonicity::from_flag(bytes[2])?,
        })
    }
}

/// One encoded block in memory. `payload` is the finished (compressed) stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaBlockState<T: DeltaValue> {
    pub block_index: u32,
    pub element_count: u32,
    pub anchor: T,
    pub factor: Option<T::Factor>,
    pub flags: DeltaFlags,
    pub payload: Vec<u8>,
}

//==================================================================================
// Core Implementation
//==================================================================================

impl<T: DeltaValue> DeltaBlockState<T> {
    /// Serializes the block into its canonical byte form.
    ///
    /// # Errors
    /// `InvalidArgument` if the payload does not fit a `u32` length.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DeltaCodecError> {
        let payload_len = len_to_u32(self.payload.len(), "block payload")?;

        let mut buf = Vec::with_capacity(BLOCK_FIXED_HEADER_SIZE + 48 + self.payload.len());
        buf.extend_from_slice(&self.flags.to_bytes());
        buf.extend_from_slice(&self.block_index.to_le_bytes());
        buf.extend_from_slice(&self.element_count.to_le_bytes());
        self.anchor.write_scalar(&mut buf);
        match &self.factor {
            Some(factor) => {
                buf.push(1);
                T::write_factor(factor, &mut buf);
            }
            None => buf.push(0),
        }
        buf.extend_from_slice(&payload_len.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }

    /// Deserializes a block written by `to_bytes`. `bytes` must hold exactly one
    /// block.
    ///
    /// # Errors
    /// * `TypeMismatch` if the block was written for a different element type.
    /// * `CorruptData` for unknown flags, truncation, or a declared payload
    ///   length that does not match the bytes present.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeltaCodecError> {
        let (header, mut cursor) = read_fixed_header(bytes)?;
        if header.data_type != T::DATA_TYPE {
            return Err(DeltaCodecError::TypeMismatch {
                stored: header.data_type.to_string(),
                requested: T::DATA_TYPE,
            });
        }
        let flags = DeltaFlags::from_bytes(header.flags)?;

        let anchor = T::read_scalar(&mut cursor)?;
        let factor = match take_array::<1>(&mut cursor) {
            Some([0]) => None,
            Some([1]) => Some(T::read_factor(&mut cursor)?),
            Some([other]) => {
                return Err(DeltaCodecError::CorruptData(format!(
                    "invalid factor marker {}",
                    other
                )))
            }
            None => return Err(truncated("factor marker")),
        };

        let payload_len = take_array::<4>(&mut cursor)
            .map(u32::from_le_bytes)
            .ok_or_else(|| truncated("payload length"))? as usize;
        // SECURITY: The declared length must match what is actually present
        // before anything is allocated for it.
        if payload_len != remaining(&cursor) {
            return Err(DeltaCodecError::CorruptData(format!(
                "declared payload length {} does not match the {} bytes available",
                payload_len,
                remaining(&cursor)
            )));
        }
        let payload = take_bytes(&mut cursor, payload_len)
            .ok_or_else(|| truncated("payload"))?
            .to_vec();

        Ok(Self {
            block_index: header.block_index,
            element_count: header.element_count,
            anchor,
            factor,
            flags,
            payload,
        })
    }

    /// Header bytes in front of the payload when serialized.
    pub fn header_size(&self) -> usize {
        let mut scratch = Vec::new();
        self.anchor.write_scalar(&mut scratch);
        if let Some(factor) = &self.factor {
            T::write_factor(factor, &mut scratch);
        }
        BLOCK_FIXED_HEADER_SIZE + scratch.len() + 1 + 4
    }

    /// Describes the block for `analyze`.
    pub fn info(&self) -> BlockInfo {
        BlockInfo {
            data_type: self.flags.data_type,
            level: self.flags.level,
            monotonicity: self.flags.monotonicity,
            block_index: self.block_index,
            element_count: self.element_count,
            anchor: format!("{:?}", self.anchor),
            factor: self.factor.as_ref().map(|f| format!("{:?}", f)),
            header_size: self.header_size(),
            payload_size: self.payload.len(),
        }
    }
}

//==================================================================================
// Header Peeking
//==================================================================================

struct FixedHeader {
    data_type: DeltaDataType,
    flags: [u8; 3],
    block_index: u32,
    element_count: u32,
}

fn read_fixed_header(bytes: &[u8]) -> Result<(FixedHeader, Cursor<&[u8]>), DeltaCodecError> {
    let mut cursor = Cursor::new(bytes);
    let flags = take_array::<3>(&mut cursor).ok_or_else(|| truncated("flags"))?;
    let data_type = DeltaDataType::from_tag(flags[0])?;
    let block_index = take_array::<4>(&mut cursor)
        .map(u32::from_le_bytes)
        .ok_or_else(|| truncated("block index"))?;
    let element_count = take_array::<4>(&mut cursor)
        .map(u32::from_le_bytes)
        .ok_or_else(|| truncated("element count"))?;
    Ok((
        FixedHeader {
            data_type,
            flags,
            block_index,
            element_count,
        },
        cursor,
    ))
}

/// The type tag of a serialized block, without validating the rest.
pub fn peek_data_type(bytes: &[u8]) -> Result<DeltaDataType, DeltaCodecError> {
    let tag = *bytes.first().ok_or_else(|| truncated("type tag"))?;
    DeltaDataType::from_tag(tag)
}

/// Parses a block of any type and describes it. The payload is validated for
/// length but never decompressed.
pub fn peek_block(bytes: &[u8]) -> Result<BlockInfo, DeltaCodecError> {
    use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
    use rust_decimal::Decimal;

    fn describe<T: DeltaValue>(bytes: &[u8]) -> Result<BlockInfo, DeltaCodecError> {
        DeltaBlockState::<T>::from_bytes(bytes).map(|state| state.info())
    }

    match peek_data_type(bytes)? {
        DeltaDataType::Int8 => describe::<i8>(bytes),
        DeltaDataType::Int16 => describe::<i16>(bytes),
        DeltaDataType::Int32 => describe::<i32>(bytes),
        DeltaDataType::Int64 => describe::<i64>(bytes),
        DeltaDataType::UInt8 => describe::<u8>(bytes),
        DeltaDataType::UInt16 => describe::<u16>(bytes),
        DeltaDataType::UInt32 => describe::<u32>(bytes),
        DeltaDataType::UInt64 => describe::<u64>(bytes),
        DeltaDataType::Float32 => describe::<f32>(bytes),
        DeltaDataType::Float64 => describe::<f64>(bytes),
        DeltaDataType::Decimal => describe::<Decimal>(bytes),
        DeltaDataType::DateTime => describe::<NaiveDateTime>(bytes),
        DeltaDataType::UtcDateTime => describe::<DateTime<Utc>>(bytes),
        DeltaDataType::Duration => describe::<TimeDelta>(bytes),
        DeltaDataType::Boolean => describe::<bool>(bytes),
        DeltaDataType::Text => describe::<String>(bytes),
    }
}

fn truncated(what: &str) -> DeltaCodecError {
    DeltaCodecError::CorruptData(format!("block truncated while reading {}", what))
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> DeltaBlockState<i64> {
        DeltaBlockState {
            block_index: 3,
            element_count: 4,
            anchor: -1_000,
            factor: Some(250),
            flags: DeltaFlags {
                data_type: DeltaDataType::Int64,
                level: CompressionLevel::Optimal,
                monotonicity: Monotonicity::Increasing,
            },
            payload: vec![9, 8, 7, 6, 5],
        }
    }

    #[test]
    fn test_layout_is_stable() {
        let bytes = sample_state().to_bytes().unwrap();
        assert_eq!(&bytes[..3], &[DeltaDataType::Int64.tag(), 0, 1]);
        assert_eq!(&bytes[3..7], &3u32.to_le_bytes());
        assert_eq!(&bytes[7..11], &4u32.to_le_bytes());
        assert_eq!(&bytes[11..19], &(-1_000i64).to_le_bytes());
        assert_eq!(bytes[19], 1);
        assert_eq!(&bytes[20..28], &250i64.to_le_bytes());
        assert_eq!(&bytes[28..32], &5u32.to_le_bytes());
        assert_eq!(&bytes[32..], &[9, 8, 7, 6, 5]);
        assert_eq!(sample_state().header_size(), 32);
    }

    #[test]
    fn test_roundtrip_with_and_without_factor() {
        let state = sample_state();
        let parsed = DeltaBlockState::<i64>::from_bytes(&state.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, state);

        let mut plain = sample_state();
        plain.factor = None;
        plain.payload.clear();
        let parsed = DeltaBlockState::<i64>::from_bytes(&plain.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, plain);
    }

    #[test]
    fn test_wrong_type_is_type_mismatch() {
        let bytes = sample_state().to_bytes().unwrap();
        let err = DeltaBlockState::<i32>::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            DeltaCodecError::TypeMismatch { requested: DeltaDataType::Int32, .. }
        ));
    }

    #[test]
    fn test_payload_length_must_match() {
        let mut bytes = sample_state().to_bytes().unwrap();
        bytes.push(0);
        assert!(matches!(
            DeltaBlockState::<i64>::from_bytes(&bytes),
            Err(DeltaCodecError::CorruptData(_))
        ));

        let bytes = sample_state().to_bytes().unwrap();
        for cut in [0, 2, 10, 18, 25, 30, bytes.len() - 1] {
            assert!(
                DeltaBlockState::<i64>::from_bytes(&bytes[..cut]).is_err(),
                "a block cut at {} bytes must not parse",
                cut
            );
        }
    }

    #[test]
    fn test_unknown_flags_are_corrupt() {
        let mut bytes = sample_state().to_bytes().unwrap();
        bytes[1] = 9;
        assert!(matches!(
            DeltaBlockState::<i64>::from_bytes(&bytes),
            Err(DeltaCodecError::CorruptData(_))
        ));

        let mut bytes = sample_state().to_bytes().unwrap();
        bytes[19] = 2;
        assert!(matches!(
            DeltaBlockState::<i64>::from_bytes(&bytes),
            Err(DeltaCodecError::CorruptData(_))
        ));
    }

    #[test]
    fn test_peek_block_dispatches_on_tag() {
        let info = peek_block(&sample_state().to_bytes().unwrap()).unwrap();
        assert_eq!(info.data_type, DeltaDataType::Int64);
        assert_eq!(info.anchor, "-1000");
        assert_eq!(info.factor.as_deref(), Some("250"));
        assert_eq!(info.payload_size, 5);
        assert!(peek_block(&[]).is_err());
        assert!(peek_block(&[0xEE]).is_err());
    }
}
