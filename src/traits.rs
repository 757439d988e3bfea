//! This module defines shared traits used across the kernels and the block pipeline.
//!
//! * `HasUnsigned` / `HasSigned` pair each primitive integer with its counterpart
//!   of the same width, so the zig-zag kernel can stay generic.
//! * `DeltaValue` is the per-type strategy the block pipeline drives: how a type
//!   writes its anchor and factor, and how a block of it becomes a delta stream.

use std::fmt::Debug;
use std::io::Cursor;

use crate::config::{Granularity, Monotonicity};
use crate::error::DeltaCodecError;
use crate::types::DeltaDataType;

//==================================================================================
// 1. Signed / Unsigned Pairing
//==================================================================================

/// A trait that maps a signed integer type to its unsigned counterpart.
pub trait HasUnsigned {
    type Unsigned;
    /// Reinterprets the bit pattern as the unsigned type.
    fn to_unsigned_bits(self) -> Self::Unsigned;
}

/// A trait that maps an unsigned integer type to its signed counterpart.
pub trait HasSigned {
    type Signed;
    /// Reinterprets the bit pattern as the signed type.
    fn to_signed_bits(self) -> Self::Signed;
}

macro_rules! impl_signed_unsigned_pair {
    ($S:ty, $U:ty) => {
        impl HasUnsigned for $S {
            type Unsigned = $U;
            #[inline]
            fn to_unsigned_bits(self) -> $U {
                self as $U
            }
        }
        impl HasSigned for $U {
            type Signed = $S;
            #[inline]
            fn to_signed_bits(self) -> $S {
                self as $S
            }
        }
    };
}

impl_signed_unsigned_pair!(i8, u8);
impl_signed_unsigned_pair!(i16, u16);
impl_signed_unsigned_pair!(i32, u32);
impl_signed_unsigned_pair!(i64, u64);
impl_signed_unsigned_pair!(i128, u128);

//==================================================================================
// 2. The Per-Type Delta Strategy
//==================================================================================

/// What a `DeltaValue` hands back after transforming one block.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaEncoding<F> {
    /// The factor the block was scaled by, if any.
    pub factor: Option<F>,
    /// The monotonicity the stream was actually written with. This is the
    /// caller's hint when the block honours it, and `None` otherwise.
    pub monotonicity: Monotonicity,
    /// The unfinished delta stream.
    pub bytes: Vec<u8>,
}

impl<F> DeltaEncoding<F> {
    /// An encoding with no factor and no monotonicity, used by the passthrough types.
    pub fn plain(bytes: Vec<u8>) -> Self {
        Self {
            factor: None,
            monotonicity: Monotonicity::None,
            bytes,
        }
    }
}

/// A column element type the codec knows how to delta-encode.
///
/// Implementations must be deterministic: the same block, anchor, and factor must
/// always produce the same bytes, and `decode_deltas` must invert `encode_deltas`
/// exactly for every input it accepted.
pub trait DeltaValue: Clone + Send + Sync + Debug + Default + 'static {
    /// The scale type stored in a block header (e.g. `i64` for `i64`, `TimeDelta`
    /// for timestamps).
    type Factor: Clone + Send + Sync + Debug + PartialEq + 'static;

    /// The tag written at the head of every block of this type.
    const DATA_TYPE: DeltaDataType;

    /// Writes one value in its fixed header form.
    fn write_scalar(&self, buf: &mut Vec<u8>);

    /// Reads one value written by `write_scalar`.
    fn read_scalar(cursor: &mut Cursor<&[u8]>) -> Result<Self, DeltaCodecError>;

    fn write_factor(factor: &Self::Factor, buf: &mut Vec<u8>);

    fn read_factor(cursor: &mut Cursor<&[u8]>) -> Result<Self::Factor, DeltaCodecError>;

    /// Converts a configured granularity into this type's factor.
    ///
    /// # Errors
    /// `InvalidArgument` when the granularity is of the wrong kind for this type
    /// or is not strictly positive.
    fn factor_from_granularity(granularity: &Granularity) -> Result<Self::Factor, DeltaCodecError>;

    /// Rewrites `block` relative to `anchor`.
    fn encode_deltas(
        block: &[Self],
        anchor: &Self,
        granularity: Option<&Self::Factor>,
        monotonicity: Monotonicity,
    ) -> Result<DeltaEncoding<Self::Factor>, DeltaCodecError>;

    /// Reconstructs `count` values from the stream produced by `encode_deltas`.
    fn decode_deltas(
        anchor: &Self,
        factor: Option<&Self::Factor>,
        monotonicity: Monotonicity,
        count: usize,
        payload: &[u8],
    ) -> Result<Vec<Self>, DeltaCodecError>;

    /// In-memory footprint of one value, for raw-size accounting.
    fn raw_size(&self) -> usize {
        std::mem::size_of::<Self>()
    }

    /// Identity transform: every value in its scalar form, back to back.
    fn encode_raw(block: &[Self], buf: &mut Vec<u8>) {
        for value in block {
            value.write_scalar(buf);
        }
    }

    /// Inverse of `encode_raw`.
    fn decode_raw(count: usize, payload: &[u8]) -> Result<Vec<Self>, DeltaCodecError> {
        // Every scalar form takes at least one byte.
        if count > payload.len() {
            return Err(DeltaCodecError::CorruptData(format!(
                "{} raw {} values cannot fit in {} bytes",
                count,
                Self::DATA_TYPE,
                payload.len()
            )));
        }
        let mut cursor = Cursor::new(payload);
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(Self::read_scalar(&mut cursor)?);
        }
        if crate::utils::remaining(&cursor) != 0 {
            return Err(DeltaCodecError::CorruptData(format!(
                "{} trailing bytes after {} raw {} values",
                crate::utils::remaining(&cursor),
                count,
                Self::DATA_TYPE
            )));
        }
        Ok(out)
    }
}
