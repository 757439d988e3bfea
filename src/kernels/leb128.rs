//! This module contains the pure, stateless kernels for performing LEB128
//! (Little-Endian Base 128) variable-length integer encoding and decoding.
//!
//! This is a Bit-Width Reduction transform, ideal for streams of unsigned
//! integers where most values are small. It is fully panic-free: truncated or
//! over-long input is reported as `Leb128DecodeError`.

use num_traits::{PrimInt, Unsigned};
use std::io::Cursor;

use crate::error::DeltaCodecError;

//==================================================================================
// 1. Single-Value Operations
//==================================================================================

/// Encodes a single unsigned integer into a LEB128 byte sequence, appending to `buffer`.
pub fn encode_one<T>(value: T, buffer: &mut Vec<u8>) -> Result<(), DeltaCodecError>
where
    T: PrimInt + Unsigned,
{
    let zero = T::zero();
    let seven_bit_mask = T::from(0x7F).ok_or_else(|| {
        DeltaCodecError::Leb128DecodeError("Failed to create 7-bit mask for type".to_string())
    })?;

    let mut current_value = value;
    loop {
        let low = (current_value & seven_bit_mask).to_u8().ok_or_else(|| {
            DeltaCodecError::Leb128DecodeError(
                "Failed to convert generic integer to u8".to_string(),
            )
        })?;
        current_value = current_value >> 7;
        if current_value == zero {
            buffer.push(low);
            return Ok(());
        }
        buffer.push(low | 0x80);
    }
}

/// Decodes a single unsigned integer from a LEB128 byte stream cursor.
pub fn decode_one<T>(cursor: &mut Cursor<&[u8]>) -> Result<T, DeltaCodecError>
where
    T: PrimInt + Unsigned,
{
    let mut result = T::zero();
    let mut shift = 0;
    let total_bits = std::mem::size_of::<T>() * 8;

    loop {
        let pos = cursor.position() as usize;
        let byte = *cursor.get_ref().get(pos).ok_or_else(|| {
            DeltaCodecError::Leb128DecodeError("Unexpected end of buffer".to_string())
        })?;
        cursor.set_position((pos + 1) as u64);

        if shift >= total_bits {
            return Err(DeltaCodecError::Leb128DecodeError(
                "Integer overflow during decoding".to_string(),
            ));
        }

        let seven_bit_payload = T::from(byte & 0x7F).ok_or_else(|| {
            DeltaCodecError::Leb128DecodeError(
                "Failed to create 7-bit payload from byte".to_string(),
            )
        })?;
        result = result | (seven_bit_payload << shift);

        if byte & 0x80 == 0 {
            // The final group may not set bits beyond the width of T.
            if shift + 7 > total_bits && ((byte & 0x7F) >> (total_bits - shift)) > 0 {
                return Err(DeltaCodecError::Leb128DecodeError(
                    "Integer overflow during decoding".to_string(),
                ));
            }
            return Ok(result);
        }

        shift += 7;
    }
}
