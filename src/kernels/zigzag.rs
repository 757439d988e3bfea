//! This module contains the pure, stateless kernels for performing Zig-zag
//! encoding and decoding.
//!
//! This is a Bit-Width Reduction transform: a lossless, bitwise mapping of
//! signed integers to unsigned integers that keeps small magnitudes small
//! regardless of sign, so the LEB128 kernel can store them in few bytes.

use num_traits::{PrimInt, Signed, Unsigned};

use crate::traits::{HasSigned, HasUnsigned};

//==================================================================================
// 1. Generic Core Logic
//==================================================================================

/// Encodes a single signed integer using the Zig-zag algorithm.
#[inline]
pub fn encode_val<T>(n: T) -> T::Unsigned
where
    T: PrimInt + Signed + HasUnsigned,
{
    let bits = std::mem::size_of::<T>() * 8;
    // `>>` on a signed primitive is arithmetic, so this is all-ones or all-zeros.
    ((n << 1) ^ (n >> (bits - 1))).to_unsigned_bits()
}

/// Decodes a single unsigned integer back to its signed representation.
#[inline]
pub fn decode_val<U>(n: U) -> U::Signed
where
    U: PrimInt + Unsigned + HasSigned,
    U::Signed: PrimInt + Signed,
{
    let shifted = (n >> 1).to_signed_bits();
    let lsb = (n & U::one()).to_signed_bits();
    shifted ^ (-lsb)
}

//==================================================================================
// 2. Unit Tests
//==================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zigzag_core_logic_i32() {
        assert_eq!(encode_val(0i32), 0u32);
        assert_eq!(encode_val(-1i32), 1u32);
        assert_eq!(encode_val(1i32), 2u32);
        assert_eq!(encode_val(-2i32), 3u32);

        assert_eq!(decode_val(0u32), 0i32);
        assert_eq!(decode_val(1u32), -1i32);
        assert_eq!(decode_val(2u32), 1i32);
        assert_eq!(decode_val(3u32), -2i32);
    }

    #[test]
    fn test_zigzag_extremes_i128() {
        for v in [i128::MIN, i128::MIN + 1, -1, 0, 1, i128::MAX - 1, i128::MAX] {
            assert_eq!(decode_val(encode_val(v)), v);
        }
        assert_eq!(encode_val(i128::MAX), u128::MAX - 1);
        assert_eq!(encode_val(i128::MIN), u128::MAX);
    }

    #[test]
    fn test_zigzag_alternating_signs_i16() {
        let original: Vec<i16> = vec![-5, 4, -3, 2, -1, 0, 100, -100, i16::MIN, i16::MAX];
        let encoded: Vec<u16> = original.iter().map(|&v| encode_val(v)).collect();
        assert_eq!(&encoded[..6], &[9u16, 8, 5, 4, 1, 0]);
        let decoded: Vec<i16> = encoded.iter().map(|&v| decode_val(v)).collect();
        assert_eq!(decoded, original);
    }
}
