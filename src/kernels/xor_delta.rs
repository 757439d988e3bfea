//! This module contains the pure, stateless kernels for performing XOR delta
//! encoding and decoding.
//!
//! This is a Value Reduction transform. It is the fallback for float blocks that
//! have no exact decimal scale: applied to the bit patterns of slowly changing
//! floats, it isolates the few bits that actually flip between neighbours.

use std::ops::BitXor;

/// Performs XOR delta encoding **in-place** on a mutable slice.
fn xor_delta_slice_inplace<T>(data: &mut [T])
where
    T: Copy + BitXor<Output = T>,
{
    if data.len() <= 1 {
        return;
    }
    // Iterate backwards for encoding to use original values for calculation.
    for i in (1..data.len()).rev() {
        data[i] = data[i] ^ data[i - 1];
    }
}

/// Reconstructs the original data from an XOR delta stream **in-place**.
fn xor_undelta_slice_inplace<T>(data: &mut [T])
where
    T: Copy + BitXor<Output = T>,
{
    // Iterate forwards to use the newly-decoded values for subsequent XORs.
    for i in 1..data.len() {
        data[i] = data[i] ^ data[i - 1];
    }
}

/// Returns `input_slice` with every element after the first replaced by its XOR
/// with the previous element.
pub fn encode<T>(input_slice: &[T]) -> Vec<T>
where
    T: Copy + BitXor<Output = T>,
{
    let mut data_vec = input_slice.to_vec();
    xor_delta_slice_inplace(&mut data_vec);
    data_vec
}

/// Inverts `encode` in place.
pub fn decode<T>(data: &mut [T])
where
    T: Copy + BitXor<Output = T>,
{
    xor_undelta_slice_inplace(data);
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xor_delta_roundtrip_u32() {
        let original: Vec<u32> = vec![0b1100, 0b1101, 0b1001, 0b1011];
        let expected_encoded: Vec<u32> = vec![0b1100, 0b0001, 0b0100, 0b0010];

        let mut encoded = encode(&original);
        assert_eq!(encoded, expected_encoded);

        decode(&mut encoded);
        assert_eq!(encoded, original);
    }

    #[test]
    fn test_xor_delta_float_bits_share_high_bits() {
        let original: Vec<u64> = [100.25f64, 100.5, 100.75].iter().map(|f| f.to_bits()).collect();
        let encoded = encode(&original);
        // Neighbouring floats of equal exponent share sign and exponent bits.
        assert!(encoded[1..].iter().all(|x| x >> 52 == 0));

        let mut decoded = encoded.clone();
        decode(&mut decoded);
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_xor_delta_empty_and_single() {
        let empty: Vec<u32> = vec![];
        assert!(encode(&empty).is_empty());

        let single = vec![42u64];
        let mut encoded = encode(&single);
        assert_eq!(encoded, single);
        decode(&mut encoded);
        assert_eq!(encoded, single);
    }
}
