//! This module contains the pure, stateless kernels for performing Zstandard
//! compression and decompression.
//!
//! Each encoded buffer carries its uncompressed length as a `u64` little-endian
//! prefix so decoding can pre-size its output and verify the result.

use std::io::Write;

use crate::error::DeltaCodecError;

fn zstd_error(message: impl Into<String>) -> DeltaCodecError {
    DeltaCodecError::Finisher {
        finisher: "zstd",
        message: message.into(),
    }
}

/// Compresses `input_bytes` at the given zstd `level`, prepending the uncompressed size.
pub fn encode(input_bytes: &[u8], level: i32) -> Result<Vec<u8>, DeltaCodecError> {
    if input_bytes.is_empty() {
        return Ok(Vec::new());
    }

    let mut output_buf = Vec::with_capacity(input_bytes.len() / 2 + 16);
    let uncompressed_len: u64 = input_bytes.len() as u64;
    output_buf.extend_from_slice(&uncompressed_len.to_le_bytes());

    let mut encoder = zstd::stream::Encoder::new(&mut output_buf, level)
        .map_err(|e| zstd_error(e.to_string()))?;
    encoder
        .write_all(input_bytes)
        .map_err(|e| zstd_error(e.to_string()))?;
    encoder.finish().map_err(|e| zstd_error(e.to_string()))?;

    Ok(output_buf)
}

/// Decompresses a buffer produced by `encode`.
pub fn decode(input_bytes: &[u8]) -> Result<Vec<u8>, DeltaCodecError> {
    if input_bytes.is_empty() {
        return Ok(Vec::new());
    }

    let (len_bytes, compressed_data) = input_bytes
        .split_first_chunk::<8>()
        .ok_or_else(|| zstd_error("Input stream too short to contain size header."))?;
    let uncompressed_len = u64::from_le_bytes(*len_bytes) as usize;

    // The header is untrusted, so cap the up-front reservation.
    let mut decompressed_data = Vec::with_capacity(uncompressed_len.min(compressed_data.len() * 64));
    zstd::stream::copy_decode(compressed_data, &mut decompressed_data)
        .map_err(|e| zstd_error(e.to_string()))?;

    if decompressed_data.len() != uncompressed_len {
        return Err(zstd_error(format!(
            "Decompressed size does not match header. Expected {}, got {}.",
            uncompressed_len,
            decompressed_data.len()
        )));
    }

    Ok(decompressed_data)
}

//==================================================================================
// Unit Tests
//==================================================================================
