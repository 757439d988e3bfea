//! This module provides a set of shared, low-level utility functions used
//! throughout the deltacodec core.
//!
//! Its primary responsibilities include:
//! 1.  Bounds-checked readers over a `Cursor` so no header parser can index past
//!     the end of a buffer.
//! 2.  Small integer helpers shared by the delta kernels and the block format.

use std::io::Cursor;

use crate::error::DeltaCodecError;

//==================================================================================
// 1. Cursor Readers
//==================================================================================

/// Takes the next `len` bytes from the cursor, or `None` if fewer remain.
pub fn take_bytes<'a>(cursor: &mut Cursor<&'a [u8]>, len: usize) -> Option<&'a [u8]> {
    let buf: &'a [u8] = *cursor.get_ref();
    let start = cursor.position() as usize;
    let end = start.checked_add(len)?;
    let slice = buf.get(start..end)?;
    cursor.set_position(end as u64);
    Some(slice)
}

/// Takes the next `N` bytes from the cursor as a fixed-size array.
pub fn take_array<const N: usize>(cursor: &mut Cursor<&[u8]>) -> Option<[u8; N]> {
    let slice = take_bytes(cursor, N)?;
    slice.try_into().ok()
}

/// Number of bytes left between the cursor position and the end of its buffer.
pub fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    cursor
        .get_ref()
        .len()
        .saturating_sub(cursor.position() as usize)
}

//==================================================================================
// 2. Integer Helpers
//==================================================================================

/// Greatest common divisor by Euclid's algorithm. `gcd(0, x) == x`.
pub fn gcd_u128(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// Converts a length to the `u32` used by the on-wire headers.
pub fn len_to_u32(len: usize, what: &str) -> Result<u32, DeltaCodecError> {
    u32::try_from(len).map_err(|_| {
        DeltaCodecError::InvalidArgument(format!(
            "{} of {} exceeds the u32 range of the block format",
            what, len
        ))
    })
}
