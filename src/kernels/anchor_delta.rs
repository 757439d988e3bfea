//! This module contains the anchor/factor delta engine shared by every ordered
//! column type.
//!
//! Integers, timestamps, durations, scaled floats, and decimal mantissas are all
//! widened to `i128` and run through the same transform:
//!
//! 1.  `d[i] = v[i] - anchor`
//! 2.  A factor `g` is chosen: the caller's granularity when it divides every
//!     `d[i]`, otherwise the gcd of all `|d[i]|` (`1` when every offset is zero).
//! 3.  `q[i] = d[i] / g`, and the stored stream is `q[i] - q[i - 1]` with `q[-1] = 0`.
//! 4.  Steps are zig-zag + LEB128 encoded. When a monotonicity hint holds for
//!     every step, the sign is implied and only the magnitude is written.
//!
//! The hint is verified rather than trusted, so a wrong hint only costs bytes.

use std::io::Cursor;

use crate::config::Monotonicity;
use crate::error::DeltaCodecError;
use crate::kernels::{leb128, zigzag};
use crate::utils::gcd_u128;

/// The output of `encode`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledDeltas {
    /// The factor every offset was divided by. Always `>= 1`.
    pub factor: u128,
    /// The monotonicity the stream was written with.
    pub monotonicity: Monotonicity,
    pub bytes: Vec<u8>,
}

//==================================================================================
// 1. Factor Selection
//==================================================================================

/// Chooses the factor for a set of offsets.
///
/// `max_factor` bounds the result so the caller can store it in its own factor
/// type; a gcd above the bound degrades to `1`.
pub fn choose_factor(offsets: &[i128], granularity: Option<u128>, max_factor: u128) -> u128 {
    let max_factor = max_factor.min(i128::MAX as u128);

    if let Some(g) = granularity {
        if g > 0 && g <= max_factor && offsets.iter().all(|d| d.unsigned_abs() % g == 0) {
            return g;
        }
        log::trace!(
            "granularity {} does not divide the block offsets; using the computed factor",
            g
        );
    }

    let gcd = offsets
        .iter()
        .fold(0u128, |acc, d| gcd_u128(acc, d.unsigned_abs()));
    if gcd == 0 || gcd > max_factor {
        1
    } else {
        gcd
    }
}

//==================================================================================
// 2. Encode / Decode
//==================================================================================

/// Delta-encodes `values` relative to `anchor`.
///
/// # Errors
/// `TransformFailure` if an offset or step does not fit in `i128`.
pub fn encode(
    values: &[i128],
    anchor: i128,
    granularity: Option<u128>,
    hint: Monotonicity,
    max_factor: u128,
) -> Result<ScaledDeltas, DeltaCodecError> {
    let offsets = values
        .iter()
        .map(|v| v.checked_sub(anchor))
        .collect::<Option<Vec<i128>>>()
        .ok_or_else(|| {
            DeltaCodecError::TransformFailure("offset from anchor overflows i128".to_string())
        })?;

    let factor = choose_factor(&offsets, granularity, max_factor);
    let g = factor as i128;

    let mut steps = Vec::with_capacity(offsets.len());
    let mut previous = 0i128;
    for d in &offsets {
        let q = d / g;
        let step = q.checked_sub(previous).ok_or_else(|| {
            DeltaCodecError::TransformFailure("delta step overflows i128".to_string())
        })?;
        steps.push(step);
        previous = q;
    }

    let monotonicity = match hint {
        Monotonicity::Increasing if steps.iter().all(|&s| s >= 0) => Monotonicity::Increasing,
        Monotonicity::Decreasing if steps.iter().all(|&s| s <= 0) => Monotonicity::Decreasing,
        Monotonicity::None => Monotonicity::None,
        ignored => {
            log::debug!(
                "monotonicity hint {:?} does not hold for this block; storing signed steps",
                ignored
            );
            Monotonicity::None
        }
    };

    let mut bytes = Vec::with_capacity(steps.len() * 2);
    for &step in &steps {
        let stored: u128 = match monotonicity {
            Monotonicity::Increasing | Monotonicity::Decreasing => step.unsigned_abs(),
            Monotonicity::None => zigzag::encode_val(step),
        };
        leb128::encode_one(stored, &mut bytes)?;
    }

    Ok(ScaledDeltas {
        factor,
        monotonicity,
        bytes,
    })
}

/// Reconstructs `count` values from a stream produced by `encode`.
///
/// Returns the values together with the number of payload bytes consumed, so
/// callers that append their own data after the stream can continue from there.
///
/// # Errors
/// `CorruptData` for a zero factor, a truncated stream, or any reconstruction
/// that overflows `i128`.
pub fn decode_prefix(
    anchor: i128,
    factor: u128,
    monotonicity: Monotonicity,
    count: usize,
    payload: &[u8],
) -> Result<(Vec<i128>, usize), DeltaCodecError> {
    if factor == 0 || factor > i128::MAX as u128 {
        return Err(DeltaCodecError::CorruptData(format!(
            "invalid block factor {}",
            factor
        )));
    }
    let g = factor as i128;
    let overflow = || DeltaCodecError::CorruptData("delta stream overflows i128".to_string());

    let mut cursor = Cursor::new(payload);
    let mut values = Vec::with_capacity(count.min(payload.len()));
    let mut q = 0i128;
    for _ in 0..count {
        let stored: u128 = leb128::decode_one(&mut cursor)
            .map_err(|e| DeltaCodecError::CorruptData(e.to_string()))?;
        let step = match monotonicity {
            Monotonicity::Increasing => i128::try_from(stored).map_err(|_| overflow())?,
            Monotonicity::Decreasing => negate_magnitude(stored).ok_or_else(overflow)?,
            Monotonicity::None => zigzag::decode_val(stored),
        };
        q = q.checked_add(step).ok_or_else(overflow)?;
        let value = q
            .checked_mul(g)
            .and_then(|d| anchor.checked_add(d))
            .ok_or_else(overflow)?;
        values.push(value);
    }
    Ok((values, cursor.position() as usize))
}

/// Like `decode_prefix`, but the stream must fill `payload` exactly.
pub fn decode(
    anchor: i128,
    factor: u128,
    monotonicity: Monotonicity,
    count: usize,
    payload: &[u8],
) -> Result<Vec<i128>, DeltaCodecError> {
    let (values, consumed) = decode_prefix(anchor, factor, monotonicity, count, payload)?;
    if consumed != payload.len() {
        return Err(DeltaCodecError::CorruptData(format!(
            "{} trailing bytes after {} delta steps",
            payload.len() - consumed,
            count
        )));
    }
    Ok(values)
}

fn negate_magnitude(magnitude: u128) -> Option<i128> {
    if magnitude <= i128::MAX as u128 {
        Some(-(magnitude as i128))
    } else if magnitude == 1u128 << 127 {
        Some(i128::MIN)
    } else {
        None
    }
}
