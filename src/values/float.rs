//! Floating point columns.
//!
//! A block is first tested against a set of decimal scales. If some scale `s`
//! turns every value `v` into an integer `m = round(v * s)` with `m / s`
//! reproducing `v` bit for bit, the integers go through the delta engine and
//! the block factor is `s`. Otherwise the factor is absent and the raw bit
//! patterns are XOR-delta encoded. Both paths are exact for every input,
//! including NaN payloads, infinities, and negative zero.
//!
//! Scaled payload layout: `[engine gcd: LEB128][engine steps]`.
//! Unscaled payload layout: `count` little-endian XOR words.

use std::io::Cursor;

use crate::config::{Granularity, Monotonicity};
use crate::error::DeltaCodecError;
use crate::kernels::{anchor_delta, bitcast, leb128, xor_delta};
use crate::traits::{DeltaEncoding, DeltaValue};
use crate::types::DeltaDataType;
use crate::utils::{remaining, take_array, take_bytes};

use super::{invalid_granularity, truncated};

macro_rules! impl_delta_value_for_float {
    ($t:ty, $bits:ty, $dt:ident, $max_digits:expr) => {
        impl DeltaValue for $t {
            /// The multiplier that turns block values into integers.
            type Factor = $t;
            const DATA_TYPE: DeltaDataType = DeltaDataType::$dt;

            fn write_scalar(&self, buf: &mut Vec<u8>) {
                buf.extend_from_slice(&self.to_bits().to_le_bytes());
            }

            fn read_scalar(cursor: &mut Cursor<&[u8]>) -> Result<Self, DeltaCodecError> {
                take_array::<{ std::mem::size_of::<$bits>() }>(cursor)
                    .map(|b| <$t>::from_bits(<$bits>::from_le_bytes(b)))
                    .ok_or_else(|| truncated("scalar", Self::DATA_TYPE))
            }

            fn write_factor(factor: &$t, buf: &mut Vec<u8>) {
                factor.write_scalar(buf);
            }

            fn read_factor(cursor: &mut Cursor<&[u8]>) -> Result<$t, DeltaCodecError> {
                Self::read_scalar(cursor)
            }

            fn factor_from_granularity(granularity: &Granularity) -> Result<$t, DeltaCodecError> {
                let step = match granularity {
                    Granularity::Float(step) => *step,
                    Granularity::Integer(step) => *step as f64,
                    other => return Err(invalid_granularity(other, Self::DATA_TYPE)),
                };
                let scale = (1.0 / step) as $t;
                if step > 0.0 && scale.is_finite() && scale > 0.0 {
                    Ok(scale)
                } else {
                    Err(invalid_granularity(granularity, Self::DATA_TYPE))
                }
            }

            fn encode_deltas(
                block: &[Self],
                anchor: &Self,
                granularity: Option<&$t>,
                monotonicity: Monotonicity,
            ) -> Result<DeltaEncoding<$t>, DeltaCodecError> {
                if block.is_empty() {
                    return Ok(DeltaEncoding::plain(Vec::new()));
                }

                let preferred = granularity.copied();
                let candidates = preferred
                    .into_iter()
                    .chain((0..=$max_digits).map(|k| (10.0 as $t).powi(k)));

                for scale in candidates {
                    let Some(anchor_int) = scale_exact(*anchor as f64, scale as f64) else {
                        continue;
                    };
                    let Some(ints) = block
                        .iter()
                        .map(|&v| {
                            let m = scale_exact(v as f64, scale as f64)?;
                            (unscale(m, scale as f64) as $t).to_bits().eq(&v.to_bits()).then_some(m)
                        })
                        .collect::<Option<Vec<i128>>>()
                    else {
                        continue;
                    };
                    if (unscale(anchor_int, scale as f64) as $t).to_bits() != anchor.to_bits() {
                        continue;
                    }

                    let scaled = anchor_delta::encode(&ints, anchor_int, None, monotonicity, u128::MAX)?;
                    let mut bytes = Vec::with_capacity(scaled.bytes.len() + 4);
                    leb128::encode_one(scaled.factor, &mut bytes)?;
                    bytes.extend_from_slice(&scaled.bytes);
                    log_metric!("event"="float_scale", "type"=Self::DATA_TYPE, "scale"=scale, "gcd"=scaled.factor);
                    return Ok(DeltaEncoding {
                        factor: Some(scale),
                        monotonicity: scaled.monotonicity,
                        bytes,
                    });
                }

                let words: Vec<$bits> = bitcast::cast(block)?;
                let xored = xor_delta::encode(&words);
                let mut bytes = Vec::with_capacity(xored.len() * std::mem::size_of::<$bits>());
                for word in xored {
                    bytes.extend_from_slice(&word.to_le_bytes());
                }
                Ok(DeltaEncoding::plain(bytes))
            }

            fn decode_deltas(
                anchor: &Self,
                factor: Option<&$t>,
                monotonicity: Monotonicity,
                count: usize,
                payload: &[u8],
            ) -> Result<Vec<Self>, DeltaCodecError> {
                match factor {
                    Some(&scale) => {
                        if !(scale.is_finite() && scale > 0.0) {
                            return Err(DeltaCodecError::CorruptData(format!(
                                "invalid {} scale {}",
                                Self::DATA_TYPE,
                                scale
                            )));
                        }
                        let anchor_int = scale_exact(*anchor as f64, scale as f64).ok_or_else(|| {
                            DeltaCodecError::CorruptData(format!(
                                "anchor {} is not representable at scale {}",
                                anchor, scale
                            ))
                        })?;
                        let mut cursor = Cursor::new(payload);
                        let gcd: u128 = leb128::decode_one(&mut cursor)
                            .map_err(|e| DeltaCodecError::CorruptData(e.to_string()))?;
                        let left = remaining(&cursor);
                        let rest = take_bytes(&mut cursor, left).unwrap_or_default();
                        let ints = anchor_delta::decode(anchor_int, gcd, monotonicity, count, rest)?;
                        Ok(ints
                            .into_iter()
                            .map(|m| unscale(m, scale as f64) as $t)
                            .collect())
                    }
                    None => {
                        let width = std::mem::size_of::<$bits>();
                        if payload.len() != count * width {
                            return Err(DeltaCodecError::CorruptData(format!(
                                "expected {} bytes of {} words, found {}",
                                count * width,
                                Self::DATA_TYPE,
                                payload.len()
                            )));
                        }
                        let mut words: Vec<$bits> = payload
                            .chunks_exact(width)
                            .map(|chunk| {
                                let mut word = [0u8; std::mem::size_of::<$bits>()];
                                word.copy_from_slice(chunk);
                                <$bits>::from_le_bytes(word)
                            })
                            .collect();
                        xor_delta::decode(&mut words);
                        bitcast::cast(&words)
                    }
                }
            }
        }
    };
}

/// `round(v * scale)` as an integer, or `None` when it is not finite.
fn scale_exact(value: f64, scale: f64) -> Option<i128> {
    let m = (value * scale).round();
    // 2^120 keeps the conversion away from i128 saturation.
    if m.is_finite() && m.abs() < 1.329_227_995_784_916e36 {
        Some(m as i128)
    } else {
        None
    }
}

fn unscale(m: i128, scale: f64) -> f64 {
    (m as f64) / scale
}

impl_delta_value_for_float!(f32, u32, Float32, 7);
impl_delta_value_for_float!(f64, u64, Float64, 15);
