//! `rust_decimal::Decimal` columns.
//!
//! Mantissas are rescaled to the largest scale in the block and run through the
//! delta engine. The original scale of every element is kept in a side table, so
//! `1.50` and `1.5` come back as written. When rescaling would overflow, the
//! block falls back to raw 16-byte values.
//!
//! Payload layout:
//! * mode `0`: `[0][block scale u8][per-element scale byte * count][engine steps]`
//! * mode `1`: `[1][Decimal::serialize() * count]`
//!
//! A per-element scale byte holds the scale in its low five bits and sets the
//! high bit for a negative zero.

use std::io::Cursor;

use rust_decimal::Decimal;

use crate::config::{Granularity, Monotonicity};
use crate::error::DeltaCodecError;
use crate::kernels::anchor_delta;
use crate::traits::{DeltaEncoding, DeltaValue};
use crate::types::DeltaDataType;
use crate::utils::{remaining, take_array, take_bytes};

use super::{invalid_granularity, truncated};

const MODE_SCALED: u8 = 0;
const MODE_RAW: u8 = 1;
const NEGATIVE_ZERO: u8 = 0x80;
const SCALE_MASK: u8 = 0x1F;
/// Largest scale a `Decimal` can carry.
const MAX_SCALE: u32 = 28;
/// Rescaled mantissas stay below this bound so offsets and steps fit in `i128`.
const MANTISSA_BOUND: i128 = i128::MAX / 4;
/// Largest mantissa a `Decimal` can carry (2^96 - 1).
const MAX_DECIMAL_MANTISSA: u128 = (1u128 << 96) - 1;

fn pow10(exp: u32) -> Option<i128> {
    10i128.checked_pow(exp)
}

/// `mantissa * 10^(target - scale)`, bounded by `MANTISSA_BOUND`.
fn rescale(value: &Decimal, target: u32) -> Option<i128> {
    let shift = target.checked_sub(value.scale())?;
    value
        .mantissa()
        .checked_mul(pow10(shift)?)
        .filter(|m| m.unsigned_abs() <= MANTISSA_BOUND as u128)
}

fn corrupt(message: impl Into<String>) -> DeltaCodecError {
    DeltaCodecError::CorruptData(message.into())
}

impl DeltaValue for Decimal {
    type Factor = Decimal;
    const DATA_TYPE: DeltaDataType = DeltaDataType::Decimal;

    fn write_scalar(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.serialize());
    }

    fn read_scalar(cursor: &mut Cursor<&[u8]>) -> Result<Self, DeltaCodecError> {
        let bytes = take_array::<16>(cursor).ok_or_else(|| truncated("scalar", Self::DATA_TYPE))?;
        // Flags word: scale in byte 2, sign in the top bit of byte 3, the rest zero.
        if bytes[0] != 0 || bytes[1] != 0 || bytes[3] & 0x7F != 0 {
            return Err(corrupt(format!("invalid decimal flags {:02x?}", &bytes[..4])));
        }
        if bytes[2] as u32 > MAX_SCALE {
            return Err(corrupt(format!(
                "decimal scale {} exceeds the maximum of {}",
                bytes[2],
                MAX_SCALE
            )));
        }
        Ok(Decimal::deserialize(bytes))
    }

    fn write_factor(factor: &Decimal, buf: &mut Vec<u8>) {
        factor.write_scalar(buf);
    }

    fn read_factor(cursor: &mut Cursor<&[u8]>) -> Result<Decimal, DeltaCodecError> {
        Self::read_scalar(cursor)
    }

    fn factor_from_granularity(granularity: &Granularity) -> Result<Decimal, DeltaCodecError> {
        let step = match granularity {
            Granularity::Decimal(step) => Some(*step),
            Granularity::Integer(step) => Decimal::try_from_i128_with_scale(*step, 0).ok(),
            _ => None,
        };
        step.filter(|s| s.is_sign_positive() && !s.is_zero())
            .ok_or_else(|| invalid_granularity(granularity, Self::DATA_TYPE))
    }

    fn encode_deltas(
        block: &[Self],
        anchor: &Self,
        granularity: Option<&Decimal>,
        monotonicity: Monotonicity,
    ) -> Result<DeltaEncoding<Decimal>, DeltaCodecError> {
        let block_scale = block.iter().map(Decimal::scale).max().unwrap_or(0);

        let rescaled = rescale(anchor, block_scale).and_then(|a| {
            block
                .iter()
                .map(|v| rescale(v, block_scale))
                .collect::<Option<Vec<i128>>>()
                .map(|ms| (a, ms))
        });

        let Some((anchor_mantissa, mantissas)) = rescaled else {
            log::debug!(
                "decimal block of {} values does not fit scale {}; storing raw",
                block.len(),
                block_scale
            );
            let mut bytes = Vec::with_capacity(1 + block.len() * 16);
            bytes.push(MODE_RAW);
            Self::encode_raw(block, &mut bytes);
            return Ok(DeltaEncoding::plain(bytes));
        };

        let preferred = granularity
            .and_then(|g| rescale(g, block_scale))
            .and_then(|g| u128::try_from(g).ok());
        let scaled = anchor_delta::encode(
            &mantissas,
            anchor_mantissa,
            preferred,
            monotonicity,
            MAX_DECIMAL_MANTISSA,
        )?;

        let mut bytes = Vec::with_capacity(2 + block.len() + scaled.bytes.len());
        bytes.push(MODE_SCALED);
        bytes.push(block_scale as u8);
        for v in block {
            let negative_zero = v.is_zero() && v.is_sign_negative();
            bytes.push(v.scale() as u8 | if negative_zero { NEGATIVE_ZERO } else { 0 });
        }
        bytes.extend_from_slice(&scaled.bytes);

        let factor = if scaled.factor == 1 {
            None
        } else {
            Some(
                Decimal::try_from_i128_with_scale(scaled.factor as i128, block_scale).map_err(
                    |e| DeltaCodecError::TransformFailure(format!("decimal factor: {}", e)),
                )?,
            )
        };
        Ok(DeltaEncoding {
            factor,
            monotonicity: scaled.monotonicity,
            bytes,
        })
    }

    fn decode_deltas(
        anchor: &Self,
        factor: Option<&Decimal>,
        monotonicity: Monotonicity,
        count: usize,
        payload: &[u8],
    ) -> Result<Vec<Self>, DeltaCodecError> {
        let mut cursor = Cursor::new(payload);
        let mode = take_array::<1>(&mut cursor).ok_or_else(|| truncated("mode", Self::DATA_TYPE))?[0];
        let left = remaining(&cursor);
        let body = take_bytes(&mut cursor, left).unwrap_or_default();

        match mode {
            MODE_RAW => Self::decode_raw(count, body),
            MODE_SCALED => {
                let (&block_scale, rest) = body
                    .split_first()
                    .ok_or_else(|| truncated("block scale", Self::DATA_TYPE))?;
                if rest.len() < count {
                    return Err(truncated("scale table", Self::DATA_TYPE));
                }
                let (scales, steps) = rest.split_at(count);
                let block_scale = block_scale as u32;
                if block_scale > MAX_SCALE {
                    return Err(corrupt(format!("block scale {} exceeds the decimal maximum", block_scale)));
                }

                let anchor_mantissa = rescale(anchor, block_scale)
                    .ok_or_else(|| corrupt("decimal anchor does not fit the block scale"))?;
                let g = match factor {
                    Some(f) => rescale(f, block_scale)
                        .and_then(|g| u128::try_from(g).ok())
                        .ok_or_else(|| corrupt(format!("invalid decimal factor {}", f)))?,
                    None => 1,
                };

                let mantissas = anchor_delta::decode(anchor_mantissa, g, monotonicity, count, steps)?;
                mantissas
                    .into_iter()
                    .zip(scales)
                    .map(|(m, &tag)| {
                        let scale = (tag & SCALE_MASK) as u32;
                        let divisor = block_scale
                            .checked_sub(scale)
                            .and_then(pow10)
                            .ok_or_else(|| corrupt(format!("element scale {} exceeds block scale", scale)))?;
                        if m % divisor != 0 {
                            return Err(corrupt("decimal mantissa is not aligned to its scale"));
                        }
                        let mut value = Decimal::try_from_i128_with_scale(m / divisor, scale)
                            .map_err(|e| corrupt(format!("decimal out of range: {}", e)))?;
                        if tag & NEGATIVE_ZERO != 0 {
                            value.set_sign_negative(true);
                        }
                        Ok(value)
                    })
                    .collect()
            }
            other => Err(corrupt(format!("unknown decimal payload mode {}", other))),
        }
    }

    fn raw_size(&self) -> usize {
        16
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn roundtrip(values: &[Decimal], granularity: Option<Decimal>, monotonicity: Monotonicity) -> DeltaEncoding<Decimal> {
        let anchor = values.first().copied().unwrap_or_default();
        let encoded = Decimal::encode_deltas(values, &anchor, granularity.as_ref(), monotonicity).unwrap();
        let decoded = Decimal::decode_deltas(
            &anchor,
            encoded.factor.as_ref(),
            encoded.monotonicity,
            values.len(),
            &encoded.bytes,
        )
        .unwrap();
        assert_eq!(decoded, values);
        // Equality ignores scale and the sign of zero; the string form does not.
        let text = |xs: &[Decimal]| xs.iter().map(|d| (d.to_string(), d.is_sign_negative())).collect::<Vec<_>>();
        assert_eq!(text(&decoded), text(values));
        encoded
    }

    #[test]
    fn test_mixed_scales_roundtrip_exactly() {
        let values = vec![dec("1.5"), dec("1.50"), dec("2"), dec("-3.125"), dec("0.000")];
        let encoded = roundtrip(&values, None, Monotonicity::None);
        assert_eq!(encoded.bytes[0], MODE_SCALED);
        assert_eq!(encoded.bytes[1], 3);
    }

    #[test]
    fn test_price_ticks_get_a_factor() {
        let values: Vec<Decimal> = (0..100).map(|i| dec("99.95") + Decimal::new(5 * i, 2)).collect();
        let encoded = roundtrip(&values, None, Monotonicity::Increasing);
        assert_eq!(encoded.factor, Some(dec("0.05")));
        assert_eq!(encoded.monotonicity, Monotonicity::Increasing);
    }

    #[test]
    fn test_negative_zero_is_preserved() {
        let mut neg_zero = dec("0.00");
        neg_zero.set_sign_negative(true);
        roundtrip(&[dec("1"), neg_zero, dec("-1")], None, Monotonicity::None);
    }

    #[test]
    fn test_overflowing_block_falls_back_to_raw() {
        let values = vec![Decimal::MAX, dec("0.0000000000000000000000000001"), Decimal::MIN];
        let encoded = roundtrip(&values, None, Monotonicity::None);
        assert_eq!(encoded.bytes[0], MODE_RAW);
        assert_eq!(encoded.bytes.len(), 1 + 16 * 3);
    }

    #[test]
    fn test_granularity() {
        let step = Decimal::factor_from_granularity(&Granularity::Decimal(dec("0.25"))).unwrap();
        let values = vec![dec("1.00"), dec("1.25"), dec("2.50")];
        let encoded = roundtrip(&values, Some(step), Monotonicity::None);
        assert_eq!(encoded.factor, Some(dec("0.25")));

        assert!(Decimal::factor_from_granularity(&Granularity::Decimal(dec("-1"))).is_err());
        assert!(Decimal::factor_from_granularity(&Granularity::Float(0.1)).is_err());
    }

    #[test]
    fn test_empty_block() {
        let encoded = roundtrip(&[], None, Monotonicity::None);
        assert_eq!(encoded.bytes, vec![MODE_SCALED, 0]);
    }

    #[test]
    fn test_scale_beyond_maximum_is_corrupt() {
        let mut bytes = dec("1.5").serialize();
        bytes[2] = 29;
        let mut cursor = Cursor::new(&bytes[..]);
        assert!(matches!(Decimal::read_scalar(&mut cursor), Err(DeltaCodecError::CorruptData(_))));

        let mut bytes = dec("-1.5").serialize();
        bytes[0] = 1;
        let mut cursor = Cursor::new(&bytes[..]);
        assert!(matches!(Decimal::read_scalar(&mut cursor), Err(DeltaCodecError::CorruptData(_))));

        let min_bytes = Decimal::MIN.serialize();
        let mut cursor = Cursor::new(&min_bytes[..]);
        assert_eq!(Decimal::read_scalar(&mut cursor).unwrap(), Decimal::MIN);

        let result = Decimal::decode_deltas(&Decimal::ZERO, None, Monotonicity::None, 0, &[MODE_SCALED, 40]);
        assert!(matches!(result, Err(DeltaCodecError::CorruptData(_))));
    }

    #[test]
    fn test_unknown_mode_is_corrupt() {
        let result = Decimal::decode_deltas(&Decimal::ZERO, None, Monotonicity::None, 0, &[7]);
        assert!(matches!(result, Err(DeltaCodecError::CorruptData(_))));
    }
}
