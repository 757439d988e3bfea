//! Fixed-width integers: a direct widening into the anchor/factor delta engine.

use std::io::Cursor;

use crate::config::{Granularity, Monotonicity};
use crate::error::DeltaCodecError;
use crate::kernels::anchor_delta;
use crate::traits::{DeltaEncoding, DeltaValue};
use crate::types::DeltaDataType;
use crate::utils::take_array;

use super::{invalid_granularity, truncated};

macro_rules! impl_delta_value_for_int {
    ($($t:ty => $dt:ident),* $(,)?) => {
        $(
            impl DeltaValue for $t {
                type Factor = $t;
                const DATA_TYPE: DeltaDataType = DeltaDataType::$dt;

                fn write_scalar(&self, buf: &mut Vec<u8>) {
                    buf.extend_from_slice(&self.to_le_bytes());
                }

                fn read_scalar(cursor: &mut Cursor<&[u8]>) -> Result<Self, DeltaCodecError> {
                    take_array::<{ std::mem::size_of::<$t>() }>(cursor)
                        .map(<$t>::from_le_bytes)
                        .ok_or_else(|| truncated("scalar", Self::DATA_TYPE))
                }

                fn write_factor(factor: &$t, buf: &mut Vec<u8>) {
                    factor.write_scalar(buf);
                }

                fn read_factor(cursor: &mut Cursor<&[u8]>) -> Result<$t, DeltaCodecError> {
                    Self::read_scalar(cursor)
                }

                fn factor_from_granularity(granularity: &Granularity) -> Result<$t, DeltaCodecError> {
                    match granularity {
                        Granularity::Integer(step) if *step > 0 => <$t>::try_from(*step)
                            .map_err(|_| invalid_granularity(granularity, Self::DATA_TYPE)),
                        other => Err(invalid_granularity(other, Self::DATA_TYPE)),
                    }
                }

                fn encode_deltas(
                    block: &[Self],
                    anchor: &Self,
                    granularity: Option<&$t>,
                    monotonicity: Monotonicity,
                ) -> Result<DeltaEncoding<$t>, DeltaCodecError> {
                    let widened: Vec<i128> = block.iter().map(|&v| v as i128).collect();
                    let scaled = anchor_delta::encode(
                        &widened,
                        *anchor as i128,
                        granularity.and_then(|&g| u128::try_from(g).ok()),
                        monotonicity,
                        <$t>::MAX as u128,
                    )?;
                    // The engine bounds the factor by MAX, so the narrowing cannot fail.
                    let factor = if scaled.factor == 1 {
                        None
                    } else {
                        Some(<$t>::try_from(scaled.factor).map_err(|_| {
                            DeltaCodecError::InternalError(format!(
                                "factor {} escaped the {} range",
                                scaled.factor,
                                Self::DATA_TYPE
                            ))
                        })?)
                    };
                    Ok(DeltaEncoding {
                        factor,
                        monotonicity: scaled.monotonicity,
                        bytes: scaled.bytes,
                    })
                }

                fn decode_deltas(
                    anchor: &Self,
                    factor: Option<&$t>,
                    monotonicity: Monotonicity,
                    count: usize,
                    payload: &[u8],
                ) -> Result<Vec<Self>, DeltaCodecError> {
                    let factor = match factor {
                        Some(&f) => u128::try_from(f).map_err(|_| {
                            DeltaCodecError::CorruptData(format!("negative factor {}", f))
                        })?,
                        None => 1,
                    };
                    anchor_delta::decode(*anchor as i128, factor, monotonicity, count, payload)?
                        .into_iter()
                        .map(|v| {
                            <$t>::try_from(v).map_err(|_| {
                                DeltaCodecError::CorruptData(format!(
                                    "decoded value {} out of range for {}",
                                    v,
                                    Self::DATA_TYPE
                                ))
                            })
                        })
                        .collect()
                }
            }
        )*
    };
}

impl_delta_value_for_int!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
);

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: DeltaValue + PartialEq + Copy>(values: &[T], monotonicity: Monotonicity) -> DeltaEncoding<T::Factor> {
        let anchor = values.first().copied().unwrap_or_default();
        let encoded = T::encode_deltas(values, &anchor, None, monotonicity).unwrap();
        let decoded = T::decode_deltas(
            &anchor,
            encoded.factor.as_ref(),
            encoded.monotonicity,
            values.len(),
            &encoded.bytes,
        )
        .unwrap();
        assert_eq!(decoded, values);
        encoded
    }

    #[test]
    fn test_full_range_roundtrips() {
        roundtrip(&[i8::MIN, i8::MAX, 0, -1, i8::MIN], Monotonicity::None);
        roundtrip(&[u8::MAX, 0, 128, u8::MAX], Monotonicity::None);
        roundtrip(&[i64::MAX, i64::MIN, 0], Monotonicity::Increasing);
        roundtrip(&[u64::MAX, 0, u64::MAX / 2], Monotonicity::Decreasing);
        roundtrip::<i32>(&[], Monotonicity::None);
    }

    #[test]
    fn test_factor_that_overflows_the_type_is_dropped() {
        // The only offset is 255, which does not fit an i8 factor.
        let encoded = roundtrip(&[-128i8, 127], Monotonicity::None);
        assert_eq!(encoded.factor, None);
    }

    #[test]
    fn test_computed_factor_is_reported() {
        let values: Vec<u32> = (0..64).map(|i| 1_000 * i).collect();
        let encoded = roundtrip(&values, Monotonicity::Increasing);
        assert_eq!(encoded.factor, Some(1_000));
        assert_eq!(encoded.monotonicity, Monotonicity::Increasing);
    }

    #[test]
    fn test_granularity_validation() {
        assert_eq!(i16::factor_from_granularity(&Granularity::Integer(60)).unwrap(), 60);
        assert!(i16::factor_from_granularity(&Granularity::Integer(0)).is_err());
        assert!(i16::factor_from_granularity(&Granularity::Integer(-5)).is_err());
        assert!(u8::factor_from_granularity(&Granularity::Integer(1_000)).is_err());
        assert!(matches!(
            i64::factor_from_granularity(&Granularity::Float(0.5)),
            Err(DeltaCodecError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_out_of_range_decode_is_corrupt() {
        // Encoded as i64, decoded as i8 with the same anchor.
        let encoded = i64::encode_deltas(&[0, 1_000, 1_001], &0, None, Monotonicity::None).unwrap();
        assert_eq!(encoded.factor, None);
        let result = i8::decode_deltas(&0, None, encoded.monotonicity, 3, &encoded.bytes);
        assert!(matches!(result, Err(DeltaCodecError::CorruptData(_))));
    }
}
