//! Date/time and duration columns.
//!
//! Every temporal value is mapped to a signed count of nanoseconds (since the
//! Unix epoch for instants) and handed to the delta engine. The factor is a
//! `TimeDelta`, so a column of whole-second timestamps stores one step per
//! second rather than per nanosecond.
//!
//! A block holding a leap second (`subsec >= 1e9`) has no nanosecond form and
//! is stored raw instead.
//!
//! Payload layout:
//! * mode `0`: `[0][engine steps]`
//! * mode `1`: `[1][(secs i64, subsec u32) * count]`

use std::io::Cursor;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::config::{Granularity, Monotonicity};
use crate::error::DeltaCodecError;
use crate::kernels::anchor_delta;
use crate::traits::{DeltaEncoding, DeltaValue};
use crate::types::DeltaDataType;
use crate::utils::{remaining, take_array, take_bytes};

use super::{invalid_granularity, truncated};

const NANOS_PER_SEC: i128 = 1_000_000_000;
const MODE_NANOS: u8 = 0;
const MODE_RAW: u8 = 1;

/// Conversion between a temporal value and `(seconds, subsecond nanos)`.
///
/// The parts form is lossless, including leap seconds (`subsec >= 1e9`), and is
/// what the scalar encoding stores. The nanosecond form feeds the delta engine
/// and is `None` for leap seconds.
trait TemporalParts: Sized {
    fn to_parts(&self) -> (i64, u32);
    fn from_parts(secs: i64, subsec: u32) -> Option<Self>;

    fn to_nanos(&self) -> Option<i128> {
        let (secs, subsec) = self.to_parts();
        ((subsec as i128) < NANOS_PER_SEC).then(|| secs as i128 * NANOS_PER_SEC + subsec as i128)
    }

    fn from_nanos(nanos: i128) -> Option<Self> {
        let secs = i64::try_from(nanos.div_euclid(NANOS_PER_SEC)).ok()?;
        Self::from_parts(secs, nanos.rem_euclid(NANOS_PER_SEC) as u32)
    }
}

impl TemporalParts for DateTime<Utc> {
    fn to_parts(&self) -> (i64, u32) {
        (self.timestamp(), self.timestamp_subsec_nanos())
    }

    fn from_parts(secs: i64, subsec: u32) -> Option<Self> {
        DateTime::from_timestamp(secs, subsec)
    }
}

impl TemporalParts for NaiveDateTime {
    fn to_parts(&self) -> (i64, u32) {
        self.and_utc().to_parts()
    }

    fn from_parts(secs: i64, subsec: u32) -> Option<Self> {
        DateTime::<Utc>::from_parts(secs, subsec).map(|dt| dt.naive_utc())
    }
}

impl TemporalParts for TimeDelta {
    fn to_parts(&self) -> (i64, u32) {
        // `subsec_nanos` carries the sign of the duration; normalize it to [0, 1e9).
        let nanos = self.num_seconds() as i128 * NANOS_PER_SEC + self.subsec_nanos() as i128;
        let secs = nanos.div_euclid(NANOS_PER_SEC) as i64;
        (secs, nanos.rem_euclid(NANOS_PER_SEC) as u32)
    }

    fn from_parts(secs: i64, subsec: u32) -> Option<Self> {
        TimeDelta::new(secs, subsec)
    }
}

/// Largest factor a `TimeDelta` can hold, in nanoseconds.
fn max_factor_nanos() -> u128 {
    TimeDelta::MAX.to_nanos().map_or(1, |n| n as u128)
}

fn factor_to_nanos(factor: &TimeDelta) -> Result<u128, DeltaCodecError> {
    factor
        .to_nanos()
        .and_then(|n| u128::try_from(n).ok())
        .filter(|&n| n > 0)
        .ok_or_else(|| DeltaCodecError::CorruptData(format!("invalid time factor {}", factor)))
}

macro_rules! impl_delta_value_for_temporal {
    ($($t:ty => $dt:ident),* $(,)?) => {
        $(
            impl DeltaValue for $t {
                type Factor = TimeDelta;
                const DATA_TYPE: DeltaDataType = DeltaDataType::$dt;

                fn write_scalar(&self, buf: &mut Vec<u8>) {
                    let (secs, subsec) = self.to_parts();
                    buf.extend_from_slice(&secs.to_le_bytes());
                    buf.extend_from_slice(&subsec.to_le_bytes());
                }

                fn read_scalar(cursor: &mut Cursor<&[u8]>) -> Result<Self, DeltaCodecError> {
                    let secs = take_array::<8>(cursor)
                        .map(i64::from_le_bytes)
                        .ok_or_else(|| truncated("scalar", Self::DATA_TYPE))?;
                    let subsec = take_array::<4>(cursor)
                        .map(u32::from_le_bytes)
                        .ok_or_else(|| truncated("scalar", Self::DATA_TYPE))?;
                    <$t>::from_parts(secs, subsec).ok_or_else(|| {
                        DeltaCodecError::CorruptData(format!(
                            "{}s + {}ns is out of range for {}",
                            secs,
                            subsec,
                            Self::DATA_TYPE
                        ))
                    })
                }

                fn write_factor(factor: &TimeDelta, buf: &mut Vec<u8>) {
                    factor.write_scalar(buf);
                }

                fn read_factor(cursor: &mut Cursor<&[u8]>) -> Result<TimeDelta, DeltaCodecError> {
                    TimeDelta::read_scalar(cursor)
                }

                fn factor_from_granularity(granularity: &Granularity) -> Result<TimeDelta, DeltaCodecError> {
                    match granularity {
                        Granularity::Nanos(step) if *step > 0 => TimeDelta::from_nanos(*step)
                            .ok_or_else(|| invalid_granularity(granularity, Self::DATA_TYPE)),
                        other => Err(invalid_granularity(other, Self::DATA_TYPE)),
                    }
                }

                fn encode_deltas(
                    block: &[Self],
                    anchor: &Self,
                    granularity: Option<&TimeDelta>,
                    monotonicity: Monotonicity,
                ) -> Result<DeltaEncoding<TimeDelta>, DeltaCodecError> {
                    let nanos = anchor.to_nanos().and_then(|a| {
                        block
                            .iter()
                            .map(|v| v.to_nanos())
                            .collect::<Option<Vec<i128>>>()
                            .map(|ns| (a, ns))
                    });
                    let Some((anchor_nanos, nanos)) = nanos else {
                        log::debug!(
                            "{} block of {} values holds a leap second; storing raw",
                            Self::DATA_TYPE,
                            block.len()
                        );
                        let mut bytes = Vec::with_capacity(1 + block.len() * 12);
                        bytes.push(MODE_RAW);
                        Self::encode_raw(block, &mut bytes);
                        return Ok(DeltaEncoding::plain(bytes));
                    };

                    let preferred = match granularity {
                        Some(g) => Some(factor_to_nanos(g)?),
                        None => None,
                    };
                    let scaled = anchor_delta::encode(
                        &nanos,
                        anchor_nanos,
                        preferred,
                        monotonicity,
                        max_factor_nanos(),
                    )?;
                    let factor = if scaled.factor == 1 {
                        None
                    } else {
                        Some(TimeDelta::from_nanos(scaled.factor as i128).ok_or_else(|| {
                            DeltaCodecError::TransformFailure(format!(
                                "factor of {} ns does not fit a TimeDelta",
                                scaled.factor
                            ))
                        })?)
                    };
                    let mut bytes = Vec::with_capacity(1 + scaled.bytes.len());
                    bytes.push(MODE_NANOS);
                    bytes.extend_from_slice(&scaled.bytes);
                    Ok(DeltaEncoding {
                        factor,
                        monotonicity: scaled.monotonicity,
                        bytes,
                    })
                }

                fn decode_deltas(
                    anchor: &Self,
                    factor: Option<&TimeDelta>,
                    monotonicity: Monotonicity,
                    count: usize,
                    payload: &[u8],
                ) -> Result<Vec<Self>, DeltaCodecError> {
                    let mut cursor = Cursor::new(payload);
                    let [mode] = take_array::<1>(&mut cursor)
                        .ok_or_else(|| truncated("mode", Self::DATA_TYPE))?;
                    let left = remaining(&cursor);
                    let body = take_bytes(&mut cursor, left).unwrap_or_default();

                    match mode {
                        MODE_NANOS => {}
                        MODE_RAW => return Self::decode_raw(count, body),
                        other => {
                            return Err(DeltaCodecError::CorruptData(format!(
                                "unknown {} payload mode {}",
                                Self::DATA_TYPE,
                                other
                            )))
                        }
                    }

                    let factor = match factor {
                        Some(f) => factor_to_nanos(f)?,
                        None => 1,
                    };
                    let anchor = anchor.to_nanos().ok_or_else(|| {
                        DeltaCodecError::CorruptData(format!(
                            "{} anchor is a leap second in a delta block",
                            Self::DATA_TYPE
                        ))
                    })?;
                    anchor_delta::decode(anchor, factor, monotonicity, count, body)?
                        .into_iter()
                        .map(|n| {
                            <$t>::from_nanos(n).ok_or_else(|| {
                                DeltaCodecError::CorruptData(format!(
                                    "decoded {} ns is out of range for {}",
                                    n,
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

impl_delta_value_for_temporal!(
    NaiveDateTime => DateTime,
    DateTime<Utc> => UtcDateTime,
    TimeDelta => Duration,
);
