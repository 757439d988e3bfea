//! `DeltaValue` implementations for every supported column element type.
//!
//! | Rust type                 | Tag           | Transform                               |
//! |---------------------------|---------------|-----------------------------------------|
//! | `i8`..`i64`, `u8`..`u64`  | `Int*`/`UInt*`| anchor/factor delta engine              |
//! | `f32`, `f64`              | `Float*`      | exact decimal scaling, else XOR of bits |
//! | `NaiveDateTime`, `DateTime<Utc>`, `TimeDelta` | temporal | delta engine on nanoseconds |
//! | `Decimal`                 | `Decimal`     | delta engine on rescaled mantissas      |
//! | `bool`                    | `Boolean`     | bit-packed passthrough                  |
//! | `String`                  | `Text`        | length-prefixed passthrough             |

mod decimal;
mod float;
mod integer;
mod passthrough;
mod temporal;

use crate::config::Granularity;
use crate::error::DeltaCodecError;
use crate::types::DeltaDataType;

pub(crate) fn truncated(what: &str, data_type: DeltaDataType) -> DeltaCodecError {
    DeltaCodecError::CorruptData(format!("truncated {} in {} block", what, data_type))
}

pub(crate) fn invalid_granularity(granularity: &Granularity, data_type: DeltaDataType) -> DeltaCodecError {
    DeltaCodecError::InvalidArgument(format!(
        "granularity {:?} is not a positive {} step",
        granularity, data_type
    ))
}
