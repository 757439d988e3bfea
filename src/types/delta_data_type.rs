//! This module defines the canonical, type-safe representation of the column
//! types a delta block can carry.

use crate::error::DeltaCodecError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The canonical, internal representation of a column's element type.
///
/// Each variant has a stable one-byte tag that is written at the head of every
/// serialized block, so a decoder can reject a block that was produced for a
/// different type before it touches the payload.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeltaDataType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Boolean,
    Text,
    DateTime,
    UtcDateTime,
    Duration,
    Decimal,
}

impl DeltaDataType {
    /// Every supported type, in tag order.
    pub const ALL: [DeltaDataType; 16] = [
        Self::Int8,
        Self::Int16,
        Self::Int32,
        Self::Int64,
        Self::UInt8,
        Self::UInt16,
        Self::UInt32,
        Self::UInt64,
        Self::Float32,
        Self::Float64,
        Self::Boolean,
        Self::Text,
        Self::DateTime,
        Self::UtcDateTime,
        Self::Duration,
        Self::Decimal,
    ];

    /// The on-wire tag. These values are part of the format contract.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int32 => 3,
            Self::Int64 => 4,
            Self::UInt8 => 5,
            Self::UInt16 => 6,
            Self::UInt32 => 7,
            Self::UInt64 => 8,
            Self::Float32 => 9,
            Self::Float64 => 10,
            Self::Boolean => 11,
            Self::Text => 12,
            Self::DateTime => 13,
            Self::UtcDateTime => 14,
            Self::Duration => 15,
            Self::Decimal => 16,
        }
    }

    /// Parses an on-wire tag.
    pub fn from_tag(tag: u8) -> Result<Self, DeltaCodecError> {
        Self::ALL
            .iter()
            .copied()
            .find(|dt| dt.tag() == tag)
            .ok_or_else(|| DeltaCodecError::CorruptData(format!("Unknown type tag {}", tag)))
    }

    /// Returns `true` if the data type is a signed integer.
    pub fn is_signed_int(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Returns `true` if the data type is a floating-point number.
    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Returns `true` for types whose transform degenerates to identity.
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Boolean | Self::Text)
    }
}

/// Provides the canonical string representation for a `DeltaDataType`.
impl fmt::Display for DeltaDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
