// In: src/config.rs

//! The single source of truth for all deltacodec configuration.
//!
//! `CodecConfig` is designed to be created once at the application boundary
//! (e.g., from a JSON file) and then shared, read-only, through an
//! `Arc<CodecConfig>`. The per-column knobs (`CompressionLevel`, `Granularity`,
//! `Monotonicity`) live in `ColumnSettings`, which can be supplied in code or
//! looked up by column name from the config.

use std::collections::HashMap;

use chrono::TimeDelta;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DeltaCodecError;

//==================================================================================
// I. Per-Column Enums
//==================================================================================

/// The quality hint handed to the finisher for a block.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CompressionLevel {
    /// Smallest output the finisher can produce.
    Optimal,
    /// **Default:** cheapest setting that still compresses.
    #[default]
    Fastest,
    /// The finisher is skipped; the delta stream is stored as-is.
    NoCompression,
}

impl CompressionLevel {
    pub(crate) fn to_flag(self) -> u8 {
        match self {
            CompressionLevel::Optimal => 0,
            CompressionLevel::Fastest => 1,
            CompressionLevel::NoCompression => 2,
        }
    }

    pub(crate) fn from_flag(flag: u8) -> Result<Self, DeltaCodecError> {
        match flag {
            0 => Ok(CompressionLevel::Optimal),
            1 => Ok(CompressionLevel::Fastest),
            2 => Ok(CompressionLevel::NoCompression),
            other => Err(DeltaCodecError::CorruptData(format!(
                "Unknown compression level flag {}",
                other
            ))),
        }
    }
}

/// A hint that a column never decreases (or never increases).
///
/// The hint is verified per block during encoding. A block whose data does not
/// honour it is stored as if no hint had been given, so a wrong hint costs
/// compression ratio but never correctness.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Monotonicity {
    #[default]
    None,
    Increasing,
    Decreasing,
}

impl Monotonicity {
    pub(crate) fn to_flag(self) -> u8 {
        match self {
            Monotonicity::None => 0,
            Monotonicity::Increasing => 1,
            Monotonicity::Decreasing => 2,
        }
    }

    pub(crate) fn from_flag(flag: u8) -> Result<Self, DeltaCodecError> {
        match flag {
            0 => Ok(Monotonicity::None),
            1 => Ok(Monotonicity::Increasing),
            2 => Ok(Monotonicity::Decreasing),
            other => Err(DeltaCodecError::CorruptData(format!(
                "Unknown monotonicity flag {}",
                other
            ))),
        }
    }
}

/// A pre-supplied scale for a column, in the column's own units.
///
/// This is the type-erased form used by configuration and by the multi-field
/// args; each column type converts it into its concrete factor and rejects
/// variants that make no sense for it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// A step for integer columns (e.g. `100` for prices quoted in cents of a dollar).
    Integer(i128),
    /// A step for float columns (e.g. `0.01`).
    Float(f64),
    /// A step, in nanoseconds, for date/time and duration columns.
    Nanos(i128),
    /// A step for decimal columns.
    Decimal(Decimal),
}

macro_rules! impl_granularity_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Granularity {
                fn from(value: $t) -> Self {
                    Granularity::Integer(value as i128)
                }
            }
        )*
    };
}

impl_granularity_from_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl From<f64> for Granularity {
    fn from(value: f64) -> Self {
        Granularity::Float(value)
    }
}

impl From<f32> for Granularity {
    fn from(value: f32) -> Self {
        Granularity::Float(value as f64)
    }
}

impl From<TimeDelta> for Granularity {
    fn from(value: TimeDelta) -> Self {
        Granularity::Nanos(value.num_seconds() as i128 * 1_000_000_000 + value.subsec_nanos() as i128)
    }
}

impl From<Decimal> for Granularity {
    fn from(value: Decimal) -> Self {
        Granularity::Decimal(value)
    }
}

/// The three per-column knobs a caller can turn.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ColumnSettings {
    #[serde(default)]
    pub level: CompressionLevel,
    #[serde(default)]
    pub granularity: Option<Granularity>,
    #[serde(default)]
    pub monotonicity: Monotonicity,
}

impl ColumnSettings {
    pub fn new(level: CompressionLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn with_granularity(mut self, granularity: impl Into<Granularity>) -> Self {
        self.granularity = Some(granularity.into());
        self
    }

    pub fn with_monotonicity(mut self, monotonicity: Monotonicity) -> Self {
        self.monotonicity = monotonicity;
        self
    }
}

//==================================================================================
// II. Codec-Wide Enums
//==================================================================================

/// Which general-purpose compressor finishes each block.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinisherKind {
    #[default]
    Deflate,
    Zstd,
    Lz4,
}

/// Whether values go through the delta transform before finishing.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    /// **Default:** anchor/factor delta transform.
    #[default]
    Delta,
    /// Values are serialized as-is and handed straight to the finisher.
    /// Useful as a baseline when measuring what the delta transform buys.
    Null,
}

//==================================================================================
// III. The Unified CodecConfig
//==================================================================================

/// The single, unified configuration for the codec.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CodecConfig {
    /// Upper bound on blocks per vector. Requests above it are clamped silently.
    #[serde(default = "default_max_num_parallel_blocks")]
    pub max_num_parallel_blocks: usize,

    /// The finisher used for every block.
    #[serde(default)]
    pub finisher: FinisherKind,

    /// The transform applied before finishing.
    #[serde(default)]
    pub transform: TransformKind,

    /// Size of a dedicated worker pool. `None` runs on the global rayon pool.
    #[serde(default)]
    pub worker_threads: Option<usize>,

    /// Level used by columns that do not specify one.
    #[serde(default)]
    pub default_level: CompressionLevel,

    /// Monotonicity hint used by columns that do not specify one.
    #[serde(default)]
    pub default_monotonicity: Monotonicity,

    /// Per-column overrides, keyed by column name.
    #[serde(default)]
    pub columns: HashMap<String, ColumnSettings>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_num_parallel_blocks: default_max_num_parallel_blocks(),
            finisher: FinisherKind::default(),
            transform: TransformKind::default(),
            worker_threads: None,
            default_level: CompressionLevel::default(),
            default_monotonicity: Monotonicity::default(),
            columns: HashMap::new(),
        }
    }
}

impl CodecConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, DeltaCodecError> {
        let config: CodecConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the codec cannot honour.
    pub fn validate(&self) -> Result<(), DeltaCodecError> {
        if self.max_num_parallel_blocks == 0 {
            return Err(DeltaCodecError::InvalidArgument(
                "max_num_parallel_blocks must be at least 1".to_string(),
            ));
        }
        if self.worker_threads == Some(0) {
            return Err(DeltaCodecError::InvalidArgument(
                "worker_threads must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings for a column that has no explicit settings of its own.
    pub fn default_column_settings(&self) -> ColumnSettings {
        ColumnSettings {
            level: self.default_level,
            granularity: None,
            monotonicity: self.default_monotonicity,
        }
    }

    /// The configured override for `name`, if any.
    pub fn column_settings(&self, name: &str) -> Option<&ColumnSettings> {
        self.columns.get(name)
    }
}

/// Provides a sensible default for `max_num_parallel_blocks` for serde.
fn default_max_num_parallel_blocks() -> usize {
    64
}
