//! Typed argument objects, one per encoding family.
//!
//! Every family exposes the same `EncodingDescriptor` view: an element count,
//! a requested block count, and one level, granularity, and monotonicity per
//! vector. `custom` is carried for the caller and never interpreted.

use std::collections::HashMap;

use crate::config::{CodecConfig, ColumnSettings, CompressionLevel, Granularity, Monotonicity};
use crate::error::DeltaCodecError;
use crate::traits::DeltaValue;

use super::schema::RecordSchema;

/// The shape every encoding family presents to the codec.
pub trait EncodingDescriptor {
    fn element_count(&self) -> usize;

    fn num_blocks(&self) -> usize;

    fn levels(&self) -> Vec<CompressionLevel>;

    fn granularities(&self) -> Vec<Option<Granularity>>;

    fn monotonicities(&self) -> Vec<Monotonicity>;

    fn custom(&self) -> Option<&serde_json::Value>;

    /// Zips the three per-vector arrays into one `ColumnSettings` per vector.
    ///
    /// # Errors
    /// `InvalidArgument` if the arrays differ in length.
    fn column_settings(&self) -> Result<Vec<ColumnSettings>, DeltaCodecError> {
        let levels = self.levels();
        let granularities = self.granularities();
        let monotonicities = self.monotonicities();
        if levels.len() != granularities.len() || levels.len() != monotonicities.len() {
            return Err(DeltaCodecError::InvalidArgument(format!(
                "per-vector settings disagree: {} levels, {} granularities, {} monotonicities",
                levels.len(),
                granularities.len(),
                monotonicities.len()
            )));
        }
        Ok(levels
            .into_iter()
            .zip(granularities)
            .zip(monotonicities)
            .map(|((level, granularity), monotonicity)| ColumnSettings {
                level,
                granularity,
                monotonicity,
            })
            .collect())
    }
}

//==================================================================================
// 1. Single Column
//==================================================================================

/// Arguments for encoding one column of `T`.
#[derive(Debug, Clone)]
pub struct EncodingArgs<'a, T: DeltaValue> {
    pub data: &'a [T],
    pub num_blocks: usize,
    pub settings: ColumnSettings,
    pub custom: Option<serde_json::Value>,
}

impl<'a, T: DeltaValue> EncodingArgs<'a, T> {
    pub fn new(data: &'a [T], num_blocks: usize, level: CompressionLevel) -> Self {
        Self {
            data,
            num_blocks,
            settings: ColumnSettings::new(level),
            custom: None,
        }
    }

    pub fn with_granularity(mut self, granularity: impl Into<Granularity>) -> Self {
        self.settings.granularity = Some(granularity.into());
        self
    }

    pub fn with_monotonicity(mut self, monotonicity: Monotonicity) -> Self {
        self.settings.monotonicity = monotonicity;
        self
    }

    pub fn with_custom(mut self, custom: serde_json::Value) -> Self {
        self.custom = Some(custom);
        self
    }

    pub fn raw_byte_size(&self) -> usize {
        self.data.iter().map(DeltaValue::raw_size).sum()
    }
}

impl<T: DeltaValue> EncodingDescriptor for EncodingArgs<'_, T> {
    fn element_count(&self) -> usize {
        self.data.len()
    }

    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn levels(&self) -> Vec<CompressionLevel> {
        vec![self.settings.level]
    }

    fn granularities(&self) -> Vec<Option<Granularity>> {
        vec![self.settings.granularity.clone()]
    }

    fn monotonicities(&self) -> Vec<Monotonicity> {
        vec![self.settings.monotonicity]
    }

    fn custom(&self) -> Option<&serde_json::Value> {
        self.custom.as_ref()
    }
}

//==================================================================================
// 2. Multi-Field Records
//==================================================================================

/// Arguments for encoding records through a `RecordSchema`, with one entry per
/// column in every per-vector array.
#[derive(Debug, Clone)]
pub struct RecordEncodingArgs<'a, R> {
    pub data: &'a [R],
    pub num_blocks: usize,
    pub levels: Vec<CompressionLevel>,
    pub granularities: Vec<Option<Granularity>>,
    pub monotonicities: Vec<Monotonicity>,
    pub custom: Option<serde_json::Value>,
}

impl<'a, R: Send + Sync + 'static> RecordEncodingArgs<'a, R> {
    /// Every column at `level`, without granularity or monotonicity hints.
    pub fn new(data: &'a [R], num_blocks: usize, schema: &RecordSchema<R>, level: CompressionLevel) -> Self {
        let fields = schema.len();
        Self {
            data,
            num_blocks,
            levels: vec![level; fields],
            granularities: vec![None; fields],
            monotonicities: vec![Monotonicity::None; fields],
            custom: None,
        }
    }

    /// Per-column settings looked up by column name in `config`, falling back
    /// to the config defaults.
    pub fn from_config(data: &'a [R], num_blocks: usize, schema: &RecordSchema<R>, config: &CodecConfig) -> Self {
        let settings: Vec<ColumnSettings> = schema
            .names()
            .into_iter()
            .map(|name| {
                config
                    .column_settings(name)
                    .cloned()
                    .unwrap_or_else(|| config.default_column_settings())
            })
            .collect();
        Self {
            data,
            num_blocks,
            levels: settings.iter().map(|s| s.level).collect(),
            granularities: settings.iter().map(|s| s.granularity.clone()).collect(),
            monotonicities: settings.iter().map(|s| s.monotonicity).collect(),
            custom: None,
        }
    }

    /// Replaces the settings of one column.
    ///
    /// # Errors
    /// `InvalidArgument` if `index` is not a column.
    pub fn set_column(&mut self, index: usize, settings: ColumnSettings) -> Result<(), DeltaCodecError> {
        if index >= self.levels.len() {
            return Err(DeltaCodecError::InvalidArgument(format!(
                "column {} does not exist in args for {} columns",
                index,
                self.levels.len()
            )));
        }
        self.levels[index] = settings.level;
        self.granularities[index] = settings.granularity;
        self.monotonicities[index] = settings.monotonicity;
        Ok(())
    }

    pub fn reset_levels(&mut self, level: CompressionLevel) {
        self.levels.iter_mut().for_each(|l| *l = level);
    }

    pub fn reset_granularities(&mut self) {
        self.granularities.iter_mut().for_each(|g| *g = None);
    }

    pub fn reset_monotonicities(&mut self, monotonicity: Monotonicity) {
        self.monotonicities.iter_mut().for_each(|m| *m = monotonicity);
    }

    pub fn with_custom(mut self, custom: serde_json::Value) -> Self {
        self.custom = Some(custom);
        self
    }

    pub fn raw_byte_size(&self, schema: &RecordSchema<R>) -> usize {
        schema.raw_byte_size(self.data)
    }
}

impl<R> EncodingDescriptor for RecordEncodingArgs<'_, R> {
    fn element_count(&self) -> usize {
        self.data.len()
    }

    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn levels(&self) -> Vec<CompressionLevel> {
        self.levels.clone()
    }

    fn granularities(&self) -> Vec<Option<Granularity>> {
        self.granularities.clone()
    }

    fn monotonicities(&self) -> Vec<Monotonicity> {
        self.monotonicities.clone()
    }

    fn custom(&self) -> Option<&serde_json::Value> {
        self.custom.as_ref()
    }
}

//==================================================================================
// 3. Maps
//==================================================================================

/// Arguments for encoding a map as a key vector and a value vector.
#[derive(Debug, Clone)]
pub struct MapEncodingArgs<'a, K, V> {
    pub data: &'a HashMap<K, V>,
    pub num_blocks: usize,
    pub key_settings: ColumnSettings,
    pub value_settings: ColumnSettings,
    pub custom: Option<serde_json::Value>,
}

impl<'a, K: DeltaValue, V: DeltaValue> MapEncodingArgs<'a, K, V> {
    pub fn new(data: &'a HashMap<K, V>, num_blocks: usize, level: CompressionLevel) -> Self {
        Self {
            data,
            num_blocks,
            key_settings: ColumnSettings::new(level),
            value_settings: ColumnSettings::new(level),
            custom: None,
        }
    }

    pub fn with_key_settings(mut self, settings: ColumnSettings) -> Self {
        self.key_settings = settings;
        self
    }

    pub fn with_value_settings(mut self, settings: ColumnSettings) -> Self {
        self.value_settings = settings;
        self
    }

    pub fn reset_levels(&mut self, level: CompressionLevel) {
        self.key_settings.level = level;
        self.value_settings.level = level;
    }

    pub fn reset_granularities(&mut self) {
        self.key_settings.granularity = None;
        self.value_settings.granularity = None;
    }

    pub fn reset_monotonicities(&mut self, monotonicity: Monotonicity) {
        self.key_settings.monotonicity = monotonicity;
        self.value_settings.monotonicity = monotonicity;
    }

    pub fn with_custom(mut self, custom: serde_json::Value) -> Self {
        self.custom = Some(custom);
        self
    }

    pub fn raw_byte_size(&self) -> usize {
        self.data.iter().map(|(k, v)| k.raw_size() + v.raw_size()).sum()
    }
}

impl<K, V> EncodingDescriptor for MapEncodingArgs<'_, K, V> {
    fn element_count(&self) -> usize {
        self.data.len()
    }

    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn levels(&self) -> Vec<CompressionLevel> {
        vec![self.key_settings.level, self.value_settings.level]
    }

    fn granularities(&self) -> Vec<Option<Granularity>> {
        vec![
            self.key_settings.granularity.clone(),
            self.value_settings.granularity.clone(),
        ]
    }

    fn monotonicities(&self) -> Vec<Monotonicity> {
        vec![self.key_settings.monotonicity, self.value_settings.monotonicity]
    }

    fn custom(&self) -> Option<&serde_json::Value> {
        self.custom.as_ref()
    }
}
