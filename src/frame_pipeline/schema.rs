//! Explicit column descriptors for multi-field records.
//!
//! A `RecordSchema<R>` is an ordered list of `(extract, inject)` accessor pairs,
//! one per field. Each pair is wrapped in a type-erased `ColumnHandle<R>` that
//! knows its element type, so the frame logic is written once for any number
//! of fields.
//!
//! ```text
//! records --extract (one pass, K builders)--> K vectors --encode_frame--> bytes
//! bytes --FrameReader--> K decoded vectors --inject (row by row)--> records
//! ```

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use rayon::prelude::*;

use super::vectors::{encode_frame, FrameReader, TypedVector};
use super::VectorEncoder;
use crate::block_pipeline::PipelineContext;
use crate::bridge::format::MAX_VECTORS_PER_FRAME;
use crate::config::ColumnSettings;
use crate::error::DeltaCodecError;
use crate::finishers::Finisher;
use crate::traits::DeltaValue;
use crate::types::DeltaDataType;

/// A decoded column whose element type is only known to the handle that
/// produced it.
pub struct DecodedColumn {
    len: usize,
    values: Box<dyn Any + Send>,
}

impl DecodedColumn {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// **CONTRACT:** One field of `R`, viewed as a column.
pub trait ColumnHandle<R>: Send + Sync {
    fn name(&self) -> &str;

    fn data_type(&self) -> DeltaDataType;

    /// Starts an empty column that collects this field as records are scanned.
    fn builder(&self, capacity: usize) -> Box<dyn ColumnBuilder<R> + '_>;

    fn decode(&self, reader: &FrameReader<'_>, vector: usize) -> Result<DecodedColumn, DeltaCodecError>;

    /// Writes a decoded column back into `records`, row by row.
    ///
    /// # Errors
    /// `CorruptData` if the column length differs from `records.len()`,
    /// `InternalError` if `column` came from a different handle.
    fn inject(&self, column: DecodedColumn, records: &mut [R]) -> Result<(), DeltaCodecError>;

    fn raw_size(&self, records: &[R]) -> usize;
}

/// One column being filled during the single scan over the source records.
pub trait ColumnBuilder<R> {
    fn push(&mut self, record: &R);

    fn finish(self: Box<Self>, settings: &ColumnSettings) -> Result<Box<dyn VectorEncoder>, DeltaCodecError>;
}

struct TypedBuilder<'c, R, T, E> {
    extract: &'c E,
    values: Vec<T>,
    _marker: PhantomData<fn(&R)>,
}

impl<R, T, E> ColumnBuilder<R> for TypedBuilder<'_, R, T, E>
where
    T: DeltaValue,
    E: Fn(&R) -> T,
{
    fn push(&mut self, record: &R) {
        self.values.push((self.extract)(record));
    }

    fn finish(self: Box<Self>, settings: &ColumnSettings) -> Result<Box<dyn VectorEncoder>, DeltaCodecError> {
        Ok(Box::new(TypedVector::owned(self.values, settings)?))
    }
}

struct TypedColumn<R, T, E, I> {
    name: String,
    extract: E,
    inject: I,
    _marker: PhantomData<fn(&R) -> T>,
}

impl<R, T, E, I> ColumnHandle<R> for TypedColumn<R, T, E, I>
where
    R: Send + Sync + 'static,
    T: DeltaValue,
    E: Fn(&R) -> T + Send + Sync + 'static,
    I: Fn(&mut R, T) + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn data_type(&self) -> DeltaDataType {
        T::DATA_TYPE
    }

    fn builder(&self, capacity: usize) -> Box<dyn ColumnBuilder<R> + '_> {
        Box::new(TypedBuilder {
            extract: &self.extract,
            values: Vec::with_capacity(capacity),
            _marker: PhantomData,
        })
    }

    fn decode(&self, reader: &FrameReader<'_>, vector: usize) -> Result<DecodedColumn, DeltaCodecError> {
        let values = reader.decode_vector::<T>(vector)?;
        Ok(DecodedColumn {
            len: values.len(),
            values: Box::new(values),
        })
    }

    fn inject(&self, column: DecodedColumn, records: &mut [R]) -> Result<(), DeltaCodecError> {
        if column.len != records.len() {
            return Err(DeltaCodecError::CorruptData(format!(
                "column '{}' decoded {} values for {} records",
                self.name,
                column.len,
                records.len()
            )));
        }
        let values: Vec<T> = *column.values.downcast::<Vec<T>>().map_err(|_| {
            DeltaCodecError::InternalError(format!(
                "column '{}' was handed values of another type",
                self.name
            ))
        })?;
        records
            .par_iter_mut()
            .zip(values.into_par_iter())
            .for_each(|(record, value)| (self.inject)(record, value));
        Ok(())
    }

    fn raw_size(&self, records: &[R]) -> usize {
        records.iter().map(|r| (self.extract)(r).raw_size()).sum()
    }
}

/// The ordered field list of a record type.
pub struct RecordSchema<R> {
    columns: Vec<Box<dyn ColumnHandle<R>>>,
}

impl<R: Send + Sync + 'static> RecordSchema<R> {
    pub fn new() -> Self {
        Self { columns: Vec::new() }
    }

    /// Appends a field. Columns are framed in the order they are added.
    pub fn column<T, E, I>(mut self, name: impl Into<String>, extract: E, inject: I) -> Self
    where
        T: DeltaValue,
        E: Fn(&R) -> T + Send + Sync + 'static,
        I: Fn(&mut R, T) + Send + Sync + 'static,
    {
        self.columns.push(Box::new(TypedColumn {
            name: name.into(),
            extract,
            inject,
            _marker: PhantomData,
        }));
        self
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[Box<dyn ColumnHandle<R>>] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// Sum of the in-memory size of every field of every record.
    pub fn raw_byte_size(&self, records: &[R]) -> usize {
        self.columns.iter().map(|c| c.raw_size(records)).sum()
    }

    /// # Errors
    /// `InvalidArgument` for an empty schema, more than 255 columns, or a
    /// repeated column name.
    pub fn validate(&self) -> Result<(), DeltaCodecError> {
        if self.columns.is_empty() {
            return Err(DeltaCodecError::InvalidArgument(
                "a record schema needs at least one column".to_string(),
            ));
        }
        if self.columns.len() > MAX_VECTORS_PER_FRAME {
            return Err(DeltaCodecError::InvalidArgument(format!(
                "a record schema holds at most {} columns, got {}",
                MAX_VECTORS_PER_FRAME,
                self.columns.len()
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.columns.iter().map(|c| c.name()).find(|n| !seen.insert(*n)) {
            return Err(DeltaCodecError::InvalidArgument(format!(
                "column name '{}' appears more than once",
                dup
            )));
        }
        Ok(())
    }
}

impl<R: Send + Sync + 'static> Default for RecordSchema<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> fmt::Debug for RecordSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.columns.iter().map(|c| (c.name(), c.data_type())))
            .finish()
    }
}

/// Encodes `records` as one vector per schema column.
///
/// # Errors
/// `InvalidArgument` if the schema is invalid or `settings` does not hold one
/// entry per column.
pub fn encode_records<R: Send + Sync + 'static>(
    records: &[R],
    schema: &RecordSchema<R>,
    settings: &[ColumnSettings],
    requested_blocks: usize,
    max_blocks: usize,
    ctx: &PipelineContext,
) -> Result<Vec<u8>, DeltaCodecError> {
    schema.validate()?;
    if settings.len() != schema.len() {
        return Err(DeltaCodecError::InvalidArgument(format!(
            "{} column settings given for a schema of {} columns",
            settings.len(),
            schema.len()
        )));
    }

    let mut builders: Vec<_> = schema
        .columns
        .iter()
        .map(|column| column.builder(records.len()))
        .collect();
    for record in records {
        for builder in builders.iter_mut() {
            builder.push(record);
        }
    }
    let vectors = builders
        .into_iter()
        .zip(settings)
        .map(|(builder, settings)| builder.finish(settings))
        .collect::<Result<Vec<_>, DeltaCodecError>>()?;

    encode_frame(&vectors, requested_blocks, max_blocks, ctx)
}

/// Decodes a frame written by `encode_records` with the same schema.
///
/// # Errors
/// `FormatError` if the frame does not hold one vector per column, and
/// `CorruptData` if the decoded columns disagree on length.
pub fn decode_records<R: Default + Send + Sync + 'static>(
    bytes: &[u8],
    schema: &RecordSchema<R>,
    finisher: Arc<dyn Finisher>,
) -> Result<Vec<R>, DeltaCodecError> {
    schema.validate()?;
    let reader = FrameReader::open(bytes, schema.len(), finisher)?;

    let columns = schema
        .columns
        .par_iter()
        .enumerate()
        .map(|(v, column)| column.decode(&reader, v))
        .collect::<Result<Vec<_>, DeltaCodecError>>()?;

    let num_records = columns.first().map(DecodedColumn::len).unwrap_or(0);
    let mut records: Vec<R> = (0..num_records).map(|_| R::default()).collect();
    for (column, decoded) in schema.columns.iter().zip(columns) {
        column.inject(decoded, &mut records)?;
    }
    Ok(records)
}
