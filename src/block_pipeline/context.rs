//! The per-call inputs shared by every block task.

use std::fmt;
use std::sync::Arc;

use crate::config::{ColumnSettings, CompressionLevel, Monotonicity, TransformKind};
use crate::error::DeltaCodecError;
use crate::finishers::Finisher;
use crate::traits::DeltaValue;

/// Everything a block task needs besides its own values. Cheap to clone and
/// shared read-only across the fan-out.
#[derive(Clone)]
pub struct PipelineContext {
    pub finisher: Arc<dyn Finisher>,
    pub transform: TransformKind,
}

impl PipelineContext {
    pub fn new(finisher: Arc<dyn Finisher>, transform: TransformKind) -> Self {
        Self { finisher, transform }
    }
}

impl fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineContext")
            .field("finisher", &self.finisher.name())
            .field("transform", &self.transform)
            .finish()
    }
}

/// `ColumnSettings` resolved against a concrete element type.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSettings<T: DeltaValue> {
    pub level: CompressionLevel,
    pub granularity: Option<T::Factor>,
    pub monotonicity: Monotonicity,
}

impl<T: DeltaValue> BlockSettings<T> {
    /// Converts the type-erased granularity into `T`'s factor.
    ///
    /// # Errors
    /// `InvalidArgument` if the granularity does not apply to `T`.
    pub fn resolve(settings: &ColumnSettings) -> Result<Self, DeltaCodecError> {
        let granularity = settings
            .granularity
            .as_ref()
            .map(T::factor_from_granularity)
            .transpose()?;
        Ok(Self {
            level: settings.level,
            granularity,
            monotonicity: settings.monotonicity,
        })
    }
}

impl<T: DeltaValue> Default for BlockSettings<T> {
    fn default() -> Self {
        Self {
            level: CompressionLevel::default(),
            granularity: None,
            monotonicity: Monotonicity::default(),
        }
    }
}
