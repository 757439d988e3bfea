//! The finishing stage: a general-purpose byte compressor applied to each
//! block's delta stream.
//!
//! The block pipeline only sees the `Finisher` trait. The concrete compressors
//! live in their own modules and are chosen through `FinisherKind`, but any
//! caller-supplied implementation works as long as `decompress` inverts
//! `compress` for every level.

use std::fmt::Debug;
use std::sync::Arc;

use crate::config::{CompressionLevel, FinisherKind};
use crate::error::DeltaCodecError;

mod deflate;
mod lz4;
mod zstd;

pub use deflate::DeflateFinisher;
pub use lz4::Lz4Finisher;
pub use zstd::ZstdFinisher;

/// A pure, stateless compressor/decompressor pair.
pub trait Finisher: Send + Sync + Debug {
    /// A short, stable name used in errors and logs.
    fn name(&self) -> &'static str;

    /// Compresses `input` with a quality hint. `NoCompression` is never passed
    /// here; the block pipeline skips the finisher for it.
    fn compress(&self, input: &[u8], level: CompressionLevel) -> Result<Vec<u8>, DeltaCodecError>;

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, DeltaCodecError>;
}

/// Builds the built-in finisher for `kind`.
pub fn finisher_for(kind: FinisherKind) -> Arc<dyn Finisher> {
    match kind {
        FinisherKind::Deflate => Arc::new(DeflateFinisher),
        FinisherKind::Zstd => Arc::new(ZstdFinisher),
        FinisherKind::Lz4 => Arc::new(Lz4Finisher),
    }
}
