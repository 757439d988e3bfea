//! This file is the root of the `deltacodec` Rust crate.
//!
//! Its responsibilities are strictly limited to:
//! 1.  Declaring all the top-level modules of the library (`block_pipeline`,
//!     `kernels`, etc.) so the Rust compiler knows they exist.
//! 2.  Re-exporting the public surface, so callers can write
//!     `deltacodec::DeltaCodec` instead of reaching into `bridge`.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
//==================================================================================
// 1. Module Declarations
//==================================================================================
#[macro_use]
mod observability; // Make macros available throughout the crate

pub mod block_pipeline;
pub mod bridge;
pub mod config;
pub mod error;
pub mod finishers;
pub mod frame_pipeline;
pub mod kernels;
pub mod traits;
pub mod types;

mod utils;
mod values;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use bridge::{analyze_frame, decode_column, encode_column, BlockInfo, DeltaCodec, FrameInfo};
pub use config::{
    CodecConfig, ColumnSettings, CompressionLevel, FinisherKind, Granularity, Monotonicity,
    TransformKind,
};
pub use error::DeltaCodecError;
pub use finishers::Finisher;
pub use frame_pipeline::{
    EncodingArgs, EncodingDescriptor, MapEncodingArgs, RecordEncodingArgs, RecordSchema,
};
pub use observability::enable_verbose_logging;
pub use traits::DeltaValue;
pub use types::DeltaDataType;
