// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the public-facing API of the deltacodec library. It wraps the
// pure `frame_pipeline` / `block_pipeline` engine behind a small facade that owns
// configuration, the finisher, and the worker pool.
//
// Data Flow (Encoding):
//
//   1. [Stateful Facade (DeltaCodec)]      -> Receives EncodingArgs / RecordEncodingArgs / MapEncodingArgs
//         |
//         `-> resolves per-vector ColumnSettings, enters the worker pool ->
//
//   2. [Frame Pipeline (encode_frame)]     -> Validates lengths, partitions once
//         |
//         `-> for each (vector, block) in parallel ->
//
//   3. [Block Pipeline (encode_block)]     -> delta transform -> finisher -> DeltaBlockState::to_bytes
//         |
//         `-> Returns `Result<Vec<u8>>` (a framed, multi-vector byte stream)
//
//
// Data Flow (Decoding):
//
//   1. [Frame Pipeline (FrameReader)]      -> Validates the envelope and vector count
//         |
//         `-> for each (vector, block) in parallel ->
//
//   2. [Block Pipeline (decode_block)]     -> from_bytes -> finisher -> inverse delta transform
//         |
//         `-> blocks are placed by their recorded index, never by completion order
//
//   3. [Stateful Facade (DeltaCodec)]      -> Returns the column, records, or map
//
// ====================================================================================
pub mod codec;
pub mod format;
pub mod stateless_api;

pub use codec::DeltaCodec;
pub use format::{BlockInfo, FrameInfo};
pub use stateless_api::{analyze_frame, decode_column, encode_column};
