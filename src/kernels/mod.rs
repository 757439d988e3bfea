//! This module collects the pure, stateless kernels the delta transform and the
//! finishers are built from.
//!
//! None of these kernels know about blocks, frames, or column types. They work
//! on slices and byte buffers only, are panic-free, and report failures through
//! `DeltaCodecError`.

/// Layer 0: Type Conversion
pub mod bitcast;

/// Layer 1: Value Reduction
pub mod anchor_delta;
pub mod xor_delta;

/// Layer 2: Bit-Width Reduction
pub mod leb128;
pub mod zigzag;

/// Final Stage: Entropy Coding
pub mod zstd;
