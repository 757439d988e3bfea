// In: src/error.rs

//! This module defines the single, unified error type for the entire deltacodec library.
//! It uses the `thiserror` crate to provide ergonomic, context-aware error handling.

use thiserror::Error;

use crate::types::DeltaDataType;

#[derive(Error, Debug)]
pub enum DeltaCodecError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Frame format error: {0}")]
    FormatError(String),

    #[error("Corrupt block data: {0}")]
    CorruptData(String),

    #[error("Type mismatch: block stores {stored}, but {requested} was requested")]
    TypeMismatch {
        stored: String,
        requested: DeltaDataType,
    },

    #[error("Delta transform failed: {0}")]
    TransformFailure(String),

    #[error("Finisher '{finisher}' failed: {message}")]
    Finisher {
        finisher: &'static str,
        message: String,
    },

    /// Context added by the orchestrator when a single block task fails.
    #[error("Block {block} of vector {vector} failed during {stage}: {source}")]
    BlockFailure {
        stage: &'static str,
        vector: usize,
        block: usize,
        #[source]
        source: Box<DeltaCodecError>,
    },

    #[error("Internal logic error (this is a bug): {0}")]
    InternalError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error from the Serde JSON library, typically while loading configuration.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// The dedicated worker pool could not be created.
    #[error("Thread pool construction failed: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    // =========================================================================
    // === Low-Level Kernel Errors
    // =========================================================================
    #[error("LEB128 decoding error: {0}")]
    Leb128DecodeError(String),
}

impl DeltaCodecError {
    /// Wraps `self` with the stage and position of the block that produced it.
    pub fn in_block(self, stage: &'static str, vector: usize, block: usize) -> Self {
        DeltaCodecError::BlockFailure {
            stage,
            vector,
            block,
            source: Box::new(self),
        }
    }

    /// Strips any `BlockFailure` context and returns the error that started it.
    pub fn root_cause(&self) -> &DeltaCodecError {
        let mut current = self;
        while let DeltaCodecError::BlockFailure { source, .. } = current {
            current = source;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_nested_block_context() {
        let err = DeltaCodecError::CorruptData("bad payload".into())
            .in_block("decompress", 1, 3)
            .in_block("decode", 1, 3);

        assert!(matches!(err.root_cause(), DeltaCodecError::CorruptData(_)));
        let message = err.to_string();
        assert!(message.contains("Block 3 of vector 1"));
        assert!(message.contains("bad payload"));
    }

    #[test]
    fn test_root_cause_of_plain_error_is_itself() {
        let err = DeltaCodecError::FormatError("bad magic".into());
        assert!(matches!(err.root_cause(), DeltaCodecError::FormatError(_)));
    }
}
