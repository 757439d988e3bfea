//! This module defines the core, strongly-typed data representations used
//! throughout the deltacodec pipeline.
//!
//! It currently includes the canonical `DeltaDataType` enum, whose one-byte tag
//! makes every serialized block self-describing.

pub mod delta_data_type;

// Re-export the main type(s) for easier access.
pub use delta_data_type::DeltaDataType;
