//! This module contains the pure, stateless kernel for bit-casting.
//!
//! This is a Type Conversion transform. It reinterprets a slice's bit patterns as
//! another type of the same size (e.g., `f64` -> `u64`), so integer kernels can run
//! on float data. It is panic-free and relies on `bytemuck` for safety.

use bytemuck::Pod;

use crate::error::DeltaCodecError;

/// Reinterprets every element of `input` as `O`.
///
/// # Errors
/// `InternalError` if `I` and `O` differ in size.
pub fn cast<I, O>(input: &[I]) -> Result<Vec<O>, DeltaCodecError>
where
    I: Pod,
    O: Pod,
{
    if std::mem::size_of::<I>() != std::mem::size_of::<O>() {
        return Err(DeltaCodecError::InternalError(format!(
            "Bit-cast size mismatch: Cannot cast from {} ({} bytes) to {} ({} bytes)",
            std::any::type_name::<I>(),
            std::mem::size_of::<I>(),
            std::any::type_name::<O>(),
            std::mem::size_of::<O>()
        )));
    }
    Ok(input.iter().map(|&v| bytemuck::cast::<I, O>(v)).collect())
}
