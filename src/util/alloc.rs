//! Fallible allocation helpers.
//!
//! Filters allocate through these so that construction, clone, and growth report
//! [`FilterError::AllocationFailed`] instead of aborting the process.

use crate::error::{FilterError, Result};

/// Allocate `len` copies of `T::default()`, reporting allocator refusal.
pub(crate) fn try_filled_vec<T: Clone + Default>(len: usize) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| FilterError::allocation_failed(len.saturating_mul(std::mem::size_of::<T>())))?;
    v.resize(len, T::default());
    Ok(v)
}

/// Copy a slice into a freshly allocated vector.
pub(crate) fn try_clone_slice<T: Clone>(src: &[T]) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(src.len()).map_err(|_| {
        FilterError::allocation_failed(src.len().saturating_mul(std::mem::size_of::<T>()))
    })?;
    v.extend_from_slice(src);
    Ok(v)
}

/// Reserve room for one more element.
pub(crate) fn try_push<T>(v: &mut Vec<T>, item: T) -> Result<()> {
    v.try_reserve(1)
        .map_err(|_| FilterError::allocation_failed(std::mem::size_of::<T>()))?;
    v.push(item);
    Ok(())
}
