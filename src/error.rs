//! Error types for taffycraft operations.
//!
//! Every fallible operation in the crate returns [`Result<T>`], whose error type is
//! [`FilterError`]. Errors fall into five groups:
//!
//! - invalid construction parameters (false positive rate, empty key set, byte budget),
//! - allocation failure during construction, clone, or growth,
//! - static filter encoding failure,
//! - growth limits and incompatible merges,
//! - malformed serialized filters.
//!
//! A failed operation never leaves a filter partially modified.
//!
//! # Error Propagation
//!
//! ```
//! use taffycraft::{Result, FilterError};
//! use taffycraft::filters::BlockFilter;
//!
//! fn sized_filter(ndv: u64, fpp: f64) -> Result<BlockFilter> {
//!     let bytes = BlockFilter::bytes_needed(ndv, fpp)?;
//!     BlockFilter::new(bytes)
//! }
//! # assert!(sized_filter(1000, 0.01).is_ok());
//! # assert!(matches!(
//! #     sized_filter(1000, 0.0),
//! #     Err(FilterError::FalsePositiveRateOutOfBounds { .. })
//! # ));
//! ```

#![allow(clippy::module_name_repetitions)]

use thiserror::Error;

/// Result type alias for taffycraft operations.
///
/// # Examples
/// ```
/// use taffycraft::{FilterError, Result};
///
/// fn check_keys(keys: &[u64]) -> Result<()> {
///     if keys.is_empty() {
///         return Err(FilterError::invalid_item_count(0));
///     }
///     Ok(())
/// }
/// # assert!(check_keys(&[1, 2, 3]).is_ok());
/// ```
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors that can occur while building, growing, or merging filters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// False positive rate outside the open interval (0, 1).
    ///
    /// NaN is reported here as well.
    #[error("False positive rate {fpp} is out of bounds. Must be in range (0, 1).")]
    FalsePositiveRateOutOfBounds {
        /// The rejected rate.
        fpp: f64,
    },

    /// A static filter was asked to encode no keys.
    #[error("Invalid item count: {count}. A static filter needs at least one key.")]
    InvalidItemCount {
        /// Number of keys supplied.
        count: usize,
    },

    /// The byte budget cannot be addressed by the filter's index arithmetic.
    #[error("Invalid filter size: {bytes} bytes. Must be addressable by a 32-bit block index.")]
    InvalidFilterSize {
        /// Requested budget in bytes.
        bytes: u64,
    },

    /// The allocator refused a request.
    #[error("Allocation of {bytes} bytes failed.")]
    AllocationFailed {
        /// Size of the refused request in bytes.
        bytes: usize,
    },

    /// The static filter could not peel its key hypergraph.
    ///
    /// Distinct from [`FilterError::AllocationFailed`]: retrying with a different
    /// seed is expected to succeed.
    #[error("Static filter construction failed for {keys} keys after {attempts} attempts.")]
    ConstructionFailed {
        /// Number of distinct keys.
        keys: usize,
        /// Number of table sizes tried.
        attempts: usize,
    },

    /// Growth would exceed what a 64-bit hash can address.
    #[error("Filter capacity exceeded: cannot grow past {limit} ({what}).")]
    CapacityExceeded {
        /// The limit that was reached.
        limit: u64,
        /// Which quantity hit the limit.
        what: &'static str,
    },

    /// Two filters cannot be merged.
    #[error("Cannot perform operation on incompatible filters: {reason}.")]
    IncompatibleFilters {
        /// Description of the mismatch.
        reason: String,
    },

    /// Serialized filter data does not describe a valid filter.
    #[error("Serialization error: {message}.")]
    SerializationError {
        /// What was wrong with the data.
        message: String,
    },
}

impl FilterError {
    /// Create a `FalsePositiveRateOutOfBounds` error.
    #[must_use]
    pub fn fp_rate_out_of_bounds(fpp: f64) -> Self {
        Self::FalsePositiveRateOutOfBounds { fpp }
    }

    /// Create an `InvalidItemCount` error.
    #[must_use]
    pub fn invalid_item_count(count: usize) -> Self {
        Self::InvalidItemCount { count }
    }

    /// Create an `InvalidFilterSize` error.
    #[must_use]
    pub fn invalid_filter_size(bytes: u64) -> Self {
        Self::InvalidFilterSize { bytes }
    }

    /// Create an `AllocationFailed` error.
    #[must_use]
    pub fn allocation_failed(bytes: usize) -> Self {
        Self::AllocationFailed { bytes }
    }

    /// Create a `ConstructionFailed` error.
    #[must_use]
    pub fn construction_failed(keys: usize, attempts: usize) -> Self {
        Self::ConstructionFailed { keys, attempts }
    }

    /// Create a `CapacityExceeded` error.
    #[must_use]
    pub fn capacity_exceeded(limit: u64, what: &'static str) -> Self {
        Self::CapacityExceeded { limit, what }
    }

    /// Create an `IncompatibleFilters` error.
    ///
    /// # Examples
    /// ```
    /// use taffycraft::FilterError;
    ///
    /// let err = FilterError::incompatible_filters(format!("sizes {} and {}", 64, 128));
    /// assert!(err.to_string().contains("sizes 64 and 128"));
    /// ```
    #[must_use]
    pub fn incompatible_filters(reason: impl Into<String>) -> Self {
        Self::IncompatibleFilters {
            reason: reason.into(),
        }
    }

    /// Create a `SerializationError`.
    #[must_use]
    pub fn serialization_error(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }

    /// True for errors that a retry with other parameters may fix.
    ///
    /// Allocation failure and capacity limits are not retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConstructionFailed { .. })
    }
}
