//! Builders for filter construction.
//!
//! # Type-State Pattern
//!
//! Builders that need both a capacity and a false positive rate carry them in
//! their state type, so `build()` only exists once both are set. Values are
//! checked when `build()` runs.
//!
//! # Examples
//!
//! ## Block Filter Builder
//!
//! ```
//! use taffycraft::builder::BlockFilterBuilder;
//!
//! let filter = BlockFilterBuilder::new()
//!     .expected_items(10_000)
//!     .false_positive_rate(0.01)
//!     .build()
//!     .unwrap();
//! assert!(filter.size_in_bytes() > 0);
//! ```
//!
//! ## Taffy Block Filter Builder
//!
//! ```
//! use taffycraft::builder::TaffyBlockFilterBuilder;
//!
//! let filter = TaffyBlockFilterBuilder::new()
//!     .expected_items(1_000)
//!     .false_positive_rate(0.001)
//!     .build()
//!     .unwrap();
//! assert_eq!(filter.generation(), 0);
//! ```
//!
//! ## Taffy Cuckoo Filter Builder
//!
//! ```
//! use taffycraft::builder::TaffyCuckooFilterBuilder;
//!
//! let filter = TaffyCuckooFilterBuilder::new()
//!     .expected_items(50_000)
//!     .build()
//!     .unwrap();
//! assert!(filter.capacity() >= 50_000);
//! ```
//!
//! # Builder Comparison
//!
//! | Builder | Required Parameters | Optional Parameters |
//! |---------|---------------------|---------------------|
//! | Block | items, fp_rate | |
//! | TaffyBlock | items, fp_rate | |
//! | TaffyCuckoo | | initial_bytes or items, entropy |

#![allow(clippy::module_name_repetitions)]

pub mod block;
pub mod taffy_block;
pub mod taffy_cuckoo;

pub use block::BlockFilterBuilder;
pub use taffy_block::TaffyBlockFilterBuilder;
pub use taffy_cuckoo::TaffyCuckooFilterBuilder;

/// Type-state marker: nothing set yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Initial;

/// Type-state marker: expected item count set.
#[derive(Debug, Clone, Copy)]
pub struct WithItems {
    items: u64,
}

/// Type-state marker: every required parameter set.
#[derive(Debug, Clone, Copy)]
pub struct Complete {
    items: u64,
    fp_rate: f64,
}

/// Checks shared by every builder.
pub(crate) mod validation {
    use crate::core::params::validate_fpp;
    use crate::error::{FilterError, Result};

    /// Reject an expected item count of zero.
    ///
    /// # Errors
    ///
    /// [`FilterError::InvalidItemCount`] if `items == 0`.
    #[inline]
    pub fn validate_items(items: u64) -> Result<()> {
        if items == 0 {
            return Err(FilterError::invalid_item_count(0));
        }
        Ok(())
    }

    /// Reject a false positive rate outside `(0, 1)`.
    ///
    /// # Errors
    ///
    /// [`FilterError::FalsePositiveRateOutOfBounds`].
    #[inline]
    pub fn validate_fp_rate(fp_rate: f64) -> Result<()> {
        validate_fpp(fp_rate)
    }
}

/// Prelude for convenient builder imports.
pub mod prelude {
    pub use super::{BlockFilterBuilder, TaffyBlockFilterBuilder, TaffyCuckooFilterBuilder};
}
