//! Builder for fixed-size block filters.
//!
//! ```text
//! Initial → WithItems → Complete → BlockFilter
//!     ↓         ↓           ↓
//!   .expected_items()  .false_positive_rate()  .build()
//! ```
//!
//! # Examples
//!
//! ```
//! use taffycraft::builder::BlockFilterBuilder;
//!
//! let (filter, metadata) = BlockFilterBuilder::new()
//!     .expected_items(123_456)
//!     .false_positive_rate(0.01)
//!     .build_with_metadata()
//!     .unwrap();
//!
//! assert_eq!(metadata.bytes as usize, filter.size_in_bytes());
//! assert!(metadata.expected_fpp <= 0.01);
//! ```

use super::validation::{validate_fp_rate, validate_items};
use super::{Complete, Initial, WithItems};
use crate::core::params;
use crate::error::Result;
use crate::filters::BlockFilter;

/// Builder for [`BlockFilter`] with type-state guarantees.
#[derive(Debug, Clone, Copy)]
pub struct BlockFilterBuilder<State = Initial> {
    state: State,
}

impl BlockFilterBuilder<Initial> {
    /// Create a new block filter builder.
    #[must_use]
    pub fn new() -> Self {
        Self { state: Initial }
    }

    /// Set the expected number of distinct hashes (must be > 0).
    #[must_use]
    pub fn expected_items(self, items: u64) -> BlockFilterBuilder<WithItems> {
        BlockFilterBuilder {
            state: WithItems { items },
        }
    }
}

impl Default for BlockFilterBuilder<Initial> {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockFilterBuilder<WithItems> {
    /// Set the target false positive rate (must be in `(0, 1)`).
    #[must_use]
    pub fn false_positive_rate(self, fp_rate: f64) -> BlockFilterBuilder<Complete> {
        BlockFilterBuilder {
            state: Complete {
                items: self.state.items,
                fp_rate,
            },
        }
    }
}

impl BlockFilterBuilder<Complete> {
    /// Validate the parameters and allocate the filter.
    ///
    /// # Errors
    ///
    /// - [`crate::FilterError::InvalidItemCount`] if `expected_items == 0`
    /// - [`crate::FilterError::FalsePositiveRateOutOfBounds`] if the rate is not in `(0, 1)`
    /// - [`crate::FilterError::AllocationFailed`] if the table cannot be allocated
    pub fn build(self) -> Result<BlockFilter> {
        self.build_with_metadata().map(|(filter, _)| filter)
    }

    /// As [`BlockFilterBuilder::build`], also returning the computed size.
    ///
    /// # Errors
    ///
    /// As for [`BlockFilterBuilder::build`].
    pub fn build_with_metadata(self) -> Result<(BlockFilter, FilterMetadata)> {
        let Complete { items, fp_rate } = self.state;
        validate_items(items)?;
        validate_fp_rate(fp_rate)?;

        let bytes = params::bytes_needed(items, fp_rate)?;
        let filter = BlockFilter::new(bytes)?;
        let metadata = FilterMetadata {
            expected_items: items,
            fp_rate,
            bytes,
            expected_fpp: params::block_fpp(items, bytes),
        };
        Ok((filter, metadata))
    }
}

/// Parameters a block filter was built with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterMetadata {
    /// Expected number of distinct hashes.
    pub expected_items: u64,
    /// Requested false positive rate.
    pub fp_rate: f64,
    /// Table size in bytes.
    pub bytes: u64,
    /// Modelled false positive rate once `expected_items` are added.
    pub expected_fpp: f64,
}

impl FilterMetadata {
    /// Bits of table per expected item.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bits_per_item(&self) -> f64 {
        self.bytes as f64 * 8.0 / self.expected_items as f64
    }
}
