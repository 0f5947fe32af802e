//! Builder for growable block filters.
//!
//! ```text
//! Initial → WithItems → Complete → TaffyBlockFilter
//!     ↓         ↓           ↓
//!   .expected_items()  .false_positive_rate()  .build()
//! ```
//!
//! `expected_items` sizes the first generation only; the filter keeps growing
//! past it.

use super::validation::{validate_fp_rate, validate_items};
use super::{Complete, Initial, WithItems};
use crate::error::Result;
use crate::filters::TaffyBlockFilter;

/// Builder for [`TaffyBlockFilter`].
///
/// # Examples
///
/// ```
/// use taffycraft::builder::TaffyBlockFilterBuilder;
///
/// let mut filter = TaffyBlockFilterBuilder::new()
///     .expected_items(100)
///     .false_positive_rate(0.01)
///     .build()?;
///
/// for h in 0..1_000u64 {
///     filter.add_hash(h.wrapping_mul(0xff51_afd7_ed55_8ccd))?;
/// }
/// assert!(filter.generation() > 0);
/// # Ok::<(), taffycraft::FilterError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TaffyBlockFilterBuilder<State = Initial> {
    state: State,
}

impl TaffyBlockFilterBuilder<Initial> {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self { state: Initial }
    }

    /// Capacity of the first generation (must be > 0).
    #[must_use]
    pub fn expected_items(self, items: u64) -> TaffyBlockFilterBuilder<WithItems> {
        TaffyBlockFilterBuilder {
            state: WithItems { items },
        }
    }
}

impl Default for TaffyBlockFilterBuilder<Initial> {
    fn default() -> Self {
        Self::new()
    }
}

impl TaffyBlockFilterBuilder<WithItems> {
    /// False positive rate to hold however far the filter grows.
    #[must_use]
    pub fn false_positive_rate(self, fp_rate: f64) -> TaffyBlockFilterBuilder<Complete> {
        TaffyBlockFilterBuilder {
            state: Complete {
                items: self.state.items,
                fp_rate,
            },
        }
    }
}

impl TaffyBlockFilterBuilder<Complete> {
    /// Validate the parameters and allocate the first generation.
    ///
    /// # Errors
    ///
    /// - [`crate::FilterError::InvalidItemCount`] if `expected_items == 0`
    /// - [`crate::FilterError::FalsePositiveRateOutOfBounds`] if the rate is not in `(0, 1)`
    /// - [`crate::FilterError::AllocationFailed`] if the first generation cannot be allocated
    pub fn build(self) -> Result<TaffyBlockFilter> {
        let Complete { items, fp_rate } = self.state;
        validate_items(items)?;
        validate_fp_rate(fp_rate)?;
        TaffyBlockFilter::new(items, fp_rate)
    }
}
