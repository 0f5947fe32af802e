//! Builder for growable cuckoo filters.
//!
//! Every parameter is optional: by default the filter starts at its smallest
//! size with the built-in permutation keys.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use crate::error::Result;
use crate::filters::taffy_cuckoo::{DEFAULT_ENTROPY, MAX_LOAD};
use crate::filters::TaffyCuckooFilter;

/// Bytes per cuckoo slot.
const SLOT_BYTES: u64 = 2;

/// Builder for [`TaffyCuckooFilter`].
///
/// # Examples
///
/// ```
/// use taffycraft::builder::TaffyCuckooFilterBuilder;
///
/// let filter = TaffyCuckooFilterBuilder::new()
///     .initial_bytes(1 << 20)
///     .entropy([1, 2, 3, 4, 5, 6, 7, 8])
///     .build()?;
/// assert_eq!(filter.size_in_bytes(), 1 << 20);
/// # Ok::<(), taffycraft::FilterError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TaffyCuckooFilterBuilder {
    bytes: u64,
    entropy: [u64; 8],
}

impl TaffyCuckooFilterBuilder {
    /// Smallest filter with the default keys.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: 1,
            entropy: DEFAULT_ENTROPY,
        }
    }

    /// Approximate starting size in bytes.
    #[must_use]
    pub fn initial_bytes(mut self, bytes: u64) -> Self {
        self.bytes = bytes;
        self
    }

    /// Start large enough to hold `items` hashes without upsizing.
    #[must_use]
    pub fn expected_items(mut self, items: u64) -> Self {
        let slots = (items as f64 / MAX_LOAD).ceil() as u64;
        // side sizes round down to a power of two
        self.bytes = slots
            .saturating_mul(SLOT_BYTES)
            .checked_next_power_of_two()
            .unwrap_or(u64::MAX);
        self
    }

    /// Permutation keys. Filters can only be merged if their keys match.
    #[must_use]
    pub fn entropy(mut self, entropy: [u64; 8]) -> Self {
        self.entropy = entropy;
        self
    }

    /// Allocate the filter.
    ///
    /// # Errors
    ///
    /// - [`crate::FilterError::CapacityExceeded`] if the size is not addressable
    /// - [`crate::FilterError::AllocationFailed`] if the tables cannot be allocated
    pub fn build(self) -> Result<TaffyCuckooFilter> {
        TaffyCuckooFilter::with_entropy(self.bytes, self.entropy)
    }
}

impl Default for TaffyCuckooFilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
