//! Behavioral traits shared by every filter.
//!
//! # Guarantees
//!
//! 1. **No false negatives**: after `add_hash(h)` succeeds, `find_hash(h)` returns `true`
//!    for the rest of the filter's life, including across clones, growth, and freezing.
//! 2. **Bounded false positives**: the rate depends on the structure and its sizing.
//! 3. **Side-effect-free lookups**: `find_hash` takes `&self`.
//! 4. **Thread safety**: all implementations are `Send + Sync`. Mutation requires
//!    `&mut self`; share snapshots (clones or frozen filters) behind `Arc` instead of
//!    locking a live filter.
//!
//! # Trait Hierarchy
//!
//! ```text
//! Filter (find_hash, size_in_bytes)
//!     │   StaticFilter, FrozenTaffyCuckooFilter
//!     └── MutableFilter (add_hash)
//!             │   BlockFilter
//!             └── Growable (upsize, generation)
//!                     TaffyBlockFilter, TaffyCuckooFilter
//! ```
//!
//! # Hash Inputs
//!
//! Filters consume 64-bit hashes computed by the caller. The `*_hash32` methods
//! widen a 32-bit hash first, using the layout each filter reads bits from.

use crate::error::Result;

/// Read side of every approximate membership filter.
///
/// # Examples
///
/// ```
/// use taffycraft::core::{Filter, MutableFilter};
/// use taffycraft::filters::BlockFilter;
///
/// fn count_hits<F: Filter>(filter: &F, hashes: &[u64]) -> usize {
///     hashes.iter().filter(|&&h| filter.find_hash(h)).count()
/// }
///
/// let mut filter = BlockFilter::new(1024).unwrap();
/// MutableFilter::add_hash(&mut filter, 7).unwrap();
/// assert_eq!(count_hits(&filter, &[7]), 1);
/// ```
pub trait Filter: Send + Sync {
    /// True if `hash` may have been added; false if it definitely was not.
    #[must_use]
    fn find_hash(&self, hash: u64) -> bool;

    /// [`Filter::find_hash`] for a 32-bit hash.
    #[must_use]
    fn find_hash32(&self, hash: u32) -> bool;

    /// Heap bytes owned by the filter's tables.
    #[must_use]
    fn size_in_bytes(&self) -> usize;
}

/// Filters that accept new members after construction.
pub trait MutableFilter: Filter {
    /// Add a hash.
    ///
    /// # Errors
    ///
    /// Growable filters report allocation failure or a growth limit. The hash is
    /// then not represented and the filter is unchanged.
    fn add_hash(&mut self, hash: u64) -> Result<()>;

    /// [`MutableFilter::add_hash`] for a 32-bit hash.
    ///
    /// # Errors
    ///
    /// As for [`MutableFilter::add_hash`].
    fn add_hash32(&mut self, hash: u32) -> Result<()>;
}

/// Filters that grow in place and keep every earlier membership fact.
pub trait Growable: MutableFilter {
    /// Grow to the next generation now rather than when the load requires it.
    ///
    /// # Errors
    ///
    /// [`crate::FilterError::AllocationFailed`] or
    /// [`crate::FilterError::CapacityExceeded`]; the filter is left as it was.
    fn upsize(&mut self) -> Result<()>;

    /// Number of upsizes performed so far.
    #[must_use]
    fn generation(&self) -> u32;
}
