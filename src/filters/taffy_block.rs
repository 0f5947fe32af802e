//! Growable block filter built from generations of split block Bloom filters.
//!
//! # Algorithm
//!
//! ```text
//! TaffyBlockFilter = [Gen₀, Gen₁, Gen₂, ...]
//!
//! Where:
//!   - Capacity(Genᵢ) = ndv × 2ⁱ
//!   - FPP(Genᵢ)      = fpp × (6/π²) / (i+1)²
//!   - Insert: newest generation only; upsize when its capacity is used up
//!   - Query:  any generation
//! ```
//!
//! Since `Σ 1/(i+1)² = π²/6`, the false positive probability summed over every
//! generation that will ever exist stays within the requested `fpp`. Each upsize
//! doubles capacity, so a filter that grows from `ndv` to `N` items upsizes
//! `log2(N / ndv)` times.
//!
//! Bloom filter bits cannot be moved into a larger table without the hashes that
//! set them, so earlier generations are kept read-only instead of remapped.
//!
//! # Examples
//!
//! ```
//! use taffycraft::filters::TaffyBlockFilter;
//!
//! let mut filter = TaffyBlockFilter::new(100, 0.01)?;
//! for h in 0..10_000u64 {
//!     filter.add_hash(h.wrapping_mul(0x9e37_79b9_7f4a_7c15))?;
//! }
//! assert!(filter.generation() >= 6);
//! assert!(filter.find_hash(0x9e37_79b9_7f4a_7c15));
//! # Ok::<(), taffycraft::FilterError>(())
//! ```

#![allow(clippy::cast_possible_truncation)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::block::BlockFilter;
use crate::core::filter::{Filter, Growable, MutableFilter};
use crate::core::params::{block_capacity, bytes_needed, taffy_generation_fpp, validate_fpp};
use crate::error::{FilterError, Result};
use crate::hash::split::widen_block_hash32;
use crate::util::alloc::try_push;

/// Most generations a filter can reach; the next one's capacity would not fit in 64 bits.
pub const MAX_GENERATIONS: u32 = 64;

/// Block filter that grows by adding generations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "TaffyBlockRepr")
)]
pub struct TaffyBlockFilter {
    /// Oldest first; only the last one is written.
    levels: Vec<BlockFilter>,
    /// Capacity of generation 0.
    base_ndv: u64,
    /// Requested overall false positive probability.
    fpp: f64,
    /// Inserts left before the newest generation is full.
    ttl: u64,
    /// Hashes added, counting repeats.
    count: u64,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct TaffyBlockRepr {
    levels: Vec<BlockFilter>,
    base_ndv: u64,
    fpp: f64,
    ttl: u64,
    count: u64,
}

#[cfg(feature = "serde")]
impl TryFrom<TaffyBlockRepr> for TaffyBlockFilter {
    type Error = FilterError;

    fn try_from(repr: TaffyBlockRepr) -> Result<Self> {
        if repr.levels.is_empty() || repr.levels.len() > MAX_GENERATIONS as usize {
            return Err(FilterError::serialization_error(format!(
                "taffy block filter with {} generations",
                repr.levels.len()
            )));
        }
        if repr.base_ndv == 0 {
            return Err(FilterError::serialization_error(
                "taffy block filter with zero base capacity",
            ));
        }
        validate_fpp(repr.fpp)
            .map_err(|e| FilterError::serialization_error(format!("taffy block filter: {}", e)))?;
        Ok(Self {
            levels: repr.levels,
            base_ndv: repr.base_ndv,
            fpp: repr.fpp,
            ttl: repr.ttl,
            count: repr.count,
        })
    }
}

impl TaffyBlockFilter {
    /// Filter whose first generation holds `ndv` hashes and whose false positive
    /// probability stays within `fpp` however far it grows.
    ///
    /// `ndv = 0` gives the smallest useful first generation.
    ///
    /// # Errors
    ///
    /// - [`FilterError::FalsePositiveRateOutOfBounds`] if `fpp` is not in `(0, 1)`
    /// - [`FilterError::AllocationFailed`] if the first generation cannot be allocated
    pub fn new(ndv: u64, fpp: f64) -> Result<Self> {
        validate_fpp(fpp)?;
        let first_fpp = taffy_generation_fpp(fpp, 0);
        let base_ndv = ndv.max(block_capacity(1, first_fpp)?).max(1);
        let first = BlockFilter::new(bytes_needed(base_ndv, first_fpp)?)?;
        Ok(Self {
            levels: vec![first],
            base_ndv,
            fpp,
            ttl: base_ndv,
            count: 0,
        })
    }

    /// Add a hash, growing first if the newest generation is full.
    ///
    /// # Errors
    ///
    /// [`FilterError::AllocationFailed`] or [`FilterError::CapacityExceeded`] from
    /// the upsize; the hash is not added and the filter is unchanged.
    pub fn add_hash(&mut self, hash: u64) -> Result<()> {
        if self.ttl == 0 {
            self.upsize()?;
        }
        if let Some(newest) = self.levels.last_mut() {
            newest.add_hash(hash);
        }
        self.ttl -= 1;
        self.count += 1;
        Ok(())
    }

    /// True if `hash` may have been added.
    #[must_use]
    pub fn find_hash(&self, hash: u64) -> bool {
        self.levels.iter().rev().any(|level| level.find_hash(hash))
    }

    /// Add a 32-bit hash.
    ///
    /// # Errors
    ///
    /// As for [`TaffyBlockFilter::add_hash`].
    pub fn add_hash32(&mut self, hash: u32) -> Result<()> {
        self.add_hash(widen_block_hash32(hash))
    }

    /// True if the 32-bit `hash` may have been added.
    #[must_use]
    pub fn find_hash32(&self, hash: u32) -> bool {
        self.find_hash(widen_block_hash32(hash))
    }

    /// Start a new generation with twice the previous capacity.
    ///
    /// # Errors
    ///
    /// - [`FilterError::CapacityExceeded`] past [`MAX_GENERATIONS`]
    /// - [`FilterError::AllocationFailed`] if the new generation cannot be allocated
    pub fn upsize(&mut self) -> Result<()> {
        let next = self.levels.len() as u32;
        let ndv = self
            .base_ndv
            .checked_shl(next)
            .filter(|ndv| ndv >> next == self.base_ndv)
            .ok_or_else(|| {
                FilterError::capacity_exceeded(u64::from(MAX_GENERATIONS), "generations")
            })?;
        let bytes = bytes_needed(ndv, taffy_generation_fpp(self.fpp, next))?;
        let level = BlockFilter::new(bytes)?;

        try_push(&mut self.levels, level)?;
        self.ttl = ndv;

        tracing::debug!(
            generation = next,
            capacity = ndv,
            bytes,
            total_bytes = self.size_in_bytes(),
            "upsized taffy block filter"
        );
        Ok(())
    }

    /// Number of upsizes so far.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.levels.len() as u32 - 1
    }

    /// Requested overall false positive probability.
    #[must_use]
    pub fn target_fpp(&self) -> f64 {
        self.fpp
    }

    /// Hashes added so far, counting repeats.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.count
    }

    /// True before the first insert.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Bytes used by all generations.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.levels.iter().map(BlockFilter::size_in_bytes).sum()
    }

    /// Deep copy that reports allocation failure.
    ///
    /// # Errors
    ///
    /// [`FilterError::AllocationFailed`].
    pub fn try_clone(&self) -> Result<Self> {
        let mut levels = Vec::new();
        levels
            .try_reserve_exact(self.levels.len())
            .map_err(|_| FilterError::allocation_failed(self.size_in_bytes()))?;
        for level in &self.levels {
            levels.push(level.try_clone()?);
        }
        Ok(Self {
            levels,
            base_ndv: self.base_ndv,
            fpp: self.fpp,
            ttl: self.ttl,
            count: self.count,
        })
    }
}

impl Filter for TaffyBlockFilter {
    fn find_hash(&self, hash: u64) -> bool {
        TaffyBlockFilter::find_hash(self, hash)
    }

    fn find_hash32(&self, hash: u32) -> bool {
        TaffyBlockFilter::find_hash32(self, hash)
    }

    fn size_in_bytes(&self) -> usize {
        TaffyBlockFilter::size_in_bytes(self)
    }
}

impl MutableFilter for TaffyBlockFilter {
    fn add_hash(&mut self, hash: u64) -> Result<()> {
        TaffyBlockFilter::add_hash(self, hash)
    }

    fn add_hash32(&mut self, hash: u32) -> Result<()> {
        TaffyBlockFilter::add_hash32(self, hash)
    }
}

impl Growable for TaffyBlockFilter {
    fn upsize(&mut self) -> Result<()> {
        TaffyBlockFilter::upsize(self)
    }

    fn generation(&self) -> u32 {
        TaffyBlockFilter::generation(self)
    }
}
