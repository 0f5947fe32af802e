//! Split block Bloom filter.
//!
//! The filter is an array of 256-bit blocks. A hash picks one block with its
//! upper 32 bits and sets one bit in each of the block's eight 32-bit words with
//! its lower 32 bits, so every operation touches a single cache line.

#![allow(clippy::cast_possible_truncation)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::core::filter::{Filter, MutableFilter};
use crate::core::params::{self, BLOCK_BYTES, MAX_BLOCK_FILTER_BYTES};
use crate::error::{FilterError, Result};
use crate::hash::split::{block_index, block_mask, widen_block_hash32};
use crate::util::alloc::{try_clone_slice, try_filled_vec};

/// Bits per block.
pub const BLOCK_SIZE_BITS: usize = 256;

/// One 256-bit block: eight words, one bit set per word per insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(C, align(32))]
pub struct Block([u32; 8]);

impl Block {
    #[inline]
    fn set(&mut self, mask: &[u32; 8]) {
        for (word, bit) in self.0.iter_mut().zip(mask) {
            *word |= bit;
        }
    }

    #[inline]
    fn contains(&self, mask: &[u32; 8]) -> bool {
        self.0.iter().zip(mask).all(|(word, bit)| word & bit != 0)
    }

    #[inline]
    fn union_with(&mut self, other: &Self) {
        for (word, theirs) in self.0.iter_mut().zip(other.0) {
            *word |= theirs;
        }
    }
}

/// Fixed-size split block Bloom filter.
///
/// # Architecture
///
/// - Filter divided into 256-bit (32-byte) blocks
/// - Upper half of the hash selects the block
/// - Lower half, multiplied by eight odd seeds, selects one bit per word
/// - At most one cache miss per operation
///
/// # Examples
///
/// ```
/// use taffycraft::filters::BlockFilter;
///
/// let bytes = BlockFilter::bytes_needed(100_000, 0.01)?;
/// let mut filter = BlockFilter::new(bytes)?;
///
/// filter.add_hash(0xfeed_f00d);
/// assert!(filter.find_hash(0xfeed_f00d));
/// # Ok::<(), taffycraft::FilterError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "BlockFilterRepr")
)]
pub struct BlockFilter {
    blocks: Vec<Block>,
}

/// Wire form of [`BlockFilter`], checked before use.
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct BlockFilterRepr {
    blocks: Vec<Block>,
}

#[cfg(feature = "serde")]
impl TryFrom<BlockFilterRepr> for BlockFilter {
    type Error = FilterError;

    fn try_from(repr: BlockFilterRepr) -> Result<Self> {
        let len = repr.blocks.len();
        if len == 0 || u32::try_from(len).is_err() {
            return Err(FilterError::serialization_error(format!(
                "block filter with {} blocks",
                len
            )));
        }
        Ok(Self {
            blocks: repr.blocks,
        })
    }
}

impl BlockFilter {
    /// Filter using at most `bytes` bytes, rounded down to whole blocks and up to
    /// at least one block.
    ///
    /// # Errors
    ///
    /// - [`FilterError::InvalidFilterSize`] if `bytes` exceeds [`MAX_BLOCK_FILTER_BYTES`]
    /// - [`FilterError::AllocationFailed`] if the table cannot be allocated
    pub fn new(bytes: u64) -> Result<Self> {
        if bytes > MAX_BLOCK_FILTER_BYTES {
            return Err(FilterError::invalid_filter_size(bytes));
        }
        let num_blocks = (bytes / BLOCK_BYTES).max(1);
        let num_blocks =
            usize::try_from(num_blocks).map_err(|_| FilterError::invalid_filter_size(bytes))?;
        Ok(Self {
            blocks: try_filled_vec(num_blocks)?,
        })
    }

    /// Filter sized for `ndv` distinct hashes at false positive probability `fpp`.
    ///
    /// # Errors
    ///
    /// As for [`BlockFilter::bytes_needed`] and [`BlockFilter::new`].
    pub fn with_ndv_fpp(ndv: u64, fpp: f64) -> Result<Self> {
        Self::new(Self::bytes_needed(ndv, fpp)?)
    }

    /// Minimum bytes for `ndv` distinct hashes at false positive probability `fpp`.
    ///
    /// # Errors
    ///
    /// [`FilterError::FalsePositiveRateOutOfBounds`] if `fpp` is not in `(0, 1)`.
    pub fn bytes_needed(ndv: u64, fpp: f64) -> Result<u64> {
        params::bytes_needed(ndv, fpp)
    }

    /// Expected false positive probability of a `bytes`-byte filter after `ndv` inserts.
    #[must_use]
    pub fn fpp(ndv: u64, bytes: u64) -> f64 {
        params::block_fpp(ndv, bytes)
    }

    /// Most distinct hashes a `bytes`-byte filter holds within `fpp`.
    ///
    /// # Errors
    ///
    /// [`FilterError::FalsePositiveRateOutOfBounds`] if `fpp` is not in `(0, 1)`.
    pub fn capacity(bytes: u64, fpp: f64) -> Result<u64> {
        params::block_capacity(bytes, fpp)
    }

    /// Add a hash. Never fails.
    #[inline]
    pub fn add_hash(&mut self, hash: u64) {
        let idx = block_index(hash, self.num_blocks_u32());
        self.blocks[idx].set(&block_mask(hash));
    }

    /// True if `hash` may have been added.
    #[inline]
    #[must_use]
    pub fn find_hash(&self, hash: u64) -> bool {
        let idx = block_index(hash, self.num_blocks_u32());
        self.blocks[idx].contains(&block_mask(hash))
    }

    /// Add a 32-bit hash.
    #[inline]
    pub fn add_hash32(&mut self, hash: u32) {
        self.add_hash(widen_block_hash32(hash));
    }

    /// True if the 32-bit `hash` may have been added.
    #[inline]
    #[must_use]
    pub fn find_hash32(&self, hash: u32) -> bool {
        self.find_hash(widen_block_hash32(hash))
    }

    /// OR `other` into this filter. Afterwards this filter finds every hash
    /// either one found.
    ///
    /// # Errors
    ///
    /// [`FilterError::IncompatibleFilters`] if the filters differ in size.
    pub fn union_with(&mut self, other: &Self) -> Result<()> {
        if self.blocks.len() != other.blocks.len() {
            return Err(FilterError::incompatible_filters(format!(
                "block filters of {} and {} blocks",
                self.blocks.len(),
                other.blocks.len()
            )));
        }
        for (mine, theirs) in self.blocks.iter_mut().zip(&other.blocks) {
            mine.union_with(theirs);
        }
        Ok(())
    }

    /// Deep copy that reports allocation failure.
    ///
    /// # Errors
    ///
    /// [`FilterError::AllocationFailed`].
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            blocks: try_clone_slice(&self.blocks)?,
        })
    }

    /// Number of blocks.
    #[must_use]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Table size in bytes.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.blocks.len() * std::mem::size_of::<Block>()
    }

    #[inline]
    fn num_blocks_u32(&self) -> u32 {
        // `new` caps the block count at u32::MAX
        self.blocks.len() as u32
    }
}

impl Filter for BlockFilter {
    fn find_hash(&self, hash: u64) -> bool {
        BlockFilter::find_hash(self, hash)
    }

    fn find_hash32(&self, hash: u32) -> bool {
        BlockFilter::find_hash32(self, hash)
    }

    fn size_in_bytes(&self) -> usize {
        BlockFilter::size_in_bytes(self)
    }
}

impl MutableFilter for BlockFilter {
    fn add_hash(&mut self, hash: u64) -> Result<()> {
        BlockFilter::add_hash(self, hash);
        Ok(())
    }

    fn add_hash32(&mut self, hash: u32) -> Result<()> {
        BlockFilter::add_hash32(self, hash);
        Ok(())
    }
}
