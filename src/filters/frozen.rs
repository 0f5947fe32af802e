//! Read-only, packed snapshot of a [`TaffyCuckooFilter`](super::TaffyCuckooFilter).
//!
//! Tails are dropped and each bucket's four fingerprints are packed into five
//! bytes, so the snapshot takes 40 bits per bucket instead of 64. Lookups compare
//! all four fingerprints of a bucket at once.
//!
//! An empty slot packs as fingerprint 0, so a query whose fingerprint is 0 is
//! reported as present on that side. This bounds the false positive rate of an
//! empty snapshot at about 2/1024.

#![allow(clippy::cast_possible_truncation)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::taffy_cuckoo::{Side, SLOTS_PER_BUCKET};
use crate::core::filter::Filter;
use crate::error::Result;
#[cfg(feature = "serde")]
use crate::error::FilterError;
use crate::hash::split::{to_path, widen_cuckoo_hash32, HEAD_BITS};
#[cfg(feature = "serde")]
use crate::hash::split::MAX_LOG_SIDE_SIZE;
use crate::hash::Feistel;
use crate::util::alloc::{try_filled_vec, try_push};
use crate::util::bitops::has_value10;

/// Packed bytes per bucket: four 10-bit fingerprints.
pub const BUCKET_BYTES: usize = SLOTS_PER_BUCKET * HEAD_BITS as usize / 8;

/// Immutable cuckoo filter answering lookups only.
///
/// # Examples
///
/// ```
/// use taffycraft::filters::TaffyCuckooFilter;
///
/// let mut live = TaffyCuckooFilter::new(1024)?;
/// live.add_hash(0x0123_4567_89ab_cdef)?;
///
/// let frozen = live.freeze()?;
/// assert!(frozen.find_hash(0x0123_4567_89ab_cdef));
/// assert!(frozen.size_in_bytes() < live.size_in_bytes());
/// # Ok::<(), taffycraft::FilterError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "FrozenRepr")
)]
pub struct FrozenTaffyCuckooFilter {
    feistels: [Feistel; 2],
    log_side_size: u32,
    /// Side 0 buckets, then side 1 buckets.
    data: Vec<u8>,
    /// Stashed entries per side, as permuted prefixes.
    stashes: [Vec<u64>; 2],
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct FrozenRepr {
    feistels: [Feistel; 2],
    log_side_size: u32,
    data: Vec<u8>,
    stashes: [Vec<u64>; 2],
}

#[cfg(feature = "serde")]
impl TryFrom<FrozenRepr> for FrozenTaffyCuckooFilter {
    type Error = FilterError;

    fn try_from(repr: FrozenRepr) -> Result<Self> {
        if repr.log_side_size == 0 || repr.log_side_size > MAX_LOG_SIDE_SIZE {
            return Err(FilterError::serialization_error(format!(
                "frozen filter with log side size {}",
                repr.log_side_size
            )));
        }
        let expected = (2 * BUCKET_BYTES as u64) << repr.log_side_size;
        if repr.data.len() as u64 != expected {
            return Err(FilterError::serialization_error(format!(
                "frozen filter with {} data bytes, expected {}",
                repr.data.len(),
                expected
            )));
        }
        Ok(Self {
            feistels: repr.feistels,
            log_side_size: repr.log_side_size,
            data: repr.data,
            stashes: repr.stashes,
        })
    }
}

impl FrozenTaffyCuckooFilter {
    pub(crate) fn from_sides(sides: &[Side; 2], log_side_size: u32) -> Result<Self> {
        let side_buckets = sides[0].buckets.len();
        let mut data = try_filled_vec::<u8>(2 * side_buckets * BUCKET_BYTES)?;
        let mut stashes = [Vec::new(), Vec::new()];

        for (s, side) in sides.iter().enumerate() {
            for (i, bucket) in side.buckets.iter().enumerate() {
                let mut word = 0u64;
                for (j, slot) in bucket.iter().enumerate() {
                    if !slot.is_empty() {
                        word |= u64::from(slot.fingerprint()) << (HEAD_BITS as usize * j);
                    }
                }
                let offset = (s * side_buckets + i) * BUCKET_BYTES;
                data[offset..offset + BUCKET_BYTES]
                    .copy_from_slice(&word.to_le_bytes()[..BUCKET_BYTES]);
            }
            for p in &side.stash {
                try_push(&mut stashes[s], p.permuted())?;
            }
        }

        tracing::debug!(
            log_side_size,
            bytes = data.len(),
            stashed = stashes[0].len() + stashes[1].len(),
            "froze taffy cuckoo filter"
        );
        Ok(Self {
            feistels: [sides[0].feistel, sides[1].feistel],
            log_side_size,
            data,
            stashes,
        })
    }

    /// True if `hash` may have been in the filter this was frozen from.
    #[must_use]
    pub fn find_hash(&self, hash: u64) -> bool {
        let side_buckets = self.data.len() / (2 * BUCKET_BYTES);
        self.feistels.iter().enumerate().any(|(s, feistel)| {
            let p = to_path(hash, feistel, self.log_side_size);
            if self.stashes[s].contains(&p.permuted()) {
                return true;
            }
            let fp = p.slot.fingerprint();
            if fp == 0 {
                return true;
            }
            let offset = (s * side_buckets + p.bucket as usize) * BUCKET_BYTES;
            let mut word = [0u8; 8];
            word[..BUCKET_BYTES].copy_from_slice(&self.data[offset..offset + BUCKET_BYTES]);
            has_value10(u64::from_le_bytes(word), u64::from(fp))
        })
    }

    /// True if the 32-bit `hash` may have been in the filter.
    #[must_use]
    pub fn find_hash32(&self, hash: u32) -> bool {
        self.find_hash(widen_cuckoo_hash32(hash))
    }

    /// Buckets per side, as a power of two.
    #[must_use]
    pub fn log_side_size(&self) -> u32 {
        self.log_side_size
    }

    /// Bytes used by the packed buckets and stashes.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.data.len()
            + self
                .stashes
                .iter()
                .map(|s| s.len() * std::mem::size_of::<u64>())
                .sum::<usize>()
    }
}

impl Filter for FrozenTaffyCuckooFilter {
    fn find_hash(&self, hash: u64) -> bool {
        FrozenTaffyCuckooFilter::find_hash(self, hash)
    }

    fn find_hash32(&self, hash: u32) -> bool {
        FrozenTaffyCuckooFilter::find_hash32(self, hash)
    }

    fn size_in_bytes(&self) -> usize {
        FrozenTaffyCuckooFilter::size_in_bytes(self)
    }
}
