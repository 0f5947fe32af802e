//! Growable cuckoo filter.
//!
//! # Layout
//!
//! Two sides, each an array of `2^log_side_size` buckets of four 16-bit slots
//! plus a small stash. A hash maps to one bucket per side through that side's
//! Feistel permutation (see [`crate::hash::split`]). Each slot keeps a 10-bit
//! fingerprint and a tail of up to five further hash bits.
//!
//! # Insert
//!
//! Place the entry in its side-0 bucket if a slot is free. Otherwise evict a
//! random slot, move the victim to its bucket on the other side, and repeat up
//! to [`MAX_DISPLACEMENTS`] times. An entry still homeless after that goes to
//! the stash, so nothing is ever dropped.
//!
//! # Growth
//!
//! Before an insert the filter upsizes if it is more than 90% full or its
//! stashes hold more than [`MAX_STASH`] entries. An upsize doubles both sides:
//! each stored entry is turned back into its hash prefix by inverting the
//! permutation, extended by the first bit of its tail, and reinserted. Entries
//! whose tail is empty are inserted twice, once for each value of the missing
//! bit. The original hashes are never needed.
//!
//! # Examples
//!
//! ```
//! use taffycraft::filters::TaffyCuckooFilter;
//!
//! let mut filter = TaffyCuckooFilter::new(1)?;
//! for h in 1..=5_000u64 {
//!     filter.add_hash(h.wrapping_mul(0x9e37_79b9_7f4a_7c15))?;
//! }
//! assert!(filter.generation() > 0);
//! assert!(filter.find_hash(0x9e37_79b9_7f4a_7c15));
//!
//! let frozen = filter.freeze()?;
//! assert!(frozen.find_hash(0x9e37_79b9_7f4a_7c15));
//! # Ok::<(), taffycraft::FilterError>(())
//! ```

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::frozen::FrozenTaffyCuckooFilter;
use crate::core::filter::{Filter, Growable, MutableFilter};
use crate::core::params::cuckoo_log_side_size;
use crate::error::{FilterError, Result};
use crate::hash::split::{
    from_path_no_tail, to_path, widen, widen_cuckoo_hash32, Path, Slot, MAX_LOG_SIDE_SIZE,
};
use crate::hash::{Feistel, SlicedPcg};
use crate::util::alloc::{try_clone_slice, try_filled_vec};

/// Slots per bucket.
pub const SLOTS_PER_BUCKET: usize = 4;

/// Evictions tried before an entry goes to the stash.
pub const MAX_DISPLACEMENTS: u32 = 500;

/// Stashed entries, over both sides, that force an upsize.
pub const MAX_STASH: usize = 8;

/// Occupancy, as a fraction of all slots, that forces an upsize.
pub const MAX_LOAD: f64 = 0.9;

/// Permutation keys used when none are given: four per side.
pub const DEFAULT_ENTROPY: [u64; 8] = [
    0x2ba7_538e_e123_4073,
    0xfcc3_7775_39b1_47d6,
    0x6086_c563_5763_47e7,
    0x52ef_f34e_e176_4465,
    0x8639_cbf5_7f26_4867,
    0x5a31_ee34_f022_4ccb,
    0x07a1_cb81_4074_4ee6,
    0xf229_6cf6_a652_4e9f,
];

pub(crate) type Bucket = [Slot; SLOTS_PER_BUCKET];

/// Outcome of offering an entry to one bucket.
enum Placement {
    Stored,
    AlreadyPresent,
    Evicted(Path),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub(crate) struct Side {
    pub(crate) feistel: Feistel,
    pub(crate) buckets: Vec<Bucket>,
    pub(crate) stash: Vec<Path>,
}

impl Side {
    fn new(log_side_size: u32, feistel: Feistel) -> Result<Self> {
        let len = 1usize
            .checked_shl(log_side_size)
            .ok_or_else(|| FilterError::allocation_failed(usize::MAX))?;
        Ok(Self {
            feistel,
            buckets: try_filled_vec(len)?,
            stash: Vec::new(),
        })
    }

    fn place(&mut self, p: Path, rng: &mut SlicedPcg) -> Placement {
        let bucket = &mut self.buckets[p.bucket as usize];
        for slot in bucket.iter_mut() {
            if slot.is_empty() {
                *slot = p.slot;
                return Placement::Stored;
            }
            if slot.matches(p.slot) {
                return Placement::AlreadyPresent;
            }
        }
        let i = rng.next_draw() as usize;
        let victim = Path {
            bucket: p.bucket,
            slot: bucket[i],
        };
        bucket[i] = p.slot;
        Placement::Evicted(victim)
    }

    fn find(&self, p: Path) -> bool {
        self.stash
            .iter()
            .any(|s| s.bucket == p.bucket && s.slot.matches(p.slot))
            || self.buckets[p.bucket as usize]
                .iter()
                .any(|s| s.matches(p.slot))
    }

    /// Every stored entry, stash first.
    fn entries(&self) -> impl Iterator<Item = Path> + '_ {
        self.stash.iter().copied().chain(
            self.buckets
                .iter()
                .enumerate()
                .flat_map(|(i, bucket)| {
                    bucket.iter().filter(|s| !s.is_empty()).map(move |&slot| Path {
                        bucket: i as u64,
                        slot,
                    })
                }),
        )
    }

    fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            feistel: self.feistel,
            buckets: try_clone_slice(&self.buckets)?,
            stash: try_clone_slice(&self.stash)?,
        })
    }
}

/// Cuckoo filter that grows in place.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "TaffyCuckooRepr")
)]
pub struct TaffyCuckooFilter {
    sides: [Side; 2],
    log_side_size: u32,
    rng: SlicedPcg,
    entropy: [u64; 8],
    occupied: u64,
    generation: u32,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct TaffyCuckooRepr {
    sides: [Side; 2],
    log_side_size: u32,
    rng: SlicedPcg,
    entropy: [u64; 8],
    occupied: u64,
    generation: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<TaffyCuckooRepr> for TaffyCuckooFilter {
    type Error = FilterError;

    fn try_from(repr: TaffyCuckooRepr) -> Result<Self> {
        let log = repr.log_side_size;
        if log == 0 || log > MAX_LOG_SIDE_SIZE {
            return Err(FilterError::serialization_error(format!(
                "taffy cuckoo filter with log side size {}",
                log
            )));
        }
        let side_len = 1u64 << log;
        let keys = [
            Feistel::new([repr.entropy[0], repr.entropy[1], repr.entropy[2], repr.entropy[3]]),
            Feistel::new([repr.entropy[4], repr.entropy[5], repr.entropy[6], repr.entropy[7]]),
        ];
        for (side, feistel) in repr.sides.iter().zip(&keys) {
            if side.buckets.len() as u64 != side_len {
                return Err(FilterError::serialization_error(format!(
                    "taffy cuckoo side with {} buckets, expected {}",
                    side.buckets.len(),
                    side_len
                )));
            }
            if side
                .stash
                .iter()
                .any(|p| p.bucket >= side_len || p.slot.is_empty())
            {
                return Err(FilterError::serialization_error(
                    "taffy cuckoo stash entry is empty or outside its side",
                ));
            }
            if side.feistel != *feistel {
                return Err(FilterError::serialization_error(
                    "taffy cuckoo permutation does not match its entropy",
                ));
            }
        }
        if repr.rng.bit_width() != SLOTS_PER_BUCKET.trailing_zeros() {
            return Err(FilterError::serialization_error(format!(
                "taffy cuckoo victim draws of {} bits",
                repr.rng.bit_width()
            )));
        }
        Ok(Self {
            sides: repr.sides,
            log_side_size: log,
            rng: repr.rng,
            entropy: repr.entropy,
            occupied: repr.occupied,
            generation: repr.generation,
        })
    }
}

impl TaffyCuckooFilter {
    /// Filter starting at roughly `bytes` bytes (at least two buckets per side).
    ///
    /// # Errors
    ///
    /// - [`FilterError::CapacityExceeded`] if `bytes` implies more buckets than a
    ///   64-bit hash can address
    /// - [`FilterError::AllocationFailed`] if the tables cannot be allocated
    pub fn new(bytes: u64) -> Result<Self> {
        Self::with_entropy(bytes, DEFAULT_ENTROPY)
    }

    /// As [`TaffyCuckooFilter::new`] with caller-chosen permutation keys.
    ///
    /// Only filters built with the same keys can be merged with
    /// [`TaffyCuckooFilter::union`].
    ///
    /// # Errors
    ///
    /// As for [`TaffyCuckooFilter::new`].
    pub fn with_entropy(bytes: u64, entropy: [u64; 8]) -> Result<Self> {
        Self::with_log_side_size(cuckoo_log_side_size(bytes), entropy)
    }

    fn with_log_side_size(log_side_size: u32, entropy: [u64; 8]) -> Result<Self> {
        if log_side_size > MAX_LOG_SIDE_SIZE {
            return Err(FilterError::capacity_exceeded(
                u64::from(MAX_LOG_SIDE_SIZE),
                "log side size",
            ));
        }
        let left = Feistel::new([entropy[0], entropy[1], entropy[2], entropy[3]]);
        let right = Feistel::new([entropy[4], entropy[5], entropy[6], entropy[7]]);
        Ok(Self {
            sides: [
                Side::new(log_side_size, left)?,
                Side::new(log_side_size, right)?,
            ],
            log_side_size,
            rng: SlicedPcg::new(SLOTS_PER_BUCKET.trailing_zeros()),
            entropy,
            occupied: 0,
            generation: 0,
        })
    }

    /// Add a hash, growing first if the filter is too full.
    ///
    /// # Errors
    ///
    /// [`FilterError::AllocationFailed`] or [`FilterError::CapacityExceeded`] when
    /// growth is needed and fails. The hash is then not added and the filter is
    /// unchanged.
    pub fn add_hash(&mut self, hash: u64) -> Result<()> {
        while self.needs_upsize() {
            self.upsize()?;
        }
        let p = to_path(hash, &self.sides[0].feistel, self.log_side_size);
        self.insert_path(0, p)
    }

    /// True if `hash` may have been added.
    #[must_use]
    pub fn find_hash(&self, hash: u64) -> bool {
        self.sides
            .iter()
            .any(|side| side.find(to_path(hash, &side.feistel, self.log_side_size)))
    }

    /// Add a 32-bit hash.
    ///
    /// # Errors
    ///
    /// As for [`TaffyCuckooFilter::add_hash`].
    pub fn add_hash32(&mut self, hash: u32) -> Result<()> {
        self.add_hash(widen_cuckoo_hash32(hash))
    }

    /// True if the 32-bit `hash` may have been added.
    #[must_use]
    pub fn find_hash32(&self, hash: u32) -> bool {
        self.find_hash(widen_cuckoo_hash32(hash))
    }

    /// Insert `p` into `side`, displacing entries as needed.
    fn insert_path(&mut self, mut side: usize, mut p: Path) -> Result<()> {
        // a displaced victim must never fail to reach a stash
        for s in &mut self.sides {
            s.stash
                .try_reserve(1)
                .map_err(|_| FilterError::allocation_failed(std::mem::size_of::<Path>()))?;
        }

        let mut ttl = MAX_DISPLACEMENTS;
        loop {
            match self.sides[side].place(p, &mut self.rng) {
                Placement::Stored => {
                    self.occupied += 1;
                    return Ok(());
                }
                // an absorbed victim leaves its slot to the incoming entry
                Placement::AlreadyPresent => return Ok(()),
                Placement::Evicted(victim) => {
                    if ttl == 0 {
                        self.sides[side].stash.push(victim);
                        self.occupied += 1;
                        tracing::debug!(
                            side,
                            stashed = self.stash_len(),
                            log_side_size = self.log_side_size,
                            "cuckoo entry stashed"
                        );
                        return Ok(());
                    }
                    ttl -= 1;
                    let other = 1 - side;
                    let prefix =
                        from_path_no_tail(victim, &self.sides[side].feistel, self.log_side_size);
                    p = to_path(prefix, &self.sides[other].feistel, self.log_side_size);
                    p.slot = p.slot.with_tail(victim.slot.tail());
                    side = other;
                }
            }
        }
    }

    /// Reinsert an entry of a filter with `from_log` buckets per side into `side`.
    fn insert_widened(
        &mut self,
        side: usize,
        p: Path,
        from: &Feistel,
        from_log: u32,
    ) -> Result<()> {
        for (prefix, tail) in widen(p, from, from_log, self.log_side_size) {
            let mut q = to_path(prefix, &self.sides[side].feistel, self.log_side_size);
            q.slot = q.slot.with_tail(tail);
            self.insert_path(side, q)?;
        }
        Ok(())
    }

    fn needs_upsize(&self) -> bool {
        let capacity = self.capacity();
        self.occupied as f64 > MAX_LOAD * capacity as f64
            || self.occupied + SLOTS_PER_BUCKET as u64 >= capacity
            || self.stash_len() > MAX_STASH
    }

    /// Double both sides and move every entry.
    ///
    /// The new tables are filled completely before they replace the old ones.
    ///
    /// # Errors
    ///
    /// - [`FilterError::CapacityExceeded`] past the addressable size
    /// - [`FilterError::AllocationFailed`] if the new tables cannot be allocated
    pub fn upsize(&mut self) -> Result<()> {
        let mut next = Self::with_log_side_size(self.log_side_size + 1, self.entropy)?;
        next.rng = self.rng.clone();
        next.generation = self.generation + 1;

        for (s, side) in self.sides.iter().enumerate() {
            for p in side.entries() {
                next.insert_widened(s, p, &side.feistel, self.log_side_size)?;
            }
        }

        tracing::debug!(
            generation = next.generation,
            log_side_size = next.log_side_size,
            occupied = next.occupied,
            stashed = next.stash_len(),
            "upsized taffy cuckoo filter"
        );
        *self = next;
        Ok(())
    }

    /// Merge two filters into a new one that finds every hash either finds.
    ///
    /// The filters may differ in size; entries of the smaller one are widened
    /// with their tail bits.
    ///
    /// # Errors
    ///
    /// - [`FilterError::IncompatibleFilters`] if the permutation keys differ
    /// - [`FilterError::AllocationFailed`] or [`FilterError::CapacityExceeded`]
    ///   if the result cannot grow
    pub fn union(&self, other: &Self) -> Result<Self> {
        if self.entropy != other.entropy {
            return Err(FilterError::incompatible_filters(
                "taffy cuckoo filters built with different entropy",
            ));
        }
        let (big, small) = if self.log_side_size >= other.log_side_size {
            (self, other)
        } else {
            (other, self)
        };

        let mut result = big.try_clone()?;
        for (s, side) in small.sides.iter().enumerate() {
            for p in side.entries() {
                while result.needs_upsize() {
                    result.upsize()?;
                }
                result.insert_widened(s, p, &side.feistel, small.log_side_size)?;
            }
        }
        Ok(result)
    }

    /// Immutable, packed copy for lookups. This filter is left untouched.
    ///
    /// # Errors
    ///
    /// [`FilterError::AllocationFailed`].
    pub fn freeze(&self) -> Result<FrozenTaffyCuckooFilter> {
        FrozenTaffyCuckooFilter::from_sides(&self.sides, self.log_side_size)
    }

    /// Deep copy that reports allocation failure.
    ///
    /// # Errors
    ///
    /// [`FilterError::AllocationFailed`].
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            sides: [self.sides[0].try_clone()?, self.sides[1].try_clone()?],
            log_side_size: self.log_side_size,
            rng: self.rng.clone(),
            entropy: self.entropy,
            occupied: self.occupied,
            generation: self.generation,
        })
    }

    /// Occupied slots, stash included.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.occupied
    }

    /// True before the first insert.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Slots over both sides.
    #[must_use]
    pub fn capacity(&self) -> u64 {
        2 * SLOTS_PER_BUCKET as u64 * (1u64 << self.log_side_size)
    }

    /// Buckets per side, as a power of two.
    #[must_use]
    pub fn log_side_size(&self) -> u32 {
        self.log_side_size
    }

    /// Number of upsizes so far.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Stashed entries over both sides.
    #[must_use]
    pub fn stash_len(&self) -> usize {
        self.sides.iter().map(|s| s.stash.len()).sum()
    }

    /// Permutation keys.
    #[must_use]
    pub fn entropy(&self) -> [u64; 8] {
        self.entropy
    }

    /// Bytes used by buckets and stashes.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.sides
            .iter()
            .map(|s| {
                s.buckets.len() * std::mem::size_of::<Bucket>()
                    + s.stash.len() * std::mem::size_of::<Path>()
            })
            .sum()
    }
}

impl Filter for TaffyCuckooFilter {
    fn find_hash(&self, hash: u64) -> bool {
        TaffyCuckooFilter::find_hash(self, hash)
    }

    fn find_hash32(&self, hash: u32) -> bool {
        TaffyCuckooFilter::find_hash32(self, hash)
    }

    fn size_in_bytes(&self) -> usize {
        TaffyCuckooFilter::size_in_bytes(self)
    }
}

impl MutableFilter for TaffyCuckooFilter {
    fn add_hash(&mut self, hash: u64) -> Result<()> {
        TaffyCuckooFilter::add_hash(self, hash)
    }

    fn add_hash32(&mut self, hash: u32) -> Result<()> {
        TaffyCuckooFilter::add_hash32(self, hash)
    }
}

impl Growable for TaffyCuckooFilter {
    fn upsize(&mut self) -> Result<()> {
        TaffyCuckooFilter::upsize(self)
    }

    fn generation(&self) -> u32 {
        TaffyCuckooFilter::generation(self)
    }
}
