//! Static XOR filter built once from a complete key set.
//!
//! Each key is an edge of a 3-uniform hypergraph over a table of 8-bit slots.
//! The three vertices lie in a window of about `m^(2/3)` slots starting at a
//! hash-derived offset, which keeps lookups local and makes peeling succeed at
//! 1.23 slots per key. Construction peels the hypergraph (repeatedly removing an
//! edge that is the only one touching some vertex) and then assigns slots in
//! reverse peel order so that
//!
//! ```text
//! fingerprint(h) ^ T[v0] ^ T[v1] ^ T[v2] == 0
//! ```
//!
//! holds for every key. A lookup recomputes the edge and checks the equation,
//! giving a false positive rate of about 2^-8 at 9.84 bits per key.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

#[cfg(feature = "rayon")]
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::core::filter::Filter;
use crate::error::{FilterError, Result};
use crate::hash::split::widen_block_hash32;
use crate::util::alloc::{try_clone_slice, try_filled_vec};
use crate::util::bitops::fast_range64;

/// Table slots allocated per distinct key.
pub const SLOTS_PER_KEY: f64 = 1.23;

/// Number of table sizes tried before construction gives up.
pub const MAX_CONSTRUCTION_ATTEMPTS: usize = 64;

/// Slots added to the table after a failed peel.
const SIZE_STEP: usize = 8;

const DIGIT_KEY: u64 = 0x9e37_79b9_7f4a_7c15;

/// Bijective 64-bit finalizer.
#[inline]
const fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Hash actually encoded for `hash` under `seed`.
#[inline]
const fn seeded(hash: u64, seed: u64) -> u64 {
    if seed == 0 {
        hash
    } else {
        mix64(hash ^ seed)
    }
}

fn window_size(m: u64) -> u64 {
    (3 + (m as f64).powf(2.0 / 3.0) as u64).min(m)
}

/// The three table slots and the fingerprint of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Edge {
    vertices: [usize; 3],
    fingerprint: u8,
}

impl Edge {
    #[inline]
    fn new(hash: u64, m: u64, window: u64) -> Self {
        let h = mix64(hash);
        let start = fast_range64(h, m - window);
        let mut digits = mix64(h ^ DIGIT_KEY);
        let mut vertices = [0usize; 3];
        for j in 0..3 {
            let mut v = fast_range64(digits, window);
            while vertices[..j].contains(&((v + start) as usize)) {
                v += 1;
                if v == window {
                    v = 0;
                }
            }
            vertices[j] = (v + start) as usize;
            digits = digits.rotate_left(21);
        }
        Self {
            vertices,
            fingerprint: h as u8,
        }
    }

    #[inline]
    fn check(&self, table: &[u8]) -> bool {
        let [a, b, c] = self.vertices;
        self.fingerprint ^ table[a] ^ table[b] ^ table[c] == 0
    }
}

/// Immutable filter over a fixed set of hashes.
///
/// # Examples
///
/// ```
/// use taffycraft::filters::StaticFilter;
///
/// let keys: Vec<u64> = (0..1000u64).map(|i| i.wrapping_mul(0x9e37_79b9_7f4a_7c15)).collect();
/// let filter = StaticFilter::new(&keys)?;
/// assert!(keys.iter().all(|&k| filter.find_hash(k)));
/// # Ok::<(), taffycraft::FilterError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "StaticFilterRepr")
)]
pub struct StaticFilter {
    table: Vec<u8>,
    window: u64,
    seed: u64,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct StaticFilterRepr {
    table: Vec<u8>,
    window: u64,
    seed: u64,
}

#[cfg(feature = "serde")]
impl TryFrom<StaticFilterRepr> for StaticFilter {
    type Error = FilterError;

    fn try_from(repr: StaticFilterRepr) -> Result<Self> {
        let slots = repr.table.len();
        // an edge needs three distinct slots inside the window
        if slots < SIZE_STEP || repr.window < 3 || repr.window > slots as u64 {
            return Err(FilterError::serialization_error(format!(
                "static filter with {} slots and window {}",
                slots, repr.window
            )));
        }
        Ok(Self {
            table: repr.table,
            window: repr.window,
            seed: repr.seed,
        })
    }
}

impl StaticFilter {
    /// Encode `hashes`. Duplicates are ignored.
    ///
    /// # Errors
    ///
    /// - [`FilterError::InvalidItemCount`] if `hashes` is empty
    /// - [`FilterError::ConstructionFailed`] if no table size peeled; retry with
    ///   [`StaticFilter::with_seed`]
    /// - [`FilterError::AllocationFailed`] if a table cannot be allocated
    pub fn new(hashes: &[u64]) -> Result<Self> {
        Self::with_seed(hashes, 0)
    }

    /// Encode `hashes` after mixing `seed` into each of them.
    ///
    /// The mixing is a bijection, so distinct hashes stay distinct; a different
    /// seed gives an independent hypergraph. Seed 0 uses the hashes unchanged.
    ///
    /// # Errors
    ///
    /// As for [`StaticFilter::new`].
    pub fn with_seed(hashes: &[u64], seed: u64) -> Result<Self> {
        if hashes.is_empty() {
            return Err(FilterError::invalid_item_count(0));
        }

        let mut keys = try_clone_slice(hashes)?;
        for key in &mut keys {
            *key = seeded(*key, seed);
        }
        keys.sort_unstable();
        keys.dedup();

        let n = keys.len();
        let mut size = initial_size(n);
        for attempt in 1..=MAX_CONSTRUCTION_ATTEMPTS {
            let window = window_size(size as u64);
            if let Some(table) = encode(&keys, size, window)? {
                tracing::debug!(
                    keys = n,
                    slots = size,
                    attempts = attempt,
                    "built static filter"
                );
                return Ok(Self {
                    table,
                    window,
                    seed,
                });
            }
            tracing::trace!(keys = n, slots = size, attempt, "static filter peel failed");
            size += SIZE_STEP;
        }
        Err(FilterError::construction_failed(
            n,
            MAX_CONSTRUCTION_ATTEMPTS,
        ))
    }

    /// True if `hash` may be in the key set; always true for members.
    #[inline]
    #[must_use]
    pub fn find_hash(&self, hash: u64) -> bool {
        Edge::new(seeded(hash, self.seed), self.table.len() as u64, self.window)
            .check(&self.table)
    }

    /// [`StaticFilter::find_hash`] for a 32-bit hash.
    ///
    /// Build the filter from widened hashes (see
    /// [`crate::hash::split::widen_block_hash32`]) to use this.
    #[inline]
    #[must_use]
    pub fn find_hash32(&self, hash: u32) -> bool {
        self.find_hash(widen_block_hash32(hash))
    }

    /// Deep copy that reports allocation failure.
    ///
    /// # Errors
    ///
    /// [`FilterError::AllocationFailed`].
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self {
            table: try_clone_slice(&self.table)?,
            window: self.window,
            seed: self.seed,
        })
    }

    /// Number of table slots.
    #[must_use]
    pub fn slots(&self) -> usize {
        self.table.len()
    }

    /// Seed mixed into every hash.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Table size in bytes.
    #[must_use]
    pub fn size_in_bytes(&self) -> usize {
        self.table.len()
    }
}

impl Filter for StaticFilter {
    fn find_hash(&self, hash: u64) -> bool {
        StaticFilter::find_hash(self, hash)
    }

    fn find_hash32(&self, hash: u32) -> bool {
        StaticFilter::find_hash32(self, hash)
    }

    fn size_in_bytes(&self) -> usize {
        StaticFilter::size_in_bytes(self)
    }
}

fn initial_size(n: usize) -> usize {
    let size = (n as f64 * SLOTS_PER_KEY) as usize;
    size.div_ceil(SIZE_STEP).max(1) * SIZE_STEP
}

/// Peel the hypergraph of `keys` over `size` slots and assign the table.
///
/// Returns `None` if some edges could not be peeled.
fn encode(keys: &[u64], size: usize, window: u64) -> Result<Option<Vec<u8>>> {
    let m = size as u64;
    let mut edges = Vec::new();
    edges
        .try_reserve_exact(keys.len())
        .map_err(|_| FilterError::allocation_failed(keys.len() * std::mem::size_of::<Edge>()))?;
    #[cfg(feature = "rayon")]
    edges.par_extend(keys.par_iter().map(|&k| Edge::new(k, m, window)));
    #[cfg(not(feature = "rayon"))]
    edges.extend(keys.iter().map(|&k| Edge::new(k, m, window)));

    let order = match peel(&edges, size)? {
        Some(order) => order,
        None => return Ok(None),
    };

    let mut table: Vec<u8> = try_filled_vec(size)?;
    for &(edge, vertex) in order.iter().rev() {
        let e = &edges[edge];
        let mut value = e.fingerprint;
        for &v in &e.vertices {
            if v != vertex {
                value ^= table[v];
            }
        }
        table[vertex] = value;
    }
    Ok(Some(table))
}

/// Peel order as (edge, vertex it was peeled from), or `None` if a core remains.
fn peel(edges: &[Edge], size: usize) -> Result<Option<Vec<(usize, usize)>>> {
    let mut degree: Vec<u32> = try_filled_vec(size)?;
    let mut edge_xor: Vec<usize> = try_filled_vec(size)?;
    for (i, e) in edges.iter().enumerate() {
        for &v in &e.vertices {
            degree[v] += 1;
            edge_xor[v] ^= i;
        }
    }

    let mut stack: Vec<usize> = (0..size).filter(|&v| degree[v] == 1).collect();
    let mut order = Vec::new();
    order
        .try_reserve_exact(edges.len())
        .map_err(|_| FilterError::allocation_failed(edges.len() * 16))?;

    while let Some(vertex) = stack.pop() {
        if degree[vertex] != 1 {
            continue;
        }
        let edge = edge_xor[vertex];
        order.push((edge, vertex));
        for &v in &edges[edge].vertices {
            degree[v] -= 1;
            edge_xor[v] ^= edge;
            if degree[v] == 1 {
                stack.push(v);
            }
        }
    }

    Ok((order.len() == edges.len()).then_some(order))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_keys(n: usize, seed: u64) -> Vec<u64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen()).collect()
    }

    #[test]
    fn test_edges_have_distinct_vertices() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for m in [8u64, 16, 100, 10_000] {
            let window = window_size(m);
            for _ in 0..1000 {
                let e = Edge::new(rng.gen(), m, window);
                let [a, b, c] = e.vertices;
                assert!(a != b && b != c && a != c);
                assert!(e.vertices.iter().all(|&v| (v as u64) < m));
            }
        }
    }

    #[test]
    fn test_single_key() {
        let filter = StaticFilter::new(&[42]).unwrap();
        assert!(filter.find_hash(42));
        assert_eq!(filter.slots(), 8);
    }

    #[test]
    fn test_no_false_negatives() {
        let keys = random_keys(50_000, 2);
        let filter = StaticFilter::new(&keys).unwrap();
        assert!(keys.iter().all(|&k| filter.find_hash(k)));
    }

    #[test]
    fn test_false_positive_rate() {
        let keys = random_keys(20_000, 3);
        let filter = StaticFilter::new(&keys).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let trials = 200_000;
        let hits = (0..trials).filter(|_| filter.find_hash(rng.gen())).count();
        let rate = hits as f64 / trials as f64;
        assert!(rate < 0.006, "false positive rate {}", rate);
    }

    #[test]
    fn test_space() {
        let keys = random_keys(10_000, 5);
        let filter = StaticFilter::new(&keys).unwrap();
        let bits_per_key = filter.size_in_bytes() as f64 * 8.0 / keys.len() as f64;
        assert!(bits_per_key < 10.5, "{} bits per key", bits_per_key);
    }

    #[test]
    fn test_empty_key_set_rejected() {
        assert_eq!(
            StaticFilter::new(&[]),
            Err(FilterError::InvalidItemCount { count: 0 })
        );
    }

    #[test]
    fn test_duplicates_ignored() {
        let mut keys = random_keys(1000, 6);
        keys.extend_from_slice(&keys.clone());
        let filter = StaticFilter::new(&keys).unwrap();
        assert!(keys.iter().all(|&k| filter.find_hash(k)));
        assert!(filter.slots() < initial_size(2000));
    }

    #[test]
    fn test_seeded_construction() {
        let keys = random_keys(5000, 7);
        let plain = StaticFilter::new(&keys).unwrap();
        let seeded = StaticFilter::with_seed(&keys, 0xdead_beef).unwrap();
        assert_eq!(seeded.seed(), 0xdead_beef);
        assert!(keys.iter().all(|&k| seeded.find_hash(k)));
        assert_ne!(plain, seeded);
    }

    #[test]
    fn test_clone() {
        let keys = random_keys(100, 8);
        let filter = StaticFilter::new(&keys).unwrap();
        let copy = filter.try_clone().unwrap();
        drop(filter);
        assert!(keys.iter().all(|&k| copy.find_hash(k)));
    }

    #[test]
    fn test_hash32() {
        let keys: Vec<u64> = (0..100u32).map(widen_block_hash32).collect();
        let filter = StaticFilter::new(&keys).unwrap();
        assert!((0..100u32).all(|k| filter.find_hash32(k)));
    }
}
