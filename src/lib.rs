//! TaffyCraft: approximate membership filters keyed by 64-bit hashes.
//!
//! An approximate membership query (AMQ) filter answers "was this hash
//! added?" in far less space than the hashes themselves. It can produce:
//! - **False positives**: may report a hash that was never added
//! - **Zero false negatives**: every hash that was added is always found
//!
//! The caller hashes its own items. Filters take the 64-bit hash (or a 32-bit
//! one, widened internally) and never see the items.
//!
//! # Quick Start
//!
//! ```
//! use taffycraft::filters::TaffyCuckooFilter;
//!
//! // Start tiny; the filter grows as hashes arrive
//! let mut filter = TaffyCuckooFilter::new(1)?;
//!
//! for h in 1..=10_000u64 {
//!     filter.add_hash(h.wrapping_mul(0x9e37_79b9_7f4a_7c15))?;
//! }
//!
//! assert!(filter.find_hash(0x9e37_79b9_7f4a_7c15));
//! # Ok::<(), taffycraft::FilterError>(())
//! ```
//!
//! # Using Builders
//!
//! ```
//! use taffycraft::builder::TaffyBlockFilterBuilder;
//!
//! let filter = TaffyBlockFilterBuilder::new()
//!     .expected_items(10_000)
//!     .false_positive_rate(0.01)
//!     .build()
//!     .unwrap();
//! assert!(filter.is_empty());
//! ```
//!
//! # Choosing a Filter
//!
//! | Filter | Best For | Grows | Memory |
//! |--------|----------|-------|--------|
//! | [`BlockFilter`] | Known size, fastest lookups | No | Optimal for blocked Bloom |
//! | [`StaticFilter`] | Keys known up front | No | ~1.23 bytes per key |
//! | [`TaffyBlockFilter`] | Unknown size | By generations | Sum of generations |
//! | [`TaffyCuckooFilter`] | Unknown size, mergeable | In place | 16 bits per slot |
//! | [`FrozenTaffyCuckooFilter`] | Read-only snapshot | No | 10 bits per slot |
//!
//! # Traits
//!
//! - [`Filter`] - lookups, implemented by every filter
//! - [`MutableFilter`] - fallible adds
//! - [`Growable`] - explicit growth
//!
//! # Errors
//!
//! Construction and growth allocate fallibly: an allocator refusal is returned
//! as [`FilterError::AllocationFailed`] instead of aborting, and the filter is
//! left as it was.
//!
//! # Features
//!
//! - `serde` - `Serialize`/`Deserialize` for every filter
//! - `rayon` - parallel edge hashing when building a [`StaticFilter`]
//!
//! # Logging
//!
//! Structural events (upsizes, stash overflows, static build retries, freezes)
//! are emitted through [`tracing`] at `debug` and `trace` level.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::manual_range_contains)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc(html_root_url = "https://docs.rs/taffycraft/0.1.0")]

/// Filter traits and sizing math
pub mod core;

/// Error types and result aliases
pub mod error;

/// Filter implementations
pub mod filters;

/// Hash splitting, permutations, and victim selection
pub mod hash;

/// Utility functions and helpers
pub mod util;

/// Type-safe builders
pub mod builder;

// Re-export commonly used types at crate root
pub use error::{FilterError, Result};

// Re-export core traits
pub use core::filter::{Filter, Growable, MutableFilter};

// Re-export all filter types at the crate root
pub use filters::{
    BlockFilter, FrozenTaffyCuckooFilter, StaticFilter, TaffyBlockFilter, TaffyCuckooFilter,
};

// Re-export builders at the crate root
pub use builder::{BlockFilterBuilder, TaffyBlockFilterBuilder, TaffyCuckooFilterBuilder};

/// Prelude module for convenient imports.
///
/// # Examples
///
/// ```
/// use taffycraft::prelude::*;
///
/// let mut filter = BlockFilter::new(1024)?;
/// filter.add_hash(42);
/// assert!(filter.find_hash(42));
/// # Ok::<(), FilterError>(())
/// ```
pub mod prelude {
    pub use crate::builder::{BlockFilterBuilder, TaffyBlockFilterBuilder, TaffyCuckooFilterBuilder};
    pub use crate::core::filter::{Filter, Growable, MutableFilter};
    pub use crate::error::{FilterError, Result};
    pub use crate::filters::{
        BlockFilter, FrozenTaffyCuckooFilter, StaticFilter, TaffyBlockFilter, TaffyCuckooFilter,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let mut filter = TaffyCuckooFilter::new(1).unwrap();
        filter.add_hash(0x5555_aaaa_5555_aaaa).unwrap();
        assert!(filter.find_hash(0x5555_aaaa_5555_aaaa));
    }

    #[test]
    fn test_trait_usage() {
        fn fill<F: MutableFilter>(filter: &mut F) {
            for h in 0..100u64 {
                filter.add_hash(h.wrapping_mul(0xc2b2_ae3d_27d4_eb4f)).unwrap();
            }
            assert!((0..100u64).all(|h| filter.find_hash(h.wrapping_mul(0xc2b2_ae3d_27d4_eb4f))));
        }

        fill(&mut BlockFilter::new(4096).unwrap());
        fill(&mut TaffyBlockFilter::new(10, 0.01).unwrap());
        fill(&mut TaffyCuckooFilter::new(1).unwrap());
    }

    #[test]
    fn test_filters_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BlockFilter>();
        assert_send_sync::<StaticFilter>();
        assert_send_sync::<TaffyBlockFilter>();
        assert_send_sync::<TaffyCuckooFilter>();
        assert_send_sync::<FrozenTaffyCuckooFilter>();
    }

    #[test]
    fn test_dyn_filter() {
        let keys: Vec<u64> = (1..=500u64).map(|k| k.wrapping_mul(0x9e37_79b9_7f4a_7c15)).collect();
        let mut live = TaffyCuckooFilter::new(1).unwrap();
        for &k in &keys {
            live.add_hash(k).unwrap();
        }
        let mut filters: Vec<Box<dyn Filter>> = Vec::new();
        filters.push(Box::new(StaticFilter::new(&keys).unwrap()));
        filters.push(Box::new(live.freeze().unwrap()));
        for filter in &filters {
            assert!(keys.iter().all(|&k| filter.find_hash(k)));
            assert!(filter.size_in_bytes() > 0);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialization() {
        let mut filter = TaffyCuckooFilter::new(1).unwrap();
        filter.add_hash(0x1234_5678_9abc_def0).unwrap();

        let bytes = bincode::serialize(&filter).unwrap();
        let restored: TaffyCuckooFilter = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, filter);
        assert!(restored.find_hash(0x1234_5678_9abc_def0));
    }
}
