//! Filter implementations.
//!
//! # Available Filters
//!
//! - [`BlockFilter`] - Fixed-size split block Bloom filter, one cache line per operation
//! - [`StaticFilter`] - Immutable filter built once from a complete key set
//! - [`TaffyBlockFilter`] - Block filter that grows by adding generations
//! - [`TaffyCuckooFilter`] - Cuckoo filter that grows in place
//! - [`FrozenTaffyCuckooFilter`] - Packed read-only snapshot of a cuckoo filter
//!
//! # Choosing a Filter
//!
//! | Filter | Use Case | Bits per item at 1% | Operations |
//! |--------|----------|---------------------|------------|
//! | [`BlockFilter`] | Known size | ~10.5 | Add, Find, Union |
//! | [`StaticFilter`] | Keys known up front | ~9.9 | Build, Find |
//! | [`TaffyBlockFilter`] | Unknown size, fastest adds | grows with log(n) | Add, Find, Upsize |
//! | [`TaffyCuckooFilter`] | Unknown size, compact | ~17-35 | Add, Find, Upsize, Union, Freeze |
//! | [`FrozenTaffyCuckooFilter`] | Read-only snapshot | ~11-22 | Find |
//!
//! Every filter is keyed by 64-bit hashes the caller computes; none of them
//! hash items itself. All have no false negatives.

#![allow(clippy::module_name_repetitions)]

pub mod block;
pub mod frozen;
pub mod static_filter;
pub mod taffy_block;
pub mod taffy_cuckoo;

pub use block::BlockFilter;
pub use frozen::FrozenTaffyCuckooFilter;
pub use static_filter::StaticFilter;
pub use taffy_block::TaffyBlockFilter;
pub use taffy_cuckoo::TaffyCuckooFilter;
