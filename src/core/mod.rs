//! Core traits and sizing math.
//!
//! # Module Organization
//!
//! ```text
//! core/
//! ├── filter.rs    - Filter, MutableFilter, Growable
//! ├── params.rs    - False positive model and sizing searches
//! └── mod.rs       - This file (public API)
//! ```
//!
//! # Examples
//!
//! ```
//! use taffycraft::core::params::{block_fpp, bytes_needed};
//!
//! let bytes = bytes_needed(1_000_000, 0.001).unwrap();
//! assert!(block_fpp(1_000_000, bytes) <= 0.001);
//! ```

pub mod filter;
pub mod params;

pub use filter::{Filter, Growable, MutableFilter};
pub use params::{block_capacity, block_fpp, bytes_needed};
