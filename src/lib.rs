#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

/// A HashMap implementation on top of the triangular-probing table.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a key-value map interface with configurable hashers.
pub mod hash_map;

pub mod hash_table;

mod error;

#[cfg(test)]
mod proptests;

pub use error::KeyNotFound;
pub use hash_map::HashMap;
pub use hash_table::HashTable;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// Hasher builder for maps that don't need a specific hasher:
        /// foldhash's randomly seeded fast hasher.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// Hasher builder for maps that don't need a specific hasher: the
        /// standard library's randomly seeded SipHash.
        pub type DefaultHashBuilder = std::hash::RandomState;
    }
}
