//! An order-parameterized B+ tree map for Rust.
//!
//! This crate provides [`BPlusTreeMap`], an ordered map with a configurable
//! node order, plus [`RangeView`], a bounded mutable window over a contiguous
//! span of its keys:
//!
//! - [`insert`](BPlusTreeMap::insert) / [`remove`](BPlusTreeMap::remove) -
//!   O(log n) updates with split, borrow, and merge rebalancing
//! - [`iter`](BPlusTreeMap::iter) - double-ended in-order iteration
//! - [`sub`](BPlusTreeMap::sub) / [`head`](BPlusTreeMap::head) /
//!   [`tail`](BPlusTreeMap::tail) - half-open range views that support reads,
//!   writes, and further narrowing
//!
//! # Example
//!
//! ```
//! use bplus_tree::BPlusTreeMap;
//!
//! let mut inventory = BPlusTreeMap::new(4);
//! inventory.insert("apples", 12);
//! inventory.insert("bananas", 5);
//! inventory.insert("cherries", 40);
//!
//! assert_eq!(inventory.get(&"bananas"), Some(&5));
//! assert_eq!(inventory.len(), 3);
//!
//! // Entries come back in key order.
//! let names: Vec<&str> = inventory.keys().copied().collect();
//! assert_eq!(names, ["apples", "bananas", "cherries"]);
//!
//! // A view covers the keys in ["apples", "cherries") and rejects the rest.
//! let mut view = inventory.sub("apples", "cherries").unwrap();
//! assert_eq!(view.get(&"bananas"), Some(&5));
//! assert!(view.insert("damsons", 7).is_err());
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Tunable order** - Node capacity is chosen per map, from 3 upward
//! - **Min-key separators** - Each branch key mirrors the smallest key of its
//!   child, so branches and children always pair up one to one
//! - **Cache-efficient** - B+tree structure with contiguous node storage
//!
//! # Implementation
//!
//! All entries live in the leaves; branches hold only separator keys and child
//! handles. Nodes are stored in a free-list arena and addressed by
//! niche-compressed handles, so tree edges are plain indices rather than owning
//! pointers. Range views capture frozen root-to-leaf paths as bounds and hold
//! the map's mutable borrow, which keeps the bounds valid for the view's
//! lifetime.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod raw;

pub mod map;

pub use error::TreeError;
pub use map::{BPlusTreeMap, RangeIter, RangeView};
