#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

extern crate alloc;

/// A hash map built on the flat table engine.
///
/// This module provides a `FlatHashMap` that wraps the `FlatHashTable` and
/// provides a standard key-value map interface with configurable hashers.
pub mod map;

/// Slot payloads for the table engine.
///
/// This module defines the `Node` contract shared by map-shaped and
/// set-shaped slots, together with the empty-key sentinel predicate the
/// whole crate is built around.
pub mod node;

/// A hash set built on the flat table engine.
///
/// This module provides a `FlatHashSet` that wraps the `FlatHashTable` and
/// provides a standard set interface with configurable hashers.
pub mod set;

pub mod table;

pub use map::Entry;
pub use map::FlatHashMap;
pub use set::FlatHashSet;
pub use table::FlatHashTable;
