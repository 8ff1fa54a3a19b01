//! owned-collections: a linked list, a chained hash map, a red-black tree
//! map, and the sets and insertion-ordered map built on them. All share one
//! position-handle model.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: three independent storage engines, each safe to reason about
//!   on its own, plus thin containers composed from them.
//! - Layers:
//!   - ownership: `OwnerId`, `Position`, `Owned<E>`. Every stored element
//!     is wrapped in an `Owned` that records which container holds it; a
//!     `Position` pairs that owner with a generational slot key.
//!   - engines: `LinkedList<E>` (sentinel-bounded doubly linked list),
//!     `HashMap<K, V, S>` (separate chaining with doubling), and
//!     `TreeMap<K, V, C>` (red-black tree). Each keeps its nodes in a
//!     `slotmap::SlotMap` and links them by slot key.
//!   - composition: `HashSet` and `TreeSet` wrap a map with unit values;
//!     `LinkedHashMap` pairs a `HashMap` with a `LinkedList` of keys.
//!
//! Constraints
//! - Single-threaded: no locks or atomics on the data path. Containers are
//!   `Send`/`Sync` when their keys, values, hasher and comparator are.
//! - No owning pointers between nodes; links are slot keys into the arena.
//! - Positions are `Copy`. A position from another container, or one whose
//!   element was removed, fails with `CollectionError::NotOwned`. Freed
//!   slots bump their generation, so a stale position never aliases a
//!   later element.
//! - Hash tables double when the next new key would exceed
//!   `capacity * load_factor`, and refuse to grow past the configured
//!   maximum (`CollectionError::ResourceExhausted`).
//! - Trees keep the red-black invariants between operations: root and nil
//!   black, no red node with a red child, equal black height on every path.
//!
//! User callbacks
//! - Engines call user code only through `Hash`/`Eq` (hash map) or the
//!   comparator (tree map). Every mutation takes `&mut self`, so a callback
//!   can at most read the container, and only from a lookup.
//! - Each hash entry stores its precomputed `u64` hash and re-indexing
//!   always uses it, so `K: Hash` is never invoked after insertion.
//!
//! Iteration order
//! - `LinkedList`, `LinkedHashMap`: sequence order.
//! - `HashMap`, `HashSet`: bucket order, each chain head to tail.
//! - `TreeMap`, `TreeSet`: ascending by the comparator.
//!
//! Cursors
//! - `LinkedList::cursor_front_mut` and `TreeMap::cursor_first_mut` hold
//!   the container's unique borrow, so nothing else can change the
//!   container while a cursor is live. `remove_current` moves the cursor to
//!   the following element.
//!
//! Persistence
//! - `Persist` writes a container as a big-endian byte stream and rebuilds
//!   it through ordinary insertion; `Record` encodes single payloads.

pub mod compare;
pub mod config;
pub mod error;
pub mod hash_map;
mod hash_map_proptest;
pub mod hash_set;
pub mod linked_hash_map;
pub mod linked_list;
pub mod ownership;
pub mod persist;
pub mod tree_map;
mod tree_map_proptest;
pub mod tree_set;

// Public surface
pub use compare::{Comparator, NaturalOrder, OrderBy, ReverseOrder};
pub use config::HashConfig;
pub use error::{CollectionError, Result};
pub use hash_map::HashMap;
pub use hash_set::HashSet;
pub use linked_hash_map::LinkedHashMap;
pub use linked_list::LinkedList;
pub use ownership::{Owned, OwnerId, Position};
pub use persist::{from_bytes, to_bytes, Persist, Record};
pub use tree_map::TreeMap;
pub use tree_set::TreeSet;
