//! Fixed-capacity collections which never allocate after construction.
//!
//! [`SlotTable`] is an open-addressing hash table; [`Deque`] threads a doubly-linked list through a [`SlotTable`]'s
//! slots, giving insertion-ordered access at both ends alongside lookup and removal by key.

mod deque;
pub use deque::*;

mod error;
pub use error::*;

mod node;
pub use node::*;

mod slot_table;
pub use slot_table::*;

mod strategy;
pub use strategy::*;

/// Identifies an element of a collection. Keys must be unique within a collection.
pub type Key = u32;
