//! A fixed-capacity double-ended queue whose elements are also indexed by key.
//!
//! The queue is a doubly-linked list whose nodes live in the slots of a [`SlotTable`], which buys:
//! - O(1) access to the oldest and newest elements,
//! - O(1) insertion at either end,
//! - O(1) average lookup and removal by key.
//!
//! Order reflects insertion only; reading an element does not move it.

use super::{Error, Key, Node, SlotTable, Strategy};
use core::fmt::{self, Write};

/// Per the General MIDI Level 2 specification, compliant devices "must be capable of supplying polyphony of
/// 32 or more allocated notes simultaneously." Thus, this is the default amount of storage for a [`Deque`].
pub const GM2_SIMUL_NOTE_NUM: usize = 32;

/// The result of inserting a value into a [`Deque`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Insertion<V> {
    /// The key was new and there was room for it.
    Inserted,
    /// The key was already present; its previous value is returned and its position is unchanged.
    Replaced(V),
    /// The key was new but the deque was full, so the element at the opposite end was evicted first.
    Evicted(V),
}

#[derive(Clone, Copy)]
enum End {
    Front,
    Back,
}

/// A double-ended queue with keyed access, stored entirely within a fixed-size [`SlotTable`].
///
/// Keys are derived from values by the [`Strategy`] supplied at construction. Inserting a value whose key is already
/// present replaces the stored value in place. Inserting a new key into a full deque evicts from the opposite end:
/// appending evicts the oldest (front) element, prepending evicts the newest (back) element.
#[derive(Clone)]
pub struct Deque<V, S, const N: usize = GM2_SIMUL_NOTE_NUM> {
    first: Option<Key>,
    last: Option<Key>,
    table: SlotTable<Node<V>, N>,
    strategy: S,
}

impl<V, S: Strategy<V>, const N: usize> Deque<V, S, N> {
    /// Constructs an empty [`Deque`] holding at most `capacity` elements.
    ///
    /// `capacity` may not be zero, nor exceed the static storage `N`.
    pub fn new(capacity: usize, strategy: S) -> Result<Self, Error> {
        Ok(Self {
            first: None,
            last: None,
            table: SlotTable::new(capacity)?,
            strategy,
        })
    }

    /// Number of elements currently held.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Maximum number of elements, fixed at construction.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns `true` if the deque holds no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns `true` if inserting a new key would evict an element.
    pub fn is_full(&self) -> bool {
        self.table.is_full()
    }

    /// The ratio of held elements to capacity.
    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    /// The [`Strategy`] supplied at construction.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Adds `value` to the back of the deque.
    ///
    /// If an element with the same key is present, its value is replaced and it keeps its position. If the deque is
    /// full, the oldest element (the front) is evicted to make room.
    pub fn append_or_replace(&mut self, value: V) -> Insertion<V> {
        let key = self.strategy.key(&value);
        if let Some(node) = self.table.get_mut(key) {
            return Insertion::Replaced(core::mem::replace(&mut node.value, value));
        }

        let evicted = self.insert_unlinked(key, value, End::Front);

        let previous = self.last;
        self.linked_mut(key).previous = previous;
        match previous {
            Some(previous) => self.linked_mut(previous).next = Some(key),
            None => self.first = Some(key),
        }
        self.last = Some(key);

        evicted.map_or(Insertion::Inserted, Insertion::Evicted)
    }

    /// Adds `value` to the front of the deque.
    ///
    /// If an element with the same key is present, its value is replaced and it keeps its position. If the deque is
    /// full, the newest element (the back) is evicted to make room.
    pub fn prepend_or_replace(&mut self, value: V) -> Insertion<V> {
        let key = self.strategy.key(&value);
        if let Some(node) = self.table.get_mut(key) {
            return Insertion::Replaced(core::mem::replace(&mut node.value, value));
        }

        let evicted = self.insert_unlinked(key, value, End::Back);

        let next = self.first;
        self.linked_mut(key).next = next;
        match next {
            Some(next) => self.linked_mut(next).previous = Some(key),
            None => self.last = Some(key),
        }
        self.first = Some(key);

        evicted.map_or(Insertion::Inserted, Insertion::Evicted)
    }

    /// Removes and returns the element at the front of the deque, i.e., the oldest appended element.
    pub fn remove_first(&mut self) -> Option<V> {
        let key = self.first?;
        let value = self.remove_by_key(key);
        assert!(value.is_some(), "front key {key} is missing from the slot table");
        value
    }

    /// Removes and returns the element at the back of the deque, i.e., the newest appended element.
    pub fn remove_last(&mut self) -> Option<V> {
        let key = self.last?;
        let value = self.remove_by_key(key);
        assert!(value.is_some(), "back key {key} is missing from the slot table");
        value
    }

    /// Removes and returns the element stored under `key`, joining its neighbours to one another.
    pub fn remove_by_key(&mut self, key: Key) -> Option<V> {
        let node = self.table.remove(key)?;

        match node.previous {
            Some(previous) => self.linked_mut(previous).next = node.next,
            None => self.first = node.next,
        }
        match node.next {
            Some(next) => self.linked_mut(next).previous = node.previous,
            None => self.last = node.previous,
        }

        Some(node.value)
    }

    /// Returns the element stored under `key`.
    pub fn find_by_key(&self, key: Key) -> Option<&V> {
        self.table.get(key).map(Node::value)
    }

    /// Returns the element stored under `key` for modification.
    ///
    /// The modification must not change the key the [`Strategy`] derives from the element.
    pub fn find_by_key_mut(&mut self, key: Key) -> Option<&mut V> {
        self.table.get_mut(key).map(|node| &mut node.value)
    }

    /// Returns the node stored under `key`, exposing its links.
    pub fn find_node_by_key(&self, key: Key) -> Option<&Node<V>> {
        self.table.get(key)
    }

    /// Returns `true` if an element is stored under `key`.
    pub fn contains_key(&self, key: Key) -> bool {
        self.table.contains_key(key)
    }

    /// Returns the element at the front of the deque.
    pub fn first(&self) -> Option<&V> {
        self.find_by_key(self.first?)
    }

    /// Returns the element at the back of the deque.
    pub fn last(&self) -> Option<&V> {
        self.find_by_key(self.last?)
    }

    /// Removes every element.
    pub fn clear(&mut self) {
        self.first = None;
        self.last = None;
        self.table.clear();
    }

    /// Returns an iterator over the elements from front to back.
    pub fn iter(&self) -> Iter<'_, V, N> {
        Iter {
            links: self.links(),
        }
    }

    /// Returns an iterator over the keys from front to back.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = Key> + '_ {
        self.links().map(|(key, _)| key)
    }

    /// Verifies the linked structure: walking forward from the front visits every stored node exactly once and ends
    /// at the back, each node's `previous` names the node visited before it, and no node links to itself.
    pub fn check_integrity(&self) -> Result<(), Error> {
        let len = self.len();
        let mut visited = 0;
        let mut previous = None;
        let mut cursor = self.first;

        while let Some(key) = cursor {
            if visited == len {
                return Err(Error::Corrupted {
                    visited: visited + 1,
                    len,
                });
            }
            let node = self.table.get(key).ok_or(Error::BrokenLink { key })?;
            if node.previous != previous || node.previous == Some(key) || node.next == Some(key) {
                return Err(Error::BrokenLink { key });
            }
            visited += 1;
            previous = Some(key);
            cursor = node.next;
        }

        if visited != len || self.last != previous {
            return Err(Error::Corrupted { visited, len });
        }
        Ok(())
    }

    /// Writes a one-line dump of the deque, e.g., `dq(2/3): (#100 _< >101)-(#101 100< >_)`, printing each element
    /// with the [`Strategy`] and its neighbours by key.
    ///
    /// The walk is bounded: if more than `capacity + 1` nodes would be printed the links must form a cycle, so the
    /// walk stops, a warning is written, and [`Error::Corrupted`] is returned.
    pub fn inspect(&self, out: &mut impl Write) -> Result<(), Error> {
        write!(out, "dq({}/{}): ", self.len(), self.capacity())?;

        let mut visited = 0;
        let mut cursor = self.first;
        while let Some(key) = cursor {
            if visited > self.capacity() {
                error!(
                    "Infinite loop detected in deque after visiting {} nodes",
                    visited
                );
                writeln!(out, "!! infinite loop detected in deque")?;
                return Err(Error::Corrupted {
                    visited,
                    len: self.len(),
                });
            }
            if visited > 0 {
                out.write_char('-')?;
            }

            let Some(node) = self.table.get(key) else {
                writeln!(out, "(#? dangling link to {key})")?;
                return Err(Error::BrokenLink { key });
            };
            out.write_str("(#")?;
            self.strategy.print(&node.value, out)?;
            out.write_char(' ')?;
            write_link(out, node.previous)?;
            out.write_str("< >")?;
            write_link(out, node.next)?;
            out.write_char(')')?;

            visited += 1;
            cursor = node.next;
        }

        writeln!(out)?;
        Ok(())
    }

    /// Stores a new, unlinked node under `key`, evicting from `evict` and retrying once if the table is full.
    fn insert_unlinked(&mut self, key: Key, value: V, evict: End) -> Option<V> {
        let node = match self.table.set(key, Node::unlinked(value)) {
            Ok(_) => return None,
            Err(node) => node,
        };

        let evicted = match evict {
            End::Front => {
                warn!("Deque is full; evicting the oldest element for key {}", key);
                self.remove_first()
            }
            End::Back => {
                warn!("Deque is full; evicting the newest element for key {}", key);
                self.remove_last()
            }
        };

        // an eviction frees exactly one slot, so a second failure means the structure is broken
        if self.table.set(key, node).is_err() {
            panic!("no room for key {key} even after evicting an element");
        }
        evicted
    }

    fn links(&self) -> Links<'_, V, N> {
        Links {
            table: &self.table,
            front: self.first,
            back: self.last,
            remaining: self.len(),
        }
    }

    /// Resolves a key reached by following links; a missing node means the links are corrupt.
    fn linked_mut(&mut self, key: Key) -> &mut Node<V> {
        match self.table.get_mut(key) {
            Some(node) => node,
            None => panic!("linked key {key} is missing from the slot table"),
        }
    }
}

fn write_link(out: &mut impl Write, link: Option<Key>) -> fmt::Result {
    match link {
        Some(key) => write!(out, "{key}"),
        None => out.write_char('_'),
    }
}

impl<V: fmt::Debug, S: Strategy<V>, const N: usize> fmt::Debug for Deque<V, S, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(feature = "defmt")]
impl<V, S: Strategy<V>, const N: usize> defmt::Format for Deque<V, S, N> {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "Deque({}/{}) {{ keys: [", self.len(), self.capacity());
        for (i, key) in self.keys().enumerate() {
            if i == 0 {
                defmt::write!(fmt, " ");
            } else {
                defmt::write!(fmt, ", ");
            }
            defmt::write!(fmt, "{}", key);
        }
        defmt::write!(fmt, " ] }}");
    }
}

/// Walks linked nodes from both ends, stopping once `remaining` nodes have been yielded so a corrupt chain can't
/// loop forever.
struct Links<'a, V, const N: usize> {
    table: &'a SlotTable<Node<V>, N>,
    front: Option<Key>,
    back: Option<Key>,
    remaining: usize,
}

impl<'a, V, const N: usize> Iterator for Links<'a, V, N> {
    type Item = (Key, &'a Node<V>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let key = self.front?;
        let node = self.table.get(key)?;
        self.remaining -= 1;
        self.front = node.next;
        Some((key, node))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl<V, const N: usize> DoubleEndedIterator for Links<'_, V, N> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let key = self.back?;
        let node = self.table.get(key)?;
        self.remaining -= 1;
        self.back = node.previous;
        Some((key, node))
    }
}

/// An iterator over the elements of a [`Deque`], from front to back.
pub struct Iter<'a, V, const N: usize> {
    links: Links<'a, V, N>,
}

impl<'a, V, const N: usize> Iterator for Iter<'a, V, N> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.links.next().map(|(_, node)| &node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.links.size_hint()
    }
}

impl<V, const N: usize> DoubleEndedIterator for Iter<'_, V, N> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.links.next_back().map(|(_, node)| &node.value)
    }
}

impl<'a, V, S: Strategy<V>, const N: usize> IntoIterator for &'a Deque<V, S, N> {
    type Item = &'a V;
    type IntoIter = Iter<'a, V, N>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::FnStrategy;
    use rand::{Rng, SeedableRng, rngs::SmallRng};
    use std::{collections::VecDeque, string::String};

    /// Values double as their own keys.
    #[derive(Clone, Copy, Debug)]
    struct Identity;

    impl Strategy<u32> for Identity {
        fn key(&self, value: &u32) -> Key {
            *value
        }

        fn print(&self, value: &u32, out: &mut dyn Write) -> fmt::Result {
            write!(out, "{value}")
        }
    }

    /// Keyed by the first field, so the second can show replacement.
    #[derive(Clone, Copy, Debug)]
    struct ByKey;

    impl Strategy<(Key, u32)> for ByKey {
        fn key(&self, value: &(Key, u32)) -> Key {
            value.0
        }
    }

    fn deque(capacity: usize) -> Deque<u32, Identity, 128> {
        Deque::new(capacity, Identity).unwrap()
    }

    fn contents<V: Copy, S: Strategy<V>, const N: usize>(deque: &Deque<V, S, N>) -> Vec<V> {
        deque.iter().copied().collect()
    }

    #[test]
    fn new() {
        let deque = deque(3);
        assert_eq!(3, deque.capacity(), "Expected left but got right");
        assert_eq!(0, deque.len(), "Expected left but got right");
        assert_eq!(None, deque.first());
        assert_eq!(None, deque.last());
        assert_eq!(Ok(()), deque.check_integrity());
    }

    #[test]
    fn new_rejects_bad_capacity() {
        assert_eq!(
            Some(Error::ZeroCapacity),
            Deque::<u32, Identity, 4>::new(0, Identity).err()
        );
        assert_eq!(
            Some(Error::CapacityExceedsStorage {
                requested: 5,
                storage: 4
            }),
            Deque::<u32, Identity, 4>::new(5, Identity).err()
        );
    }

    #[test]
    fn append_links_after_last() {
        let mut deque = deque(127);

        assert_eq!(Insertion::Inserted, deque.append_or_replace(100));
        assert_eq!(1, deque.len());
        let node = deque.find_node_by_key(100).unwrap();
        assert_eq!((None, None), (node.previous(), node.next()));

        deque.append_or_replace(101);
        assert_eq!(Some(&101), deque.last());
        assert_eq!(Some(101), deque.find_node_by_key(100).unwrap().next());
        assert_eq!(Some(100), deque.find_node_by_key(101).unwrap().previous());

        deque.append_or_replace(102);
        assert_eq!(vec![100, 101, 102], contents(&deque));
        assert_eq!(Ok(()), deque.check_integrity());
    }

    #[test]
    fn append_replaces_last_without_self_reference() {
        let mut deque = Deque::<(Key, u32), ByKey, 8>::new(8, ByKey).unwrap();
        deque.append_or_replace((100, 0));
        deque.append_or_replace((101, 0));
        deque.append_or_replace((102, 0));

        assert_eq!(Insertion::Replaced((102, 0)), deque.append_or_replace((102, 1)));
        assert_eq!(3, deque.len(), "Replacement should not change occupancy");
        assert_eq!(Some(&(102, 1)), deque.last());

        let last = deque.find_node_by_key(102).unwrap();
        assert_eq!(Some(101), last.previous(), "Last node must not become its own neighbour");
        assert_eq!(None, last.next());
        assert_eq!(Ok(()), deque.check_integrity());
    }

    #[test]
    fn append_replaces_in_place() {
        let mut deque = Deque::<(Key, u32), ByKey, 8>::new(8, ByKey).unwrap();
        deque.append_or_replace((100, 0));
        deque.append_or_replace((101, 0));
        deque.append_or_replace((102, 0));

        deque.append_or_replace((100, 1));
        assert_eq!(vec![(100, 1), (101, 0), (102, 0)], contents(&deque));
        assert_eq!(Ok(()), deque.check_integrity());
    }

    #[test]
    fn prepend_links_before_first() {
        let mut deque = deque(127);
        deque.prepend_or_replace(102);
        assert_eq!(deque.first(), deque.last());

        deque.prepend_or_replace(101);
        deque.prepend_or_replace(100);
        assert_eq!(vec![100, 101, 102], contents(&deque));
        assert_eq!(Some(100), deque.find_node_by_key(101).unwrap().previous());
        assert_eq!(Ok(()), deque.check_integrity());
    }

    #[test]
    fn prepend_replaces_first_without_self_reference() {
        let mut deque = Deque::<(Key, u32), ByKey, 8>::new(8, ByKey).unwrap();
        deque.prepend_or_replace((102, 0));
        deque.prepend_or_replace((101, 0));
        deque.prepend_or_replace((100, 0));

        assert_eq!(Insertion::Replaced((100, 0)), deque.prepend_or_replace((100, 1)));
        assert_eq!(3, deque.len());
        assert_eq!(Some(&(100, 1)), deque.first());

        let first = deque.find_node_by_key(100).unwrap();
        assert_eq!((None, Some(101)), (first.previous(), first.next()));
        assert_eq!(Ok(()), deque.check_integrity());
    }

    #[test]
    fn remove_first_yields_insertion_order() {
        let mut deque = deque(127);
        for value in [100, 101, 102] {
            deque.append_or_replace(value);
        }

        assert_eq!(Some(100), deque.remove_first());
        assert_eq!(Some(&101), deque.first());
        assert_eq!(None, deque.find_node_by_key(101).unwrap().previous());
        assert_eq!(Some(101), deque.remove_first());
        assert_eq!(Some(102), deque.remove_first());
        assert_eq!(None, deque.remove_first(), "Empty deque has nothing to remove");
        assert_eq!((None, None), (deque.first(), deque.last()));
        assert_eq!(Ok(()), deque.check_integrity());
    }

    #[test]
    fn remove_last_yields_reverse_order() {
        let mut deque = deque(127);
        for value in [100, 101, 102] {
            deque.append_or_replace(value);
        }

        assert_eq!(Some(102), deque.remove_last());
        assert_eq!(Some(&101), deque.last());
        assert_eq!(None, deque.find_node_by_key(101).unwrap().next());
        assert_eq!(Some(101), deque.remove_last());
        assert_eq!(Some(100), deque.remove_last());
        assert_eq!(None, deque.remove_last());
        assert_eq!(0, deque.len());
    }

    #[test]
    fn remove_by_key() {
        let mut deque = deque(127);
        for value in [100, 101, 102] {
            deque.append_or_replace(value);
        }

        assert_eq!(None, deque.remove_by_key(10), "Absent key should not be removed");
        assert_eq!(3, deque.len());

        assert_eq!(Some(101), deque.remove_by_key(101));
        assert_eq!(vec![100, 102], contents(&deque));
        assert_eq!(Ok(()), deque.check_integrity());

        assert_eq!(Some(100), deque.remove_by_key(100));
        assert_eq!(Some(&102), deque.first());
        assert_eq!(Some(102), deque.remove_by_key(102));
        assert!(deque.is_empty());
        assert_eq!(Ok(()), deque.check_integrity());
    }

    #[test]
    fn find_by_key() {
        let mut deque = deque(127);
        for value in [100, 101, 102] {
            deque.append_or_replace(value);
        }

        assert_eq!(Some(&100), deque.find_by_key(100));
        assert_eq!(Some(&101), deque.find_by_key(101));
        assert_eq!(Some(&102), deque.find_by_key(102));
        assert_eq!(None, deque.find_by_key(3));
        assert_eq!(vec![100, 101, 102], contents(&deque), "Lookups should not reorder");
    }

    #[test]
    fn find_by_key_mut() {
        let mut deque = Deque::<(Key, u32), ByKey, 8>::new(8, ByKey).unwrap();
        deque.append_or_replace((1, 0));
        deque.find_by_key_mut(1).unwrap().1 = 7;
        assert_eq!(Some(&(1, 7)), deque.find_by_key(1));
    }

    #[test]
    fn clear_then_reuse() {
        let mut deque = deque(3);
        for value in [100, 101, 102] {
            deque.append_or_replace(value);
        }
        deque.clear();
        assert!(deque.is_empty());
        assert_eq!(None, deque.find_by_key(100));

        for value in [100, 101, 102] {
            deque.append_or_replace(value);
        }
        assert_eq!(3, deque.len());
        assert_eq!(Ok(()), deque.check_integrity());
    }

    #[test]
    fn eviction() {
        const A: u32 = 10;
        const B: u32 = 11;
        const C: u32 = 12;
        const D: u32 = 13;

        let mut deque = deque(2);
        deque.append_or_replace(A);
        deque.append_or_replace(B);
        assert!(deque.is_full());

        assert_eq!(Insertion::Evicted(A), deque.append_or_replace(C), "Append should evict the oldest");
        assert_eq!(vec![B, C], contents(&deque));

        assert_eq!(Insertion::Evicted(C), deque.prepend_or_replace(D), "Prepend should evict the newest");
        assert_eq!(vec![D, B], contents(&deque));
        assert_eq!(2, deque.len());
        assert_eq!(Ok(()), deque.check_integrity());
    }

    #[test]
    fn replacing_on_full_deque_does_not_evict() {
        let mut deque = Deque::<(Key, u32), ByKey, 2>::new(2, ByKey).unwrap();
        deque.append_or_replace((1, 0));
        deque.append_or_replace((2, 0));

        assert_eq!(Insertion::Replaced((1, 0)), deque.append_or_replace((1, 1)));
        assert_eq!(vec![(1, 1), (2, 0)], contents(&deque));
    }

    #[test]
    fn eviction_with_capacity_of_one() {
        let mut deque = deque(1);
        deque.append_or_replace(1);
        assert_eq!(Insertion::Evicted(1), deque.append_or_replace(2));
        assert_eq!(Insertion::Evicted(2), deque.prepend_or_replace(3));
        assert_eq!(vec![3], contents(&deque));
        assert_eq!(Ok(()), deque.check_integrity());
    }

    #[test]
    fn colliding_keys_survive_removal() {
        let mut deque = deque(3);
        for value in [0, 3, 6] {
            deque.append_or_replace(value);
        }

        assert_eq!(Some(3), deque.remove_by_key(3));
        assert_eq!(Some(&0), deque.find_by_key(0));
        assert_eq!(Some(&6), deque.find_by_key(6));
        assert_eq!(vec![0, 6], contents(&deque));
        assert_eq!(Ok(()), deque.check_integrity());

        // removing the front relocates 6 into bucket 0; its links must still resolve
        assert_eq!(Some(0), deque.remove_first());
        assert_eq!(vec![6], contents(&deque));
        assert_eq!(Ok(()), deque.check_integrity());
    }

    #[test]
    fn load_factor() {
        let mut deque = deque(4);
        for (k, value) in [1, 2, 3, 4].into_iter().enumerate() {
            deque.append_or_replace(value);
            assert!((deque.load_factor() - (k + 1) as f32 / 4.0).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn iter_from_both_ends() {
        let mut deque = deque(8);
        for value in [1, 2, 3, 4] {
            deque.append_or_replace(value);
        }

        let mut iter = deque.iter();
        assert_eq!(Some(&1), iter.next());
        assert_eq!(Some(&4), iter.next_back());
        assert_eq!(Some(&2), iter.next());
        assert_eq!(Some(&3), iter.next_back());
        assert_eq!(None, iter.next());
        assert_eq!(None, iter.next_back());

        assert_eq!(vec![4, 3, 2, 1], deque.keys().rev().collect::<Vec<_>>());
    }

    #[test]
    fn inspect() {
        let mut deque = deque(3);
        for value in [100, 101, 102] {
            deque.append_or_replace(value);
        }

        let mut out = String::new();
        assert_eq!(Ok(()), deque.inspect(&mut out));
        assert_eq!(
            "dq(3/3): (#100 _< >101)-(#101 100< >102)-(#102 101< >_)\n",
            out
        );
    }

    #[test]
    fn inspect_with_fn_strategy() {
        let strategy = FnStrategy::new(
            |value: &u32| value / 10,
            |value: &u32, out: &mut dyn Write| write!(out, "v{value}"),
        );
        let mut deque = Deque::<u32, _, 4>::new(4, strategy).unwrap();
        deque.append_or_replace(10);
        deque.append_or_replace(20);

        let mut out = String::new();
        deque.inspect(&mut out).unwrap();
        assert_eq!("dq(2/4): (#v10 _< >2)-(#v20 1< >_)\n", out);
    }

    #[test]
    fn inspect_detects_cycle() {
        let mut deque = deque(3);
        for value in [100, 101, 102] {
            deque.append_or_replace(value);
        }
        deque.table.get_mut(102).unwrap().next = Some(100);

        let mut out = String::new();
        assert_eq!(
            Err(Error::Corrupted { visited: 4, len: 3 }),
            deque.inspect(&mut out)
        );
        assert!(out.ends_with("!! infinite loop detected in deque\n"));
        assert_eq!(
            Err(Error::Corrupted { visited: 4, len: 3 }),
            deque.check_integrity()
        );
        assert_eq!(3, deque.iter().count(), "Iteration should stop after len nodes");
    }

    #[test]
    fn integrity_detects_self_reference() {
        let mut deque = deque(3);
        for value in [100, 101, 102] {
            deque.append_or_replace(value);
        }
        deque.table.get_mut(101).unwrap().next = Some(101);

        assert_eq!(Err(Error::BrokenLink { key: 101 }), deque.check_integrity());
    }

    #[test]
    fn randomized_operations_match_model() {
        for seed in 0..64 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let capacity = rng.random_range(1..=16);
            let mut deque = Deque::<(Key, u32), ByKey, 16>::new(capacity, ByKey).unwrap();
            let mut model: VecDeque<(Key, u32)> = VecDeque::new();

            for step in 0..400u32 {
                let key = rng.random_range(0..(capacity as Key * 3));
                let value = (key, step);
                let position = model.iter().position(|&(k, _)| k == key);

                match rng.random_range(0..5) {
                    0 | 1 => {
                        let expected = match position {
                            Some(i) => Insertion::Replaced(core::mem::replace(&mut model[i], value)),
                            None if model.len() == capacity => {
                                let victim = model.pop_front().unwrap();
                                model.push_back(value);
                                Insertion::Evicted(victim)
                            }
                            None => {
                                model.push_back(value);
                                Insertion::Inserted
                            }
                        };
                        assert_eq!(expected, deque.append_or_replace(value), "seed {seed}");
                    }
                    2 => {
                        let expected = match position {
                            Some(i) => Insertion::Replaced(core::mem::replace(&mut model[i], value)),
                            None if model.len() == capacity => {
                                let victim = model.pop_back().unwrap();
                                model.push_front(value);
                                Insertion::Evicted(victim)
                            }
                            None => {
                                model.push_front(value);
                                Insertion::Inserted
                            }
                        };
                        assert_eq!(expected, deque.prepend_or_replace(value), "seed {seed}");
                    }
                    3 => {
                        let expected = position.and_then(|i| model.remove(i));
                        assert_eq!(expected, deque.remove_by_key(key), "seed {seed}");
                    }
                    _ => {
                        if rng.random_bool(0.5) {
                            assert_eq!(model.pop_front(), deque.remove_first(), "seed {seed}");
                        } else {
                            assert_eq!(model.pop_back(), deque.remove_last(), "seed {seed}");
                        }
                    }
                }

                assert!(deque.len() <= capacity);
                assert_eq!(Ok(()), deque.check_integrity(), "seed {seed}");
                assert_eq!(model.iter().copied().collect::<Vec<_>>(), contents(&deque));
                for &(key, step) in &model {
                    assert_eq!(Some(&(key, step)), deque.find_by_key(key));
                }
            }
        }
    }
}
