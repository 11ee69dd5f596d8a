//! A fixed-capacity hash table using open addressing with linear probing.
//!
//! All values live directly in the table's backing array, so a table never allocates once constructed. The hash
//! function is simply `key mod capacity`, which suits the small, dense keys (e.g., MIDI note numbers) it is meant for.

use super::{Error, Key};
use core::fmt::{self, Write};
use tinyvec::ArrayVec;

/// One cell of a [`SlotTable`]'s backing array.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot<V> {
    /// Nothing is stored here; probing stops at an empty slot.
    Empty,
    /// A value stored under its key.
    Occupied {
        /// Key the value was stored under.
        key: Key,
        /// Stored value.
        value: V,
    },
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Slot::Empty
    }
}

impl<V> Slot<V> {
    /// Returns the key stored in this slot, if any.
    pub fn key(&self) -> Option<Key> {
        match self {
            Slot::Empty => None,
            Slot::Occupied { key, .. } => Some(*key),
        }
    }

    /// Returns `true` if nothing is stored in this slot.
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}

/// A fixed-capacity key-value table.
///
/// `N` is the amount of statically allocated storage; the capacity in use is chosen once at construction and may be
/// anything from 1 to `N`. The table never grows: when every slot holds an unrelated key, [`SlotTable::set`] hands
/// the value back and leaves it to the caller to decide what to evict.
///
/// Deletion does not use tombstones. Instead, [`SlotTable::remove`] moves entries backward into the vacated slot so
/// that, for any stored key, probing forward from its home bucket always reaches it before reaching an empty slot.
#[derive(Clone, Debug)]
pub struct SlotTable<V, const N: usize> {
    slots: ArrayVec<[Slot<V>; N]>,
    len: usize,
}

impl<V, const N: usize> SlotTable<V, N> {
    /// Constructs an empty table with `capacity` slots.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            error!("Refusing to construct a table with zero capacity");
            return Err(Error::ZeroCapacity);
        }
        if capacity > N {
            error!(
                "Requested capacity {} exceeds static storage of {}",
                capacity, N
            );
            return Err(Error::CapacityExceedsStorage {
                requested: capacity,
                storage: N,
            });
        }

        let mut slots = ArrayVec::new();
        slots.resize_with(capacity, Slot::default);
        Ok(Self { slots, len: 0 })
    }

    /// Number of slots, fixed for the lifetime of the table.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no slots are occupied.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// The ratio of occupied slots to capacity, in `[0, 1]`.
    pub fn load_factor(&self) -> f32 {
        self.len as f32 / self.capacity() as f32
    }

    /// The home bucket of `key`: the slot it occupies absent collisions.
    pub fn home(&self, key: Key) -> usize {
        (key % self.capacity() as Key) as usize
    }

    /// Returns a reference to the value stored under `key`.
    pub fn get(&self, key: Key) -> Option<&V> {
        match &self.slots[self.find_slot(key)?] {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Empty => None,
        }
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut(&mut self, key: Key) -> Option<&mut V> {
        let index = self.find_slot(key)?;
        match &mut self.slots[index] {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Empty => None,
        }
    }

    /// Returns `true` if a value is stored under `key`.
    pub fn contains_key(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    /// Stores `value` under `key`, overwriting any value already stored under the same key.
    ///
    /// When the probe sequence wraps all the way around without finding either `key` or an empty slot, the table is
    /// full of unrelated keys: nothing is written and `value` is returned as the error so the caller can make room and
    /// try again.
    pub fn set(&mut self, key: Key, value: V) -> Result<&mut V, V> {
        let Some(index) = self.find_slot(key) else {
            return Err(value);
        };

        let slot = &mut self.slots[index];
        if slot.is_empty() {
            self.len += 1;
        }
        *slot = Slot::Occupied { key, value };

        match slot {
            Slot::Occupied { value, .. } => Ok(value),
            Slot::Empty => unreachable!("slot was just filled"),
        }
    }

    /// Removes and returns the value stored under `key`.
    ///
    /// The contiguous run of occupied slots starting at the key's home bucket is scanned up to the first empty slot.
    /// The last entry in that run sharing the removed key's home bucket is moved into the vacated slot, keeping that
    /// bucket's entries contiguous. Entries from other buckets that follow the newly emptied slot are then shifted
    /// back as far as their own home buckets allow, so runs mixing several buckets stay reachable too.
    pub fn remove(&mut self, key: Key) -> Option<V> {
        let capacity = self.capacity();
        let home = self.home(key);
        let mut found = None;
        let mut swap_candidate = None;

        for offset in 0..capacity {
            let index = (home + offset) % capacity;
            let Some(occupant) = self.slots[index].key() else {
                break;
            };
            if occupant == key {
                found = Some(index);
            }
            if self.home(occupant) == home {
                swap_candidate = Some(index);
            }
        }

        let found = found?;
        let removed = match swap_candidate {
            Some(candidate) if candidate != found => {
                let moved = core::mem::take(&mut self.slots[candidate]);
                let removed = core::mem::replace(&mut self.slots[found], moved);
                self.close_gap(candidate);
                removed
            }
            _ => {
                let removed = core::mem::take(&mut self.slots[found]);
                self.close_gap(found);
                removed
            }
        };
        self.len -= 1;

        match removed {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Empty => None,
        }
    }

    /// Empties every slot.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = Slot::Empty);
        self.len = 0;
    }

    /// Direct access to the slot at `index`, bypassing keys.
    ///
    /// An out-of-range index is a programming error; it is logged and `None` is returned.
    pub fn slot(&self, index: usize) -> Option<&Slot<V>> {
        let slot = self.slots.get(index);
        if slot.is_none() {
            error!(
                "Slot index {} is out of range for capacity {}",
                index,
                self.capacity()
            );
        }
        slot
    }

    /// Iterates over the slots in storage order.
    pub fn slots(&self) -> impl Iterator<Item = &Slot<V>> {
        self.slots.iter()
    }

    /// Counts occupied slots that sit away from their home bucket because that bucket is taken.
    pub fn collision_count(&self) -> usize {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.key().map(|key| (index, self.home(key))))
            .filter(|&(index, home)| index != home && !self.slots[home].is_empty())
            .count()
    }

    /// The share of stored entries displaced from their home bucket; `0.0` for an empty table.
    pub fn collision_ratio(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        self.collision_count() as f32 / self.len as f32
    }

    /// Writes a one-line, human-readable dump of the slots, e.g., `h(2/3): { {k:0,v:*},{},{k:7,v:*}, }`.
    pub fn inspect(&self, out: &mut impl Write) -> fmt::Result {
        write!(out, "h({}/{}): {{ ", self.len, self.capacity())?;
        for slot in self.slots.iter() {
            match slot {
                Slot::Occupied { key, .. } => write!(out, "{{k:{key},v:*}},")?,
                Slot::Empty => write!(out, "{{}},")?,
            }
        }
        writeln!(out, " }}")
    }

    /// Finds the slot holding `key`, or else the first empty slot along its probe sequence.
    fn find_slot(&self, key: Key) -> Option<usize> {
        let capacity = self.capacity();
        let home = self.home(key);

        (0..capacity)
            .map(|offset| (home + offset) % capacity)
            .find(|&index| match &self.slots[index] {
                Slot::Empty => true,
                Slot::Occupied { key: occupant, .. } => *occupant == key,
            })
    }

    /// Backward-shift repair after `hole` has been emptied.
    ///
    /// Walks the rest of the run; an entry may fill the hole if the hole lies between its home bucket and its current
    /// slot, otherwise moving it would put it ahead of where probing for it begins.
    fn close_gap(&mut self, mut hole: usize) {
        let capacity = self.capacity();
        let distance = |from: usize, to: usize| (to + capacity - from) % capacity;

        let mut index = (hole + 1) % capacity;
        while index != hole {
            let Some(occupant) = self.slots[index].key() else {
                break;
            };
            let home = self.home(occupant);
            if distance(home, hole) < distance(home, index) {
                self.slots[hole] = core::mem::take(&mut self.slots[index]);
                hole = index;
            }
            index = (index + 1) % capacity;
        }
    }
}
