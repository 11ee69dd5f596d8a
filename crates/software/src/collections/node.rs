use super::Key;

/// A value wrapper living inside a [`SlotTable`][super::SlotTable] slot, linked to its neighbours in a
/// [`Deque`][super::Deque].
///
/// Links are stored as keys rather than slot positions: deletion may relocate entries within the table, but a key
/// always resolves to wherever its node currently lives.
#[derive(Clone, Debug, PartialEq)]
pub struct Node<V> {
    pub(super) value: V,
    pub(super) previous: Option<Key>,
    pub(super) next: Option<Key>,
}

impl<V> Node<V> {
    pub(super) fn unlinked(value: V) -> Self {
        Self {
            value,
            previous: None,
            next: None,
        }
    }

    /// The wrapped value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Key of the node linked before this one, toward the front.
    pub fn previous(&self) -> Option<Key> {
        self.previous
    }

    /// Key of the node linked after this one, toward the back.
    pub fn next(&self) -> Option<Key> {
        self.next
    }
}
