use super::Key;
use core::fmt::{self, Write};

/// Behavior injected into a [`Deque`][super::Deque] at construction: how to derive a key from a value, and how to
/// print a value for diagnostics.
pub trait Strategy<V> {
    /// Returns the key for `value`.
    ///
    /// Must be idempotent: the same logical element must always produce the same key, otherwise lookups and removals
    /// silently miss.
    fn key(&self, value: &V) -> Key;

    /// Writes a short representation of `value`, used by [`Deque::inspect`][super::Deque::inspect].
    fn print(&self, value: &V, out: &mut dyn Write) -> fmt::Result {
        let _ = value;
        out.write_char('*')
    }
}

/// A [`Strategy`] assembled from a pair of functions.
#[derive(Clone, Copy, Debug)]
pub struct FnStrategy<K, P> {
    key: K,
    print: P,
}

impl<K, P> FnStrategy<K, P> {
    /// Builds a strategy from a key function and a print function.
    pub fn new(key: K, print: P) -> Self {
        Self { key, print }
    }
}

impl<V, K, P> Strategy<V> for FnStrategy<K, P>
where
    K: Fn(&V) -> Key,
    P: Fn(&V, &mut dyn Write) -> fmt::Result,
{
    fn key(&self, value: &V) -> Key {
        (self.key)(value)
    }

    fn print(&self, value: &V, out: &mut dyn Write) -> fmt::Result {
        (self.print)(value, out)
    }
}
