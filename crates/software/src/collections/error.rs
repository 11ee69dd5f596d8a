use super::Key;
use thiserror::Error;

/// Failures reported while constructing or diagnosing a collection.
///
/// Ordinary outcomes such as a missing key or an empty [`Deque`][super::Deque] are expressed with [`Option`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A table must have at least one slot; `key mod 0` is undefined.
    #[error("capacity must be greater than zero")]
    ZeroCapacity,
    /// The requested capacity does not fit in the statically allocated storage.
    #[error("capacity {requested} exceeds the {storage} slots of static storage")]
    CapacityExceedsStorage {
        /// Capacity asked for at construction.
        requested: usize,
        /// Number of slots the backing array was compiled with.
        storage: usize,
    },
    /// Walking the chain from front to back did not visit exactly the stored nodes, e.g., because the links form a
    /// cycle or skip over nodes.
    #[error("walked {visited} linked nodes but {len} are stored")]
    Corrupted {
        /// Nodes visited before the walk ended or was abandoned.
        visited: usize,
        /// Number of nodes stored in the table.
        len: usize,
    },
    /// A link points at a key which is not stored, points back at its own node, or disagrees with its neighbour.
    #[error("the link to or from key {key} is broken")]
    BrokenLink {
        /// Key of the node whose link is broken.
        key: Key,
    },
    /// The diagnostic output sink refused a write.
    #[error("failed to write diagnostic output")]
    Format,
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Error::Format
    }
}
