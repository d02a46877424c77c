//! Error and diagnostic types shared by `Mapping` and `Set`.

use crate::hashable::TypeTag;
use thiserror::Error;

/// Errors raised synchronously by the call that caused them. The table is
/// left unchanged whenever one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Construction was attempted with a capacity of zero.
    #[error("Capacity must be a positive integer.")]
    InvalidCapacity(usize),
    /// A null key was passed to a Mapping insertion.
    #[error("None keys are not allowed in this dictionary.")]
    InvalidKey,
    /// A null value (Mapping payload or Set element) was inserted.
    #[error("None values are not allowed in this collection.")]
    InvalidValue,
    /// The key or element cannot be hashed.
    #[error("Unhashable type: {0}")]
    UnhashableType(TypeTag),
}

/// Returned by [`Hashable::try_hash`](crate::Hashable::try_hash) when an
/// instance cannot be hashed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Unhashable type: {0}")]
pub struct Unhashable(pub TypeTag);

impl From<Unhashable> for TableError {
    fn from(e: Unhashable) -> Self {
        TableError::UnhashableType(e.0)
    }
}

/// Non-fatal diagnostic produced when a Set receives an element whose runtime
/// type differs from the first element it ever accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixedTypeWarning {
    pub expected: TypeTag,
    pub found: TypeTag,
}

impl core::fmt::Display for MixedTypeWarning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Adding element of type {} to a Set containing {}. Mixed types may cause unexpected behavior.",
            self.found, self.expected
        )
    }
}
