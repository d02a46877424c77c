//! chain-hashmap: a fixed-capacity, separate-chaining `Mapping` and `Set`
//! with functional bulk operations.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: two associative containers sharing one small, inspectable
//!   hash-table engine whose bucket count never changes.
//! - Layers:
//!   - BucketTable<K, V, S>: `capacity` chain heads plus a `SlotMap` arena
//!     of entries. Each entry stores its key, payload, full `u64` hash and
//!     the arena key of its successor. Provides insert/find/remove over a
//!     chain and a same-layout derivation used by the bulk operations.
//!   - Mapping<K, V, S>: dictionary semantics on top (`add` replaces the
//!     payload of an equal key in place).
//!   - Set<T, S>: `BucketTable<T, ()>` plus the runtime type of the first
//!     element ever accepted, for the mixed-type diagnostic.
//!
//! Constraints
//! - Fixed capacity: no resizing or rehashing, ever. `capacity == 0` is
//!   rejected at construction.
//! - Single-threaded; no interior mutability, no locking.
//! - No null keys, payloads or elements ([`Nullable`]); keys and elements
//!   must be [`Hashable`], which may refuse per instance
//!   (`TableError::UnhashableType`).
//! - Queries treat a null or missing key as absent, but still hash their
//!   argument: an unhashable key fails with `TableError::UnhashableType`.
//!
//! Ownership
//! - Every entry is referenced by exactly one link: either a bucket head or
//!   its predecessor's `next`. Removing an entry splices that link, and
//!   dropping the table drops the arena and with it every entry.
//!
//! Traversal order
//! - Bucket index ascending, then chain order (first-insertion order within
//!   a bucket). The default hasher is deterministic, so two tables of equal
//!   capacity with the same insertion history traverse identically; this is
//!   what makes `concat`/`empty` satisfy the monoid laws on `to_sequence()`.
//!
//! Derived tables
//! - `filter` and `Mapping::map` reuse the stored hashes and bucket
//!   placement of `self` and never call back into `Hashable`.
//!   `Set::map` and `concat` re-add through the public `add` path.
//! - All derived tables keep `self`'s capacity. Skewed hashes therefore
//!   keep long chains; this is the accepted cost of a fixed capacity.
//!
//! Diagnostics
//! - `Set::add` logs a `MixedTypeWarning` through the `log` facade (target
//!   `chain_hashmap::set`) and also returns it to the caller.

#[cfg(feature = "bench_internal")]
pub mod bucket_table;
#[cfg(not(feature = "bench_internal"))]
mod bucket_table;
mod bucket_table_proptest;
mod error;
mod hashable;
pub mod mapping;
pub mod set;
mod value;

// Public surface
pub use bucket_table::{DefaultHashBuilder, DEFAULT_CAPACITY};
pub use error::{MixedTypeWarning, TableError, Unhashable};
pub use hashable::{Hashable, Nullable, TypeTag};
pub use mapping::Mapping;
pub use set::Set;
pub use value::Value;
