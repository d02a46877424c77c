//! Mapping: key-value dictionary over a fixed-capacity `BucketTable`.

use crate::bucket_table::{BucketTable, DefaultHashBuilder};
use crate::error::TableError;
use crate::hashable::{Hashable, Nullable};
use core::borrow::Borrow;
use core::convert::Infallible;
use core::fmt;
use core::hash::BuildHasher;

pub use crate::bucket_table::{IntoIter, Iter};

/// A dictionary with a fixed number of buckets chosen at construction.
///
/// Keys are unique by `Eq`; adding an existing key replaces its value in
/// place. Neither keys nor values may be null. Traversal order is bucket
/// index, then insertion order within a bucket, and is not key order.
///
/// The table never grows. Derived tables (`filter`, `map`, `concat`) keep
/// the capacity of `self`, so long chains stay long.
#[derive(Clone)]
pub struct Mapping<K, V, S = DefaultHashBuilder> {
    table: BucketTable<K, V, S>,
}

impl<K, V> Mapping<K, V>
where
    K: Hashable,
    V: Nullable,
{
    /// Ten buckets, deterministic hasher.
    pub fn new() -> Self {
        Self::empty()
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, TableError> {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }

    /// Builds a Mapping of default capacity from `pairs`, later duplicates
    /// overwriting earlier ones.
    pub fn try_from_iter<I>(pairs: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut m = Self::new();
        m.from_sequence(pairs)?;
        Ok(m)
    }
}

impl<K, V, S> Mapping<K, V, S>
where
    K: Hashable,
    V: Nullable,
    S: BuildHasher,
{
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self, TableError> {
        Ok(Self {
            table: BucketTable::with_capacity_and_hasher(capacity, hasher)?,
        })
    }

    /// A fresh Mapping with the default capacity.
    pub fn empty() -> Self
    where
        S: Default,
    {
        Self {
            table: BucketTable::with_hasher(S::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn size(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Bucket `key` lands in. Null keys are rejected before hashing.
    pub fn bucket_index<Q>(&self, key: &Q) -> Result<usize, TableError>
    where
        Q: ?Sized + Hashable,
    {
        if key.is_null() {
            return Err(TableError::InvalidKey);
        }
        self.table.index_of(key)
    }

    /// Inserts or updates `key`. Returns the replaced value, if any.
    ///
    /// Fails with `InvalidKey`, `InvalidValue` or `UnhashableType`, leaving the
    /// Mapping unchanged.
    pub fn add(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        if key.is_null() {
            return Err(TableError::InvalidKey);
        }
        if value.is_null() {
            return Err(TableError::InvalidValue);
        }
        self.table.insert(key, value)
    }

    /// Value stored under `key`. A null key is simply absent; an unhashable
    /// key fails with `UnhashableType`.
    pub fn get<Q>(&self, key: &Q) -> Result<Option<&V>, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hashable,
    {
        if key.is_null() {
            return Ok(None);
        }
        self.table.get(key)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Result<Option<(&K, &V)>, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hashable,
    {
        if key.is_null() {
            return Ok(None);
        }
        self.table.get_key_value(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<Option<&mut V>, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hashable,
    {
        if key.is_null() {
            return Ok(None);
        }
        self.table.get_mut(key)
    }

    /// Removes `key` and returns its value. Absent or null keys are a no-op;
    /// an unhashable key fails with `UnhashableType`.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<Option<V>, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hashable,
    {
        if key.is_null() {
            return Ok(None);
        }
        Ok(self.table.remove(key)?.map(|(_, v)| v))
    }

    pub fn member<Q>(&self, key: &Q) -> Result<bool, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hashable,
    {
        Ok(self.get(key)?.is_some())
    }

    /// Applies `add` to each pair in order. Stops at the first error; pairs
    /// before it stay inserted.
    pub fn from_sequence<I>(&mut self, pairs: I) -> Result<(), TableError>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in pairs {
            self.add(k, v)?;
        }
        Ok(())
    }

    pub fn to_sequence(&self) -> Vec<(K, V)>
    where
        K: Clone,
        V: Clone,
    {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    /// Entries satisfying `predicate`, in traversal order, in a table of the
    /// same capacity.
    pub fn filter<P>(&self, mut predicate: P) -> Self
    where
        K: Clone,
        V: Clone,
        S: Clone,
        P: FnMut(&K, &V) -> bool,
    {
        let derived = self
            .table
            .derive(|k, v| Ok::<_, Infallible>(predicate(k, v).then(|| v.clone())));
        match derived {
            Ok(table) => Self { table },
            Err(never) => match never {},
        }
    }

    /// Replaces every value with `f(value)`; keys are unchanged. A null result
    /// fails with `InvalidValue`, exactly as `add` would.
    pub fn map<W, F>(&self, mut f: F) -> Result<Mapping<K, W, S>, TableError>
    where
        K: Clone,
        S: Clone,
        W: Nullable,
        F: FnMut(&V) -> W,
    {
        let table = self.table.derive(|_, v| {
            let w = f(v);
            if w.is_null() {
                return Err(TableError::InvalidValue);
            }
            Ok(Some(w))
        })?;
        Ok(Mapping { table })
    }

    /// Left fold over the values in traversal order.
    pub fn reduce<A, F>(&self, f: F, initial: A) -> A
    where
        F: FnMut(A, &V) -> A,
    {
        self.values().fold(initial, f)
    }

    /// `self`'s entries followed by `other`'s, in a table of `self`'s capacity;
    /// on key collision `other` wins. `other` is rehashed under `self`'s hasher.
    pub fn concat(&self, other: &Self) -> Result<Self, TableError>
    where
        K: Clone,
        V: Clone,
        S: Clone,
    {
        let mut out = self.clone();
        for (k, v) in other.iter() {
            out.add(k.clone(), v.clone())?;
        }
        Ok(out)
    }

    /// Per-bucket chain lengths, by bucket index.
    pub fn chain_lengths(&self) -> Vec<usize> {
        self.table.chain_lengths()
    }
}

impl<K, V, S> Mapping<K, V, S> {
    /// One-pass cursor over `(key, value)` in traversal order. The borrow
    /// checker rules out mutation while it is alive.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.table.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<K, V, S> Default for Mapping<K, V, S>
where
    K: Hashable,
    V: Nullable,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::empty()
    }
}

impl<K, V, S> IntoIterator for Mapping<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.table.into_iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a Mapping<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for Mapping<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display, S> fmt::Display for Mapping<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        f.write_str("}")
    }
}
