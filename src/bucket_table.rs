//! BucketTable: fixed-capacity separate-chaining engine shared by Mapping and Set.
//!
//! Entries live in a `SlotMap` arena. Every bucket head and every entry's
//! `next` field is an `Option<DefaultKey>`, and each entry is reachable from
//! exactly one of those links, so the arena plus the links form one owned
//! singly linked chain per bucket. `len` is the arena length, which keeps it
//! equal to the number of reachable entries by construction.

use crate::error::{TableError, Unhashable};
use crate::hashable::Hashable;
use core::borrow::Borrow;
use core::hash::{BuildHasher, BuildHasherDefault, Hasher};
use core::iter::FusedIterator;
use core::mem;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::DefaultHasher;

/// Bucket count used by `new()` and `empty()`.
pub const DEFAULT_CAPACITY: usize = 10;

/// Deterministic hasher: equal content inserted in the same order into tables
/// of equal capacity yields the same traversal order.
pub type DefaultHashBuilder = BuildHasherDefault<DefaultHasher>;

#[derive(Debug, Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
    next: Option<DefaultKey>,
}

#[derive(Clone)]
pub struct BucketTable<K, V, S = DefaultHashBuilder> {
    hasher: S,
    heads: Box<[Option<DefaultKey>]>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
}

impl<K, V, S> BucketTable<K, V, S> {
    /// Fails with `InvalidCapacity` for a zero bucket count.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self, TableError> {
        if capacity == 0 {
            return Err(TableError::InvalidCapacity(capacity));
        }
        Ok(Self {
            hasher,
            heads: vec![None; capacity].into_boxed_slice(),
            slots: SlotMap::with_key(),
        })
    }

    /// `DEFAULT_CAPACITY` buckets; cannot fail.
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            heads: vec![None; DEFAULT_CAPACITY].into_boxed_slice(),
            slots: SlotMap::with_key(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.heads.len()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Walks buckets in index order and each chain from head to tail.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            heads: &self.heads,
            slots: &self.slots,
            bucket: 0,
            cursor: None,
            remaining: self.slots.len(),
        }
    }

    /// Number of entries in each bucket's chain, by bucket index.
    pub fn chain_lengths(&self) -> Vec<usize> {
        self.heads
            .iter()
            .map(|head| {
                let mut n = 0;
                let mut link = *head;
                while let Some(id) = link {
                    n += 1;
                    link = self.slots[id].next;
                }
                n
            })
            .collect()
    }

    /// Builds a table of the same capacity and hasher from the entries for
    /// which `f` returns `Some`. Keys keep their stored hash and bucket, and
    /// chains keep their relative order, so nothing is rehashed.
    pub fn derive<W, E, F>(&self, mut f: F) -> Result<BucketTable<K, W, S>, E>
    where
        K: Clone,
        S: Clone,
        F: FnMut(&K, &V) -> Result<Option<W>, E>,
    {
        let mut out = BucketTable {
            hasher: self.hasher.clone(),
            heads: vec![None; self.capacity()].into_boxed_slice(),
            slots: SlotMap::with_key(),
        };
        for (bucket, head) in self.heads.iter().enumerate() {
            let mut tail: Option<DefaultKey> = None;
            let mut link = *head;
            while let Some(id) = link {
                let e = &self.slots[id];
                link = e.next;
                let Some(value) = f(&e.key, &e.value)? else {
                    continue;
                };
                let new_id = out.slots.insert(Entry {
                    key: e.key.clone(),
                    value,
                    hash: e.hash,
                    next: None,
                });
                match tail {
                    Some(t) => out.slots[t].next = Some(new_id),
                    None => out.heads[bucket] = Some(new_id),
                }
                tail = Some(new_id);
            }
        }
        Ok(out)
    }
}

impl<K, V, S> BucketTable<K, V, S>
where
    K: Hashable,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> Result<u64, Unhashable>
    where
        Q: ?Sized + Hashable,
    {
        let mut state = self.hasher.build_hasher();
        q.try_hash(&mut state)?;
        Ok(state.finish())
    }

    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.heads.len() as u64) as usize
    }

    /// Bucket index `key` maps to, or `UnhashableType`.
    pub fn index_of<Q>(&self, key: &Q) -> Result<usize, TableError>
    where
        Q: ?Sized + Hashable,
    {
        Ok(self.bucket_of(self.make_hash(key)?))
    }

    /// Appends a new entry at the tail of its chain, or replaces the payload of
    /// the entry with an equal key in place and returns the previous payload.
    /// The stored key is kept on replacement.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        let hash = self.make_hash(&key)?;
        let bucket = self.bucket_of(hash);

        let mut tail = None;
        let mut link = self.heads[bucket];
        while let Some(id) = link {
            let e = &mut self.slots[id];
            if e.hash == hash && e.key == key {
                return Ok(Some(mem::replace(&mut e.value, value)));
            }
            tail = Some(id);
            link = e.next;
        }

        let id = self.slots.insert(Entry {
            key,
            value,
            hash,
            next: None,
        });
        match tail {
            Some(t) => self.slots[t].next = Some(id),
            None => self.heads[bucket] = Some(id),
        }
        Ok(None)
    }

    /// Returns `(bucket, predecessor, entry)` for the entry matching `q`, or
    /// `UnhashableType` when `q` cannot be hashed.
    fn locate<Q>(
        &self,
        q: &Q,
    ) -> Result<Option<(usize, Option<DefaultKey>, DefaultKey)>, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hashable,
    {
        let hash = self.make_hash(q)?;
        let bucket = self.bucket_of(hash);

        let mut prev = None;
        let mut link = self.heads[bucket];
        while let Some(id) = link {
            let e = &self.slots[id];
            if e.hash == hash && e.key.borrow() == q {
                return Ok(Some((bucket, prev, id)));
            }
            prev = Some(id);
            link = e.next;
        }
        Ok(None)
    }

    pub fn contains_key<Q>(&self, q: &Q) -> Result<bool, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hashable,
    {
        Ok(self.locate(q)?.is_some())
    }

    pub fn get<Q>(&self, q: &Q) -> Result<Option<&V>, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hashable,
    {
        Ok(self.locate(q)?.map(|(_, _, id)| &self.slots[id].value))
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Result<Option<(&K, &V)>, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hashable,
    {
        Ok(self.locate(q)?.map(|(_, _, id)| {
            let e = &self.slots[id];
            (&e.key, &e.value)
        }))
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Result<Option<&mut V>, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hashable,
    {
        let Some((_, _, id)) = self.locate(q)? else {
            return Ok(None);
        };
        Ok(self.slots.get_mut(id).map(|e| &mut e.value))
    }

    /// Splices the matching entry out of its chain and returns it. A missing
    /// key is a no-op.
    pub fn remove<Q>(&mut self, q: &Q) -> Result<Option<(K, V)>, TableError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hashable,
    {
        let Some((bucket, prev, id)) = self.locate(q)? else {
            return Ok(None);
        };
        let Some(e) = self.slots.remove(id) else {
            return Ok(None);
        };
        match prev {
            Some(p) => self.slots[p].next = e.next,
            None => self.heads[bucket] = e.next,
        }
        Ok(Some((e.key, e.value)))
    }
}

/// Borrowing cursor over a table: current bucket index plus current chain
/// node. One pass only; call `iter()` again to restart.
pub struct Iter<'a, K, V> {
    heads: &'a [Option<DefaultKey>],
    slots: &'a SlotMap<DefaultKey, Entry<K, V>>,
    bucket: usize,
    cursor: Option<DefaultKey>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(id) = self.cursor {
                let e = &self.slots[id];
                self.cursor = e.next;
                self.remaining -= 1;
                return Some((&e.key, &e.value));
            }
            let head = self.heads.get(self.bucket)?;
            self.cursor = *head;
            self.bucket += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter { ..*self }
    }
}

/// Owning cursor; yields entries in the same order as `Iter`.
pub struct IntoIter<K, V> {
    heads: Box<[Option<DefaultKey>]>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
    bucket: usize,
    cursor: Option<DefaultKey>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(id) = self.cursor {
                let e = self.slots.remove(id)?;
                self.cursor = e.next;
                return Some((e.key, e.value));
            }
            let head = self.heads.get(self.bucket)?;
            self.cursor = *head;
            self.bucket += 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.slots.len(), Some(self.slots.len()))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V, S> IntoIterator for BucketTable<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            heads: self.heads,
            slots: self.slots,
            bucket: 0,
            cursor: None,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a BucketTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
