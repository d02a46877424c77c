#![cfg(test)]

// Property tests for BucketTable kept inside the crate so they do not
// require feature gates to access the internal module.

use crate::bucket_table::{BucketTable, DefaultHashBuilder};
use crate::error::Unhashable;
use crate::hashable::{Hashable, Nullable};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}
impl Nullable for Key {}
impl Hashable for Key {
    fn try_hash<H: Hasher>(&self, state: &mut H) -> Result<(), Unhashable> {
        // Must agree with `str` for borrowed lookups.
        self.0.as_str().try_hash(state)
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<OpI>)> {
    (1usize..=12, proptest::collection::vec("[a-z]{0,5}", 1..=8)).prop_flat_map(|(cap, pool)| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            idx.clone().prop_map(OpI::Remove),
            idx.clone().prop_map(OpI::Get),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (cap, pool.clone(), ops))
    })
}

fn run_state_machine<S: BuildHasher>(
    mut sut: BucketTable<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let capacity = sut.capacity();
    let mut model: HashMap<Key, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(&pool, i);
                let prev = sut.insert(k.clone(), v).expect("string keys hash");
                prop_assert_eq!(prev, model.insert(k, v));
            }
            OpI::Remove(i) => {
                let k = key_from(&pool, i);
                let removed = sut.remove(&k).expect("string keys hash");
                let expected = model.remove_entry(&k);
                prop_assert_eq!(removed, expected);
            }
            OpI::Get(i) => {
                let k = key_from(&pool, i);
                prop_assert_eq!(sut.get(&k).expect("string keys hash"), model.get(&k));
                prop_assert_eq!(
                    sut.get_key_value(&k).expect("string keys hash"),
                    model.get_key_value(&k)
                );
            }
            OpI::Contains(s) => {
                let has = sut.contains_key(s.as_str()).expect("string keys hash");
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(&pool, i);
                match (sut.get_mut(&k).expect("string keys hash"), model.get_mut(&k)) {
                    (Some(sv), Some(mv)) => {
                        *sv = sv.saturating_add(d);
                        *mv = mv.saturating_add(d);
                    }
                    (None, None) => {}
                    _ => prop_assert!(false, "presence mismatch for {:?}", k),
                }
            }
            OpI::Iterate => {
                let s_keys: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(s_keys, m_keys);
                prop_assert_eq!(sut.iter().count(), sut.len());
            }
        }

        // Post-conditions after each op
        // 1) Size parity, and size equals the number of reachable entries.
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.chain_lengths().iter().sum::<usize>(), sut.len());
        // 2) Capacity never changes.
        prop_assert_eq!(sut.capacity(), capacity);
        // 3) Every entry sits in the bucket its key hashes to.
        for (bucket, (k, _)) in bucket_of_each(&sut) {
            prop_assert_eq!(sut.index_of(k).expect("hashable"), bucket);
        }
    }
    Ok(())
}

// Pairs each entry with the bucket it was found in, walking chains in order.
fn bucket_of_each<S>(t: &BucketTable<Key, i32, S>) -> Vec<(usize, (&Key, &i32))> {
    let lengths = t.chain_lengths();
    let mut it = t.iter();
    let mut out = Vec::with_capacity(t.len());
    for (bucket, n) in lengths.into_iter().enumerate() {
        for _ in 0..n {
            if let Some(e) = it.next() {
                out.push((bucket, e));
            }
        }
    }
    out
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `insert` returns the replaced payload exactly when the model had the key.
// - `remove` returns the owned `(K, V)` matching the model; absent keys are a no-op.
// - `get`/`contains_key` parity, including borrowed `&str` lookups.
// - `len` equals the sum of chain lengths and the model's length after each op.
// - Capacity is immutable and every entry lives in its hash bucket.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((cap, pool, ops) in arb_scenario()) {
        let sut = BucketTable::with_capacity_and_hasher(cap, DefaultHashBuilder::default())
            .expect("positive capacity");
        run_state_machine(sut, pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior (constant hasher). Every entry shares bucket 0, so
// this stresses chain append, splice-out and equality scanning.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((cap, pool, ops) in arb_scenario()) {
        let sut = BucketTable::with_capacity_and_hasher(cap, ConstBuildHasher)
            .expect("positive capacity");
        run_state_machine(sut, pool, ops)?;
    }
}

// Property: chain order is first-insertion order. With a single bucket the
// traversal must equal the deduplicated insertion sequence.
proptest! {
    #[test]
    fn prop_single_bucket_keeps_insertion_order(keys in proptest::collection::vec(0u8..20, 0..40)) {
        let mut t: BucketTable<u8, (), _> =
            BucketTable::with_capacity_and_hasher(1, DefaultHashBuilder::default()).unwrap();
        let mut expected = Vec::new();
        for k in keys {
            if t.insert(k, ()).unwrap().is_none() {
                expected.push(k);
            }
        }
        let seen: Vec<u8> = t.iter().map(|(k, _)| *k).collect();
        prop_assert_eq!(seen, expected);
    }
}

#[test]
fn key_hash_matches_str() {
    let mut a = DefaultHashBuilder::default().build_hasher();
    let mut b = DefaultHashBuilder::default().build_hasher();
    Key("abc".into()).try_hash(&mut a).unwrap();
    "abc".hash(&mut b);
    assert_eq!(a.finish(), b.finish());
}
