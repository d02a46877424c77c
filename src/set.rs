//! Set: deduplicating collection over a fixed-capacity `BucketTable`, with a
//! best-effort mixed-type diagnostic.

use crate::bucket_table::{self, BucketTable, DefaultHashBuilder};
use crate::error::{MixedTypeWarning, TableError};
use crate::hashable::{Hashable, TypeTag};
use core::borrow::Borrow;
use core::convert::Infallible;
use core::fmt;
use core::hash::BuildHasher;
use core::iter::FusedIterator;

/// A set with a fixed number of buckets chosen at construction.
///
/// Elements are unique by `Eq`; re-adding an element is a no-op. The runtime
/// type of the first element ever accepted is remembered, and later elements
/// of another type are accepted with a [`MixedTypeWarning`].
#[derive(Clone)]
pub struct Set<T, S = DefaultHashBuilder> {
    table: BucketTable<T, (), S>,
    element_type: Option<TypeTag>,
}

impl<T: Hashable> Set<T> {
    /// Ten buckets, deterministic hasher.
    pub fn new() -> Self {
        Self::empty()
    }

    pub fn with_capacity(capacity: usize) -> Result<Self, TableError> {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }

    /// Builds a Set of default capacity from `values`. Warnings are logged
    /// and dropped.
    pub fn try_from_iter<I>(values: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut s = Self::new();
        s.from_sequence(values)?;
        Ok(s)
    }
}

impl<T, S> Set<T, S>
where
    T: Hashable,
    S: BuildHasher,
{
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self, TableError> {
        Ok(Self {
            table: BucketTable::with_capacity_and_hasher(capacity, hasher)?,
            element_type: None,
        })
    }

    /// A fresh Set with the default capacity.
    pub fn empty() -> Self
    where
        S: Default,
    {
        Self {
            table: BucketTable::with_hasher(S::default()),
            element_type: None,
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

    /// Runtime type of the first element ever accepted. Removing elements does
    /// not reset it.
    pub fn element_type(&self) -> Option<TypeTag> {
        self.element_type
    }

    /// Bucket `value` lands in. Null values are rejected before hashing.
    pub fn bucket_index<Q>(&self, value: &Q) -> Result<usize, TableError>
    where
        Q: ?Sized + Hashable,
    {
        if value.is_null() {
            return Err(TableError::InvalidValue);
        }
        self.table.index_of(value)
    }

    /// Adds `value` unless an equal element is present.
    ///
    /// Fails with `InvalidValue` or `UnhashableType`, leaving the Set
    /// unchanged. When `value`'s runtime type differs from the first accepted
    /// element's, it is still added and the warning is both logged and
    /// returned.
    pub fn add(&mut self, value: T) -> Result<Option<MixedTypeWarning>, TableError> {
        if value.is_null() {
            return Err(TableError::InvalidValue);
        }
        let found = value.type_tag();
        self.table.insert(value, ())?;

        match self.element_type {
            None => {
                self.element_type = Some(found);
                Ok(None)
            }
            Some(expected) if expected != found => {
                let warning = MixedTypeWarning { expected, found };
                log::warn!(target: "chain_hashmap::set", "{warning}");
                Ok(Some(warning))
            }
            Some(_) => Ok(None),
        }
    }

    /// Absent and null values are a no-op. Returns whether an element was
    /// removed; an unhashable value fails with `UnhashableType`.
    pub fn remove<Q>(&mut self, value: &Q) -> Result<bool, TableError>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hashable,
    {
        if value.is_null() {
            return Ok(false);
        }
        Ok(self.table.remove(value)?.is_some())
    }

    pub fn member<Q>(&self, value: &Q) -> Result<bool, TableError>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hashable,
    {
        if value.is_null() {
            return Ok(false);
        }
        self.table.contains_key(value)
    }

    /// Adds each value in order and collects the mixed-type warnings. Stops at
    /// the first error; values before it stay inserted.
    pub fn from_sequence<I>(&mut self, values: I) -> Result<Vec<MixedTypeWarning>, TableError>
    where
        I: IntoIterator<Item = T>,
    {
        let mut warnings = Vec::new();
        for v in values {
            warnings.extend(self.add(v)?);
        }
        Ok(warnings)
    }

    pub fn to_sequence(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.iter().cloned().collect()
    }

    /// Elements satisfying `predicate`, in a Set of the same capacity. The
    /// result's element type is that of its first element in traversal order.
    pub fn filter<P>(&self, mut predicate: P) -> Self
    where
        T: Clone,
        S: Clone,
        P: FnMut(&T) -> bool,
    {
        let derived = self
            .table
            .derive(|v, _| Ok::<_, Infallible>(predicate(v).then_some(())));
        let table = match derived {
            Ok(table) => table,
            Err(never) => match never {},
        };
        let element_type = table.iter().next().map(|(v, _)| v.type_tag());
        Self {
            table,
            element_type,
        }
    }

    /// Adds `f(v)` for every element into a Set of the same capacity. Inputs
    /// that map to equal outputs collapse into one element. A null or
    /// unhashable output fails as `add` would.
    pub fn map<U, F>(&self, mut f: F) -> Result<Set<U, S>, TableError>
    where
        U: Hashable,
        S: Clone,
        F: FnMut(&T) -> U,
    {
        let mut out = Set::with_capacity_and_hasher(self.capacity(), self.table.hasher().clone())?;
        for v in self.iter() {
            out.add(f(v))?;
        }
        Ok(out)
    }

    /// Left fold over the elements in traversal order.
    pub fn reduce<A, F>(&self, f: F, initial: A) -> A
    where
        F: FnMut(A, &T) -> A,
    {
        self.iter().fold(initial, f)
    }

    /// Elements of `self` then `other`, added into a fresh Set of `self`'s
    /// capacity. Membership does not depend on operand order; which
    /// mixed-type warnings get logged may.
    pub fn concat(&self, other: &Self) -> Result<Self, TableError>
    where
        T: Clone,
        S: Clone,
    {
        let mut out = Set::with_capacity_and_hasher(self.capacity(), self.table.hasher().clone())?;
        for v in self.iter().chain(other.iter()) {
            out.add(v.clone())?;
        }
        Ok(out)
    }

    /// Per-bucket chain lengths, by bucket index.
    pub fn chain_lengths(&self) -> Vec<usize> {
        self.table.chain_lengths()
    }
}

impl<T, S> Set<T, S> {
    /// One-pass cursor over the elements in traversal order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter(self.table.iter())
    }
}

impl<T, S> Default for Set<T, S>
where
    T: Hashable,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::empty()
    }
}

pub struct Iter<'a, T>(bucket_table::Iter<'a, T, ()>);

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(v, _)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

pub struct IntoIter<T>(bucket_table::IntoIter<T, ()>);

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(v, _)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

impl<T, S> IntoIterator for Set<T, S> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(self.table.into_iter())
    }
}

impl<'a, T, S> IntoIterator for &'a Set<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug, S> fmt::Debug for Set<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display, S> fmt::Display for Set<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    /// Per-thread log capture; each test runs on its own thread, so records
    /// from concurrently running tests do not mix.
    mod capture {
        use std::cell::RefCell;
        use std::sync::Once;

        thread_local! {
            static RECORDS: RefCell<Vec<(String, log::Level, String)>> = RefCell::new(Vec::new());
        }

        struct ThreadCapture;

        impl log::Log for ThreadCapture {
            fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
                true
            }

            fn log(&self, record: &log::Record<'_>) {
                let entry = (
                    record.target().to_string(),
                    record.level(),
                    record.args().to_string(),
                );
                RECORDS.with(|r| r.borrow_mut().push(entry));
            }

            fn flush(&self) {}
        }

        static LOGGER: ThreadCapture = ThreadCapture;
        static INIT: Once = Once::new();

        pub fn install() {
            INIT.call_once(|| {
                let _ = log::set_logger(&LOGGER);
                log::set_max_level(log::LevelFilter::Warn);
            });
        }

        pub fn take() -> Vec<(String, log::Level, String)> {
            RECORDS.with(|r| r.take())
        }
    }

    fn sorted<T: Hashable + Ord + Clone>(s: &Set<T>) -> Vec<T> {
        let mut v = s.to_sequence();
        v.sort();
        v
    }

    #[test]
    fn add_deduplicates() {
        let mut s = Set::new();
        s.add(1).unwrap();
        s.add(2).unwrap();
        s.add(1).unwrap();
        assert_eq!(s.size(), 2);
        assert_eq!(s.member(&1), Ok(true));
        assert_eq!(s.member(&3), Ok(false));
    }

    #[test]
    fn remove_reports_presence() {
        let mut s = Set::try_from_iter([1, 2]).unwrap();
        assert_eq!(s.remove(&1), Ok(true));
        assert_eq!(s.remove(&1), Ok(false));
        assert_eq!(s.member(&1), Ok(false));
        assert_eq!(s.member(&2), Ok(true));
        assert_eq!(s.size(), 1);
    }

    /// Invariant: a value whose runtime type differs from the first accepted
    /// element is inserted and flagged, never rejected.
    #[test]
    fn mixed_types_warn_but_insert() {
        let mut s: Set<Value> = Set::new();
        assert_eq!(s.add(42.into()).unwrap(), None);
        let w = s.add("hello".into()).unwrap().expect("warning");
        assert_eq!(w.expected.name(), "int");
        assert_eq!(w.found.name(), "str");
        assert!(w.to_string().contains("Mixed types"));
        assert_eq!(s.member(&Value::from("hello")), Ok(true));
        assert_eq!(s.size(), 2);
    }

    /// Invariant: the baseline stays the first-ever type, even after a run of
    /// other-typed elements and after the first element is removed.
    #[test]
    fn baseline_is_first_ever_type() {
        let mut s: Set<Value> = Set::new();
        s.add(1.into()).unwrap();
        assert!(s.add("a".into()).unwrap().is_some());
        assert!(s.add("b".into()).unwrap().is_some());
        s.remove(&Value::Int(1)).unwrap();
        assert!(s.add("c".into()).unwrap().is_some());
        assert!(s.add(2.into()).unwrap().is_none());
        assert_eq!(s.element_type(), Some(TypeTag::new("int")));
    }

    #[test]
    fn rejected_values_do_not_set_baseline() {
        let mut s: Set<Value> = Set::new();
        assert_eq!(s.add(Value::Null), Err(TableError::InvalidValue));
        assert!(matches!(
            s.add(Value::List(vec![])),
            Err(TableError::UnhashableType(_))
        ));
        assert_eq!(s.element_type(), None);
        assert!(s.is_empty());
        assert_eq!(s.member(&Value::Null), Ok(false));
        assert_eq!(s.remove(&Value::Null), Ok(false));
    }

    /// Invariant: membership and removal hash their argument first, so an
    /// unhashable value fails and the Set is left unchanged.
    #[test]
    fn unhashable_lookup_rejected() {
        let mut s: Set<Value> = Set::try_from_iter([Value::from(1)]).unwrap();
        let list = Value::List(vec![Value::from(1)]);
        assert!(matches!(
            s.member(&list),
            Err(TableError::UnhashableType(t)) if t.name() == "list"
        ));
        assert!(matches!(s.remove(&list), Err(TableError::UnhashableType(_))));
        assert_eq!(s.size(), 1);
        assert_eq!(s.member(&Value::from(1)), Ok(true));
    }

    /// Invariant: a null value is rejected with `InvalidValue` before hashing,
    /// and `bucket_index` names the bucket an added element actually lands in.
    #[test]
    fn bucket_index_matches_placement() {
        let mut s: Set<Value> = Set::with_capacity(4).unwrap();
        assert_eq!(s.bucket_index(&Value::Null), Err(TableError::InvalidValue));
        assert!(matches!(
            s.bucket_index(&Value::List(vec![])),
            Err(TableError::UnhashableType(_))
        ));

        s.add(Value::from("only")).unwrap();
        let bucket = s.bucket_index(&Value::from("only")).unwrap();
        let lengths = s.chain_lengths();
        assert_eq!(lengths[bucket], 1);
        assert_eq!(lengths.iter().sum::<usize>(), 1);
    }

    /// Invariant: `Bool` and `Int` are different element types, so `true`
    /// joins a Set holding `1` as a separate element and is flagged.
    #[test]
    fn bool_is_distinct_from_int() {
        let mut s: Set<Value> = Set::try_from_iter([Value::Int(1)]).unwrap();
        let w = s.add(Value::Bool(true)).unwrap().expect("warning");
        assert_eq!(w.found.name(), "bool");
        assert_eq!(s.size(), 2);
    }

    /// Invariant: the diagnostic is emitted once per mixed-type add, as a
    /// warning under the Set's log target.
    #[test]
    fn mixed_type_warning_is_logged() {
        capture::install();
        capture::take();

        let mut s: Set<Value> = Set::new();
        s.add(1.into()).unwrap();
        s.add(2.into()).unwrap();
        assert!(capture::take().is_empty());

        s.add("two".into()).unwrap();
        let records = capture::take();
        assert_eq!(records.len(), 1);
        let (target, level, message) = &records[0];
        assert_eq!(target, "chain_hashmap::set");
        assert_eq!(*level, log::Level::Warn);
        assert!(message.contains("Mixed types"));
        assert!(message.contains("str"));
    }

    #[test]
    fn from_sequence_collects_warnings() {
        let mut s: Set<Value> = Set::new();
        let w = s
            .from_sequence([Value::from(1), Value::from("x"), Value::from(2), Value::from("y")])
            .unwrap();
        assert_eq!(w.len(), 2);
        assert_eq!(s.size(), 4);
    }

    #[test]
    fn filter_map_reduce() {
        let s = Set::try_from_iter([1, 2, 3, 4, 5]).unwrap();
        assert_eq!(sorted(&s.filter(|x| x % 2 == 0)), vec![2, 4]);
        assert_eq!(sorted(&s.map(|x| x * 2).unwrap()), vec![2, 4, 6, 8, 10]);
        assert_eq!(s.reduce(|acc, x| acc + x, 0), 15);
    }

    /// Invariant: distinct inputs that map to the same output collapse.
    #[test]
    fn map_collapses_equal_outputs() {
        let s = Set::try_from_iter([1, 2, 3, 4]).unwrap();
        let parity = s.map(|x| x % 2).unwrap();
        assert_eq!(parity.size(), 2);
        assert_eq!(parity.capacity(), s.capacity());
    }

    #[test]
    fn map_to_null_or_unhashable_fails() {
        let s: Set<Value> = Set::try_from_iter([Value::from(1)]).unwrap();
        assert!(matches!(s.map(|_| Value::Null), Err(TableError::InvalidValue)));
        assert!(matches!(
            s.map(|v| Value::List(vec![v.clone()])),
            Err(TableError::UnhashableType(_))
        ));
    }

    #[test]
    fn concat_unions_membership() {
        let a = Set::try_from_iter([1, 2, 3]).unwrap();
        let b = Set::try_from_iter([3, 4, 5]).unwrap();
        assert_eq!(sorted(&a.concat(&b).unwrap()), vec![1, 2, 3, 4, 5]);
        assert_eq!(sorted(&b.concat(&a).unwrap()), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn empty_iteration_ends_immediately() {
        let s: Set<i32> = Set::empty();
        let mut it = s.iter();
        assert!(it.next().is_none());
        assert_eq!(s.to_string(), "{}");
    }

    #[test]
    fn display_single_bucket_order() {
        let mut s: Set<i32> = Set::with_capacity(1).unwrap();
        s.from_sequence([3, 1, 2]).unwrap();
        assert_eq!(s.to_string(), "{3, 1, 2}");
        assert_eq!(format!("{s:?}"), "{3, 1, 2}");
    }
}
