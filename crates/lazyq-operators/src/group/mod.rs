//! Key-based grouping.
//!
//! Bucket discovery runs through [`crate::keys::Buckets`]: groups come out in
//! the order their keys were first seen, and keys are matched through the
//! supplied equality comparer (hash-keyed only for the default comparer).

pub mod aggregate;

use std::marker::PhantomData;

use lazyq_core::comparer::EqualityComparer;
use lazyq_core::sequence::{Cursor, Sequence};

use crate::keys::Buckets;

pub use aggregate::{AggregateBy, CountBy, Seed};

/// A key and the elements that share it.
///
/// A grouping owns its bucket, so it can be iterated any number of times,
/// also after the session that produced it is gone.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouping<K, E> {
    key: K,
    elements: Vec<E>,
}

impl<K, E> Grouping<K, E> {
    pub fn new(key: K, elements: Vec<E>) -> Self {
        Self { key, elements }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn elements(&self) -> &[E] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn into_parts(self) -> (K, Vec<E>) {
        (self.key, self.elements)
    }
}

impl<K, E: Clone> Sequence for Grouping<K, E> {
    type Item = E;

    fn open(&self) -> Cursor<'_, E> {
        Cursor::from_values(self.elements.iter().cloned())
    }
}

/// A materialized grouping with key lookup, built by `to_lookup`.
pub struct Lookup<K, E, C> {
    pub(crate) buckets: Buckets<K, E, C>,
}

impl<K, E, C: EqualityComparer<K>> Lookup<K, E, C> {
    /// Elements under `key`; empty when the key was never seen.
    pub fn get(&self, key: &K) -> &[E] {
        self.buckets.get(key).unwrap_or(&[])
    }

    pub fn contains(&self, key: &K) -> bool {
        self.buckets.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[E])> {
        self.buckets.iter()
    }

    pub fn into_groupings(self) -> Vec<Grouping<K, E>> {
        self.buckets
            .into_pairs()
            .map(|(key, elements)| Grouping::new(key, elements))
            .collect()
    }
}

/// `group_by` and its element-selector forms.
#[derive(Clone)]
pub struct GroupBy<S, K, E, KF, EF, C> {
    pub(crate) source: S,
    pub(crate) key: KF,
    pub(crate) element: EF,
    pub(crate) comparer: C,
    pub(crate) _types: PhantomData<fn() -> (K, E)>,
}

impl<S, K, E, KF, EF, C> GroupBy<S, K, E, KF, EF, C>
where
    S: Sequence,
    KF: Fn(&S::Item) -> K,
    EF: Fn(S::Item) -> E,
    C: EqualityComparer<K>,
{
    /// Drain one session of the source into ordered buckets.
    fn collect_buckets(&self) -> lazyq_core::Result<Buckets<K, E, &C>> {
        let mut buckets = Buckets::new(&self.comparer);
        for item in self.source.open() {
            let item = item?;
            let key = (self.key)(&item);
            buckets.push(key, (self.element)(item));
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(groups = buckets.len(), path = ?buckets.path(), "grouped sequence");

        Ok(buckets)
    }
}

impl<S, K, E, KF, EF, C> Sequence for GroupBy<S, K, E, KF, EF, C>
where
    S: Sequence,
    KF: Fn(&S::Item) -> K,
    EF: Fn(S::Item) -> E,
    C: EqualityComparer<K>,
{
    type Item = Grouping<K, E>;

    fn open(&self) -> Cursor<'_, Grouping<K, E>> {
        Cursor::deferred(move || {
            let buckets = self.collect_buckets()?;
            Ok(Cursor::from_values(
                buckets
                    .into_pairs()
                    .map(|(key, elements)| Grouping::new(key, elements)),
            ))
        })
    }
}

/// `group_by` with a result selector applied to every `(key, elements)`.
#[derive(Clone)]
pub struct GroupResult<S, K, E, KF, EF, RF, C> {
    pub(crate) groups: GroupBy<S, K, E, KF, EF, C>,
    pub(crate) result: RF,
}

impl<S, K, E, R, KF, EF, RF, C> Sequence for GroupResult<S, K, E, KF, EF, RF, C>
where
    S: Sequence,
    KF: Fn(&S::Item) -> K,
    EF: Fn(S::Item) -> E,
    RF: Fn(K, Vec<E>) -> R,
    C: EqualityComparer<K>,
{
    type Item = R;

    fn open(&self) -> Cursor<'_, R> {
        let result = &self.result;
        Cursor::new(self.groups.open().map(move |group| {
            group.map(|g| {
                let (key, elements) = g.into_parts();
                result(key, elements)
            })
        }))
    }
}
