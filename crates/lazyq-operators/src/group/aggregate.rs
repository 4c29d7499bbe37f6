//! Per-key folds: `aggregate_by` and `count_by`.

use std::marker::PhantomData;

use lazyq_core::comparer::EqualityComparer;
use lazyq_core::sequence::{Cursor, Sequence};

use crate::keys::KeyIndex;

/// Starting accumulator for each key.
#[derive(Debug, Clone)]
pub enum Seed<A, SF> {
    /// Cloned once per distinct key.
    Value(A),
    /// Called with the key the first time it is seen.
    Factory(SF),
}

impl<A: Clone, SF> Seed<A, SF> {
    /// Initial accumulator for `key`.
    pub fn make<K>(&self, key: &K) -> A
    where
        SF: Fn(&K) -> A,
    {
        match self {
            Seed::Value(value) => value.clone(),
            Seed::Factory(factory) => factory(key),
        }
    }
}

/// Yields `(key, accumulator)` in first-seen key order.
#[derive(Clone)]
pub struct AggregateBy<S, K, A, KF, SF, G, C> {
    pub(crate) source: S,
    pub(crate) key: KF,
    pub(crate) seed: Seed<A, SF>,
    pub(crate) fold: G,
    pub(crate) comparer: C,
    pub(crate) _key: PhantomData<fn() -> K>,
}

/// `count_by` is a fold that adds one per element.
pub type CountBy<S, K, KF, C> =
    AggregateBy<S, K, usize, KF, fn(&K) -> usize, fn(usize, <S as Sequence>::Item) -> usize, C>;

pub(crate) fn count_one<T>(n: usize, _: T) -> usize {
    n + 1
}

impl<S, K, A, KF, SF, G, C> Sequence for AggregateBy<S, K, A, KF, SF, G, C>
where
    S: Sequence,
    KF: Fn(&S::Item) -> K,
    A: Clone,
    SF: Fn(&K) -> A,
    G: Fn(A, S::Item) -> A,
    C: EqualityComparer<K>,
{
    type Item = (K, A);

    fn open(&self) -> Cursor<'_, (K, A)> {
        Cursor::deferred(move || {
            let mut index = KeyIndex::new(&self.comparer);
            // `None` only while an accumulator is handed to `fold`.
            let mut totals: Vec<Option<A>> = Vec::new();
            for item in self.source.open() {
                let item = item?;
                let (slot, fresh) = index.insert((self.key)(&item));
                if fresh {
                    totals.push(Some(self.seed.make(&index.keys()[slot])));
                }
                if let Some(acc) = totals[slot].take() {
                    totals[slot] = Some((self.fold)(acc, item));
                }
            }

            #[cfg(feature = "tracing")]
            tracing::trace!(keys = index.len(), path = ?index.path(), "aggregated sequence");

            Ok(Cursor::from_values(
                index
                    .into_keys()
                    .into_iter()
                    .zip(totals)
                    .filter_map(|(key, acc)| acc.map(|acc| (key, acc))),
            ))
        })
    }
}
