//! Grouping and per-key folds with suspending key selectors.
//!
//! Bucket discovery goes through [`AsyncBuckets`]; groups and accumulators
//! come out in first-seen key order. Element, result, seed and fold
//! functions stay immediate.

use std::future::Future;
use std::marker::PhantomData;

use futures::StreamExt;
use lazyq_core::error::Result;
use lazyq_operators::{Grouping, Seed};

use crate::comparer::AsyncEqualityComparer;
use crate::keys::{AsyncBuckets, AsyncKeyIndex};
use crate::sequence::{deferred, from_values, AsyncCursor, AsyncSequence};

impl<K, E: Clone> AsyncSequence for Grouping<K, E> {
    type Item = E;

    fn open(&self) -> AsyncCursor<'_, E> {
        from_values(self.elements().iter().cloned())
    }
}

#[derive(Clone)]
pub struct AsyncGroupBy<S, K, KFut, E, KF, EF, C> {
    pub(crate) source: S,
    pub(crate) key: KF,
    pub(crate) element: EF,
    pub(crate) comparer: C,
    pub(crate) _types: PhantomData<fn() -> (K, KFut, E)>,
}

impl<S, K, KFut, E, KF, EF, C> AsyncGroupBy<S, K, KFut, E, KF, EF, C>
where
    S: AsyncSequence,
    S::Item: Clone,
    KF: Fn(S::Item) -> KFut,
    KFut: Future<Output = K>,
    EF: Fn(S::Item) -> E,
    C: AsyncEqualityComparer<K>,
{
    async fn collect_buckets(&self) -> Result<AsyncBuckets<K, E, &C>> {
        let mut buckets = AsyncBuckets::new(&self.comparer);
        let mut items = self.source.open();
        while let Some(item) = items.next().await {
            let item = item?;
            let key = (self.key)(item.clone()).await;
            buckets.push(key, (self.element)(item)).await;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(groups = buckets.len(), path = ?buckets.path(), "grouped sequence");

        Ok(buckets)
    }
}

impl<S, K, KFut, E, KF, EF, C> AsyncSequence for AsyncGroupBy<S, K, KFut, E, KF, EF, C>
where
    S: AsyncSequence,
    S::Item: Clone,
    KF: Fn(S::Item) -> KFut,
    KFut: Future<Output = K>,
    EF: Fn(S::Item) -> E,
    C: AsyncEqualityComparer<K>,
{
    type Item = Grouping<K, E>;

    fn open(&self) -> AsyncCursor<'_, Grouping<K, E>> {
        deferred(move || async move {
            let buckets = self.collect_buckets().await?;
            Ok(from_values(
                buckets
                    .into_pairs()
                    .map(|(key, elements)| Grouping::new(key, elements)),
            ))
        })
    }
}

/// `group_by` with a result selector over `(key, bucket)`.
#[derive(Clone)]
pub struct AsyncGroupResult<S, K, KFut, E, KF, EF, RF, C> {
    pub(crate) groups: AsyncGroupBy<S, K, KFut, E, KF, EF, C>,
    pub(crate) result: RF,
}

impl<S, K, KFut, E, R, KF, EF, RF, C> AsyncSequence for AsyncGroupResult<S, K, KFut, E, KF, EF, RF, C>
where
    S: AsyncSequence,
    S::Item: Clone,
    KF: Fn(S::Item) -> KFut,
    KFut: Future<Output = K>,
    EF: Fn(S::Item) -> E,
    RF: Fn(K, Vec<E>) -> R,
    C: AsyncEqualityComparer<K>,
{
    type Item = R;

    fn open(&self) -> AsyncCursor<'_, R> {
        deferred(move || async move {
            let buckets = self.groups.collect_buckets().await?;
            let result = &self.result;
            Ok(from_values(
                buckets
                    .into_pairs()
                    .map(move |(key, elements)| result(key, elements)),
            ))
        })
    }
}

/// Yields `(key, accumulator)` in first-seen key order.
#[derive(Clone)]
pub struct AsyncAggregateBy<S, K, KFut, A, KF, SF, G, C> {
    pub(crate) source: S,
    pub(crate) key: KF,
    pub(crate) seed: Seed<A, SF>,
    pub(crate) fold: G,
    pub(crate) comparer: C,
    pub(crate) _key: PhantomData<fn() -> (K, KFut)>,
}

pub type AsyncCountBy<S, K, KFut, KF, C> = AsyncAggregateBy<
    S,
    K,
    KFut,
    usize,
    KF,
    fn(&K) -> usize,
    fn(usize, <S as AsyncSequence>::Item) -> usize,
    C,
>;

impl<S, K, KFut, A, KF, SF, G, C> AsyncSequence for AsyncAggregateBy<S, K, KFut, A, KF, SF, G, C>
where
    S: AsyncSequence,
    S::Item: Clone,
    KF: Fn(S::Item) -> KFut,
    KFut: Future<Output = K>,
    A: Clone,
    SF: Fn(&K) -> A,
    G: Fn(A, S::Item) -> A,
    C: AsyncEqualityComparer<K>,
{
    type Item = (K, A);

    fn open(&self) -> AsyncCursor<'_, (K, A)> {
        deferred(move || async move {
            let mut index = AsyncKeyIndex::new(&self.comparer);
            let mut totals: Vec<Option<A>> = Vec::new();
            let mut items = self.source.open();
            while let Some(item) = items.next().await {
                let item = item?;
                let (slot, fresh) = index.insert((self.key)(item.clone()).await).await;
                if fresh {
                    totals.push(Some(self.seed.make(&index.keys()[slot])));
                }
                if let Some(acc) = totals[slot].take() {
                    totals[slot] = Some((self.fold)(acc, item));
                }
            }

            #[cfg(feature = "tracing")]
            tracing::trace!(keys = index.len(), path = ?index.path(), "aggregated sequence");

            Ok(from_values(
                index
                    .into_keys()
                    .into_iter()
                    .zip(totals)
                    .filter_map(|(key, acc)| acc.map(|acc| (key, acc))),
            ))
        })
    }
}
