//! Set algebra with suspending keys and comparers.
//!
//! Each session gets its own [`AsyncKeyIndex`]. Seeding the second sequence
//! is deferred to the first poll, and a stream that stops being polled stops
//! seeding too.

use std::future::Future;
use std::marker::PhantomData;

use futures::stream::{self, StreamExt};
use lazyq_core::error::Result;

use crate::comparer::AsyncEqualityComparer;
use crate::keys::AsyncKeyIndex;
use crate::sequence::{cursor, deferred, AsyncCursor, AsyncSequence};

/// How a streamed key is checked against the session's index.
#[derive(Debug, Clone, Copy)]
enum Admit {
    /// Keep the first occurrence and remember it.
    FirstSeen,
    Present,
}

impl Admit {
    async fn check<K, C>(self, index: &mut AsyncKeyIndex<K, C>, key: K) -> bool
    where
        C: AsyncEqualityComparer<K>,
    {
        match self {
            Admit::FirstSeen => index.insert(key).await.1,
            Admit::Present => index.contains(&key).await,
        }
    }
}

/// Stream `items`, keeping those whose key passes `admit`.
fn screen<'a, T, K, KF, KFut, C>(
    items: AsyncCursor<'a, T>,
    key: &'a KF,
    index: AsyncKeyIndex<K, C>,
    admit: Admit,
) -> AsyncCursor<'a, T>
where
    T: Clone + 'a,
    K: 'a,
    KF: Fn(T) -> KFut,
    KFut: Future<Output = K> + 'a,
    C: AsyncEqualityComparer<K> + 'a,
{
    cursor(stream::unfold((items, index), move |(mut items, mut index)| async move {
        while let Some(item) = items.next().await {
            match item {
                Ok(value) => {
                    let k = key(value.clone()).await;
                    if admit.check(&mut index, k).await {
                        return Some((Ok(value), (items, index)));
                    }
                }
                Err(e) => return Some((Err(e), (items, index))),
            }
        }
        None
    }))
}

/// Membership of every key of one session of `source`.
async fn seed<'a, S, K, KF, KFut, C>(
    source: &'a S,
    key: &KF,
    comparer: &'a C,
) -> Result<AsyncKeyIndex<K, &'a C>>
where
    S: AsyncSequence,
    KF: Fn(S::Item) -> KFut,
    KFut: Future<Output = K>,
    C: AsyncEqualityComparer<K>,
{
    let mut index = AsyncKeyIndex::new(comparer);
    let mut items = source.open();
    while let Some(item) = items.next().await {
        index.insert(key(item?).await).await;
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(keys = index.len(), path = ?index.path(), "seeded membership");

    Ok(index)
}

#[derive(Clone)]
pub struct AsyncDistinct<S, K, KF, KFut, C> {
    pub(crate) source: S,
    pub(crate) key: KF,
    pub(crate) comparer: C,
    pub(crate) _key: PhantomData<fn() -> (K, KFut)>,
}

impl<S, K, KF, KFut, C> AsyncSequence for AsyncDistinct<S, K, KF, KFut, C>
where
    S: AsyncSequence,
    S::Item: Clone,
    KF: Fn(S::Item) -> KFut,
    KFut: Future<Output = K>,
    C: AsyncEqualityComparer<K>,
{
    type Item = S::Item;

    fn open(&self) -> AsyncCursor<'_, S::Item> {
        let seen = AsyncKeyIndex::new(&self.comparer);
        screen(self.source.open(), &self.key, seen, Admit::FirstSeen)
    }
}

macro_rules! binary_set_op {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone)]
        pub struct $name<A, B, K, KF, KFut, C> {
            pub(crate) first: A,
            pub(crate) second: B,
            pub(crate) key: KF,
            pub(crate) comparer: C,
            pub(crate) _key: PhantomData<fn() -> (K, KFut)>,
        }
    };
}

binary_set_op!(AsyncExcept);
binary_set_op!(
    /// Duplicates in the first sequence all pass.
    AsyncIntersect
);
binary_set_op!(AsyncUnion);
binary_set_op!(
    /// Symmetric difference: `first - second`, then `second - first`.
    /// Each pass drops repeats like `except` does.
    AsyncExclusive
);

impl<A, B, K, KF, KFut, C> AsyncSequence for AsyncExcept<A, B, K, KF, KFut, C>
where
    A: AsyncSequence,
    A::Item: Clone,
    B: AsyncSequence<Item = A::Item>,
    KF: Fn(A::Item) -> KFut,
    KFut: Future<Output = K>,
    C: AsyncEqualityComparer<K>,
{
    type Item = A::Item;

    fn open(&self) -> AsyncCursor<'_, A::Item> {
        deferred(move || async move {
            let seen = seed(&self.second, &self.key, &self.comparer).await?;
            Ok(screen(self.first.open(), &self.key, seen, Admit::FirstSeen))
        })
    }
}

impl<A, B, K, KF, KFut, C> AsyncSequence for AsyncIntersect<A, B, K, KF, KFut, C>
where
    A: AsyncSequence,
    A::Item: Clone,
    B: AsyncSequence<Item = A::Item>,
    KF: Fn(A::Item) -> KFut,
    KFut: Future<Output = K>,
    C: AsyncEqualityComparer<K>,
{
    type Item = A::Item;

    fn open(&self) -> AsyncCursor<'_, A::Item> {
        deferred(move || async move {
            let present = seed(&self.second, &self.key, &self.comparer).await?;
            Ok(screen(self.first.open(), &self.key, present, Admit::Present))
        })
    }
}

impl<A, B, K, KF, KFut, C> AsyncSequence for AsyncUnion<A, B, K, KF, KFut, C>
where
    A: AsyncSequence,
    A::Item: Clone,
    B: AsyncSequence<Item = A::Item>,
    KF: Fn(A::Item) -> KFut,
    KFut: Future<Output = K>,
    C: AsyncEqualityComparer<K>,
{
    type Item = A::Item;

    fn open(&self) -> AsyncCursor<'_, A::Item> {
        let both = self.first.open().chain(self.second.open()).boxed_local();
        let seen = AsyncKeyIndex::new(&self.comparer);
        screen(both, &self.key, seen, Admit::FirstSeen)
    }
}

impl<A, B, K, KF, KFut, C> AsyncSequence for AsyncExclusive<A, B, K, KF, KFut, C>
where
    A: AsyncSequence,
    A::Item: Clone,
    B: AsyncSequence<Item = A::Item>,
    KF: Fn(A::Item) -> KFut,
    KFut: Future<Output = K>,
    C: AsyncEqualityComparer<K>,
{
    type Item = A::Item;

    fn open(&self) -> AsyncCursor<'_, A::Item> {
        let left = deferred(move || async move {
            let right_keys = seed(&self.second, &self.key, &self.comparer).await?;
            Ok(screen(self.first.open(), &self.key, right_keys, Admit::FirstSeen))
        });
        let right = deferred(move || async move {
            let left_keys = seed(&self.first, &self.key, &self.comparer).await?;
            Ok(screen(self.second.open(), &self.key, left_keys, Admit::FirstSeen))
        });
        cursor(left.chain(right))
    }
}
