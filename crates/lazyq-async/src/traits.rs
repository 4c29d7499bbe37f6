//! The suspending combinator surface.
//!
//! Method names match `lazyq_operators::QueryExt`; key selectors take an
//! owned copy of the element and return a future. Element, result, seed
//! and fold functions are immediate. Terminals return boxed local futures.

use std::future::Future;
use std::hash::Hash;
use std::marker::PhantomData;

use futures::future::{self, FutureExt, LocalBoxFuture, Ready};
use futures::StreamExt;
use lazyq_core::comparer::{DefaultEquality, DefaultOrder};
use lazyq_core::error::{Error, Result};
use lazyq_operators::{InnerMatch, Seed};

use crate::comparer::{AsyncEqualityComparer, AsyncOrderComparer};
use crate::group::{AsyncAggregateBy, AsyncCountBy, AsyncGroupBy, AsyncGroupResult};
use crate::join::{AsyncGroupJoin, AsyncJoin};
use crate::sequence::{collect, AsyncSequence};
use crate::set::{AsyncDistinct, AsyncExcept, AsyncExclusive, AsyncIntersect, AsyncUnion};
use crate::sort::AsyncOrderedSequence;

type SelfKey<T> = fn(T) -> Ready<T>;
type SelfElement<T> = fn(T) -> T;

fn count_one<T>(n: usize, _: T) -> usize {
    n + 1
}

pub trait AsyncQueryExt: AsyncSequence + Sized {
    // ---- terminals ----

    fn to_vec(&self) -> LocalBoxFuture<'_, Result<Vec<Self::Item>>> {
        collect(self.open()).boxed_local()
    }

    fn count(&self) -> LocalBoxFuture<'_, Result<usize>> {
        async move {
            let mut items = self.open();
            let mut n = 0;
            while let Some(item) = items.next().await {
                item?;
                n += 1;
            }
            Ok(n)
        }
        .boxed_local()
    }

    /// First element; [`Error::NoElements`] on an empty sequence.
    fn first(&self) -> LocalBoxFuture<'_, Result<Self::Item>> {
        async move {
            match self.open().next().await {
                Some(item) => item,
                None => Err(Error::NoElements),
            }
        }
        .boxed_local()
    }

    // ---- ordering ----

    fn order_by<'q, K, F, Fut>(self, selector: F) -> AsyncOrderedSequence<'q, Self>
    where
        Self::Item: Clone,
        F: Fn(Self::Item) -> Fut + 'q,
        Fut: Future<Output = K> + 'q,
        K: Ord + 'q,
    {
        AsyncOrderedSequence::new(self, selector, DefaultOrder, false)
    }

    fn order_by_with<'q, K, F, Fut, C>(self, selector: F, comparer: C) -> AsyncOrderedSequence<'q, Self>
    where
        Self::Item: Clone,
        F: Fn(Self::Item) -> Fut + 'q,
        Fut: Future<Output = K> + 'q,
        C: AsyncOrderComparer<K> + 'q,
        K: 'q,
    {
        AsyncOrderedSequence::new(self, selector, comparer, false)
    }

    fn order_by_descending<'q, K, F, Fut>(self, selector: F) -> AsyncOrderedSequence<'q, Self>
    where
        Self::Item: Clone,
        F: Fn(Self::Item) -> Fut + 'q,
        Fut: Future<Output = K> + 'q,
        K: Ord + 'q,
    {
        AsyncOrderedSequence::new(self, selector, DefaultOrder, true)
    }

    fn order_by_descending_with<'q, K, F, Fut, C>(
        self,
        selector: F,
        comparer: C,
    ) -> AsyncOrderedSequence<'q, Self>
    where
        Self::Item: Clone,
        F: Fn(Self::Item) -> Fut + 'q,
        Fut: Future<Output = K> + 'q,
        C: AsyncOrderComparer<K> + 'q,
        K: 'q,
    {
        AsyncOrderedSequence::new(self, selector, comparer, true)
    }

    // ---- grouping ----

    fn group_by<K, KF, KFut>(
        self,
        key: KF,
    ) -> AsyncGroupBy<Self, K, KFut, Self::Item, KF, SelfElement<Self::Item>, DefaultEquality>
    where
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        K: Eq + Hash,
    {
        self.group_by_with(key, DefaultEquality)
    }

    fn group_by_with<K, KF, KFut, C>(
        self,
        key: KF,
        comparer: C,
    ) -> AsyncGroupBy<Self, K, KFut, Self::Item, KF, SelfElement<Self::Item>, C>
    where
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        C: AsyncEqualityComparer<K>,
    {
        self.group_by_elements(key, std::convert::identity as SelfElement<Self::Item>, comparer)
    }

    fn group_by_elements<K, E, KF, KFut, EF, C>(
        self,
        key: KF,
        element: EF,
        comparer: C,
    ) -> AsyncGroupBy<Self, K, KFut, E, KF, EF, C>
    where
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        EF: Fn(Self::Item) -> E,
        C: AsyncEqualityComparer<K>,
    {
        AsyncGroupBy {
            source: self,
            key,
            element,
            comparer,
            _types: PhantomData,
        }
    }

    fn group_by_result<K, E, R, KF, KFut, EF, RF, C>(
        self,
        key: KF,
        element: EF,
        result: RF,
        comparer: C,
    ) -> AsyncGroupResult<Self, K, KFut, E, KF, EF, RF, C>
    where
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        EF: Fn(Self::Item) -> E,
        RF: Fn(K, Vec<E>) -> R,
        C: AsyncEqualityComparer<K>,
    {
        AsyncGroupResult {
            groups: self.group_by_elements(key, element, comparer),
            result,
        }
    }

    fn aggregate_by<K, A, KF, KFut, G>(
        self,
        key: KF,
        seed: A,
        fold: G,
    ) -> AsyncAggregateBy<Self, K, KFut, A, KF, fn(&K) -> A, G, DefaultEquality>
    where
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        K: Eq + Hash,
        A: Clone,
        G: Fn(A, Self::Item) -> A,
    {
        AsyncAggregateBy {
            source: self,
            key,
            seed: Seed::Value(seed),
            fold,
            comparer: DefaultEquality,
            _key: PhantomData,
        }
    }

    fn aggregate_by_with<K, A, KF, KFut, SF, G, C>(
        self,
        key: KF,
        seed: SF,
        fold: G,
        comparer: C,
    ) -> AsyncAggregateBy<Self, K, KFut, A, KF, SF, G, C>
    where
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        SF: Fn(&K) -> A,
        A: Clone,
        G: Fn(A, Self::Item) -> A,
        C: AsyncEqualityComparer<K>,
    {
        AsyncAggregateBy {
            source: self,
            key,
            seed: Seed::Factory(seed),
            fold,
            comparer,
            _key: PhantomData,
        }
    }

    fn count_by<K, KF, KFut>(self, key: KF) -> AsyncCountBy<Self, K, KFut, KF, DefaultEquality>
    where
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        K: Eq + Hash,
    {
        self.count_by_with(key, DefaultEquality)
    }

    fn count_by_with<K, KF, KFut, C>(self, key: KF, comparer: C) -> AsyncCountBy<Self, K, KFut, KF, C>
    where
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        C: AsyncEqualityComparer<K>,
    {
        AsyncAggregateBy {
            source: self,
            key,
            seed: Seed::Value(0),
            fold: count_one,
            comparer,
            _key: PhantomData,
        }
    }

    // ---- set algebra ----

    fn distinct(
        self,
    ) -> AsyncDistinct<Self, Self::Item, SelfKey<Self::Item>, Ready<Self::Item>, DefaultEquality>
    where
        Self::Item: Clone + Eq + Hash,
    {
        self.distinct_with(DefaultEquality)
    }

    fn distinct_with<C>(
        self,
        comparer: C,
    ) -> AsyncDistinct<Self, Self::Item, SelfKey<Self::Item>, Ready<Self::Item>, C>
    where
        Self::Item: Clone,
        C: AsyncEqualityComparer<Self::Item>,
    {
        self.distinct_by_with(future::ready as SelfKey<Self::Item>, comparer)
    }

    fn distinct_by<K, KF, KFut>(self, key: KF) -> AsyncDistinct<Self, K, KF, KFut, DefaultEquality>
    where
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        K: Eq + Hash,
    {
        self.distinct_by_with(key, DefaultEquality)
    }

    fn distinct_by_with<K, KF, KFut, C>(self, key: KF, comparer: C) -> AsyncDistinct<Self, K, KF, KFut, C>
    where
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        C: AsyncEqualityComparer<K>,
    {
        AsyncDistinct {
            source: self,
            key,
            comparer,
            _key: PhantomData,
        }
    }

    fn except<B>(
        self,
        other: B,
    ) -> AsyncExcept<Self, B, Self::Item, SelfKey<Self::Item>, Ready<Self::Item>, DefaultEquality>
    where
        B: AsyncSequence<Item = Self::Item>,
        Self::Item: Clone + Eq + Hash,
    {
        self.except_by_with(other, future::ready as SelfKey<Self::Item>, DefaultEquality)
    }

    fn except_with<B, C>(
        self,
        other: B,
        comparer: C,
    ) -> AsyncExcept<Self, B, Self::Item, SelfKey<Self::Item>, Ready<Self::Item>, C>
    where
        B: AsyncSequence<Item = Self::Item>,
        Self::Item: Clone,
        C: AsyncEqualityComparer<Self::Item>,
    {
        self.except_by_with(other, future::ready as SelfKey<Self::Item>, comparer)
    }

    fn except_by<B, K, KF, KFut>(self, other: B, key: KF) -> AsyncExcept<Self, B, K, KF, KFut, DefaultEquality>
    where
        B: AsyncSequence<Item = Self::Item>,
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        K: Eq + Hash,
    {
        self.except_by_with(other, key, DefaultEquality)
    }

    fn except_by_with<B, K, KF, KFut, C>(
        self,
        other: B,
        key: KF,
        comparer: C,
    ) -> AsyncExcept<Self, B, K, KF, KFut, C>
    where
        B: AsyncSequence<Item = Self::Item>,
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        C: AsyncEqualityComparer<K>,
    {
        AsyncExcept {
            first: self,
            second: other,
            key,
            comparer,
            _key: PhantomData,
        }
    }

    fn intersect<B>(
        self,
        other: B,
    ) -> AsyncIntersect<Self, B, Self::Item, SelfKey<Self::Item>, Ready<Self::Item>, DefaultEquality>
    where
        B: AsyncSequence<Item = Self::Item>,
        Self::Item: Clone + Eq + Hash,
    {
        self.intersect_by_with(other, future::ready as SelfKey<Self::Item>, DefaultEquality)
    }

    fn intersect_with<B, C>(
        self,
        other: B,
        comparer: C,
    ) -> AsyncIntersect<Self, B, Self::Item, SelfKey<Self::Item>, Ready<Self::Item>, C>
    where
        B: AsyncSequence<Item = Self::Item>,
        Self::Item: Clone,
        C: AsyncEqualityComparer<Self::Item>,
    {
        self.intersect_by_with(other, future::ready as SelfKey<Self::Item>, comparer)
    }

    fn intersect_by<B, K, KF, KFut>(
        self,
        other: B,
        key: KF,
    ) -> AsyncIntersect<Self, B, K, KF, KFut, DefaultEquality>
    where
        B: AsyncSequence<Item = Self::Item>,
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        K: Eq + Hash,
    {
        self.intersect_by_with(other, key, DefaultEquality)
    }

    fn intersect_by_with<B, K, KF, KFut, C>(
        self,
        other: B,
        key: KF,
        comparer: C,
    ) -> AsyncIntersect<Self, B, K, KF, KFut, C>
    where
        B: AsyncSequence<Item = Self::Item>,
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        C: AsyncEqualityComparer<K>,
    {
        AsyncIntersect {
            first: self,
            second: other,
            key,
            comparer,
            _key: PhantomData,
        }
    }

    fn union<B>(
        self,
        other: B,
    ) -> AsyncUnion<Self, B, Self::Item, SelfKey<Self::Item>, Ready<Self::Item>, DefaultEquality>
    where
        B: AsyncSequence<Item = Self::Item>,
        Self::Item: Clone + Eq + Hash,
    {
        self.union_by_with(other, future::ready as SelfKey<Self::Item>, DefaultEquality)
    }

    fn union_with<B, C>(
        self,
        other: B,
        comparer: C,
    ) -> AsyncUnion<Self, B, Self::Item, SelfKey<Self::Item>, Ready<Self::Item>, C>
    where
        B: AsyncSequence<Item = Self::Item>,
        Self::Item: Clone,
        C: AsyncEqualityComparer<Self::Item>,
    {
        self.union_by_with(other, future::ready as SelfKey<Self::Item>, comparer)
    }

    fn union_by<B, K, KF, KFut>(self, other: B, key: KF) -> AsyncUnion<Self, B, K, KF, KFut, DefaultEquality>
    where
        B: AsyncSequence<Item = Self::Item>,
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        K: Eq + Hash,
    {
        self.union_by_with(other, key, DefaultEquality)
    }

    fn union_by_with<B, K, KF, KFut, C>(
        self,
        other: B,
        key: KF,
        comparer: C,
    ) -> AsyncUnion<Self, B, K, KF, KFut, C>
    where
        B: AsyncSequence<Item = Self::Item>,
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        C: AsyncEqualityComparer<K>,
    {
        AsyncUnion {
            first: self,
            second: other,
            key,
            comparer,
            _key: PhantomData,
        }
    }

    fn exclusive<B>(
        self,
        other: B,
    ) -> AsyncExclusive<Self, B, Self::Item, SelfKey<Self::Item>, Ready<Self::Item>, DefaultEquality>
    where
        B: AsyncSequence<Item = Self::Item>,
        Self::Item: Clone + Eq + Hash,
    {
        self.exclusive_by_with(other, future::ready as SelfKey<Self::Item>, DefaultEquality)
    }

    fn exclusive_with<B, C>(
        self,
        other: B,
        comparer: C,
    ) -> AsyncExclusive<Self, B, Self::Item, SelfKey<Self::Item>, Ready<Self::Item>, C>
    where
        B: AsyncSequence<Item = Self::Item>,
        Self::Item: Clone,
        C: AsyncEqualityComparer<Self::Item>,
    {
        self.exclusive_by_with(other, future::ready as SelfKey<Self::Item>, comparer)
    }

    fn exclusive_by<B, K, KF, KFut>(
        self,
        other: B,
        key: KF,
    ) -> AsyncExclusive<Self, B, K, KF, KFut, DefaultEquality>
    where
        B: AsyncSequence<Item = Self::Item>,
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        K: Eq + Hash,
    {
        self.exclusive_by_with(other, key, DefaultEquality)
    }

    fn exclusive_by_with<B, K, KF, KFut, C>(
        self,
        other: B,
        key: KF,
        comparer: C,
    ) -> AsyncExclusive<Self, B, K, KF, KFut, C>
    where
        B: AsyncSequence<Item = Self::Item>,
        KF: Fn(Self::Item) -> KFut,
        KFut: Future<Output = K>,
        C: AsyncEqualityComparer<K>,
    {
        AsyncExclusive {
            first: self,
            second: other,
            key,
            comparer,
            _key: PhantomData,
        }
    }

    // ---- joins ----

    fn join<I, K, R, OF, OFut, IF, IFut, RF>(
        self,
        inner: I,
        outer_key: OF,
        inner_key: IF,
        result: RF,
    ) -> AsyncJoin<Self, I, K, OF, OFut, IF, IFut, RF, DefaultEquality>
    where
        I: AsyncSequence,
        OF: Fn(Self::Item) -> OFut,
        OFut: Future<Output = K>,
        IF: Fn(I::Item) -> IFut,
        IFut: Future<Output = K>,
        RF: Fn(&Self::Item, &I::Item) -> R,
        K: Eq + Hash,
    {
        self.join_with_mode(inner, outer_key, inner_key, result, DefaultEquality, InnerMatch::Every)
    }

    fn join_with<I, K, R, OF, OFut, IF, IFut, RF, C>(
        self,
        inner: I,
        outer_key: OF,
        inner_key: IF,
        result: RF,
        comparer: C,
    ) -> AsyncJoin<Self, I, K, OF, OFut, IF, IFut, RF, C>
    where
        I: AsyncSequence,
        OF: Fn(Self::Item) -> OFut,
        OFut: Future<Output = K>,
        IF: Fn(I::Item) -> IFut,
        IFut: Future<Output = K>,
        RF: Fn(&Self::Item, &I::Item) -> R,
        C: AsyncEqualityComparer<K>,
    {
        self.join_with_mode(inner, outer_key, inner_key, result, comparer, InnerMatch::Every)
    }

    #[allow(clippy::too_many_arguments)]
    fn join_with_mode<I, K, R, OF, OFut, IF, IFut, RF, C>(
        self,
        inner: I,
        outer_key: OF,
        inner_key: IF,
        result: RF,
        comparer: C,
        mode: InnerMatch,
    ) -> AsyncJoin<Self, I, K, OF, OFut, IF, IFut, RF, C>
    where
        I: AsyncSequence,
        OF: Fn(Self::Item) -> OFut,
        OFut: Future<Output = K>,
        IF: Fn(I::Item) -> IFut,
        IFut: Future<Output = K>,
        RF: Fn(&Self::Item, &I::Item) -> R,
        C: AsyncEqualityComparer<K>,
    {
        AsyncJoin {
            outer: self,
            inner,
            outer_key,
            inner_key,
            result,
            comparer,
            mode,
            _key: PhantomData,
        }
    }

    fn group_join<I, K, R, OF, OFut, IF, IFut, RF>(
        self,
        inner: I,
        outer_key: OF,
        inner_key: IF,
        result: RF,
    ) -> AsyncGroupJoin<Self, I, K, OF, OFut, IF, IFut, RF, DefaultEquality>
    where
        I: AsyncSequence,
        OF: Fn(Self::Item) -> OFut,
        OFut: Future<Output = K>,
        IF: Fn(I::Item) -> IFut,
        IFut: Future<Output = K>,
        RF: Fn(Self::Item, &[I::Item]) -> R,
        K: Eq + Hash,
    {
        self.group_join_with(inner, outer_key, inner_key, result, DefaultEquality)
    }

    fn group_join_with<I, K, R, OF, OFut, IF, IFut, RF, C>(
        self,
        inner: I,
        outer_key: OF,
        inner_key: IF,
        result: RF,
        comparer: C,
    ) -> AsyncGroupJoin<Self, I, K, OF, OFut, IF, IFut, RF, C>
    where
        I: AsyncSequence,
        OF: Fn(Self::Item) -> OFut,
        OFut: Future<Output = K>,
        IF: Fn(I::Item) -> IFut,
        IFut: Future<Output = K>,
        RF: Fn(Self::Item, &[I::Item]) -> R,
        C: AsyncEqualityComparer<K>,
    {
        AsyncGroupJoin {
            outer: self,
            inner,
            outer_key,
            inner_key,
            result,
            comparer,
            _key: PhantomData,
        }
    }
}

impl<S: AsyncSequence> AsyncQueryExt for S {}
