//! The combinator surface: one extension trait over every [`Sequence`].
//!
//! Every method only builds a wrapper; nothing is read from any sequence
//! until a session of the result is advanced. Forms without a comparer use
//! the canonical [`DefaultEquality`] / [`DefaultOrder`] and therefore the
//! hashed key path.

use std::hash::Hash;
use std::marker::PhantomData;

use lazyq_core::comparer::{DefaultEquality, DefaultOrder, EqualityComparer, OrderComparer};
use lazyq_core::error::Result;
use lazyq_core::sequence::Sequence;
use lazyq_core::types::TypeTag;

use crate::group::aggregate::count_one;
use crate::group::{AggregateBy, CountBy, GroupBy, GroupResult, Lookup, Seed};
use crate::join::{GroupJoin, InnerMatch, Join};
use crate::keys::Buckets;
use crate::of_type::{own_tag, OfType, TypeFilter, Typed};
use crate::set::{identity_key, Distinct, Except, Exclusive, Intersect, Union};
use crate::sort::OrderedSequence;

type SelfKey<T> = fn(&T) -> T;
type SelfElement<T> = fn(T) -> T;

pub trait QueryExt: Sequence + Sized {
    // ---- ordering ----

    fn order_by<'q, K, F>(self, selector: F) -> OrderedSequence<'q, Self>
    where
        F: Fn(&Self::Item) -> K + 'q,
        K: Ord + 'q,
    {
        OrderedSequence::new(self, selector, DefaultOrder, false)
    }

    fn order_by_with<'q, K, F, C>(self, selector: F, comparer: C) -> OrderedSequence<'q, Self>
    where
        F: Fn(&Self::Item) -> K + 'q,
        C: OrderComparer<K> + 'q,
        K: 'q,
    {
        OrderedSequence::new(self, selector, comparer, false)
    }

    fn order_by_descending<'q, K, F>(self, selector: F) -> OrderedSequence<'q, Self>
    where
        F: Fn(&Self::Item) -> K + 'q,
        K: Ord + 'q,
    {
        OrderedSequence::new(self, selector, DefaultOrder, true)
    }

    fn order_by_descending_with<'q, K, F, C>(
        self,
        selector: F,
        comparer: C,
    ) -> OrderedSequence<'q, Self>
    where
        F: Fn(&Self::Item) -> K + 'q,
        C: OrderComparer<K> + 'q,
        K: 'q,
    {
        OrderedSequence::new(self, selector, comparer, true)
    }

    // ---- grouping ----

    fn group_by<K, KF>(
        self,
        key: KF,
    ) -> GroupBy<Self, K, Self::Item, KF, SelfElement<Self::Item>, DefaultEquality>
    where
        KF: Fn(&Self::Item) -> K,
        K: Eq + Hash,
    {
        self.group_by_with(key, DefaultEquality)
    }

    fn group_by_with<K, KF, C>(
        self,
        key: KF,
        comparer: C,
    ) -> GroupBy<Self, K, Self::Item, KF, SelfElement<Self::Item>, C>
    where
        KF: Fn(&Self::Item) -> K,
        C: EqualityComparer<K>,
    {
        GroupBy {
            source: self,
            key,
            element: std::convert::identity,
            comparer,
            _types: PhantomData,
        }
    }

    fn group_by_elements<K, E, KF, EF, C>(
        self,
        key: KF,
        element: EF,
        comparer: C,
    ) -> GroupBy<Self, K, E, KF, EF, C>
    where
        KF: Fn(&Self::Item) -> K,
        EF: Fn(Self::Item) -> E,
        C: EqualityComparer<K>,
    {
        GroupBy {
            source: self,
            key,
            element,
            comparer,
            _types: PhantomData,
        }
    }

    fn group_by_result<K, E, R, KF, EF, RF, C>(
        self,
        key: KF,
        element: EF,
        result: RF,
        comparer: C,
    ) -> GroupResult<Self, K, E, KF, EF, RF, C>
    where
        KF: Fn(&Self::Item) -> K,
        EF: Fn(Self::Item) -> E,
        RF: Fn(K, Vec<E>) -> R,
        C: EqualityComparer<K>,
    {
        GroupResult {
            groups: self.group_by_elements(key, element, comparer),
            result,
        }
    }

    /// Fold every element into its key's accumulator, starting from a clone
    /// of `seed`.
    fn aggregate_by<K, A, KF, G>(
        self,
        key: KF,
        seed: A,
        fold: G,
    ) -> AggregateBy<Self, K, A, KF, fn(&K) -> A, G, DefaultEquality>
    where
        KF: Fn(&Self::Item) -> K,
        K: Eq + Hash,
        A: Clone,
        G: Fn(A, Self::Item) -> A,
    {
        AggregateBy {
            source: self,
            key,
            seed: Seed::Value(seed),
            fold,
            comparer: DefaultEquality,
            _key: PhantomData,
        }
    }

    /// Like [`QueryExt::aggregate_by`], with the seed built from the key.
    fn aggregate_by_with<K, A, KF, SF, G, C>(
        self,
        key: KF,
        seed: SF,
        fold: G,
        comparer: C,
    ) -> AggregateBy<Self, K, A, KF, SF, G, C>
    where
        KF: Fn(&Self::Item) -> K,
        SF: Fn(&K) -> A,
        A: Clone,
        G: Fn(A, Self::Item) -> A,
        C: EqualityComparer<K>,
    {
        AggregateBy {
            source: self,
            key,
            seed: Seed::Factory(seed),
            fold,
            comparer,
            _key: PhantomData,
        }
    }

    fn count_by<K, KF>(self, key: KF) -> CountBy<Self, K, KF, DefaultEquality>
    where
        KF: Fn(&Self::Item) -> K,
        K: Eq + Hash,
    {
        self.count_by_with(key, DefaultEquality)
    }

    fn count_by_with<K, KF, C>(self, key: KF, comparer: C) -> CountBy<Self, K, KF, C>
    where
        KF: Fn(&Self::Item) -> K,
        C: EqualityComparer<K>,
    {
        AggregateBy {
            source: self,
            key,
            seed: Seed::Value(0),
            fold: count_one,
            comparer,
            _key: PhantomData,
        }
    }

    /// Materialize one session into a keyed lookup.
    fn to_lookup<K, KF>(&self, key: KF) -> Result<Lookup<K, Self::Item, DefaultEquality>>
    where
        KF: Fn(&Self::Item) -> K,
        K: Eq + Hash,
    {
        self.to_lookup_with(key, DefaultEquality)
    }

    fn to_lookup_with<K, KF, C>(&self, key: KF, comparer: C) -> Result<Lookup<K, Self::Item, C>>
    where
        KF: Fn(&Self::Item) -> K,
        C: EqualityComparer<K>,
    {
        let mut buckets = Buckets::new(comparer);
        for item in self.open() {
            let item = item?;
            buckets.push(key(&item), item);
        }
        Ok(Lookup { buckets })
    }

    // ---- set algebra ----

    fn distinct(self) -> Distinct<Self, Self::Item, SelfKey<Self::Item>, DefaultEquality>
    where
        Self::Item: Clone + Eq + Hash,
    {
        self.distinct_with(DefaultEquality)
    }

    fn distinct_with<C>(self, comparer: C) -> Distinct<Self, Self::Item, SelfKey<Self::Item>, C>
    where
        Self::Item: Clone,
        C: EqualityComparer<Self::Item>,
    {
        Distinct {
            source: self,
            key: identity_key,
            comparer,
            _key: PhantomData,
        }
    }

    fn distinct_by<K, KF>(self, key: KF) -> Distinct<Self, K, KF, DefaultEquality>
    where
        KF: Fn(&Self::Item) -> K,
        K: Eq + Hash,
    {
        self.distinct_by_with(key, DefaultEquality)
    }

    fn distinct_by_with<K, KF, C>(self, key: KF, comparer: C) -> Distinct<Self, K, KF, C>
    where
        KF: Fn(&Self::Item) -> K,
        C: EqualityComparer<K>,
    {
        Distinct {
            source: self,
            key,
            comparer,
            _key: PhantomData,
        }
    }

    fn except<B>(
        self,
        other: B,
    ) -> Except<Self, B, Self::Item, SelfKey<Self::Item>, DefaultEquality>
    where
        B: Sequence<Item = Self::Item>,
        Self::Item: Clone + Eq + Hash,
    {
        self.except_with(other, DefaultEquality)
    }

    fn except_with<B, C>(
        self,
        other: B,
        comparer: C,
    ) -> Except<Self, B, Self::Item, SelfKey<Self::Item>, C>
    where
        B: Sequence<Item = Self::Item>,
        Self::Item: Clone,
        C: EqualityComparer<Self::Item>,
    {
        Except {
            first: self,
            second: other,
            key: identity_key,
            comparer,
            _key: PhantomData,
        }
    }

    fn except_by<B, K, KF>(self, other: B, key: KF) -> Except<Self, B, K, KF, DefaultEquality>
    where
        B: Sequence<Item = Self::Item>,
        KF: Fn(&Self::Item) -> K,
        K: Eq + Hash,
    {
        self.except_by_with(other, key, DefaultEquality)
    }

    fn except_by_with<B, K, KF, C>(self, other: B, key: KF, comparer: C) -> Except<Self, B, K, KF, C>
    where
        B: Sequence<Item = Self::Item>,
        KF: Fn(&Self::Item) -> K,
        C: EqualityComparer<K>,
    {
        Except {
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
    ) -> Intersect<Self, B, Self::Item, SelfKey<Self::Item>, DefaultEquality>
    where
        B: Sequence<Item = Self::Item>,
        Self::Item: Clone + Eq + Hash,
    {
        self.intersect_with(other, DefaultEquality)
    }

    fn intersect_with<B, C>(
        self,
        other: B,
        comparer: C,
    ) -> Intersect<Self, B, Self::Item, SelfKey<Self::Item>, C>
    where
        B: Sequence<Item = Self::Item>,
        Self::Item: Clone,
        C: EqualityComparer<Self::Item>,
    {
        Intersect {
            first: self,
            second: other,
            key: identity_key,
            comparer,
            _key: PhantomData,
        }
    }

    fn intersect_by<B, K, KF>(self, other: B, key: KF) -> Intersect<Self, B, K, KF, DefaultEquality>
    where
        B: Sequence<Item = Self::Item>,
        KF: Fn(&Self::Item) -> K,
        K: Eq + Hash,
    {
        self.intersect_by_with(other, key, DefaultEquality)
    }

    fn intersect_by_with<B, K, KF, C>(
        self,
        other: B,
        key: KF,
        comparer: C,
    ) -> Intersect<Self, B, K, KF, C>
    where
        B: Sequence<Item = Self::Item>,
        KF: Fn(&Self::Item) -> K,
        C: EqualityComparer<K>,
    {
        Intersect {
            first: self,
            second: other,
            key,
            comparer,
            _key: PhantomData,
        }
    }

    fn union<B>(self, other: B) -> Union<Self, B, Self::Item, SelfKey<Self::Item>, DefaultEquality>
    where
        B: Sequence<Item = Self::Item>,
        Self::Item: Clone + Eq + Hash,
    {
        self.union_with(other, DefaultEquality)
    }

    fn union_with<B, C>(
        self,
        other: B,
        comparer: C,
    ) -> Union<Self, B, Self::Item, SelfKey<Self::Item>, C>
    where
        B: Sequence<Item = Self::Item>,
        Self::Item: Clone,
        C: EqualityComparer<Self::Item>,
    {
        Union {
            first: self,
            second: other,
            key: identity_key,
            comparer,
            _key: PhantomData,
        }
    }

    fn union_by<B, K, KF>(self, other: B, key: KF) -> Union<Self, B, K, KF, DefaultEquality>
    where
        B: Sequence<Item = Self::Item>,
        KF: Fn(&Self::Item) -> K,
        K: Eq + Hash,
    {
        self.union_by_with(other, key, DefaultEquality)
    }

    fn union_by_with<B, K, KF, C>(self, other: B, key: KF, comparer: C) -> Union<Self, B, K, KF, C>
    where
        B: Sequence<Item = Self::Item>,
        KF: Fn(&Self::Item) -> K,
        C: EqualityComparer<K>,
    {
        Union {
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
    ) -> Exclusive<Self, B, Self::Item, SelfKey<Self::Item>, DefaultEquality>
    where
        B: Sequence<Item = Self::Item>,
        Self::Item: Clone + Eq + Hash,
    {
        self.exclusive_with(other, DefaultEquality)
    }

    fn exclusive_with<B, C>(
        self,
        other: B,
        comparer: C,
    ) -> Exclusive<Self, B, Self::Item, SelfKey<Self::Item>, C>
    where
        B: Sequence<Item = Self::Item>,
        Self::Item: Clone,
        C: EqualityComparer<Self::Item>,
    {
        Exclusive {
            first: self,
            second: other,
            key: identity_key,
            comparer,
            _key: PhantomData,
        }
    }

    fn exclusive_by<B, K, KF>(self, other: B, key: KF) -> Exclusive<Self, B, K, KF, DefaultEquality>
    where
        B: Sequence<Item = Self::Item>,
        KF: Fn(&Self::Item) -> K,
        K: Eq + Hash,
    {
        self.exclusive_by_with(other, key, DefaultEquality)
    }

    fn exclusive_by_with<B, K, KF, C>(
        self,
        other: B,
        key: KF,
        comparer: C,
    ) -> Exclusive<Self, B, K, KF, C>
    where
        B: Sequence<Item = Self::Item>,
        KF: Fn(&Self::Item) -> K,
        C: EqualityComparer<K>,
    {
        Exclusive {
            first: self,
            second: other,
            key,
            comparer,
            _key: PhantomData,
        }
    }

    // ---- joins ----

    fn join<I, K, R, OF, IF, RF>(
        self,
        inner: I,
        outer_key: OF,
        inner_key: IF,
        result: RF,
    ) -> Join<Self, I, K, OF, IF, RF, DefaultEquality>
    where
        I: Sequence,
        OF: Fn(&Self::Item) -> K,
        IF: Fn(&I::Item) -> K,
        RF: Fn(&Self::Item, &I::Item) -> R,
        K: Eq + Hash,
    {
        self.join_with_mode(inner, outer_key, inner_key, result, DefaultEquality, InnerMatch::Every)
    }

    fn join_with<I, K, R, OF, IF, RF, C>(
        self,
        inner: I,
        outer_key: OF,
        inner_key: IF,
        result: RF,
        comparer: C,
    ) -> Join<Self, I, K, OF, IF, RF, C>
    where
        I: Sequence,
        OF: Fn(&Self::Item) -> K,
        IF: Fn(&I::Item) -> K,
        RF: Fn(&Self::Item, &I::Item) -> R,
        C: EqualityComparer<K>,
    {
        self.join_with_mode(inner, outer_key, inner_key, result, comparer, InnerMatch::Every)
    }

    fn join_with_mode<I, K, R, OF, IF, RF, C>(
        self,
        inner: I,
        outer_key: OF,
        inner_key: IF,
        result: RF,
        comparer: C,
        mode: InnerMatch,
    ) -> Join<Self, I, K, OF, IF, RF, C>
    where
        I: Sequence,
        OF: Fn(&Self::Item) -> K,
        IF: Fn(&I::Item) -> K,
        RF: Fn(&Self::Item, &I::Item) -> R,
        C: EqualityComparer<K>,
    {
        Join {
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

    fn group_join<I, K, R, OF, IF, RF>(
        self,
        inner: I,
        outer_key: OF,
        inner_key: IF,
        result: RF,
    ) -> GroupJoin<Self, I, K, OF, IF, RF, DefaultEquality>
    where
        I: Sequence,
        OF: Fn(&Self::Item) -> K,
        IF: Fn(&I::Item) -> K,
        RF: Fn(Self::Item, &[I::Item]) -> R,
        K: Eq + Hash,
    {
        self.group_join_with(inner, outer_key, inner_key, result, DefaultEquality)
    }

    fn group_join_with<I, K, R, OF, IF, RF, C>(
        self,
        inner: I,
        outer_key: OF,
        inner_key: IF,
        result: RF,
        comparer: C,
    ) -> GroupJoin<Self, I, K, OF, IF, RF, C>
    where
        I: Sequence,
        OF: Fn(&Self::Item) -> K,
        IF: Fn(&I::Item) -> K,
        RF: Fn(Self::Item, &[I::Item]) -> R,
        C: EqualityComparer<K>,
    {
        GroupJoin {
            outer: self,
            inner,
            outer_key,
            inner_key,
            result,
            comparer,
            _key: PhantomData,
        }
    }

    // ---- kinds ----

    fn of_type(self, filter: TypeFilter<Self::Item>) -> OfType<Self, fn(&Self::Item) -> TypeTag>
    where
        Self::Item: Typed,
    {
        OfType {
            source: self,
            tag_of: own_tag,
            filter,
        }
    }

    /// `of_type` with the kind read through `tag_of`, e.g. from a record field.
    fn of_type_by<F>(self, tag_of: F, filter: TypeFilter<Self::Item>) -> OfType<Self, F>
    where
        F: Fn(&Self::Item) -> TypeTag,
    {
        OfType {
            source: self,
            tag_of,
            filter,
        }
    }
}

impl<S: Sequence> QueryExt for S {}
