//! Suspending comparers.
//!
//! The canonical defaults implement both the immediate and the suspending
//! traits, so they keep their identity (and with it the hashed fast path) in
//! both modes. Any other immediate comparer is lifted with [`Immediate`].

use std::cmp::Ordering;
use std::future::Future;
use std::hash::Hash;
use std::marker::PhantomData;

use futures::future::{self, FutureExt, LocalBoxFuture};
use lazyq_core::comparer::{
    DefaultEquality, DefaultOrder, EqualityComparer, OrderComparer, ReverseOrder,
};

pub trait AsyncEqualityComparer<T: ?Sized> {
    fn equals<'a>(&'a self, a: &'a T, b: &'a T) -> LocalBoxFuture<'a, bool>;

    /// True only for the canonical default instance.
    fn is_default(&self) -> bool {
        false
    }

    fn hash_key(&self, _value: &T) -> Option<u64> {
        None
    }
}

pub trait AsyncOrderComparer<T: ?Sized> {
    fn compare<'a>(&'a self, a: &'a T, b: &'a T) -> LocalBoxFuture<'a, Ordering>;
}

impl<T: Eq + Hash + ?Sized> AsyncEqualityComparer<T> for DefaultEquality {
    fn equals<'a>(&'a self, a: &'a T, b: &'a T) -> LocalBoxFuture<'a, bool> {
        future::ready(a == b).boxed_local()
    }

    fn is_default(&self) -> bool {
        true
    }

    fn hash_key(&self, value: &T) -> Option<u64> {
        EqualityComparer::hash_key(self, value)
    }
}

impl<T: Ord + ?Sized> AsyncOrderComparer<T> for DefaultOrder {
    fn compare<'a>(&'a self, a: &'a T, b: &'a T) -> LocalBoxFuture<'a, Ordering> {
        future::ready(a.cmp(b)).boxed_local()
    }
}

/// An immediate comparer used where a suspending one is expected.
#[derive(Debug, Clone, Copy, Default)]
pub struct Immediate<C>(pub C);

impl<T: ?Sized, C: EqualityComparer<T>> AsyncEqualityComparer<T> for Immediate<C> {
    fn equals<'a>(&'a self, a: &'a T, b: &'a T) -> LocalBoxFuture<'a, bool> {
        future::ready(self.0.equals(a, b)).boxed_local()
    }

    fn is_default(&self) -> bool {
        self.0.is_default()
    }

    fn hash_key(&self, value: &T) -> Option<u64> {
        self.0.hash_key(value)
    }
}

impl<T: ?Sized, C: OrderComparer<T>> AsyncOrderComparer<T> for Immediate<C> {
    fn compare<'a>(&'a self, a: &'a T, b: &'a T) -> LocalBoxFuture<'a, Ordering> {
        future::ready(self.0.compare(a, b)).boxed_local()
    }
}

impl<T: ?Sized, C: AsyncOrderComparer<T>> AsyncOrderComparer<T> for ReverseOrder<C> {
    fn compare<'a>(&'a self, a: &'a T, b: &'a T) -> LocalBoxFuture<'a, Ordering> {
        self.0.compare(a, b).map(Ordering::reverse).boxed_local()
    }
}

impl<T: ?Sized, C: AsyncEqualityComparer<T> + ?Sized> AsyncEqualityComparer<T> for &C {
    fn equals<'a>(&'a self, a: &'a T, b: &'a T) -> LocalBoxFuture<'a, bool> {
        (**self).equals(a, b)
    }

    fn is_default(&self) -> bool {
        (**self).is_default()
    }

    fn hash_key(&self, value: &T) -> Option<u64> {
        (**self).hash_key(value)
    }
}

impl<T: ?Sized, C: AsyncOrderComparer<T> + ?Sized> AsyncOrderComparer<T> for &C {
    fn compare<'a>(&'a self, a: &'a T, b: &'a T) -> LocalBoxFuture<'a, Ordering> {
        (**self).compare(a, b)
    }
}

/// Suspending equality from a closure over owned copies of both values.
pub struct AsyncEqualityFn<F, Fut> {
    f: F,
    _fut: PhantomData<fn() -> Fut>,
}

/// Suspending order from a closure over owned copies of both values.
pub struct AsyncOrderFn<F, Fut> {
    f: F,
    _fut: PhantomData<fn() -> Fut>,
}

pub fn async_equality_fn<T, F, Fut>(f: F) -> AsyncEqualityFn<F, Fut>
where
    F: Fn(T, T) -> Fut,
    Fut: Future<Output = bool>,
{
    AsyncEqualityFn {
        f,
        _fut: PhantomData,
    }
}

pub fn async_order_fn<T, F, Fut>(f: F) -> AsyncOrderFn<F, Fut>
where
    F: Fn(T, T) -> Fut,
    Fut: Future<Output = Ordering>,
{
    AsyncOrderFn {
        f,
        _fut: PhantomData,
    }
}

impl<F: Clone, Fut> Clone for AsyncEqualityFn<F, Fut> {
    fn clone(&self) -> Self {
        AsyncEqualityFn {
            f: self.f.clone(),
            _fut: PhantomData,
        }
    }
}

impl<F: Clone, Fut> Clone for AsyncOrderFn<F, Fut> {
    fn clone(&self) -> Self {
        AsyncOrderFn {
            f: self.f.clone(),
            _fut: PhantomData,
        }
    }
}

impl<T, F, Fut> AsyncEqualityComparer<T> for AsyncEqualityFn<F, Fut>
where
    T: Clone,
    F: Fn(T, T) -> Fut,
    Fut: Future<Output = bool>,
{
    fn equals<'a>(&'a self, a: &'a T, b: &'a T) -> LocalBoxFuture<'a, bool> {
        (self.f)(a.clone(), b.clone()).boxed_local()
    }
}

impl<T, F, Fut> AsyncOrderComparer<T> for AsyncOrderFn<F, Fut>
where
    T: Clone,
    F: Fn(T, T) -> Fut,
    Fut: Future<Output = Ordering>,
{
    fn compare<'a>(&'a self, a: &'a T, b: &'a T) -> LocalBoxFuture<'a, Ordering> {
        (self.f)(a.clone(), b.clone()).boxed_local()
    }
}
