//! Suspending leaf sequences.

use std::future::Future;

use futures::stream::{self, StreamExt};
use lazyq_core::error::Result;
use lazyq_core::sequence::Sequence;

use crate::sequence::{cursor, deferred, from_values, AsyncCursor, AsyncSequence};

/// Any immediate sequence, seen through the suspending contract.
#[derive(Debug, Clone)]
pub struct Lifted<S>(pub S);

pub fn lift<S: Sequence>(source: S) -> Lifted<S> {
    Lifted(source)
}

impl<S: Sequence> AsyncSequence for Lifted<S> {
    type Item = S::Item;

    fn open(&self) -> AsyncCursor<'_, S::Item> {
        stream::iter(self.0.open()).boxed_local()
    }
}

/// A sequence whose whole content is produced by one suspending call,
/// made again for every session.
#[derive(Clone)]
pub struct Fetch<F> {
    fetch: F,
}

pub fn fetch<F, Fut, T>(fetch: F) -> Fetch<F>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    Fetch { fetch }
}

impl<F, Fut, T> AsyncSequence for Fetch<F>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Vec<T>>> + 'static,
    T: 'static,
{
    type Item = T;

    fn open(&self) -> AsyncCursor<'_, T> {
        deferred(move || async move { Ok(from_values((self.fetch)().await?)) })
    }
}

/// Produces each element through its own suspending call:
/// `step(0)`, `step(1)`, ... until a call yields `None`.
#[derive(Clone)]
pub struct Unfold<F> {
    step: F,
}

pub fn unfold<F, Fut, T>(step: F) -> Unfold<F>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Option<Result<T>>>,
{
    Unfold { step }
}

impl<F, Fut, T> AsyncSequence for Unfold<F>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Option<Result<T>>> + 'static,
    T: 'static,
{
    type Item = T;

    fn open(&self) -> AsyncCursor<'_, T> {
        let step = &self.step;
        cursor(stream::unfold(0usize, move |i| async move {
            let item = step(i).await?;
            Some((item, i + 1))
        }))
    }
}
