//! The suspending sequence contract.
//!
//! Same rules as `lazyq_core::sequence`, over `futures` streams: `open`
//! returns a fresh, lazy, local stream per session, the stream ends after
//! the first error, and materializing work is postponed with [`deferred`]
//! until the first poll.

use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use futures::future;
use futures::stream::{self, LocalBoxStream, Stream, StreamExt};
use lazyq_core::error::{Error, Result};

/// One suspending iteration session.
pub type AsyncCursor<'a, T> = LocalBoxStream<'a, Result<T>>;

/// A re-iterable source whose elements may take suspension points to produce.
pub trait AsyncSequence {
    type Item;

    fn open(&self) -> AsyncCursor<'_, Self::Item>;
}

/// Wrap a fallible stream so it stops after its first error.
pub fn cursor<'a, T, St>(inner: St) -> AsyncCursor<'a, T>
where
    St: Stream<Item = Result<T>> + 'a,
    T: 'a,
{
    stream::unfold(Some(inner.boxed_local()), |state| async move {
        let mut inner = state?;
        match inner.next().await? {
            Ok(item) => Some((Ok(item), Some(inner))),
            Err(e) => Some((Err(e), None)),
        }
    })
    .fuse()
    .boxed_local()
}

pub fn from_values<'a, T, I>(values: I) -> AsyncCursor<'a, T>
where
    I: IntoIterator<Item = T>,
    I::IntoIter: 'a,
    T: 'a,
{
    stream::iter(values.into_iter().map(Ok)).boxed_local()
}

pub fn failed<'a, T: 'a>(err: Error) -> AsyncCursor<'a, T> {
    stream::once(future::ready(Err(err))).boxed_local()
}

/// Build the real cursor on the first poll.
pub fn deferred<'a, T, F, Fut>(init: F) -> AsyncCursor<'a, T>
where
    T: 'a,
    F: FnOnce() -> Fut + 'a,
    Fut: Future<Output = Result<AsyncCursor<'a, T>>> + 'a,
{
    stream::once(async move { init().await })
        .flat_map(|built| match built {
            Ok(cursor) => cursor,
            Err(e) => failed(e),
        })
        .boxed_local()
}

/// Drain one session.
pub async fn collect<T>(mut cursor: AsyncCursor<'_, T>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    while let Some(item) = cursor.next().await {
        out.push(item?);
    }
    Ok(out)
}

impl<T: Clone> AsyncSequence for Vec<T> {
    type Item = T;

    fn open(&self) -> AsyncCursor<'_, T> {
        from_values(self.iter().cloned())
    }
}

impl<T: Clone> AsyncSequence for [T] {
    type Item = T;

    fn open(&self) -> AsyncCursor<'_, T> {
        from_values(self.iter().cloned())
    }
}

impl<S: AsyncSequence + ?Sized> AsyncSequence for &S {
    type Item = S::Item;

    fn open(&self) -> AsyncCursor<'_, S::Item> {
        (**self).open()
    }
}

impl<S: AsyncSequence + ?Sized> AsyncSequence for Box<S> {
    type Item = S::Item;

    fn open(&self) -> AsyncCursor<'_, S::Item> {
        (**self).open()
    }
}

impl<S: AsyncSequence + ?Sized> AsyncSequence for Rc<S> {
    type Item = S::Item;

    fn open(&self) -> AsyncCursor<'_, S::Item> {
        (**self).open()
    }
}

impl<S: AsyncSequence + ?Sized> AsyncSequence for Arc<S> {
    type Item = S::Item;

    fn open(&self) -> AsyncCursor<'_, S::Item> {
        (**self).open()
    }
}
