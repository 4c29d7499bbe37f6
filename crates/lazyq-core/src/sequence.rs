//! The lazy sequence contract.
//!
//! A [`Sequence`] is a recipe, not a stream: `open` hands out a fresh
//! [`Cursor`] (one iteration session) every time it is called, and nothing
//! is pulled from the underlying source until the cursor is advanced.
//!
//! Rules every implementation follows:
//! 1. `open` never consumes the wrapped source. Work that needs a
//!    materialized input goes through [`Cursor::deferred`].
//! 2. Two calls to `open` give two independent cursors.
//! 3. A cursor that reported End (or an error) keeps reporting End.

use std::rc::Rc;
use std::sync::Arc;

use crate::error::{Error, Result};

/// A re-iterable, lazily evaluated source of elements.
pub trait Sequence {
    type Item;

    /// Start a new iteration session.
    fn open(&self) -> Cursor<'_, Self::Item>;
}

/// One iteration session over a sequence.
///
/// Yields `Ok(item)` per element; a source error is yielded once and ends
/// the session.
pub struct Cursor<'a, T> {
    state: State<'a, T>,
}

type Init<'a, T> = Box<dyn FnOnce() -> Result<Cursor<'a, T>> + 'a>;

enum State<'a, T> {
    Live(Box<dyn Iterator<Item = Result<T>> + 'a>),
    Deferred(Init<'a, T>),
    Done,
}

impl<'a, T> Cursor<'a, T> {
    /// Wrap a fallible iterator.
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<T>> + 'a,
    {
        Self {
            state: State::Live(Box::new(iter)),
        }
    }

    /// Wrap an infallible iterator.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'a,
        T: 'a,
    {
        Self::new(values.into_iter().map(Ok))
    }

    pub fn empty() -> Self {
        Self { state: State::Done }
    }

    /// A session that fails on its first advance.
    pub fn failed(err: Error) -> Self
    where
        T: 'a,
    {
        Self::new(std::iter::once(Err(err)))
    }

    /// Postpone building the real cursor until the first advance.
    ///
    /// Materializing combinators (sort, grouping, seeded set operators,
    /// joins) use this so that opening a session stays free.
    pub fn deferred<F>(init: F) -> Self
    where
        F: FnOnce() -> Result<Cursor<'a, T>> + 'a,
    {
        Self {
            state: State::Deferred(Box::new(init)),
        }
    }

    /// Pull the next element: `None` is End.
    pub fn advance(&mut self) -> Option<Result<T>> {
        loop {
            match std::mem::replace(&mut self.state, State::Done) {
                State::Done => return None,
                State::Deferred(init) => match init() {
                    Ok(cursor) => self.state = cursor.state,
                    Err(e) => return Some(Err(e)),
                },
                State::Live(mut inner) => {
                    return match inner.next() {
                        Some(Ok(item)) => {
                            self.state = State::Live(inner);
                            Some(Ok(item))
                        }
                        // Errors and End both leave the cursor in `Done`.
                        other => other,
                    };
                }
            }
        }
    }

    /// True once the session can yield nothing more.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Done)
    }
}

impl<T> Iterator for Cursor<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}

impl<T> std::fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            State::Live(_) => "live",
            State::Deferred(_) => "deferred",
            State::Done => "done",
        };
        f.debug_struct("Cursor").field("state", &state).finish()
    }
}

impl<T: Clone> Sequence for Vec<T> {
    type Item = T;

    fn open(&self) -> Cursor<'_, T> {
        Cursor::from_values(self.iter().cloned())
    }
}

impl<T: Clone> Sequence for [T] {
    type Item = T;

    fn open(&self) -> Cursor<'_, T> {
        Cursor::from_values(self.iter().cloned())
    }
}

impl<T: Clone, const N: usize> Sequence for [T; N] {
    type Item = T;

    fn open(&self) -> Cursor<'_, T> {
        Cursor::from_values(self.iter().cloned())
    }
}

impl<S: Sequence + ?Sized> Sequence for &S {
    type Item = S::Item;

    fn open(&self) -> Cursor<'_, S::Item> {
        (**self).open()
    }
}

impl<S: Sequence + ?Sized> Sequence for Box<S> {
    type Item = S::Item;

    fn open(&self) -> Cursor<'_, S::Item> {
        (**self).open()
    }
}

impl<S: Sequence + ?Sized> Sequence for Rc<S> {
    type Item = S::Item;

    fn open(&self) -> Cursor<'_, S::Item> {
        (**self).open()
    }
}

impl<S: Sequence + ?Sized> Sequence for Arc<S> {
    type Item = S::Item;

    fn open(&self) -> Cursor<'_, S::Item> {
        (**self).open()
    }
}
