//! Element-wise adapters with no state beyond a single cursor.

use crate::sequence::{Cursor, Sequence};

#[derive(Debug, Clone)]
pub struct Map<S, F> {
    pub(crate) source: S,
    pub(crate) f: F,
}

impl<S, F, B> Sequence for Map<S, F>
where
    S: Sequence,
    F: Fn(S::Item) -> B,
{
    type Item = B;

    fn open(&self) -> Cursor<'_, B> {
        let f = &self.f;
        Cursor::new(self.source.open().map(move |item| item.map(f)))
    }
}

#[derive(Debug, Clone)]
pub struct Filter<S, P> {
    pub(crate) source: S,
    pub(crate) predicate: P,
}

impl<S, P> Sequence for Filter<S, P>
where
    S: Sequence,
    P: Fn(&S::Item) -> bool,
{
    type Item = S::Item;

    fn open(&self) -> Cursor<'_, S::Item> {
        let predicate = &self.predicate;
        Cursor::new(self.source.open().filter(move |item| match item {
            Ok(value) => predicate(value),
            Err(_) => true,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Take<S> {
    pub(crate) source: S,
    pub(crate) n: usize,
}

impl<S: Sequence> Sequence for Take<S> {
    type Item = S::Item;

    fn open(&self) -> Cursor<'_, S::Item> {
        Cursor::new(self.source.open().take(self.n))
    }
}

#[derive(Debug, Clone)]
pub struct Skip<S> {
    pub(crate) source: S,
    pub(crate) n: usize,
}

impl<S: Sequence> Sequence for Skip<S> {
    type Item = S::Item;

    fn open(&self) -> Cursor<'_, S::Item> {
        let mut remaining = self.n;
        // Errors are never skipped.
        Cursor::new(self.source.open().filter(move |item| {
            if remaining > 0 && item.is_ok() {
                remaining -= 1;
                return false;
            }
            true
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Concat<A, B> {
    pub(crate) first: A,
    pub(crate) second: B,
}

impl<A, B> Sequence for Concat<A, B>
where
    A: Sequence,
    B: Sequence<Item = A::Item>,
{
    type Item = A::Item;

    fn open(&self) -> Cursor<'_, A::Item> {
        let second = &self.second;
        // The second source is opened only once the first is exhausted.
        let tail = Cursor::deferred(move || Ok(second.open()));
        Cursor::new(self.first.open().chain(tail))
    }
}
