//! Leaf sequences: generators, ranges, repeats, and fallible fixtures.

use std::marker::PhantomData;

use crate::error::Result;
use crate::sequence::{Cursor, Sequence};

/// A sequence backed by a factory that builds a fresh iterator per session.
///
/// The factory is invoked on the first advance of each session, not on
/// `open`, so side effects in it are deferred like everything else.
#[derive(Clone)]
pub struct Generate<F> {
    factory: F,
}

pub fn generate<F, I>(factory: F) -> Generate<F>
where
    F: Fn() -> I,
    I: IntoIterator,
{
    Generate { factory }
}

impl<F, I> Sequence for Generate<F>
where
    F: Fn() -> I,
    I: IntoIterator + 'static,
{
    type Item = I::Item;

    fn open(&self) -> Cursor<'_, I::Item> {
        Cursor::deferred(move || Ok(Cursor::from_values((self.factory)())))
    }
}

/// `count` consecutive integers starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: i64,
    count: usize,
}

pub fn range(start: i64, count: usize) -> Range {
    Range { start, count }
}

impl Sequence for Range {
    type Item = i64;

    fn open(&self) -> Cursor<'_, i64> {
        let start = self.start;
        Cursor::from_values((0..self.count).map(move |i| start + i as i64))
    }
}

/// The same value `count` times, or forever when `count` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Repeat<T> {
    value: T,
    count: Option<usize>,
}

pub fn repeat<T: Clone>(value: T, count: Option<usize>) -> Repeat<T> {
    Repeat { value, count }
}

impl<T: Clone> Sequence for Repeat<T> {
    type Item = T;

    fn open(&self) -> Cursor<'_, T> {
        let values = std::iter::repeat(&self.value).cloned();
        match self.count {
            Some(n) => Cursor::from_values(values.take(n)),
            None => Cursor::from_values(values),
        }
    }
}

/// A sequence with no elements.
#[derive(Debug, Clone, Copy)]
pub struct Empty<T>(PhantomData<fn() -> T>);

pub fn empty<T>() -> Empty<T> {
    Empty(PhantomData)
}

impl<T> Sequence for Empty<T> {
    type Item = T;

    fn open(&self) -> Cursor<'_, T> {
        Cursor::empty()
    }
}

/// A fixed list of results; errors are replayed on every session.
///
/// Mostly useful to exercise error propagation through combinators.
#[derive(Debug, Clone, PartialEq)]
pub struct Fallible<T> {
    items: Vec<Result<T>>,
}

impl<T> Fallible<T> {
    pub fn new(items: Vec<Result<T>>) -> Self {
        Self { items }
    }
}

impl<T: Clone> Sequence for Fallible<T> {
    type Item = T;

    fn open(&self) -> Cursor<'_, T> {
        Cursor::new(self.items.iter().cloned())
    }
}
