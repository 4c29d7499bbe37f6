//! Element-wise adapters and terminal consumers as extension methods.
//!
//! Terminals open one session and drive it to completion (or to the first
//! decisive element). They are the only place the single-element errors
//! (`NoElements`, `NoMatch`, `MultipleMatches`) are raised.

use crate::adapters::{Concat, Filter, Map, Skip, Take};
use crate::error::{Error, Result};
use crate::sequence::Sequence;

pub trait SequenceExt: Sequence + Sized {
    fn map<B, F>(self, f: F) -> Map<Self, F>
    where
        F: Fn(Self::Item) -> B,
    {
        Map { source: self, f }
    }

    fn filter<P>(self, predicate: P) -> Filter<Self, P>
    where
        P: Fn(&Self::Item) -> bool,
    {
        Filter {
            source: self,
            predicate,
        }
    }

    fn take(self, n: usize) -> Take<Self> {
        Take { source: self, n }
    }

    fn skip(self, n: usize) -> Skip<Self> {
        Skip { source: self, n }
    }

    fn concat<B>(self, second: B) -> Concat<Self, B>
    where
        B: Sequence<Item = Self::Item>,
    {
        Concat {
            first: self,
            second,
        }
    }

    /// Materialize one full session.
    fn to_vec(&self) -> Result<Vec<Self::Item>> {
        self.open().collect()
    }

    fn count(&self) -> Result<usize> {
        let mut n = 0;
        for item in self.open() {
            item?;
            n += 1;
        }
        Ok(n)
    }

    fn first(&self) -> Result<Self::Item> {
        self.open().next().unwrap_or(Err(Error::NoElements))
    }

    fn first_where<P>(&self, predicate: P) -> Result<Self::Item>
    where
        P: Fn(&Self::Item) -> bool,
    {
        let mut any = false;
        for item in self.open() {
            let item = item?;
            any = true;
            if predicate(&item) {
                return Ok(item);
            }
        }
        Err(if any { Error::NoMatch } else { Error::NoElements })
    }

    fn last(&self) -> Result<Self::Item> {
        let mut last = None;
        for item in self.open() {
            last = Some(item?);
        }
        last.ok_or(Error::NoElements)
    }

    fn single(&self) -> Result<Self::Item> {
        let mut cursor = self.open();
        let only = cursor.next().unwrap_or(Err(Error::NoElements))?;
        match cursor.next() {
            None => Ok(only),
            Some(Err(e)) => Err(e),
            Some(Ok(_)) => Err(Error::MultipleMatches),
        }
    }

    fn single_where<P>(&self, predicate: P) -> Result<Self::Item>
    where
        P: Fn(&Self::Item) -> bool,
    {
        let mut any = false;
        let mut found = None;
        for item in self.open() {
            let item = item?;
            any = true;
            if predicate(&item) {
                if found.is_some() {
                    return Err(Error::MultipleMatches);
                }
                found = Some(item);
            }
        }
        match found {
            Some(item) => Ok(item),
            None if any => Err(Error::NoMatch),
            None => Err(Error::NoElements),
        }
    }
}

impl<S: Sequence> SequenceExt for S {}
