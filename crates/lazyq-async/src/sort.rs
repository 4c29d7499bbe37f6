//! Stable multi-key ordering with suspending key selectors and comparers.
//!
//! Same shape as the immediate engine: an immutable chain of levels, keys
//! computed once per level over the materialized elements, and an index
//! comparator that falls through the levels down to the original index.
//! Comparisons may suspend, so the indices are ordered with a bottom-up
//! merge sort that awaits each comparison in turn.

use std::cmp::Ordering;
use std::future::Future;
use std::marker::PhantomData;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use lazyq_core::comparer::DefaultOrder;

use crate::comparer::AsyncOrderComparer;
use crate::sequence::{collect, deferred, from_values, AsyncCursor, AsyncSequence};

trait AsyncSortLevel<T> {
    fn descending(&self) -> bool;

    fn compute<'a>(&'a self, elements: &'a [T]) -> LocalBoxFuture<'a, Box<dyn AsyncLevelKeys + 'a>>;
}

trait AsyncLevelKeys {
    fn compare(&self, a: usize, b: usize) -> LocalBoxFuture<'_, Ordering>;
}

struct KeyLevel<F, C, K, Fut> {
    selector: F,
    comparer: C,
    descending: bool,
    _key: PhantomData<fn() -> (K, Fut)>,
}

impl<T, F, C, K, Fut> AsyncSortLevel<T> for KeyLevel<F, C, K, Fut>
where
    T: Clone,
    F: Fn(T) -> Fut,
    Fut: Future<Output = K>,
    C: AsyncOrderComparer<K>,
{
    fn descending(&self) -> bool {
        self.descending
    }

    fn compute<'a>(&'a self, elements: &'a [T]) -> LocalBoxFuture<'a, Box<dyn AsyncLevelKeys + 'a>> {
        async move {
            let mut keys = Vec::with_capacity(elements.len());
            for element in elements {
                keys.push((self.selector)(element.clone()).await);
            }
            Box::new(ComputedKeys {
                keys,
                comparer: &self.comparer,
            }) as Box<dyn AsyncLevelKeys + 'a>
        }
        .boxed_local()
    }
}

struct ComputedKeys<'a, K, C> {
    keys: Vec<K>,
    comparer: &'a C,
}

impl<K, C: AsyncOrderComparer<K>> AsyncLevelKeys for ComputedKeys<'_, K, C> {
    fn compare(&self, a: usize, b: usize) -> LocalBoxFuture<'_, Ordering> {
        self.comparer.compare(&self.keys[a], &self.keys[b])
    }
}

struct AsyncEnumerableSorter<'a> {
    keys: Box<dyn AsyncLevelKeys + 'a>,
    descending: bool,
    next: Option<Box<AsyncEnumerableSorter<'a>>>,
}

impl<'a> AsyncEnumerableSorter<'a> {
    fn compare(&self, a: usize, b: usize) -> LocalBoxFuture<'_, Ordering> {
        async move {
            let mut ord = self.keys.compare(a, b).await;
            if self.descending {
                ord = ord.reverse();
            }
            if ord != Ordering::Equal {
                return ord;
            }
            match &self.next {
                Some(next) => next.compare(a, b).await,
                None => a.cmp(&b),
            }
        }
        .boxed_local()
    }

    async fn sort(&self, len: usize) -> Vec<usize> {
        let mut run: Vec<usize> = (0..len).collect();
        let mut width = 1;
        while width < len {
            let mut merged = Vec::with_capacity(len);
            let mut start = 0;
            while start < len {
                let mid = (start + width).min(len);
                let end = (start + 2 * width).min(len);
                let (mut i, mut j) = (start, mid);
                while i < mid && j < end {
                    if self.compare(run[j], run[i]).await == Ordering::Less {
                        merged.push(run[j]);
                        j += 1;
                    } else {
                        merged.push(run[i]);
                        i += 1;
                    }
                }
                merged.extend_from_slice(&run[i..mid]);
                merged.extend_from_slice(&run[j..end]);
                start = end;
            }
            run = merged;
            width *= 2;
        }
        run
    }
}

struct SortChain<'q, T> {
    level: Box<dyn AsyncSortLevel<T> + 'q>,
    parent: Option<Rc<SortChain<'q, T>>>,
}

impl<'q, T> SortChain<'q, T> {
    fn depth(&self) -> usize {
        1 + self.parent.as_ref().map_or(0, |p| p.depth())
    }
}

/// A suspending sequence sorted by one or more keys.
pub struct AsyncOrderedSequence<'q, S: AsyncSequence> {
    source: S,
    chain: Rc<SortChain<'q, S::Item>>,
}

impl<'q, S: AsyncSequence + Clone> Clone for AsyncOrderedSequence<'q, S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            chain: Rc::clone(&self.chain),
        }
    }
}

impl<'q, S> AsyncOrderedSequence<'q, S>
where
    S: AsyncSequence,
    S::Item: Clone,
{
    pub(crate) fn new<K, F, Fut, C>(source: S, selector: F, comparer: C, descending: bool) -> Self
    where
        F: Fn(S::Item) -> Fut + 'q,
        Fut: Future<Output = K> + 'q,
        C: AsyncOrderComparer<K> + 'q,
        K: 'q,
    {
        Self {
            source,
            chain: Rc::new(SortChain {
                level: Box::new(KeyLevel {
                    selector,
                    comparer,
                    descending,
                    _key: PhantomData,
                }),
                parent: None,
            }),
        }
    }

    fn push<K, F, Fut, C>(self, selector: F, comparer: C, descending: bool) -> Self
    where
        F: Fn(S::Item) -> Fut + 'q,
        Fut: Future<Output = K> + 'q,
        C: AsyncOrderComparer<K> + 'q,
        K: 'q,
    {
        let chain = Rc::new(SortChain {
            level: Box::new(KeyLevel {
                selector,
                comparer,
                descending,
                _key: PhantomData,
            }),
            parent: Some(self.chain),
        });
        Self {
            source: self.source,
            chain,
        }
    }

    pub fn then_by<K, F, Fut>(self, selector: F) -> Self
    where
        F: Fn(S::Item) -> Fut + 'q,
        Fut: Future<Output = K> + 'q,
        K: Ord + 'q,
    {
        self.push(selector, DefaultOrder, false)
    }

    pub fn then_by_with<K, F, Fut, C>(self, selector: F, comparer: C) -> Self
    where
        F: Fn(S::Item) -> Fut + 'q,
        Fut: Future<Output = K> + 'q,
        C: AsyncOrderComparer<K> + 'q,
        K: 'q,
    {
        self.push(selector, comparer, false)
    }

    pub fn then_by_descending<K, F, Fut>(self, selector: F) -> Self
    where
        F: Fn(S::Item) -> Fut + 'q,
        Fut: Future<Output = K> + 'q,
        K: Ord + 'q,
    {
        self.push(selector, DefaultOrder, true)
    }

    pub fn then_by_descending_with<K, F, Fut, C>(self, selector: F, comparer: C) -> Self
    where
        F: Fn(S::Item) -> Fut + 'q,
        Fut: Future<Output = K> + 'q,
        C: AsyncOrderComparer<K> + 'q,
        K: 'q,
    {
        self.push(selector, comparer, true)
    }

    pub fn levels(&self) -> usize {
        self.chain.depth()
    }

    async fn permutation(&self, elements: &[S::Item]) -> Vec<usize> {
        if elements.is_empty() {
            return Vec::new();
        }
        let mut sorter: Option<AsyncEnumerableSorter<'_>> = None;
        let mut node = Some(&*self.chain);
        while let Some(level) = node {
            sorter = Some(AsyncEnumerableSorter {
                keys: level.level.compute(elements).await,
                descending: level.level.descending(),
                next: sorter.map(Box::new),
            });
            node = level.parent.as_deref();
        }
        match sorter {
            Some(root) => root.sort(elements.len()).await,
            None => (0..elements.len()).collect(),
        }
    }
}

impl<'q, S> AsyncSequence for AsyncOrderedSequence<'q, S>
where
    S: AsyncSequence,
    S::Item: Clone,
{
    type Item = S::Item;

    fn open(&self) -> AsyncCursor<'_, S::Item> {
        deferred(move || async move {
            let elements = collect(self.source.open()).await?;
            let order = self.permutation(&elements).await;

            #[cfg(feature = "tracing")]
            tracing::trace!(elements = elements.len(), levels = self.levels(), "sorted sequence");

            let mut slots: Vec<Option<S::Item>> = elements.into_iter().map(Some).collect();
            Ok(from_values(
                order.into_iter().filter_map(move |i| slots[i].take()),
            ))
        })
    }
}
