//! Stable multi-key ordering.
//!
//! `order_by` starts a chain and every `then_by` pushes a new tie-breaking
//! level onto it. Nothing is sorted until a session is advanced: at that
//! point the source is materialized once, every level computes its keys over
//! the same element list, and the indices are sorted through a linked list
//! of [`sorter::EnumerableSorter`]s.

mod sorter;

use std::sync::Arc;

use lazyq_core::comparer::OrderComparer;
use lazyq_core::error::Result;
use lazyq_core::sequence::{Cursor, Sequence};

use sorter::{EnumerableSorter, KeyLevel, SortLevel};

/// Immutable chain of sort levels; `parent` points at the previous
/// (higher-priority) level.
struct SortChain<'q, T> {
    level: Box<dyn SortLevel<T> + 'q>,
    parent: Option<Arc<SortChain<'q, T>>>,
}

impl<'q, T> SortChain<'q, T> {
    fn depth(&self) -> usize {
        1 + self.parent.as_ref().map_or(0, |p| p.depth())
    }
}

/// A sequence sorted by one or more keys.
pub struct OrderedSequence<'q, S: Sequence> {
    source: S,
    chain: Arc<SortChain<'q, S::Item>>,
}

impl<'q, S: Sequence + Clone> Clone for OrderedSequence<'q, S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            chain: Arc::clone(&self.chain),
        }
    }
}

impl<'q, S: Sequence> OrderedSequence<'q, S> {
    pub(crate) fn new<K, F, C>(source: S, selector: F, comparer: C, descending: bool) -> Self
    where
        F: Fn(&S::Item) -> K + 'q,
        C: OrderComparer<K> + 'q,
        K: 'q,
    {
        Self {
            source,
            chain: Arc::new(SortChain {
                level: Box::new(KeyLevel::new(selector, comparer, descending)),
                parent: None,
            }),
        }
    }

    fn push<K, F, C>(&self, selector: F, comparer: C, descending: bool) -> Arc<SortChain<'q, S::Item>>
    where
        F: Fn(&S::Item) -> K + 'q,
        C: OrderComparer<K> + 'q,
        K: 'q,
    {
        Arc::new(SortChain {
            level: Box::new(KeyLevel::new(selector, comparer, descending)),
            parent: Some(Arc::clone(&self.chain)),
        })
    }

    /// Add an ascending tie-breaking level.
    pub fn then_by<K, F>(self, selector: F) -> Self
    where
        F: Fn(&S::Item) -> K + 'q,
        K: Ord + 'q,
    {
        self.then_by_with(selector, lazyq_core::comparer::DefaultOrder)
    }

    pub fn then_by_with<K, F, C>(self, selector: F, comparer: C) -> Self
    where
        F: Fn(&S::Item) -> K + 'q,
        C: OrderComparer<K> + 'q,
        K: 'q,
    {
        let chain = self.push(selector, comparer, false);
        Self {
            source: self.source,
            chain,
        }
    }

    /// Add a descending tie-breaking level.
    pub fn then_by_descending<K, F>(self, selector: F) -> Self
    where
        F: Fn(&S::Item) -> K + 'q,
        K: Ord + 'q,
    {
        self.then_by_descending_with(selector, lazyq_core::comparer::DefaultOrder)
    }

    pub fn then_by_descending_with<K, F, C>(self, selector: F, comparer: C) -> Self
    where
        F: Fn(&S::Item) -> K + 'q,
        C: OrderComparer<K> + 'q,
        K: 'q,
    {
        let chain = self.push(selector, comparer, true);
        Self {
            source: self.source,
            chain,
        }
    }

    /// Number of chained levels.
    pub fn levels(&self) -> usize {
        self.chain.depth()
    }

    /// Sorted permutation of `elements`' indices.
    fn permutation(&self, elements: &[S::Item]) -> Vec<usize> {
        if elements.is_empty() {
            return Vec::new();
        }
        // Walk from the outermost `then_by` back to the root `order_by`; each
        // sorter built along the way becomes the tie-breaker of the next one.
        let mut sorter: Option<EnumerableSorter<'_>> = None;
        let mut node = Some(&*self.chain);
        while let Some(level) = node {
            sorter = Some(EnumerableSorter::new(
                level.level.compute(elements),
                level.level.descending(),
                sorter.map(Box::new),
            ));
            node = level.parent.as_deref();
        }
        match sorter {
            Some(root) => root.sort(elements.len()),
            None => (0..elements.len()).collect(),
        }
    }
}

impl<'q, S: Sequence> Sequence for OrderedSequence<'q, S> {
    type Item = S::Item;

    fn open(&self) -> Cursor<'_, S::Item> {
        Cursor::deferred(move || {
            let elements = self.source.open().collect::<Result<Vec<_>>>()?;
            let order = self.permutation(&elements);

            #[cfg(feature = "tracing")]
            tracing::trace!(elements = elements.len(), levels = self.levels(), "sorted sequence");

            let mut slots: Vec<Option<S::Item>> = elements.into_iter().map(Some).collect();
            Ok(Cursor::from_values(
                order.into_iter().filter_map(move |i| slots[i].take()),
            ))
        })
    }
}
