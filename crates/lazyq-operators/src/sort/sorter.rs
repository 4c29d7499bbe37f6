//! Per-level key materialization and the index comparator.

use std::cmp::Ordering;
use std::marker::PhantomData;

use lazyq_core::comparer::OrderComparer;

/// One `order_by`/`then_by` level, with its key type erased.
pub(crate) trait SortLevel<T> {
    fn descending(&self) -> bool;

    /// Evaluate this level's key selector once per element.
    fn compute<'a>(&'a self, elements: &[T]) -> Box<dyn LevelKeys + 'a>;
}

/// Keys of one level, addressed by original element index.
pub(crate) trait LevelKeys {
    fn compare(&self, a: usize, b: usize) -> Ordering;
}

pub(crate) struct KeyLevel<F, C, K> {
    selector: F,
    comparer: C,
    descending: bool,
    _key: PhantomData<fn() -> K>,
}

impl<F, C, K> KeyLevel<F, C, K> {
    pub(crate) fn new(selector: F, comparer: C, descending: bool) -> Self {
        Self {
            selector,
            comparer,
            descending,
            _key: PhantomData,
        }
    }
}

impl<T, F, C, K> SortLevel<T> for KeyLevel<F, C, K>
where
    F: Fn(&T) -> K,
    C: OrderComparer<K>,
{
    fn descending(&self) -> bool {
        self.descending
    }

    fn compute<'a>(&'a self, elements: &[T]) -> Box<dyn LevelKeys + 'a> {
        Box::new(ComputedKeys {
            keys: elements.iter().map(&self.selector).collect(),
            comparer: &self.comparer,
        })
    }
}

struct ComputedKeys<'a, K, C> {
    keys: Vec<K>,
    comparer: &'a C,
}

impl<K, C: OrderComparer<K>> LevelKeys for ComputedKeys<'_, K, C> {
    fn compare(&self, a: usize, b: usize) -> Ordering {
        self.comparer.compare(&self.keys[a], &self.keys[b])
    }
}

/// Comparator for one level, linked to the next (tie-breaking) level.
///
/// The innermost sorter falls back to the original index, which makes the
/// resulting order stable regardless of the sort algorithm.
pub(crate) struct EnumerableSorter<'a> {
    keys: Box<dyn LevelKeys + 'a>,
    descending: bool,
    next: Option<Box<EnumerableSorter<'a>>>,
}

impl<'a> EnumerableSorter<'a> {
    pub(crate) fn new(
        keys: Box<dyn LevelKeys + 'a>,
        descending: bool,
        next: Option<Box<EnumerableSorter<'a>>>,
    ) -> Self {
        Self {
            keys,
            descending,
            next,
        }
    }

    pub(crate) fn compare(&self, a: usize, b: usize) -> Ordering {
        let mut ord = self.keys.compare(a, b);
        // Invert at this level, before any tie-break below it.
        if self.descending {
            ord = ord.reverse();
        }
        if ord != Ordering::Equal {
            return ord;
        }
        match &self.next {
            Some(next) => next.compare(a, b),
            None => a.cmp(&b),
        }
    }

    /// Original indices in sorted order.
    pub(crate) fn sort(&self, len: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..len).collect();
        indices.sort_unstable_by(|&a, &b| self.compare(a, b));
        indices
    }
}
