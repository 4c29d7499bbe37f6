//! Set algebra over keyed membership.
//!
//! Every operator here tracks keys in a [`KeyIndex`], created fresh for each
//! session, so the hash-or-scan choice is made once per iteration from the
//! comparer's identity. Plain forms use the element itself as key; `_by`
//! forms apply the key selector to both sequences.
//!
//! Operators that need the second sequence up front (`except`, `intersect`,
//! `exclusive`) seed it inside a deferred cursor: nothing is read until the
//! first advance.

use std::marker::PhantomData;

use lazyq_core::comparer::EqualityComparer;
use lazyq_core::error::Result;
use lazyq_core::sequence::{Cursor, Sequence};

use crate::keys::KeyIndex;

pub(crate) fn identity_key<T: Clone>(item: &T) -> T {
    item.clone()
}

/// Membership of every key of one session of `source`.
fn seed<'a, S, K, KF, C>(source: &'a S, key: &KF, comparer: &'a C) -> Result<KeyIndex<K, &'a C>>
where
    S: Sequence,
    KF: Fn(&S::Item) -> K,
    C: EqualityComparer<K>,
{
    let mut index = KeyIndex::new(comparer);
    for item in source.open() {
        index.insert(key(&item?));
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(keys = index.len(), path = ?index.path(), "seeded membership");

    Ok(index)
}

#[derive(Clone)]
pub struct Distinct<S, K, KF, C> {
    pub(crate) source: S,
    pub(crate) key: KF,
    pub(crate) comparer: C,
    pub(crate) _key: PhantomData<fn() -> K>,
}

impl<S, K, KF, C> Sequence for Distinct<S, K, KF, C>
where
    S: Sequence,
    KF: Fn(&S::Item) -> K,
    C: EqualityComparer<K>,
{
    type Item = S::Item;

    fn open(&self) -> Cursor<'_, S::Item> {
        let key = &self.key;
        let mut seen = KeyIndex::new(&self.comparer);
        Cursor::new(self.source.open().filter(move |item| match item {
            Ok(value) => seen.insert(key(value)).1,
            Err(_) => true,
        }))
    }
}

#[derive(Clone)]
pub struct Except<A, B, K, KF, C> {
    pub(crate) first: A,
    pub(crate) second: B,
    pub(crate) key: KF,
    pub(crate) comparer: C,
    pub(crate) _key: PhantomData<fn() -> K>,
}

impl<A, B, K, KF, C> Sequence for Except<A, B, K, KF, C>
where
    A: Sequence,
    B: Sequence<Item = A::Item>,
    KF: Fn(&A::Item) -> K,
    C: EqualityComparer<K>,
{
    type Item = A::Item;

    fn open(&self) -> Cursor<'_, A::Item> {
        Cursor::deferred(move || {
            let key = &self.key;
            let mut seen = seed(&self.second, key, &self.comparer)?;
            Ok(Cursor::new(self.first.open().filter(move |item| match item {
                Ok(value) => seen.insert(key(value)).1,
                Err(_) => true,
            })))
        })
    }
}

#[derive(Clone)]
pub struct Intersect<A, B, K, KF, C> {
    pub(crate) first: A,
    pub(crate) second: B,
    pub(crate) key: KF,
    pub(crate) comparer: C,
    pub(crate) _key: PhantomData<fn() -> K>,
}

impl<A, B, K, KF, C> Sequence for Intersect<A, B, K, KF, C>
where
    A: Sequence,
    B: Sequence<Item = A::Item>,
    KF: Fn(&A::Item) -> K,
    C: EqualityComparer<K>,
{
    type Item = A::Item;

    fn open(&self) -> Cursor<'_, A::Item> {
        Cursor::deferred(move || {
            let key = &self.key;
            let present = seed(&self.second, key, &self.comparer)?;
            // Hits are not removed: duplicates in `first` all pass.
            Ok(Cursor::new(self.first.open().filter(move |item| match item {
                Ok(value) => present.contains(&key(value)),
                Err(_) => true,
            })))
        })
    }
}

#[derive(Clone)]
pub struct Union<A, B, K, KF, C> {
    pub(crate) first: A,
    pub(crate) second: B,
    pub(crate) key: KF,
    pub(crate) comparer: C,
    pub(crate) _key: PhantomData<fn() -> K>,
}

impl<A, B, K, KF, C> Sequence for Union<A, B, K, KF, C>
where
    A: Sequence,
    B: Sequence<Item = A::Item>,
    KF: Fn(&A::Item) -> K,
    C: EqualityComparer<K>,
{
    type Item = A::Item;

    fn open(&self) -> Cursor<'_, A::Item> {
        let key = &self.key;
        let mut seen = KeyIndex::new(&self.comparer);
        let both = self.first.open().chain(self.second.open());
        Cursor::new(both.filter(move |item| match item {
            Ok(value) => seen.insert(key(value)).1,
            Err(_) => true,
        }))
    }
}

/// Symmetric difference: `first - second`, then `second - first`.
///
/// Each pass behaves like `except`: its index is seeded from the opposite
/// sequence and emitted keys join it, so repeats within a pass are dropped.
#[derive(Clone)]
pub struct Exclusive<A, B, K, KF, C> {
    pub(crate) first: A,
    pub(crate) second: B,
    pub(crate) key: KF,
    pub(crate) comparer: C,
    pub(crate) _key: PhantomData<fn() -> K>,
}

impl<A, B, K, KF, C> Sequence for Exclusive<A, B, K, KF, C>
where
    A: Sequence,
    B: Sequence<Item = A::Item>,
    KF: Fn(&A::Item) -> K,
    C: EqualityComparer<K>,
{
    type Item = A::Item;

    fn open(&self) -> Cursor<'_, A::Item> {
        let key = &self.key;
        let comparer = &self.comparer;
        let left = Cursor::deferred(move || {
            let mut right_keys = seed(&self.second, key, comparer)?;
            Ok(Cursor::new(self.first.open().filter(move |item| match item {
                Ok(value) => right_keys.insert(key(value)).1,
                Err(_) => true,
            })))
        });
        // Seeded from `first` only once the left pass is exhausted.
        let right = Cursor::deferred(move || {
            let mut left_keys = seed(&self.first, key, comparer)?;
            Ok(Cursor::new(self.second.open().filter(move |item| match item {
                Ok(value) => left_keys.insert(key(value)).1,
                Err(_) => true,
            })))
        });
        Cursor::new(left.chain(right))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use lazyq_core::comparer::{equality_fn, IgnoreAsciiCase, KeyEquality};
    use lazyq_core::source::{empty, generate, Fallible};
    use lazyq_core::sequence::Sequence;
    use lazyq_core::terminal::SequenceExt;
    use lazyq_core::Error;

    use crate::traits::QueryExt;

    #[test]
    fn distinct_keeps_first_occurrences() {
        let letters = vec!["f", "o", "o"];
        assert_eq!(letters.distinct().to_vec().unwrap(), vec!["f", "o"]);
    }

    #[test]
    fn distinct_is_idempotent() {
        let xs = vec![3, 1, 3, 2, 1, 4];
        let once = (&xs).distinct().to_vec().unwrap();
        let twice = (&xs).distinct().distinct().to_vec().unwrap();
        assert_eq!(once, vec![3, 1, 2, 4]);
        assert_eq!(once, twice);
    }

    #[test]
    fn distinct_by_and_custom_comparer() {
        let people = vec![("ann", 31), ("bob", 25), ("cat", 31)];
        let by_age = (&people).distinct_by(|p| p.1).to_vec().unwrap();
        assert_eq!(by_age, vec![("ann", 31), ("bob", 25)]);

        let words = vec!["Hi", "hi", "HO", "ho"];
        let folded = words.distinct_with(IgnoreAsciiCase).to_vec().unwrap();
        assert_eq!(folded, vec!["Hi", "HO"]);
    }

    #[test]
    fn except_scenario() {
        let xs = vec![1, 2, 3, 4, 5];
        assert_eq!(xs.except(vec![3, 4]).to_vec().unwrap(), vec![1, 2, 5]);
    }

    #[test]
    fn except_suppresses_duplicates_and_self() {
        let xs = vec![1, 1, 2, 2, 3];
        assert_eq!((&xs).except(vec![3]).to_vec().unwrap(), vec![1, 2]);
        assert!((&xs).except(&xs).to_vec().unwrap().is_empty());
    }

    #[test]
    fn intersect_scenario_keeps_first_duplicates() {
        let xs = vec![1, 2, 2, 3, 4, 5, 5, 6];
        let hits = xs.intersect(vec![1, 1, 3, 3, 5]).to_vec().unwrap();
        assert_eq!(hits, vec![1, 3, 5, 5]);
    }

    #[test]
    fn intersect_with_self_equals_distinct_for_unique_input() {
        let xs = vec![4, 2, 9];
        assert_eq!(
            (&xs).intersect(&xs).to_vec().unwrap(),
            (&xs).distinct().to_vec().unwrap()
        );
    }

    #[test]
    fn union_with_empty_is_distinct() {
        let xs = vec![2, 1, 2, 3, 1];
        let union = (&xs).union(empty()).to_vec().unwrap();
        assert_eq!(union, (&xs).distinct().to_vec().unwrap());
    }

    #[test]
    fn union_continues_against_the_same_keys() {
        let a = vec![1, 2, 2];
        let b = vec![2, 3, 1, 4, 3];
        assert_eq!(a.union(b).to_vec().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn by_variants_key_both_sequences() {
        let a = vec![("x", 1), ("y", 2), ("z", 3)];
        let b = vec![("q", 2)];
        assert_eq!(
            (&a).except_by(&b, |p| p.1).to_vec().unwrap(),
            vec![("x", 1), ("z", 3)]
        );
        assert_eq!((&a).intersect_by(&b, |p| p.1).to_vec().unwrap(), vec![("y", 2)]);
        assert_eq!(
            (&a).union_by(&b, |p| p.1).to_vec().unwrap(),
            vec![("x", 1), ("y", 2), ("z", 3)]
        );
    }

    #[test]
    fn exclusive_emits_both_sides() {
        let a = vec![1, 2, 3, 3];
        let b = vec![3, 4, 5, 4];
        assert_eq!((&a).exclusive(&b).to_vec().unwrap(), vec![1, 2, 4, 5]);
        // Matches `except` run both ways.
        let mut both = (&a).except(&b).to_vec().unwrap();
        both.extend((&b).except(&a).to_vec().unwrap());
        assert_eq!((&a).exclusive(&b).to_vec().unwrap(), both);
        assert!((&a).exclusive(&a).to_vec().unwrap().is_empty());
    }

    #[test]
    fn exclusive_by_with_custom_comparer() {
        let a = vec!["Ant", "bee"];
        let b = vec!["BEE", "cow"];
        let diff = a
            .exclusive_by_with(b, |w| w.to_string(), IgnoreAsciiCase)
            .to_vec()
            .unwrap();
        assert_eq!(diff, vec!["Ant", "cow"]);
    }

    #[test]
    fn custom_and_default_comparers_agree() {
        let xs: Vec<i32> = (0..40).map(|i| (i * 7) % 13).collect();
        let ys: Vec<i32> = (0..10).collect();
        let scan = KeyEquality(|x: &i32| *x);
        assert_eq!(
            (&xs).except_with(&ys, scan).to_vec().unwrap(),
            (&xs).except(&ys).to_vec().unwrap()
        );
        assert_eq!(
            (&xs).union_with(&ys, scan).to_vec().unwrap(),
            (&xs).union(&ys).to_vec().unwrap()
        );
        assert_eq!(
            (&xs).intersect_with(&ys, scan).to_vec().unwrap(),
            (&xs).intersect(&ys).to_vec().unwrap()
        );
    }

    #[test]
    fn equivalence_classes_collapse() {
        let mod5 = equality_fn(|a: &i32, b: &i32| a % 5 == b % 5);
        let xs = vec![1, 6, 2, 11, 7, 3];
        assert_eq!(xs.distinct_with(mod5).to_vec().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn seeding_waits_for_the_first_advance() {
        let seeded = Cell::new(0);
        let second = generate(|| {
            seeded.set(seeded.get() + 1);
            vec![2]
        });
        let xs = vec![1, 2, 3];
        let result = (&xs).except(&second);
        let mut cursor = result.open();
        assert_eq!(seeded.get(), 0);
        assert_eq!(cursor.next(), Some(Ok(1)));
        assert_eq!(seeded.get(), 1);
        drop(cursor);
        assert_eq!(result.to_vec().unwrap(), vec![1, 3]);
        assert_eq!(seeded.get(), 2);
    }

    #[test]
    fn second_sequence_errors_propagate() {
        let bad = Fallible::new(vec![Ok(1), Err(Error::Source("seed".into()))]);
        let xs = vec![1, 2];
        assert_eq!(
            (&xs).intersect(&bad).to_vec(),
            Err(Error::Source("seed".into()))
        );
        assert_eq!(
            (&xs).exclusive(&bad).to_vec(),
            Err(Error::Source("seed".into()))
        );
    }
}
