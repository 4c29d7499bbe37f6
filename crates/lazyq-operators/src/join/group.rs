use std::marker::PhantomData;

use lazyq_core::comparer::EqualityComparer;
use lazyq_core::sequence::{Cursor, Sequence};

use crate::keys::Buckets;

/// Pairs every outer element with the bucket of inner elements sharing its
/// key; unmatched outer elements see an empty bucket.
#[derive(Clone)]
pub struct GroupJoin<O, I, K, OF, IF, RF, C> {
    pub(crate) outer: O,
    pub(crate) inner: I,
    pub(crate) outer_key: OF,
    pub(crate) inner_key: IF,
    pub(crate) result: RF,
    pub(crate) comparer: C,
    pub(crate) _key: PhantomData<fn() -> K>,
}

impl<O, I, K, R, OF, IF, RF, C> Sequence for GroupJoin<O, I, K, OF, IF, RF, C>
where
    O: Sequence,
    I: Sequence,
    OF: Fn(&O::Item) -> K,
    IF: Fn(&I::Item) -> K,
    RF: Fn(O::Item, &[I::Item]) -> R,
    C: EqualityComparer<K>,
{
    type Item = R;

    fn open(&self) -> Cursor<'_, R> {
        Cursor::deferred(move || {
            let mut buckets = Buckets::new(&self.comparer);
            for item in self.inner.open() {
                let item = item?;
                buckets.push((self.inner_key)(&item), item);
            }

            #[cfg(feature = "tracing")]
            tracing::trace!(groups = buckets.len(), path = ?buckets.path(), "group join inner bucketed");

            Ok(Cursor::new(self.outer.open().map(move |item| {
                item.map(|outer| {
                    let bucket = buckets.get(&(self.outer_key)(&outer)).unwrap_or(&[]);
                    (self.result)(outer, bucket)
                })
            })))
        })
    }
}
