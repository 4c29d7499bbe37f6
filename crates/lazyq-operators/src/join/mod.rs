//! Join engines.
//!
//! [`Join`] is a nested loop: the inner sequence is materialized once per
//! session (keys included) and scanned in full for every outer element.
//! [`GroupJoin`] buckets the inner sequence once and looks each outer key up.

mod group;

use std::marker::PhantomData;

use lazyq_core::comparer::EqualityComparer;
use lazyq_core::error::Result;
use lazyq_core::sequence::{Cursor, Sequence};

pub use group::GroupJoin;

/// How inner elements may be reused across outer elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InnerMatch {
    /// Relational semantics: an inner element pairs with every matching
    /// outer element.
    #[default]
    Every,
    /// An inner element is marked returned after its first match and is
    /// skipped for every later outer element.
    Once,
}

#[derive(Clone)]
pub struct Join<O, I, K, OF, IF, RF, C> {
    pub(crate) outer: O,
    pub(crate) inner: I,
    pub(crate) outer_key: OF,
    pub(crate) inner_key: IF,
    pub(crate) result: RF,
    pub(crate) comparer: C,
    pub(crate) mode: InnerMatch,
    pub(crate) _key: PhantomData<fn() -> K>,
}

impl<O, I, K, OF, IF, RF, C> Join<O, I, K, OF, IF, RF, C> {
    pub fn mode(&self) -> InnerMatch {
        self.mode
    }
}

impl<O, I, K, R, OF, IF, RF, C> Sequence for Join<O, I, K, OF, IF, RF, C>
where
    O: Sequence,
    I: Sequence,
    OF: Fn(&O::Item) -> K,
    IF: Fn(&I::Item) -> K,
    RF: Fn(&O::Item, &I::Item) -> R,
    C: EqualityComparer<K>,
{
    type Item = R;

    fn open(&self) -> Cursor<'_, R> {
        Cursor::deferred(move || {
            let inner = self.inner.open().collect::<Result<Vec<_>>>()?;
            let inner_keys: Vec<K> = inner.iter().map(&self.inner_key).collect();

            #[cfg(feature = "tracing")]
            tracing::trace!(inner = inner.len(), mode = ?self.mode, "join inner materialized");

            let once = self.mode == InnerMatch::Once;
            let mut returned = vec![false; inner.len()];
            let mut outer = self.outer.open();
            let mut current: Option<(O::Item, K)> = None;
            let mut next_inner = 0;

            Ok(Cursor::new(std::iter::from_fn(move || loop {
                if current.is_none() {
                    match outer.next()? {
                        Ok(item) => {
                            let key = (self.outer_key)(&item);
                            current = Some((item, key));
                            next_inner = 0;
                        }
                        Err(e) => return Some(Err(e)),
                    }
                }
                if let Some((item, key)) = &current {
                    while next_inner < inner.len() {
                        let j = next_inner;
                        next_inner += 1;
                        if once && returned[j] {
                            continue;
                        }
                        if self.comparer.equals(key, &inner_keys[j]) {
                            returned[j] = true;
                            return Some(Ok((self.result)(item, &inner[j])));
                        }
                    }
                }
                current = None;
            })))
        })
    }
}
