//! Joins with suspending key selectors and comparers.

use std::future::Future;
use std::marker::PhantomData;

use futures::stream::{self, StreamExt};
use lazyq_operators::InnerMatch;

use crate::comparer::AsyncEqualityComparer;
use crate::keys::AsyncBuckets;
use crate::sequence::{collect, cursor, deferred, AsyncCursor, AsyncSequence};

#[derive(Clone)]
pub struct AsyncJoin<O, I, K, OF, OFut, IF, IFut, RF, C> {
    pub(crate) outer: O,
    pub(crate) inner: I,
    pub(crate) outer_key: OF,
    pub(crate) inner_key: IF,
    pub(crate) result: RF,
    pub(crate) comparer: C,
    pub(crate) mode: InnerMatch,
    pub(crate) _key: PhantomData<fn() -> (K, OFut, IFut)>,
}

impl<O, I, K, OF, OFut, IF, IFut, RF, C> AsyncJoin<O, I, K, OF, OFut, IF, IFut, RF, C> {
    pub fn mode(&self) -> InnerMatch {
        self.mode
    }
}

/// Per-session state of the nested loop.
struct NestedLoop<'a, T, U, K> {
    outer: AsyncCursor<'a, T>,
    inner: Vec<U>,
    inner_keys: Vec<K>,
    returned: Vec<bool>,
    current: Option<(T, K)>,
    next_inner: usize,
}

impl<O, I, K, R, OF, OFut, IF, IFut, RF, C> AsyncSequence
    for AsyncJoin<O, I, K, OF, OFut, IF, IFut, RF, C>
where
    O: AsyncSequence,
    O::Item: Clone,
    I: AsyncSequence,
    I::Item: Clone,
    OF: Fn(O::Item) -> OFut,
    OFut: Future<Output = K>,
    IF: Fn(I::Item) -> IFut,
    IFut: Future<Output = K>,
    RF: Fn(&O::Item, &I::Item) -> R,
    C: AsyncEqualityComparer<K>,
{
    type Item = R;

    fn open(&self) -> AsyncCursor<'_, R> {
        deferred(move || async move {
            let inner = collect(self.inner.open()).await?;
            let mut inner_keys = Vec::with_capacity(inner.len());
            for item in &inner {
                inner_keys.push((self.inner_key)(item.clone()).await);
            }

            #[cfg(feature = "tracing")]
            tracing::trace!(inner = inner.len(), mode = ?self.mode, "join inner materialized");

            let once = self.mode == InnerMatch::Once;
            let state = NestedLoop {
                outer: self.outer.open(),
                returned: vec![false; inner.len()],
                inner,
                inner_keys,
                current: None,
                next_inner: 0,
            };
            Ok(cursor(stream::unfold(state, move |mut st| async move {
                loop {
                    if st.current.is_none() {
                        match st.outer.next().await? {
                            Ok(item) => {
                                let key = (self.outer_key)(item.clone()).await;
                                st.current = Some((item, key));
                                st.next_inner = 0;
                            }
                            Err(e) => return Some((Err(e), st)),
                        }
                    }
                    if let Some((item, key)) = &st.current {
                        while st.next_inner < st.inner.len() {
                            let j = st.next_inner;
                            st.next_inner += 1;
                            if once && st.returned[j] {
                                continue;
                            }
                            if self.comparer.equals(key, &st.inner_keys[j]).await {
                                st.returned[j] = true;
                                let joined = (self.result)(item, &st.inner[j]);
                                return Some((Ok(joined), st));
                            }
                        }
                    }
                    st.current = None;
                }
            })))
        })
    }
}

#[derive(Clone)]
pub struct AsyncGroupJoin<O, I, K, OF, OFut, IF, IFut, RF, C> {
    pub(crate) outer: O,
    pub(crate) inner: I,
    pub(crate) outer_key: OF,
    pub(crate) inner_key: IF,
    pub(crate) result: RF,
    pub(crate) comparer: C,
    pub(crate) _key: PhantomData<fn() -> (K, OFut, IFut)>,
}

impl<O, I, K, R, OF, OFut, IF, IFut, RF, C> AsyncSequence
    for AsyncGroupJoin<O, I, K, OF, OFut, IF, IFut, RF, C>
where
    O: AsyncSequence,
    O::Item: Clone,
    I: AsyncSequence,
    OF: Fn(O::Item) -> OFut,
    OFut: Future<Output = K>,
    IF: Fn(I::Item) -> IFut,
    IFut: Future<Output = K>,
    I::Item: Clone,
    RF: Fn(O::Item, &[I::Item]) -> R,
    C: AsyncEqualityComparer<K>,
{
    type Item = R;

    fn open(&self) -> AsyncCursor<'_, R> {
        deferred(move || async move {
            let mut buckets = AsyncBuckets::new(&self.comparer);
            let mut inner = self.inner.open();
            while let Some(item) = inner.next().await {
                let item = item?;
                let key = (self.inner_key)(item.clone()).await;
                buckets.push(key, item).await;
            }

            #[cfg(feature = "tracing")]
            tracing::trace!(buckets = buckets.len(), path = ?buckets.path(), "group join inner bucketed");

            let outer = self.outer.open();
            Ok(cursor(stream::unfold(
                (outer, buckets),
                move |(mut outer, buckets)| async move {
                    let joined = match outer.next().await? {
                        Ok(item) => {
                            let key = (self.outer_key)(item.clone()).await;
                            let matched = buckets.get(&key).await.unwrap_or(&[]);
                            Ok((self.result)(item, matched))
                        }
                        Err(e) => Err(e),
                    };
                    Some((joined, (outer, buckets)))
                },
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use futures::{future, StreamExt};
    use lazyq_core::comparer::IgnoreAsciiCase;
    use lazyq_core::source::Fallible;
    use lazyq_core::Error;
    use lazyq_operators::InnerMatch;

    use crate::comparer::{async_equality_fn, Immediate};
    use crate::sequence::AsyncSequence;
    use crate::source::{fetch, lift};
    use crate::traits::AsyncQueryExt;

    fn people() -> Vec<(u32, &'static str)> {
        vec![(1, "ada"), (2, "bob"), (3, "cy")]
    }

    fn pets() -> Vec<(&'static str, u32)> {
        vec![("rex", 2), ("tom", 1), ("kit", 2), ("nemo", 9)]
    }

    #[tokio::test]
    async fn nested_loop_pairs_in_outer_then_inner_order() {
        let pairs = people()
            .join(
                pets(),
                |p| async move {
                    tokio::task::yield_now().await;
                    p.0
                },
                |q| future::ready(q.1),
                |p, q| (p.1, q.0),
            )
            .to_vec()
            .await
            .unwrap();
        assert_eq!(pairs, vec![("ada", "tom"), ("bob", "rex"), ("bob", "kit")]);
    }

    #[tokio::test]
    async fn once_mode_skips_returned_inner_elements() {
        let outer = vec![("a", 1), ("b", 1), ("c", 2)];
        let inner = vec![(1, 'x'), (2, 'y'), (1, 'z')];
        let every = (&outer)
            .join(&inner, |o| future::ready(o.1), |i| future::ready(i.0), |o, i| (o.0, i.1))
            .to_vec()
            .await
            .unwrap();
        assert_eq!(every, vec![("a", 'x'), ("a", 'z'), ("b", 'x'), ("b", 'z'), ("c", 'y')]);

        let once = (&outer).join_with_mode(
            &inner,
            |o| future::ready(o.1),
            |i| future::ready(i.0),
            |o, i| (o.0, i.1),
            lazyq_core::comparer::default_equality(),
            InnerMatch::Once,
        );
        assert_eq!(once.mode(), InnerMatch::Once);
        assert_eq!(once.to_vec().await.unwrap(), vec![("a", 'x'), ("a", 'z'), ("c", 'y')]);
    }

    #[tokio::test]
    async fn suspending_comparer_matches_keys() {
        let outer = vec!["Ada", "BOB"];
        let inner = vec![("ada", 1), ("bob", 2), ("Bob", 3)];
        let folded = async_equality_fn(|a: String, b: String| async move { a.eq_ignore_ascii_case(&b) });
        let pairs = (&outer)
            .join_with(
                &inner,
                |o| future::ready(o.to_string()),
                |i| future::ready(i.0.to_string()),
                |o, i| (*o, i.1),
                folded,
            )
            .to_vec()
            .await
            .unwrap();
        assert_eq!(pairs, vec![("Ada", 1), ("BOB", 2), ("BOB", 3)]);
    }

    #[tokio::test]
    async fn group_join_yields_one_result_per_outer() {
        let owners = people()
            .group_join(
                pets(),
                |p| future::ready(p.0),
                |q| future::ready(q.1),
                |p, qs| (p.1, qs.iter().map(|q| q.0).collect::<Vec<_>>()),
            )
            .to_vec()
            .await
            .unwrap();
        assert_eq!(
            owners,
            vec![("ada", vec!["tom"]), ("bob", vec!["rex", "kit"]), ("cy", vec![])]
        );

        let empty: Vec<(&str, u32)> = Vec::new();
        let lonely = people()
            .group_join_with(
                empty,
                |p| future::ready(p.1.to_string()),
                |q| future::ready(q.0.to_string()),
                |p, qs| (p.0, qs.len()),
                Immediate(IgnoreAsciiCase),
            )
            .to_vec()
            .await
            .unwrap();
        assert_eq!(lonely, vec![(1, 0), (2, 0), (3, 0)]);
    }

    #[tokio::test]
    async fn inner_is_read_on_first_poll_only() {
        let reads = Cell::new(0);
        let inner = fetch(|| {
            reads.set(reads.get() + 1);
            async { Ok(vec![(1u32, "one")]) }
        });
        let outer = vec![1u32, 2];
        let joined = (&outer).join(&inner, future::ready, |i| future::ready(i.0), |o, i| (*o, i.1));
        let session = joined.open();
        assert_eq!(reads.get(), 0);
        drop(session);
        assert_eq!(joined.to_vec().await.unwrap(), vec![(1, "one")]);
        assert_eq!(reads.get(), 1);
    }

    #[tokio::test]
    async fn errors_propagate_from_either_side() {
        let bad = lift(Fallible::new(vec![Ok(1u32), Err(Error::Source("inner".into()))]));
        let outer = vec![1u32];
        let joined = (&outer).join(&bad, future::ready, future::ready, |o, _| *o);
        assert_eq!(joined.to_vec().await, Err(Error::Source("inner".into())));

        let grouped = (&bad).group_join(&outer, future::ready, future::ready, |o, is| (o, is.len()));
        let mut session = grouped.open();
        assert_eq!(session.next().await, Some(Ok((1, 1))));
        assert_eq!(session.next().await, Some(Err(Error::Source("inner".into()))));
        assert_eq!(session.next().await, None);
    }
}
