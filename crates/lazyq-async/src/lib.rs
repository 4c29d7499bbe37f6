#![forbid(unsafe_code)]
//! lazyq-async: the suspending side of lazyq.
//!
//! Design intent:
//! - An [`AsyncSequence`] opens local `futures` streams; nothing here needs
//!   an executor, a runtime, or `Send`.
//! - Key selectors and comparers may suspend. Each suspension finishes
//!   before the next step starts, so results come out in the same order as
//!   the immediate combinators in `lazyq-operators`.
//! - The canonical default comparers keep the hashed key path in both modes.

pub mod comparer;
pub mod group;
pub mod join;
pub mod keys;
pub mod sequence;
pub mod set;
pub mod sort;
pub mod source;
pub mod traits;

pub use comparer::{
    async_equality_fn, async_order_fn, AsyncEqualityComparer, AsyncEqualityFn,
    AsyncOrderComparer, AsyncOrderFn, Immediate,
};
pub use group::{AsyncAggregateBy, AsyncCountBy, AsyncGroupBy, AsyncGroupResult};
pub use join::{AsyncGroupJoin, AsyncJoin};
pub use keys::{AsyncBuckets, AsyncKeyIndex};
pub use sequence::{AsyncCursor, AsyncSequence};
pub use set::{AsyncDistinct, AsyncExcept, AsyncExclusive, AsyncIntersect, AsyncUnion};
pub use sort::AsyncOrderedSequence;
pub use source::{fetch, lift, unfold, Fetch, Lifted, Unfold};
pub use traits::AsyncQueryExt;
