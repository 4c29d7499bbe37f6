#![forbid(unsafe_code)]
//! lazyq-operators: ordering, grouping, set algebra, and joins over
//! `lazyq_core::Sequence`.
//!
//! Design intent:
//! - Every combinator is a plain struct wrapping its inputs; `open` never
//!   reads anything and materializing work runs inside `Cursor::deferred`.
//! - Keys are compared only through `EqualityComparer`/`OrderComparer`; the
//!   hashed fast path is picked per session by `keys::KeyIndex`.
//! - Per-session state (buckets, seen keys, sort keys) never outlives the
//!   cursor that built it.

pub mod group;
pub mod join;
pub mod keys;
pub mod of_type;
pub mod set;
pub mod sort;
pub mod traits;

pub use group::{AggregateBy, CountBy, GroupBy, GroupResult, Grouping, Lookup, Seed};
pub use join::{GroupJoin, InnerMatch, Join};
pub use keys::{Buckets, KeyIndex, MembershipPath};
pub use of_type::{OfType, TypeFilter, Typed};
pub use set::{Distinct, Except, Exclusive, Intersect, Union};
pub use sort::OrderedSequence;
pub use traits::QueryExt;
