#![forbid(unsafe_code)]
//! lazyq-core: the lazy sequence contract, comparers, errors, configs, and
//! the small value model shared by every other lazyq crate.
//!
//! Design intent:
//! - Everything here is synchronous and allocation-light; the suspending
//!   variants live in `lazyq-async`.
//! - Combinators (ordering, grouping, set algebra, joins) live in
//!   `lazyq-operators` and consume sequences only through [`Sequence`].

pub mod adapters;
pub mod comparer;
pub mod config;
pub mod error;
pub mod prelude;
pub mod sequence;
pub mod source;
pub mod terminal;
pub mod types;

pub use comparer::{
    default_equality, default_order, DefaultEquality, DefaultOrder, EqualityComparer,
    OrderComparer,
};
pub use error::{Error, Result};
pub use sequence::{Cursor, Sequence};
pub use terminal::SequenceExt;
