//! Convenient re-exports for downstream crates.

pub use crate::comparer::{
    default_equality, default_order, equality_fn, order_fn, DefaultEquality, DefaultOrder,
    EqualityComparer, EqualityFn, IgnoreAsciiCase, KeyEquality, OrderComparer, OrderFn, ReverseOrder,
};
pub use crate::config::EngineConfig;
pub use crate::error::{Error, Result};
pub use crate::sequence::{Cursor, Sequence};
pub use crate::source::{empty, generate, range, repeat, Fallible};
pub use crate::terminal::SequenceExt;
pub use crate::types::{Record, Scalar, TypeTag};
