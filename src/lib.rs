#![forbid(unsafe_code)]
//! lazyq: deferred query combinators over lazy sequences.
//!
//! Facade over the workspace crates:
//! - `lazyq_core`: the sequence contract, comparers, errors, values;
//! - `lazyq_operators`: ordering, grouping, set algebra, joins;
//! - `lazyq_async`: the same combinators over suspending sequences;
//! - `lazyq_planner` / `lazyq_exec`: YAML record pipelines.

pub use lazyq_async as suspending;
pub use lazyq_core as base;
pub use lazyq_exec as exec;
pub use lazyq_operators as operators;
pub use lazyq_planner as planner;

/// Everything needed to compose synchronous queries.
pub mod prelude {
    pub use lazyq_core::prelude::*;
    pub use lazyq_operators::{Grouping, InnerMatch, QueryExt, TypeFilter};
}
