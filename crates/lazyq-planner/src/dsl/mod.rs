//! Pipeline DSL front ends.

pub mod yaml;
