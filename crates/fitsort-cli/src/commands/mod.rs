//! CLI command implementations.

pub mod sort;
