//! Crate-wide utilities.

pub mod tracing_targets;
