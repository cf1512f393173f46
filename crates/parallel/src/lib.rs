//! # Relief Parallel
//!
//! Parallel execution strategies for grid operators.
//!
//! Operators write their destination grid in disjoint row bands. This crate
//! decides how many bands to cut and runs them either on the calling thread
//! or on a rayon worker pool, returning only after every band is finished.

pub mod strategy;

pub use strategy::{num_cpus, ParallelStrategy, ProcessingMode};
