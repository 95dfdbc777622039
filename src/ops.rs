//! Stateful operators.
//!
//! - [`flat_map`]: flattening of nested sources, failing fast.
//! - [`group_by`]: dynamic partitioning by key.
//! - [`ref_count`]: automatic connection management for connectables.
//! - [`selector`]: the shape user callbacks are called through.

pub mod flat_map;
pub mod group_by;
pub mod ref_count;
pub mod selector;
