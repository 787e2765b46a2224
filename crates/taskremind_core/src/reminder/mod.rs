//! Reminder evaluation engine.
//!
//! # Responsibility
//! - Decide which reminder events are due for a task snapshot.
//! - Bound delivery log growth with pure retention helpers.
//!
//! # Invariants
//! - Nothing in this module performs I/O or reads the system clock.
//! - Inputs are never mutated; callers own persistence of new records.

pub mod config;
pub mod evaluator;
pub mod retention;
