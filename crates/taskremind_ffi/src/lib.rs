//! Flutter-facing bridge for the task reminder core.

pub mod api;
