//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep FFI and CLI layers decoupled from storage details.

pub mod reminder_service;
pub mod stats_service;
pub mod task_service;
