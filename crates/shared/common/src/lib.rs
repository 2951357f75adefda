//! Common utilities shared across all crates.
//!
//! This crate provides:
//! - Unified error taxonomy with user-facing messages
//! - Configuration structures

pub mod config;
pub mod error;

pub use config::*;
pub use error::{AppError, AppResult, OptionExt};
