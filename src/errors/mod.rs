//! Centralized error handling for the EPG browser
//!
//! Error types are defined in [`types`] and re-exported here together with
//! the `AppResult` alias used throughout the crate.
//!
//! # Error Categories
//!
//! - **Upstream errors**: the repository tree listing failed or came back
//!   malformed; these abort a refresh before any store mutation
//! - **File errors**: a single channel file failed to download or parse;
//!   these are logged and skipped, never fatal
//! - **Configuration errors**: malformed settings caught at startup
//!
//! Store and transaction failures propagate as `anyhow` errors from the
//! database layer and surface as 500 responses at the web boundary.

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;
