//! Error type definitions for the EPG browser
//!
//! One application-level error enum covers the failure modes the refresh
//! pipeline and startup can hit. `thiserror` provides the `Display` and
//! `Error` implementations.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// The upstream tree listing failed or returned an unexpected shape.
    /// Fatal to a refresh; nothing is written when this is raised.
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable { message: String },

    /// A single channel file could not be fetched or parsed. Recorded as a
    /// diagnostic by the batcher; the file's channels are simply absent.
    #[error("Failed to process {path}: {message}")]
    FileParse { path: String, message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create an upstream unavailability error with a custom message
    pub fn upstream_unavailable<S: Into<String>>(message: S) -> Self {
        Self::UpstreamUnavailable {
            message: message.into(),
        }
    }

    /// Create a per-file fetch/parse error for the given tree path
    pub fn file_parse<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
