//! Unified error types for the Berth workspace.
//!
//! Higher-level crates define their own domain-specific error enums for
//! outcomes that are not operational failures (see
//! `berth_api::error::StateChangeError`).

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum BerthError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A status string did not name a known status.
    #[error("invalid {kind} status: {value:?}")]
    InvalidStatus {
        /// Which status family was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, BerthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_kind_and_id() {
        let err = BerthError::NotFound {
            kind: "task",
            id: "arn:task/1".into(),
        };
        assert_eq!(err.to_string(), "task not found: arn:task/1");
    }

    #[test]
    fn serde_errors_convert() {
        let source = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: BerthError = source.into();
        assert!(matches!(err, BerthError::Serialization { .. }));
    }
}
