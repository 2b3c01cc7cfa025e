//! Error types for the fallible edges of the client
//!
//! The simulation itself is total; only wire decoding and configuration can
//! fail.

use std::path::PathBuf;

/// Wire protocol errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server message '{0}' carried no match state")]
    MissingState(&'static str),

    #[error("Server error: {0}")]
    Server(String),
}

/// Settings file errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}
