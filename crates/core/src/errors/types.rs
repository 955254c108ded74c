//! Core error type definitions

use super::reference::ReferenceError;
use std::path::PathBuf;

/// Result type alias for envlink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for envlink operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No known hosting platform could be detected
    #[error("unknown runtime environment")]
    UnknownRuntime,

    /// The declared environment manifest could not be retrieved
    #[error("{}", format_status_error("failed to fetch environment manifest for", .profile, .status, .message))]
    ManifestFetch {
        profile: String,
        message: String,
        status: Option<u16>,
    },

    /// A value carried a reference prefix but could not be decoded
    #[error("invalid reference: {0}")]
    InvalidReference(#[from] ReferenceError),

    /// Cluster endpoint or trust material could not be obtained
    #[error("failed to resolve cluster '{cluster}': {message}")]
    ClusterResolution { cluster: String, message: String },

    /// The referenced object could not be fetched from the cluster
    #[error("{}", format_status_error("failed to fetch", .url, .status, .message))]
    ObjectFetch {
        url: String,
        message: String,
        status: Option<u16>,
    },

    /// The fetched object has no entry for the requested key
    #[error("key '{key}' not found in {object}")]
    MissingKey { object: String, key: String },

    /// The value stored under a key could not be decoded
    #[error("failed to decode value of key '{key}': {message}")]
    Decode { key: String, message: String },

    /// The resolved value could not be handed to the environment
    #[error("failed to materialize '{variable}': {message}")]
    Materialization { variable: String, message: String },

    /// Bearer credentials could not be obtained
    #[error("failed to obtain credentials: {message}")]
    Credentials { message: String },

    /// Environment variable related errors
    #[error("environment variable '{variable}' error: {message}")]
    Environment { variable: String, message: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// File system operations
    #[error("file system {operation} operation failed for '{}': {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Operation timeout errors
    #[error("operation '{operation}' timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },
}

fn format_status_error(action: &str, target: &str, status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("{action} '{target}' (status {code}): {message}"),
        None => format!("{action} '{target}': {message}"),
    }
}

impl Error {
    /// HTTP status attached to the error, if the failure came from a response
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::ManifestFetch { status, .. } | Error::ObjectFetch { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether the error was caused by an elapsed deadline or request timeout
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}
