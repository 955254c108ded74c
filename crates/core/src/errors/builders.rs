//! Builder methods for creating errors with context

use super::types::Error;
use std::path::PathBuf;

// Helper methods for creating errors with context
impl Error {
    /// Create a manifest fetch error
    #[must_use]
    pub fn manifest_fetch(
        profile: impl Into<String>,
        message: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        Error::ManifestFetch {
            profile: profile.into(),
            message: message.into(),
            status,
        }
    }

    /// Create a cluster resolution error
    #[must_use]
    pub fn cluster_resolution(cluster: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ClusterResolution {
            cluster: cluster.into(),
            message: message.into(),
        }
    }

    /// Create an object fetch error
    #[must_use]
    pub fn object_fetch(
        url: impl Into<String>,
        message: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        Error::ObjectFetch {
            url: url.into(),
            message: message.into(),
            status,
        }
    }

    /// Create a missing key error
    #[must_use]
    pub fn missing_key(object: impl Into<String>, key: impl Into<String>) -> Self {
        Error::MissingKey {
            object: object.into(),
            key: key.into(),
        }
    }

    /// Create a value decode error
    #[must_use]
    pub fn decode(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Decode {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a materialization error
    #[must_use]
    pub fn materialization(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Materialization {
            variable: variable.into(),
            message: message.into(),
        }
    }

    /// Create a credentials error
    #[must_use]
    pub fn credentials(message: impl Into<String>) -> Self {
        Error::Credentials {
            message: message.into(),
        }
    }

    /// Create an environment variable error
    #[must_use]
    pub fn environment(variable: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Environment {
            variable: variable.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(operation: impl Into<String>, duration: std::time::Duration) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration,
        }
    }
}
