//! Hosting platform profiles

use serde::{Deserialize, Serialize};
use std::fmt;

/// The hosting platform a process was detected to run on.
///
/// Determined once per pass from ambient signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeProfile {
    /// A managed function runtime
    #[serde(rename = "function")]
    FunctionRuntime,
    /// A managed container service runtime
    #[serde(rename = "service")]
    ServiceRuntime,
    /// No known platform signals were present
    Unknown,
}

impl RuntimeProfile {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeProfile::FunctionRuntime => "function",
            RuntimeProfile::ServiceRuntime => "service",
            RuntimeProfile::Unknown => "unknown",
        }
    }

    /// Whether a manifest can be fetched for this profile
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, RuntimeProfile::Unknown)
    }
}

impl fmt::Display for RuntimeProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
