//! Centralized configuration for envlink
//!
//! `Config` is the single source of truth handed to the engine. It is
//! immutable after construction and `Clone + Send + Sync`, so it can be
//! shared across resolution tasks.

use envlink_core::{
    constants::{
        CONTAINER_API_URL, DEFAULT_DEADLINE_SECS, DEFAULT_MAX_CONCURRENT,
        DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SERVICE_REGION, FUNCTIONS_API_URL, METADATA_URL,
        RUN_API_URL_TEMPLATE,
    },
    Error, MissingKeyPolicy, Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Immutable configuration for one engine
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Platform identifiers captured from the environment
    pub signals: RuntimeSignals,

    /// Base URLs of the collaborating APIs
    pub endpoints: ApiEndpoints,

    /// Timeouts, concurrency and materialization policy
    pub settings: ResolutionSettings,
}

/// Snapshot of the identifiers a hosting platform injects into the process.
///
/// Empty values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeSignals {
    pub function_name: Option<String>,
    pub function_region: Option<String>,
    pub function_project: Option<String>,
    pub service_name: Option<String>,
    pub service_project: Option<String>,
    pub service_region: Option<String>,
}

impl RuntimeSignals {
    /// Fully-qualified function resource name
    pub fn function_resource(&self) -> Result<String> {
        let name = required(&self.function_name, "function name")?;
        let project = required(&self.function_project, "function project")?;
        let region = required(&self.function_region, "function region")?;
        Ok(format!(
            "projects/{project}/locations/{region}/functions/{name}"
        ))
    }

    /// Fully-qualified service resource name
    pub fn service_resource(&self) -> Result<String> {
        let name = required(&self.service_name, "service name")?;
        let project = required(&self.service_project, "service project")?;
        Ok(format!("namespaces/{project}/services/{name}"))
    }

    /// Region hosting the service, falling back to the platform default
    #[must_use]
    pub fn service_region(&self) -> &str {
        self.service_region
            .as_deref()
            .unwrap_or(DEFAULT_SERVICE_REGION)
    }
}

fn required<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| Error::configuration(format!("{what} is not set")))
}

/// Base URLs of the platform, cluster-management and metadata APIs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoints {
    /// Function-description API
    pub functions: String,
    /// Service-description API; `{region}` is substituted per request
    pub run: String,
    /// Cluster-management API
    pub container: String,
    /// Instance metadata server
    pub metadata: String,
}

impl ApiEndpoints {
    /// Point every API at one base URL (mock servers, proxies)
    #[must_use]
    pub fn uniform(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            functions: base.clone(),
            run: base.clone(),
            container: base.clone(),
            metadata: base,
        }
    }

    /// Service-description API URL for a region
    #[must_use]
    pub fn run_url(&self, region: &str) -> String {
        self.run.replace("{region}", region)
    }
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            functions: FUNCTIONS_API_URL.to_string(),
            run: RUN_API_URL_TEMPLATE.to_string(),
            container: CONTAINER_API_URL.to_string(),
            metadata: METADATA_URL.to_string(),
        }
    }
}

/// Settings that shape one resolution pass
#[derive(Clone)]
pub struct ResolutionSettings {
    /// Timeout for each outbound request
    pub request_timeout: Duration,

    /// Bound on the whole pass, manifest fetch included
    pub deadline: Duration,

    /// References resolved at the same time
    pub max_concurrent: usize,

    /// Behavior when a referenced key is absent
    pub missing_key: MissingKeyPolicy,

    /// Directory for materialized files; the system temp directory if unset
    pub temp_dir: Option<PathBuf>,

    /// Fixed bearer token used instead of the metadata server
    pub access_token: Option<String>,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            deadline: Duration::from_secs(DEFAULT_DEADLINE_SECS),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            missing_key: MissingKeyPolicy::default(),
            temp_dir: None,
            access_token: None,
        }
    }
}

impl fmt::Debug for ResolutionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionSettings")
            .field("request_timeout", &self.request_timeout)
            .field("deadline", &self.deadline)
            .field("max_concurrent", &self.max_concurrent)
            .field("missing_key", &self.missing_key)
            .field("temp_dir", &self.temp_dir)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
