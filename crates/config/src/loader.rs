//! Configuration loader for envlink
//!
//! Captures ambient process state exactly once and turns it into a
//! [`Config`]. Tests hand the loader an explicit variable map instead.

use crate::config::{ApiEndpoints, Config, ResolutionSettings, RuntimeSignals};
use envlink_core::{
    constants::{
        ACCESS_TOKEN_VAR, ENVLINK_DEADLINE_VAR, ENVLINK_MAX_CONCURRENT_VAR,
        ENVLINK_MISSING_KEY_VAR, ENVLINK_REQUEST_TIMEOUT_VAR, ENVLINK_TEMP_DIR_VAR,
        FUNCTION_NAME_VAR, FUNCTION_PROJECT_VAR, FUNCTION_REGION_VAR, METADATA_HOST_VAR,
        SERVICE_NAME_VAR, SERVICE_PROJECT_VAR, SERVICE_REGION_VAR,
    },
    Error, MissingKeyPolicy, Result,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Builder that produces a [`Config`] from an environment snapshot
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Variables to read; the process environment if unset
    environment: Option<HashMap<String, String>>,
    /// Endpoint overrides
    endpoints: Option<ApiEndpoints>,
    /// Base settings that `ENVLINK_*` variables refine
    settings: Option<ResolutionSettings>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from an explicit variable map instead of the process environment
    pub fn environment(mut self, environment: HashMap<String, String>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Snapshot the current process environment
    pub fn capture_process_env(mut self) -> Self {
        self.environment = Some(std::env::vars().collect());
        self
    }

    /// Override API endpoints
    pub fn endpoints(mut self, endpoints: ApiEndpoints) -> Self {
        self.endpoints = Some(endpoints);
        self
    }

    /// Start from explicit settings
    pub fn settings(mut self, settings: ResolutionSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the configuration
    pub fn load(self) -> Result<Config> {
        let env = match self.environment {
            Some(env) => env,
            None => std::env::vars().collect(),
        };
        let lookup = |name: &str| {
            env.get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let signals = RuntimeSignals {
            function_name: lookup(FUNCTION_NAME_VAR),
            function_region: lookup(FUNCTION_REGION_VAR),
            function_project: lookup(FUNCTION_PROJECT_VAR),
            service_name: lookup(SERVICE_NAME_VAR),
            service_project: lookup(SERVICE_PROJECT_VAR),
            service_region: lookup(SERVICE_REGION_VAR),
        };

        let mut endpoints = self.endpoints.unwrap_or_default();
        if let Some(host) = lookup(METADATA_HOST_VAR) {
            endpoints.metadata = format!("http://{host}");
        }

        let mut settings = self.settings.unwrap_or_default();
        if let Some(secs) = parse_var::<u64>(&lookup, ENVLINK_REQUEST_TIMEOUT_VAR)? {
            settings.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ENVLINK_DEADLINE_VAR)? {
            settings.deadline = Duration::from_secs(secs);
        }
        if let Some(max) = parse_var::<usize>(&lookup, ENVLINK_MAX_CONCURRENT_VAR)? {
            if max == 0 {
                return Err(Error::configuration(format!(
                    "{ENVLINK_MAX_CONCURRENT_VAR} must be at least 1"
                )));
            }
            settings.max_concurrent = max;
        }
        if let Some(policy) = lookup(ENVLINK_MISSING_KEY_VAR) {
            settings.missing_key = MissingKeyPolicy::from_str(&policy)?;
        }
        if let Some(dir) = lookup(ENVLINK_TEMP_DIR_VAR) {
            settings.temp_dir = Some(PathBuf::from(dir));
        }
        if let Some(token) = lookup(ACCESS_TOKEN_VAR) {
            settings.access_token = Some(token);
        }

        tracing::debug!(
            signals = ?signals,
            settings = ?settings,
            "Loaded envlink configuration"
        );

        Ok(Config {
            signals,
            endpoints,
            settings,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| Error::environment(name, format!("invalid value '{raw}': {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_captures_signals() {
        let config = ConfigLoader::new()
            .environment(env(&[
                ("K_SERVICE", "env"),
                ("GOOGLE_CLOUD_PROJECT", "hightowerlabs"),
                ("REGION", "asia-northeast1"),
                ("FUNCTION_NAME", ""),
            ]))
            .load()
            .unwrap();

        assert_eq!(config.signals.service_name.as_deref(), Some("env"));
        assert_eq!(config.signals.service_region(), "asia-northeast1");
        assert_eq!(config.signals.function_name, None);
    }

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::new().environment(HashMap::new()).load().unwrap();

        assert_eq!(config.signals, RuntimeSignals::default());
        assert_eq!(config.endpoints, ApiEndpoints::default());
        assert_eq!(config.settings.max_concurrent, 4);
        assert_eq!(config.settings.missing_key, MissingKeyPolicy::Fail);
        assert!(config.settings.access_token.is_none());
    }

    #[test]
    fn test_settings_overrides() {
        let config = ConfigLoader::new()
            .environment(env(&[
                ("ENVLINK_REQUEST_TIMEOUT_SECS", "3"),
                ("ENVLINK_DEADLINE_SECS", "12"),
                ("ENVLINK_MAX_CONCURRENT", "8"),
                ("ENVLINK_MISSING_KEY", "empty"),
                ("ENVLINK_TEMP_DIR", "/run/secrets"),
                ("GOOGLE_OAUTH_ACCESS_TOKEN", "ya29.token"),
                ("GCE_METADATA_HOST", "169.254.169.254"),
            ]))
            .load()
            .unwrap();

        let settings = &config.settings;
        assert_eq!(settings.request_timeout, Duration::from_secs(3));
        assert_eq!(settings.deadline, Duration::from_secs(12));
        assert_eq!(settings.max_concurrent, 8);
        assert_eq!(settings.missing_key, MissingKeyPolicy::Empty);
        assert_eq!(settings.temp_dir, Some(PathBuf::from("/run/secrets")));
        assert_eq!(settings.access_token.as_deref(), Some("ya29.token"));
        assert_eq!(config.endpoints.metadata, "http://169.254.169.254");
    }

    #[test]
    fn test_invalid_overrides_are_rejected() {
        let err = ConfigLoader::new()
            .environment(env(&[("ENVLINK_DEADLINE_SECS", "soon")]))
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("ENVLINK_DEADLINE_SECS"));

        assert!(ConfigLoader::new()
            .environment(env(&[("ENVLINK_MAX_CONCURRENT", "0")]))
            .load()
            .is_err());

        assert!(ConfigLoader::new()
            .environment(env(&[("ENVLINK_MISSING_KEY", "ignore")]))
            .load()
            .is_err());
    }

    #[test]
    #[serial]
    fn test_capture_process_env() {
        std::env::set_var("K_SERVICE", "from-process");
        let config = ConfigLoader::new().capture_process_env().load().unwrap();
        std::env::remove_var("K_SERVICE");

        assert_eq!(config.signals.service_name.as_deref(), Some("from-process"));
    }
}
