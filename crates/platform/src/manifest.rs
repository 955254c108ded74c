//! Declared environment of the running function or service

use crate::auth::TokenSource;
use crate::http::{api_client, describe, read_body, snippet};
use async_trait::async_trait;
use envlink_config::{ApiEndpoints, Config, RuntimeSignals};
use envlink_core::{Error, Manifest, Result, RuntimeProfile};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Retrieves the manifest the platform holds for this deployment
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    async fn fetch(&self, profile: RuntimeProfile) -> Result<Manifest>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FunctionDescription {
    #[serde(default)]
    environment_variables: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceDescription {
    #[serde(default)]
    spec: ServiceSpec,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceSpec {
    #[serde(default)]
    template: RevisionTemplate,
}

#[derive(Debug, Default, Deserialize)]
struct RevisionTemplate {
    #[serde(default)]
    spec: RevisionSpec,
}

#[derive(Debug, Default, Deserialize)]
struct RevisionSpec {
    #[serde(default)]
    containers: Vec<Container>,
}

#[derive(Debug, Deserialize)]
struct Container {
    #[serde(default)]
    env: Vec<EnvVar>,
}

#[derive(Debug, Deserialize)]
struct EnvVar {
    name: String,
    #[serde(default)]
    value: Option<String>,
}

impl ServiceDescription {
    fn into_manifest(self) -> Manifest {
        self.spec
            .template
            .spec
            .containers
            .into_iter()
            .flat_map(|container| container.env)
            .map(|var| (var.name, var.value.unwrap_or_default()))
            .collect()
    }
}

/// Manifest fetcher backed by the function and service description APIs
pub struct PlatformManifestFetcher {
    client: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    signals: RuntimeSignals,
    endpoints: ApiEndpoints,
}

impl PlatformManifestFetcher {
    pub fn new(config: &Config, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        Ok(Self {
            client: api_client(config.settings.request_timeout)?,
            tokens,
            signals: config.signals.clone(),
            endpoints: config.endpoints.clone(),
        })
    }

    fn url(&self, profile: RuntimeProfile) -> Result<String> {
        match profile {
            RuntimeProfile::FunctionRuntime => Ok(format!(
                "{}/{}",
                self.endpoints.functions.trim_end_matches('/'),
                self.signals.function_resource()?
            )),
            RuntimeProfile::ServiceRuntime => {
                let base = self.endpoints.run_url(self.signals.service_region());
                Ok(format!(
                    "{}/{}",
                    base.trim_end_matches('/'),
                    self.signals.service_resource()?
                ))
            }
            RuntimeProfile::Unknown => Err(Error::UnknownRuntime),
        }
    }

    async fn get(&self, profile: RuntimeProfile, url: &str) -> Result<Vec<u8>> {
        let token = self.tokens.token().await?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| Error::manifest_fetch(profile.as_str(), describe(&e), None))?;

        let (status, body) = read_body(response)
            .await
            .map_err(|e| Error::manifest_fetch(profile.as_str(), describe(&e), None))?;

        if !status.is_success() {
            return Err(Error::manifest_fetch(
                profile.as_str(),
                snippet(&body),
                Some(status.as_u16()),
            ));
        }
        Ok(body)
    }
}

#[async_trait]
impl ManifestFetcher for PlatformManifestFetcher {
    async fn fetch(&self, profile: RuntimeProfile) -> Result<Manifest> {
        let url = self.url(profile).map_err(|e| match e {
            Error::UnknownRuntime => e,
            other => Error::manifest_fetch(profile.as_str(), other.to_string(), None),
        })?;

        tracing::debug!(profile = %profile, url = %url, "Fetching environment manifest");
        let body = self.get(profile, &url).await?;

        let malformed = |e: serde_json::Error| {
            Error::manifest_fetch(profile.as_str(), format!("malformed response: {e}"), None)
        };

        let manifest = match profile {
            RuntimeProfile::FunctionRuntime => {
                let description: FunctionDescription =
                    serde_json::from_slice(&body).map_err(malformed)?;
                Manifest::from(description.environment_variables)
            }
            _ => {
                let description: ServiceDescription =
                    serde_json::from_slice(&body).map_err(malformed)?;
                description.into_manifest()
            }
        };

        tracing::debug!(profile = %profile, entries = manifest.len(), "Fetched environment manifest");
        Ok(manifest)
    }
}
