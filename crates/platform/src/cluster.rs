//! Cluster endpoint and trust material from the cluster-management API

use crate::auth::TokenSource;
use crate::http::{api_client, describe, read_body, snippet};
use async_trait::async_trait;
use envlink_core::{ClusterConnection, Error, Result, TrustRoot};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Maps a cluster identifier to the connection used to reach it
#[async_trait]
pub trait ClusterResolver: Send + Sync {
    /// `cluster` is the path form from a reference,
    /// e.g. `/projects/p/locations/l/clusters/c`
    async fn resolve(&self, cluster: &str) -> Result<ClusterConnection>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClusterDescription {
    #[serde(default)]
    endpoint: String,
    #[serde(default)]
    master_auth: Option<MasterAuth>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MasterAuth {
    #[serde(default)]
    cluster_ca_certificate: Option<String>,
}

impl ClusterDescription {
    fn into_connection(self, cluster: &str) -> Result<ClusterConnection> {
        if self.endpoint.trim().is_empty() {
            return Err(Error::cluster_resolution(cluster, "cluster has no endpoint"));
        }

        let encoded = self
            .master_auth
            .and_then(|auth| auth.cluster_ca_certificate)
            .filter(|cert| !cert.trim().is_empty())
            .ok_or_else(|| Error::cluster_resolution(cluster, "cluster has no CA certificate"))?;

        let trust_root = TrustRoot::from_base64(&encoded)
            .map_err(|e| Error::cluster_resolution(cluster, e.to_string()))?;

        Ok(ClusterConnection::new(self.endpoint.trim(), trust_root))
    }
}

/// Resolver backed by the container cluster-management API.
///
/// Lookups are not memoized; each reference resolves its own cluster.
pub struct ContainerClusterResolver {
    client: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
    base_url: String,
}

impl ContainerClusterResolver {
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: api_client(timeout)?,
            tokens,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ClusterResolver for ContainerClusterResolver {
    async fn resolve(&self, cluster: &str) -> Result<ClusterConnection> {
        let id = cluster.trim_matches('/');
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), id);
        let token = self.tokens.token().await?;

        tracing::debug!(cluster = %id, "Resolving cluster");
        let response = self
            .client
            .get(&url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| Error::cluster_resolution(id, describe(&e)))?;

        let (status, body) = read_body(response)
            .await
            .map_err(|e| Error::cluster_resolution(id, describe(&e)))?;

        match status {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(Error::cluster_resolution(id, "cluster not found"));
            }
            s => {
                return Err(Error::cluster_resolution(
                    id,
                    format!("status {}: {}", s.as_u16(), snippet(&body)),
                ));
            }
        }

        let description: ClusterDescription = serde_json::from_slice(&body)
            .map_err(|e| Error::cluster_resolution(id, format!("malformed response: {e}")))?;
        let connection = description.into_connection(id)?;

        tracing::debug!(cluster = %id, endpoint = %connection.endpoint(), "Resolved cluster");
        Ok(connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;

    const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

    fn description(endpoint: &str, cert: Option<&str>) -> ClusterDescription {
        ClusterDescription {
            endpoint: endpoint.to_string(),
            master_auth: Some(MasterAuth {
                cluster_ca_certificate: cert.map(str::to_string),
            }),
        }
    }

    #[test]
    fn test_description_into_connection() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(PEM);
        let connection = description("10.0.0.1", Some(&encoded))
            .into_connection("c")
            .unwrap();
        assert_eq!(connection.endpoint(), "10.0.0.1");
        assert_eq!(connection.trust_root().as_pem(), PEM.as_bytes());
    }

    #[test]
    fn test_description_requires_endpoint_and_certificate() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(PEM);
        assert!(description("", Some(&encoded)).into_connection("c").is_err());
        assert!(description("10.0.0.1", None).into_connection("c").is_err());
        assert!(description("10.0.0.1", Some("not base64!"))
            .into_connection("c")
            .is_err());
    }
}
