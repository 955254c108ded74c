//! Raw secret and config map bodies from a cluster's API server

use crate::auth::TokenSource;
use crate::http::{describe, read_body, snippet};
use async_trait::async_trait;
use envlink_core::{constants::USER_AGENT, ClusterConnection, Error, Reference, Result};
use reqwest::{Certificate, StatusCode};
use std::sync::Arc;
use std::time::Duration;

const MAX_IDLE_PER_HOST: usize = 10;
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches the object a reference points at
#[async_trait]
pub trait ObjectFetcher: Send + Sync {
    /// Return the raw response body of the referenced object
    async fn fetch(&self, connection: &ClusterConnection, reference: &Reference)
        -> Result<Vec<u8>>;
}

/// Fetcher speaking the Kubernetes core API over a client that trusts only
/// the cluster's CA
pub struct KubernetesObjectFetcher {
    tokens: Arc<dyn TokenSource>,
    timeout: Duration,
}

impl KubernetesObjectFetcher {
    #[must_use]
    pub fn new(tokens: Arc<dyn TokenSource>, timeout: Duration) -> Self {
        Self { tokens, timeout }
    }

    fn client(&self, connection: &ClusterConnection) -> Result<reqwest::Client> {
        let endpoint = connection.endpoint();
        let certificate = Certificate::from_pem(connection.trust_root().as_pem())
            .map_err(|e| Error::object_fetch(endpoint, format!("invalid CA certificate: {e}"), None))?;

        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .tls_built_in_root_certs(false)
            .add_root_certificate(certificate)
            .pool_max_idle_per_host(MAX_IDLE_PER_HOST)
            .pool_idle_timeout(IDLE_TIMEOUT)
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::object_fetch(endpoint, format!("failed to build client: {e}"), None))
    }
}

#[async_trait]
impl ObjectFetcher for KubernetesObjectFetcher {
    async fn fetch(
        &self,
        connection: &ClusterConnection,
        reference: &Reference,
    ) -> Result<Vec<u8>> {
        let client = self.client(connection)?;
        let url = format!("{}{}", connection.base_url(), reference.object_path());
        let token = self.tokens.token().await?;

        tracing::debug!(url = %url, kind = %reference.kind(), "Fetching object");
        let response = client
            .get(&url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|e| Error::object_fetch(&url, describe(&e), None))?;

        let (status, body) = read_body(response)
            .await
            .map_err(|e| Error::object_fetch(&url, describe(&e), None))?;

        if status != StatusCode::OK {
            return Err(Error::object_fetch(
                &url,
                snippet(&body),
                Some(status.as_u16()),
            ));
        }
        Ok(body)
    }
}
