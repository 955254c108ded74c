//! Bearer credentials from the ambient credential source

use crate::http::{api_client, describe, read_body, snippet};
use async_trait::async_trait;
use envlink_core::{constants::CLOUD_PLATFORM_SCOPE, Error, Result};
use serde::Deserialize;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use zeroize::Zeroizing;

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// An OAuth bearer token. The secret is cleared from memory on drop.
#[derive(Clone)]
pub struct AccessToken {
    secret: Zeroizing<String>,
    expires_at: Option<Instant>,
}

impl AccessToken {
    #[must_use]
    pub fn new(secret: impl Into<String>, expires_in: Option<Duration>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
            expires_at: expires_in.map(|ttl| Instant::now() + ttl),
        }
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Whether the token is still usable, with a safety margin
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        match self.expires_at {
            Some(at) => Instant::now() + EXPIRY_MARGIN < at,
            None => true,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of bearer credentials for outbound API calls
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a token valid for at least a short while
    async fn token(&self) -> Result<AccessToken>;
}

/// A fixed token supplied by configuration
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: AccessToken,
}

impl StaticTokenSource {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(secret, None),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn token(&self) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Service account tokens from the instance metadata server, cached until
/// shortly before they expire
pub struct MetadataTokenSource {
    client: reqwest::Client,
    url: String,
    cached: Mutex<Option<AccessToken>>,
}

impl MetadataTokenSource {
    /// Create a source for the metadata server at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: api_client(timeout)?,
            url: format!(
                "{}/computeMetadata/v1/instance/service-accounts/default/token",
                base_url.trim_end_matches('/')
            ),
            cached: Mutex::new(None),
        })
    }

    async fn fetch(&self) -> Result<AccessToken> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("scopes", CLOUD_PLATFORM_SCOPE)])
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| Error::credentials(describe(&e)))?;

        let (status, body) = read_body(response)
            .await
            .map_err(|e| Error::credentials(describe(&e)))?;

        if !status.is_success() {
            return Err(Error::credentials(format!(
                "metadata server returned {status}: {}",
                snippet(&body)
            )));
        }

        let token: MetadataToken = serde_json::from_slice(&body)
            .map_err(|e| Error::credentials(format!("malformed token response: {e}")))?;
        let token = Zeroizing::new(token);

        Ok(AccessToken::new(
            token.access_token.as_str(),
            token.expires_in.map(Duration::from_secs),
        ))
    }
}

impl zeroize::Zeroize for MetadataToken {
    fn zeroize(&mut self) {
        self.access_token.zeroize();
    }
}

#[async_trait]
impl TokenSource for MetadataTokenSource {
    async fn token(&self) -> Result<AccessToken> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.clone());
        }

        let token = self.fetch().await?;
        tracing::debug!("Fetched access token from metadata server");
        *cached = Some(token.clone());
        Ok(token)
    }
}
