//! Clients for the collaborators of a resolution pass.
//!
//! Each collaborator sits behind a trait so the engine can be exercised with
//! test doubles:
//!
//! - [`TokenSource`]: bearer credentials from the ambient credential source
//! - [`ManifestFetcher`]: declared environment of the running function or service
//! - [`ClusterResolver`]: endpoint and CA certificate of a cluster
//! - [`ObjectFetcher`]: raw secret or config map bodies from a cluster

pub mod auth;
pub mod cluster;
mod http;
pub mod manifest;
pub mod objects;

pub use auth::{AccessToken, MetadataTokenSource, StaticTokenSource, TokenSource};
pub use cluster::{ClusterResolver, ContainerClusterResolver};
pub use manifest::{ManifestFetcher, PlatformManifestFetcher};
pub use objects::{KubernetesObjectFetcher, ObjectFetcher};

use envlink_config::Config;
use envlink_core::Result;
use std::sync::Arc;

/// Token source selected by configuration: a fixed token when one is
/// configured, the instance metadata server otherwise
pub fn token_source(config: &Config) -> Result<Arc<dyn TokenSource>> {
    match &config.settings.access_token {
        Some(token) => Ok(Arc::new(StaticTokenSource::new(token.clone()))),
        None => Ok(Arc::new(MetadataTokenSource::new(
            &config.endpoints.metadata,
            config.settings.request_timeout,
        )?)),
    }
}
