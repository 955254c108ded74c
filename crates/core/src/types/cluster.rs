//! Connection details for a cluster's key-value API

use crate::errors::{Error, Result};
use base64::Engine as _;
use std::fmt;
use std::sync::Arc;

const PEM_CERTIFICATE_MARKER: &str = "-----BEGIN CERTIFICATE-----";

/// PEM encoded certificate bundle trusted when talking to a cluster
#[derive(Clone, PartialEq, Eq)]
pub struct TrustRoot(Arc<[u8]>);

impl TrustRoot {
    /// Build a trust root from PEM bytes, rejecting data without a certificate block
    pub fn from_pem(pem: impl Into<Vec<u8>>) -> Result<Self> {
        let pem = pem.into();
        let text = std::str::from_utf8(&pem)
            .map_err(|_| Error::configuration("CA certificate is not valid PEM text"))?;
        if !text.contains(PEM_CERTIFICATE_MARKER) {
            return Err(Error::configuration(
                "CA certificate does not contain a PEM certificate block",
            ));
        }
        Ok(Self(pem.into()))
    }

    /// Decode the base64 certificate field reported by the cluster-management API
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let pem = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::configuration(format!("CA certificate is not base64: {e}")))?;
        Self::from_pem(pem)
    }

    #[must_use]
    pub fn as_pem(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for TrustRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrustRoot")
            .field("bytes", &self.0.len())
            .finish()
    }
}

/// Endpoint and trust material for one cluster. Immutable and cheap to share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConnection {
    endpoint: String,
    trust_root: TrustRoot,
}

impl ClusterConnection {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, trust_root: TrustRoot) -> Self {
        Self {
            endpoint: endpoint.into(),
            trust_root,
        }
    }

    /// Host of the cluster API server, as reported by the cluster-management API
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub fn trust_root(&self) -> &TrustRoot {
        &self.trust_root
    }

    /// Base URL of the API server. Always HTTPS; any reported scheme is replaced.
    #[must_use]
    pub fn base_url(&self) -> String {
        let endpoint = self.endpoint.trim_end_matches('/');
        let host = endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"))
            .unwrap_or(endpoint);
        format!("https://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n";

    #[test]
    fn test_trust_root_from_base64() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(PEM);
        let root = TrustRoot::from_base64(&encoded).unwrap();
        assert_eq!(root.as_pem(), PEM.as_bytes());
    }

    #[test]
    fn test_trust_root_rejects_non_pem() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("not a certificate");
        assert!(TrustRoot::from_base64(&encoded).is_err());
        assert!(TrustRoot::from_base64("%%%").is_err());
    }

    #[test]
    fn test_base_url_is_always_https() {
        let root = TrustRoot::from_pem(PEM).unwrap();

        let conn = ClusterConnection::new("35.1.2.3", root.clone());
        assert_eq!(conn.base_url(), "https://35.1.2.3");

        let conn = ClusterConnection::new("https://35.1.2.3/", root.clone());
        assert_eq!(conn.base_url(), "https://35.1.2.3");

        let conn = ClusterConnection::new("http://127.0.0.1:8080/", root);
        assert_eq!(conn.base_url(), "https://127.0.0.1:8080");
    }
}
