//! Secret and config map payloads returned by a cluster's key-value API

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// A fetched secret or config map. Only `data` is consulted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectPayload {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl ObjectPayload {
    /// Decode a raw response body
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Stored (still encoded) value for a key
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

/// What to do when the fetched object has no entry for the requested key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingKeyPolicy {
    /// Fail the entry and leave the variable untouched
    #[default]
    Fail,
    /// Materialize an empty value
    Empty,
}

impl FromStr for MissingKeyPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(MissingKeyPolicy::Fail),
            "empty" => Ok(MissingKeyPolicy::Empty),
            other => Err(Error::configuration(format!(
                "unknown missing key policy '{other}' (expected 'fail' or 'empty')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_decodes_data_map() {
        let body = br#"{"apiVersion":"v1","kind":"Secret","data":{"foo":"YmFy"}}"#;
        let payload = ObjectPayload::from_slice(body).unwrap();

        assert_eq!(payload.kind, "Secret");
        assert_eq!(payload.value("foo"), Some("YmFy"));
        assert_eq!(payload.value("missing"), None);
    }

    #[test]
    fn test_payload_without_data_is_empty() {
        let payload = ObjectPayload::from_slice(br#"{"kind":"ConfigMap"}"#).unwrap();
        assert!(payload.data.is_empty());
    }

    #[test]
    fn test_malformed_payload_is_json_error() {
        let err = ObjectPayload::from_slice(b"<html>").unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
    }

    #[test]
    fn test_missing_key_policy_parsing() {
        assert_eq!("fail".parse::<MissingKeyPolicy>().unwrap(), MissingKeyPolicy::Fail);
        assert_eq!(" Empty ".parse::<MissingKeyPolicy>().unwrap(), MissingKeyPolicy::Empty);
        assert!("ignore".parse::<MissingKeyPolicy>().is_err());
    }
}
