//! Reference strings and their decoded locators.
//!
//! A reference is a declared environment value of the form
//!
//! ```text
//! $SecretKeyRef:/projects/P/locations/L/clusters/C/namespaces/N/secrets/S/keys/K
//! $ConfigMapKeyRef:/projects/P/locations/L/clusters/C/namespaces/N/configmaps/S/keys/K?tempFile=1
//! ```
//!
//! Values without either prefix are not references and are used verbatim.

use crate::constants::{CONFIG_MAP_REFERENCE_PREFIX, SECRET_REFERENCE_PREFIX, TEMP_FILE_PARAM};
use crate::errors::{Error, ReferenceError, Result};
use base64::Engine as _;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use zeroize::Zeroizing;

/// Number of `/`-separated segments in a locator path, counting the empty
/// segment before the leading separator.
pub const LOCATOR_SEGMENTS: usize = 13;

/// Position of the key segment, the only one that may decode to a `/`
const KEY_SEGMENT: usize = 12;

/// The kind of cluster object a reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Secret,
    ConfigMap,
}

impl ObjectKind {
    /// The reference prefix that selects this kind
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        match self {
            ObjectKind::Secret => SECRET_REFERENCE_PREFIX,
            ObjectKind::ConfigMap => CONFIG_MAP_REFERENCE_PREFIX,
        }
    }

    /// Plural collection name used in locators and API paths
    #[must_use]
    pub fn collection(&self) -> &'static str {
        match self {
            ObjectKind::Secret => "secrets",
            ObjectKind::ConfigMap => "configmaps",
        }
    }

    /// Split a raw value into its kind and locator if it carries a known prefix
    #[must_use]
    pub fn strip_prefix(value: &str) -> Option<(ObjectKind, &str)> {
        [ObjectKind::Secret, ObjectKind::ConfigMap]
            .into_iter()
            .find_map(|kind| value.strip_prefix(kind.prefix()).map(|rest| (kind, rest)))
    }

    /// Decode a stored value into the bytes it represents.
    ///
    /// Secret data is base64 encoded; config map data is literal text.
    pub fn decode(&self, key: &str, stored: &str) -> Result<Zeroizing<Vec<u8>>> {
        match self {
            ObjectKind::Secret => base64::engine::general_purpose::STANDARD
                .decode(stored.trim())
                .map(Zeroizing::new)
                .map_err(|e| Error::decode(key, e.to_string())),
            ObjectKind::ConfigMap => Ok(Zeroizing::new(stored.as_bytes().to_vec())),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Secret => f.write_str("secret"),
            ObjectKind::ConfigMap => f.write_str("configmap"),
        }
    }
}

/// How a resolved value is handed to the process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Materialization {
    /// The variable holds the value itself
    #[default]
    Inline,
    /// The variable holds the path of an owner-only file containing the value
    TempFile,
}

/// A decoded reference locator. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    cluster: String,
    namespace: String,
    kind: ObjectKind,
    name: String,
    key: String,
    materialization: Materialization,
}

impl Reference {
    /// Check whether a raw value carries a reference prefix
    #[must_use]
    pub fn is_reference(value: &str) -> bool {
        ObjectKind::strip_prefix(value).is_some()
    }

    /// Parse a raw declared value.
    ///
    /// Returns `Ok(None)` for values that are not references, which callers
    /// use verbatim.
    pub fn parse(value: &str) -> std::result::Result<Option<Self>, ReferenceError> {
        match ObjectKind::strip_prefix(value) {
            Some((kind, locator)) => Self::parse_locator(kind, locator).map(Some),
            None => Ok(None),
        }
    }

    /// Parse a value that must be a reference
    pub fn parse_required(value: &str) -> std::result::Result<Self, ReferenceError> {
        Self::parse(value)?.ok_or(ReferenceError::UnknownPrefix)
    }

    fn parse_locator(kind: ObjectKind, locator: &str) -> std::result::Result<Self, ReferenceError> {
        if locator.chars().any(char::is_control) {
            return Err(ReferenceError::Unparseable(
                "locator contains control characters".to_string(),
            ));
        }

        let locator = locator.split_once('#').map_or(locator, |(rest, _)| rest);
        let (path, query) = match locator.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (locator, None),
        };

        if !path.starts_with('/') {
            return Err(ReferenceError::MissingLeadingSeparator);
        }

        let raw: Vec<&str> = path.split('/').collect();
        if raw.len() != LOCATOR_SEGMENTS {
            return Err(ReferenceError::SegmentCount {
                expected: LOCATOR_SEGMENTS,
                found: raw.len(),
            });
        }
        let decoded = raw
            .iter()
            .enumerate()
            .map(|(position, segment)| decode_segment(position, segment))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let segments: Vec<&str> = decoded.iter().map(AsRef::as_ref).collect();

        expect_keyword(&segments, 1, &["projects"])?;
        expect_keyword(&segments, 3, &["locations", "zones"])?;
        expect_keyword(&segments, 5, &["clusters"])?;
        expect_keyword(&segments, 7, &["namespaces"])?;
        expect_keyword(&segments, 9, &[kind.collection()])?;
        expect_keyword(&segments, 11, &["keys"])?;

        let project = non_empty(&segments, 2, "project")?;
        let location = non_empty(&segments, 4, "location")?;
        let cluster_name = non_empty(&segments, 6, "cluster")?;
        let namespace = non_empty(&segments, 8, "namespace")?;
        let name = non_empty(&segments, 10, "object name")?;
        let key = non_empty(&segments, 12, "key")?;

        let materialization = match query {
            Some(query) if url::form_urlencoded::parse(query.as_bytes())
                .any(|(param, _)| param == TEMP_FILE_PARAM) =>
            {
                Materialization::TempFile
            }
            _ => Materialization::Inline,
        };

        Ok(Self {
            cluster: format!(
                "/{}/{project}/{}/{location}/{}/{cluster_name}",
                segments[1], segments[3], segments[5]
            ),
            namespace: namespace.to_string(),
            kind,
            name: name.to_string(),
            key: key.to_string(),
            materialization,
        })
    }

    /// Cluster resource path with its leading separator
    #[must_use]
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Cluster resource path without leading separators, as the
    /// cluster-management API expects it
    #[must_use]
    pub fn cluster_id(&self) -> &str {
        self.cluster.trim_start_matches('/')
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn materialization(&self) -> Materialization {
        self.materialization
    }

    /// API path of the referenced object relative to a cluster endpoint
    #[must_use]
    pub fn object_path(&self) -> String {
        format!(
            "/api/v1/namespaces/{}/{}/{}/",
            self.namespace,
            self.kind.collection(),
            self.name
        )
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/namespaces/{}/{}/{}/keys/{}",
            self.cluster,
            self.namespace,
            self.kind.collection(),
            self.name,
            self.key
        )
    }
}

fn expect_keyword(
    segments: &[&str],
    position: usize,
    accepted: &[&'static str],
) -> std::result::Result<(), ReferenceError> {
    let found = segments[position];
    if accepted.contains(&found) {
        Ok(())
    } else {
        Err(ReferenceError::UnexpectedSegment {
            position,
            expected: accepted[0],
            found: found.to_string(),
        })
    }
}

/// Percent-decode one path segment, rejecting malformed escapes
fn decode_segment(
    position: usize,
    segment: &str,
) -> std::result::Result<Cow<'_, str>, ReferenceError> {
    let bytes = segment.as_bytes();
    let well_formed = segment.match_indices('%').all(|(i, _)| {
        bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    if !well_formed {
        return Err(ReferenceError::Unparseable(format!(
            "invalid percent-encoding in '{segment}'"
        )));
    }

    let decoded = percent_decode_str(segment).decode_utf8().map_err(|_| {
        ReferenceError::Unparseable(format!("'{segment}' does not decode to UTF-8"))
    })?;
    if decoded.chars().any(char::is_control) {
        return Err(ReferenceError::Unparseable(format!(
            "'{segment}' decodes to control characters"
        )));
    }
    if position != KEY_SEGMENT && decoded.contains('/') {
        return Err(ReferenceError::Unparseable(format!(
            "'{segment}' decodes to a path separator"
        )));
    }
    Ok(decoded)
}

fn non_empty<'a>(
    segments: &[&'a str],
    position: usize,
    field: &'static str,
) -> std::result::Result<&'a str, ReferenceError> {
    match segments[position] {
        "" => Err(ReferenceError::EmptyField { field }),
        value => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET_REF: &str =
        "$SecretKeyRef:/projects/P/locations/L/clusters/C/namespaces/N/secrets/S/keys/K";
    const CONFIG_MAP_REF: &str =
        "$ConfigMapKeyRef:/projects/hightowerlabs/locations/us-central1/clusters/api/namespaces/default/configmaps/env/keys/ENVIRONMENT";

    #[test]
    fn test_parse_secret_reference() {
        let reference = Reference::parse(SECRET_REF).unwrap().unwrap();

        assert_eq!(reference.cluster(), "/projects/P/locations/L/clusters/C");
        assert_eq!(reference.cluster_id(), "projects/P/locations/L/clusters/C");
        assert_eq!(reference.namespace(), "N");
        assert_eq!(reference.kind(), ObjectKind::Secret);
        assert_eq!(reference.name(), "S");
        assert_eq!(reference.key(), "K");
        assert_eq!(reference.materialization(), Materialization::Inline);
    }

    #[test]
    fn test_parse_config_map_reference() {
        let reference = Reference::parse(CONFIG_MAP_REF).unwrap().unwrap();

        assert_eq!(reference.kind(), ObjectKind::ConfigMap);
        assert_eq!(reference.namespace(), "default");
        assert_eq!(reference.name(), "env");
        assert_eq!(reference.key(), "ENVIRONMENT");
        assert_eq!(
            reference.object_path(),
            "/api/v1/namespaces/default/configmaps/env/"
        );
    }

    #[test]
    fn test_temp_file_parameter_only_changes_materialization() {
        let inline = Reference::parse(SECRET_REF).unwrap().unwrap();
        let temp = Reference::parse(&format!("{SECRET_REF}?tempFile=1"))
            .unwrap()
            .unwrap();

        assert_eq!(temp.materialization(), Materialization::TempFile);
        assert_eq!(temp.cluster(), inline.cluster());
        assert_eq!(temp.namespace(), inline.namespace());
        assert_eq!(temp.kind(), inline.kind());
        assert_eq!(temp.name(), inline.name());
        assert_eq!(temp.key(), inline.key());
    }

    #[test]
    fn test_temp_file_presence_is_enough() {
        let empty = Reference::parse(&format!("{SECRET_REF}?tempFile=")).unwrap().unwrap();
        assert_eq!(empty.materialization(), Materialization::TempFile);

        let bare = Reference::parse(&format!("{SECRET_REF}?tempFile")).unwrap().unwrap();
        assert_eq!(bare.materialization(), Materialization::TempFile);

        let other = Reference::parse(&format!("{SECRET_REF}?mountPath=/etc/app/foo"))
            .unwrap()
            .unwrap();
        assert_eq!(other.materialization(), Materialization::Inline);
    }

    #[test]
    fn test_plain_values_are_not_references() {
        for value in ["", "plain", "SecretKeyRef:/projects", "$secretkeyref:/x", "$OTHER:/a"] {
            assert_eq!(Reference::parse(value), Ok(None));
            assert!(!Reference::is_reference(value));
        }
        assert_eq!(
            Reference::parse_required("plain"),
            Err(ReferenceError::UnknownPrefix)
        );
    }

    #[test]
    fn test_short_path_is_malformed_not_a_panic() {
        let err = Reference::parse("$SecretKeyRef:/projects/P/locations/L/clusters/C")
            .unwrap_err();

        assert_eq!(
            err,
            ReferenceError::SegmentCount {
                expected: LOCATOR_SEGMENTS,
                found: 7
            }
        );
        assert!(err.is_malformed());
        assert!(err.to_string().starts_with("malformed reference"));
    }

    #[test]
    fn test_extra_segments_are_rejected() {
        let err = Reference::parse(&format!("{SECRET_REF}/extra")).unwrap_err();
        assert!(matches!(err, ReferenceError::SegmentCount { found: 14, .. }));
    }

    #[test]
    fn test_relative_locator_is_rejected() {
        let err = Reference::parse("$SecretKeyRef:projects/P/locations/L/clusters/C/namespaces/N/secrets/S/keys/K")
            .unwrap_err();
        assert_eq!(err, ReferenceError::MissingLeadingSeparator);
    }

    #[test]
    fn test_collection_must_match_prefix() {
        let err = Reference::parse(
            "$SecretKeyRef:/projects/P/locations/L/clusters/C/namespaces/N/configmaps/S/keys/K",
        )
        .unwrap_err();

        assert_eq!(
            err,
            ReferenceError::UnexpectedSegment {
                position: 9,
                expected: "secrets",
                found: "configmaps".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_fields_are_rejected() {
        let err = Reference::parse(
            "$SecretKeyRef:/projects/P/locations/L/clusters/C/namespaces//secrets/S/keys/K",
        )
        .unwrap_err();
        assert_eq!(err, ReferenceError::EmptyField { field: "namespace" });

        let err = Reference::parse(
            "$SecretKeyRef:/projects/P/locations/L/clusters/C/namespaces/N/secrets/S/keys/",
        )
        .unwrap_err();
        assert_eq!(err, ReferenceError::EmptyField { field: "key" });
    }

    #[test]
    fn test_zonal_cluster_paths_are_accepted() {
        let reference = Reference::parse(
            "$SecretKeyRef:/projects/P/zones/us-central1-a/clusters/C/namespaces/N/secrets/S/keys/K",
        )
        .unwrap()
        .unwrap();
        assert_eq!(reference.cluster(), "/projects/P/zones/us-central1-a/clusters/C");
    }

    #[test]
    fn test_segments_are_percent_decoded() {
        let reference = Reference::parse(
            "$SecretKeyRef:/projects/P/locations/L/clusters/C/namespaces/N/secrets/my%2Dsecret/keys/my%2Ekey",
        )
        .unwrap()
        .unwrap();
        assert_eq!(reference.name(), "my-secret");
        assert_eq!(reference.key(), "my.key");
    }

    #[test]
    fn test_encoded_separator_does_not_change_segment_count() {
        let reference = Reference::parse(&format!("{SECRET_REF}%2Fsub"))
            .unwrap()
            .unwrap();
        assert_eq!(reference.key(), "K/sub");

        let err = Reference::parse(
            "$SecretKeyRef:/projects/P/locations/L/clusters/C/namespaces/N%2Fx/secrets/S/keys/K",
        )
        .unwrap_err();
        assert!(matches!(err, ReferenceError::Unparseable(_)));
    }

    #[test]
    fn test_malformed_percent_encoding_is_unparseable() {
        for key in ["my%zzkey", "key%", "key%2", "%ff", "a%00b"] {
            let err = Reference::parse(&format!(
                "$SecretKeyRef:/projects/P/locations/L/clusters/C/namespaces/N/secrets/S/keys/{key}"
            ))
            .unwrap_err();
            assert!(matches!(err, ReferenceError::Unparseable(_)), "{key}: {err}");
        }
    }

    #[test]
    fn test_control_characters_are_unparseable() {
        let err = Reference::parse("$SecretKeyRef:/projects/P\n").unwrap_err();
        assert!(matches!(err, ReferenceError::Unparseable(_)));
    }

    #[test]
    fn test_secret_decode_is_base64() {
        let decoded = ObjectKind::Secret.decode("foo", "aGVsbG8=").unwrap();
        assert_eq!(decoded.as_slice(), b"hello");

        let err = ObjectKind::Secret.decode("foo", "not base64!").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_config_map_decode_is_literal() {
        let decoded = ObjectKind::ConfigMap.decode("foo", "aGVsbG8=").unwrap();
        assert_eq!(decoded.as_slice(), b"aGVsbG8=");
    }

    proptest! {
        #[test]
        fn prop_values_without_prefix_pass_through(value in "[^$].*") {
            prop_assert_eq!(Reference::parse(&value), Ok(None));
        }

        #[test]
        fn prop_fields_round_trip(
            project in "[a-z][a-z0-9-]{0,20}",
            location in "[a-z0-9-]{1,20}",
            cluster in "[a-z0-9-]{1,20}",
            namespace in "[a-z0-9-]{1,20}",
            name in "[a-z0-9.-]{1,20}",
            key in "[A-Za-z0-9._-]{1,20}",
            temp_file in any::<bool>(),
        ) {
            let suffix = if temp_file { "?tempFile=true" } else { "" };
            let value = format!(
                "$ConfigMapKeyRef:/projects/{project}/locations/{location}/clusters/{cluster}/namespaces/{namespace}/configmaps/{name}/keys/{key}{suffix}"
            );

            let reference = Reference::parse(&value).unwrap().unwrap();
            prop_assert_eq!(
                reference.cluster(),
                format!("/projects/{project}/locations/{location}/clusters/{cluster}")
            );
            prop_assert_eq!(reference.namespace(), namespace.as_str());
            prop_assert_eq!(reference.name(), name.as_str());
            prop_assert_eq!(reference.key(), key.as_str());
            prop_assert_eq!(
                reference.materialization() == Materialization::TempFile,
                temp_file
            );
        }
    }
}
