//! Turns a fetched object body into the final value of a variable

use envlink_config::ResolutionSettings;
use envlink_core::{
    constants::TEMP_FILE_PREFIX, Error, Materialization, MaterializedResult, MissingKeyPolicy,
    ObjectPayload, Reference, Result,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Decodes the referenced key and hands it over inline or through a file
#[derive(Debug, Clone)]
pub struct Materializer {
    missing_key: MissingKeyPolicy,
    temp_dir: PathBuf,
}

impl Materializer {
    /// `temp_dir` defaults to the system temporary directory
    #[must_use]
    pub fn new(missing_key: MissingKeyPolicy, temp_dir: Option<PathBuf>) -> Self {
        Self {
            missing_key,
            temp_dir: temp_dir.unwrap_or_else(std::env::temp_dir),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &ResolutionSettings) -> Self {
        Self::new(settings.missing_key, settings.temp_dir.clone())
    }

    #[must_use]
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Produce the value for `variable` from the raw body of the referenced object
    pub fn materialize(
        &self,
        variable: &str,
        reference: &Reference,
        body: &[u8],
    ) -> Result<MaterializedResult> {
        let payload = ObjectPayload::from_slice(body)
            .map_err(|e| Error::decode(reference.key(), format!("malformed object body: {e}")))?;
        let bytes = self.extract(&payload, reference)?;

        match reference.materialization() {
            Materialization::Inline => {
                let value = std::str::from_utf8(&bytes).map_err(|_| {
                    Error::materialization(
                        variable,
                        "value is not valid UTF-8; use the tempFile parameter for binary data",
                    )
                })?;
                if value.contains('\0') {
                    return Err(Error::materialization(
                        variable,
                        "value contains a NUL byte; use the tempFile parameter for binary data",
                    ));
                }
                Ok(MaterializedResult::inline(variable, value))
            }
            Materialization::TempFile => {
                let path = self.write_temp_file(&bytes)?;
                tracing::debug!(variable = %variable, path = %path.display(), "Wrote value to file");
                Ok(MaterializedResult::temp_file(
                    variable,
                    path.to_string_lossy(),
                ))
            }
        }
    }

    fn extract(&self, payload: &ObjectPayload, reference: &Reference) -> Result<Zeroizing<Vec<u8>>> {
        match payload.value(reference.key()) {
            Some(stored) => reference.kind().decode(reference.key(), stored),
            None => match self.missing_key {
                MissingKeyPolicy::Fail => Err(Error::missing_key(
                    format!(
                        "{} {}/{}",
                        reference.kind(),
                        reference.namespace(),
                        reference.name()
                    ),
                    reference.key(),
                )),
                MissingKeyPolicy::Empty => Ok(Zeroizing::new(Vec::new())),
            },
        }
    }

    /// Write `contents` to a new owner-only file that outlives the process
    fn write_temp_file(&self, contents: &[u8]) -> Result<PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix(TEMP_FILE_PREFIX)
            .tempfile_in(&self.temp_dir)
            .map_err(|e| Error::file_system(&self.temp_dir, "create temp file", e))?;

        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;

            file.as_file()
                .set_permissions(Permissions::from_mode(0o600))
                .map_err(|e| Error::file_system(file.path(), "set permissions", e))?;
        }

        file.write_all(contents)
            .map_err(|e| Error::file_system(file.path(), "write", e))?;
        file.as_file()
            .sync_all()
            .map_err(|e| Error::file_system(file.path(), "sync", e))?;

        let (_, path) = file
            .keep()
            .map_err(|e| Error::file_system(e.file.path(), "persist", e.error))?;

        if path.is_absolute() {
            Ok(path)
        } else {
            std::fs::canonicalize(&path).map_err(|e| Error::file_system(&path, "canonicalize", e))
        }
    }
}

impl Default for Materializer {
    fn default() -> Self {
        Self::new(MissingKeyPolicy::default(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use tempfile::TempDir;

    const LOCATOR: &str = "/projects/p/locations/l/clusters/c/namespaces/default";

    fn secret(key: &str, query: &str) -> Reference {
        Reference::parse_required(&format!(
            "$SecretKeyRef:{LOCATOR}/secrets/env/keys/{key}{query}"
        ))
        .unwrap()
    }

    fn config_map(key: &str) -> Reference {
        Reference::parse_required(&format!(
            "$ConfigMapKeyRef:{LOCATOR}/configmaps/env/keys/{key}"
        ))
        .unwrap()
    }

    fn body(key: &str, value: &str) -> Vec<u8> {
        format!(r#"{{"apiVersion":"v1","data":{{"{key}":"{value}"}}}}"#).into_bytes()
    }

    #[test]
    fn test_secret_value_is_base64_decoded() {
        let encoded = base64::engine::general_purpose::STANDARD.encode("bar");
        let result = Materializer::default()
            .materialize("FOO", &secret("foo", ""), &body("foo", &encoded))
            .unwrap();

        assert_eq!(result.variable(), "FOO");
        assert_eq!(result.value(), "bar");
        assert_eq!(result.materialization(), Materialization::Inline);
    }

    #[test]
    fn test_config_map_value_is_literal() {
        let result = Materializer::default()
            .materialize("GREETING", &config_map("greeting"), &body("greeting", "hello"))
            .unwrap();
        assert_eq!(result.value(), "hello");
    }

    #[test]
    fn test_missing_key_fails_closed() {
        let err = Materializer::default()
            .materialize("FOO", &secret("foo", ""), &body("other", "eA=="))
            .unwrap_err();
        assert!(matches!(err, Error::MissingKey { .. }));
        assert!(err.to_string().contains("secret default/env"));
    }

    #[test]
    fn test_missing_key_empty_policy() {
        let result = Materializer::new(MissingKeyPolicy::Empty, None)
            .materialize("FOO", &secret("foo", ""), &body("other", "eA=="))
            .unwrap();
        assert_eq!(result.value(), "");
    }

    #[test]
    fn test_invalid_base64_is_decode_error() {
        let err = Materializer::default()
            .materialize("FOO", &secret("foo", ""), &body("foo", "***"))
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_binary_inline_value_is_rejected() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([0xff, 0xfe, 0x00]);
        let err = Materializer::default()
            .materialize("BLOB", &secret("blob", ""), &body("blob", &encoded))
            .unwrap_err();
        assert!(matches!(err, Error::Materialization { .. }));
        assert!(err.to_string().contains("tempFile"));
    }

    #[test]
    fn test_nul_inline_value_is_rejected() {
        let err = Materializer::default()
            .materialize("A_BAD", &config_map("a"), &body("a", "a\\u0000b"))
            .unwrap_err();
        assert!(matches!(err, Error::Materialization { .. }));
        assert!(err.to_string().contains("tempFile"));

        let encoded = base64::engine::general_purpose::STANDARD.encode(b"a\0b");
        let err = Materializer::default()
            .materialize("A_BAD", &secret("a", ""), &body("a", &encoded))
            .unwrap_err();
        assert!(matches!(err, Error::Materialization { .. }));
    }

    #[test]
    fn test_temp_file_materialization() {
        let dir = TempDir::new().unwrap();
        let contents = [0xffu8, 0x00, b'k', b'e', b'y'];
        let encoded = base64::engine::general_purpose::STANDARD.encode(contents);

        let result = Materializer::new(MissingKeyPolicy::Fail, Some(dir.path().to_path_buf()))
            .materialize("KEY_FILE", &secret("key", "?tempFile=true"), &body("key", &encoded))
            .unwrap();

        let path = Path::new(result.value());
        assert_eq!(result.materialization(), Materialization::TempFile);
        assert!(path.is_absolute());
        assert!(path.starts_with(dir.path()));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(TEMP_FILE_PREFIX));
        assert_eq!(std::fs::read(path).unwrap(), contents);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
