use envlink_core::{Error, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::env;

/// Global lock serializing writes to the process environment table
static ENV_LOCK: Lazy<RwLock<()>> = Lazy::new(|| RwLock::new(()));

/// Thread-safe environment variable operations
pub struct SyncEnv;

impl SyncEnv {
    /// Set an environment variable with thread safety.
    ///
    /// Names that are empty or contain `=` or NUL, and values containing
    /// NUL, are rejected instead of panicking inside `std::env::set_var`.
    pub fn set_var<K: AsRef<str>, V: AsRef<str>>(key: K, value: V) -> Result<()> {
        let (key, value) = (key.as_ref(), value.as_ref());
        validate(key, value)?;

        let _guard = ENV_LOCK.write();
        env::set_var(key, value);
        Ok(())
    }

    /// Get an environment variable with thread safety
    pub fn var<K: AsRef<str>>(key: K) -> Option<String> {
        let _guard = ENV_LOCK.read();
        env::var(key.as_ref()).ok()
    }

    /// Remove an environment variable with thread safety
    pub fn remove_var<K: AsRef<str>>(key: K) -> Result<()> {
        let key = key.as_ref();
        validate(key, "")?;

        let _guard = ENV_LOCK.write();
        env::remove_var(key);
        Ok(())
    }
}

fn validate(key: &str, value: &str) -> Result<()> {
    if key.is_empty() || key.contains('=') || key.contains('\0') {
        return Err(Error::environment(key, "invalid variable name"));
    }
    if value.contains('\0') {
        return Err(Error::environment(key, "value contains a NUL byte"));
    }
    Ok(())
}
