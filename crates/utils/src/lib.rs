//! Shared utilities for envlink
//!
//! Logging setup, serialized access to the process environment, and the
//! deadline used to bound a resolution pass.

pub mod deadline;
pub mod sync_env;
pub mod tracing;

pub use deadline::Deadline;
pub use sync_env::SyncEnv;
pub use tracing::LogFormat;
