//! Core domain types, errors, and constants for `envlink`.
//!
//! This crate holds the pieces every other crate agrees on: the shape of a
//! decoded reference, the objects fetched from a cluster, the outcome of a
//! resolution pass, and the error taxonomy used to report failures.
//!
//! ## Key Components
//!
//! - **`errors`**: the primary `Error` enum and `Result` alias, plus the
//!   `ReferenceError` produced by the reference parser.
//! - **`types`**: `RuntimeProfile`, `Reference`, `ClusterConnection`,
//!   `ObjectPayload` and the per-entry outcome types.
//! - **`constants`**: reference prefixes, ambient signal names and defaults.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, ReferenceError, Result},
    types::*,
};
