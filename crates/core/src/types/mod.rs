//! Core domain types for `envlink`.
//!
//! ## Organization
//!
//! - **`runtime`**: the hosting platform profile
//! - **`manifest`**: declared environment variables reported by the platform
//! - **`reference`**: reference strings and their decoded locators
//! - **`cluster`**: connection details for a cluster's key-value API
//! - **`object`**: fetched secret and config map payloads
//! - **`outcome`**: per-entry results and the report of a resolution pass

pub mod cluster;
pub mod manifest;
pub mod object;
pub mod outcome;
pub mod reference;
pub mod runtime;

pub use cluster::*;
pub use manifest::*;
pub use object::*;
pub use outcome::*;
pub use reference::*;
pub use runtime::*;
