//! Configuration for envlink
//!
//! The engine never reads ambient process state on its own. Everything it
//! needs (platform signals, API endpoints, timeouts and policies) is captured
//! once into an immutable [`Config`] by the [`ConfigLoader`].

pub mod config;
pub mod loader;

pub use config::*;
pub use loader::ConfigLoader;
