//! Error types for envlink operations

mod builders;
mod conversions;
mod reference;
mod types;

pub use reference::ReferenceError;
pub use types::{Error, Result};
