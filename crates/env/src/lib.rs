//! Environment reference resolution for envlink
//!
//! Values declared as `$SecretKeyRef:` or `$ConfigMapKeyRef:` references are
//! replaced by the data they point at, either inline or through a file.

pub mod apply;
pub mod detector;
pub mod engine;
pub mod materializer;

pub use apply::{ApplyReport, EnvironmentSink, MemoryEnvironment, ProcessEnvironment};
pub use detector::{FixedDetector, RuntimeDetector, SignalDetector};
pub use engine::{Engine, EngineBuilder};
pub use materializer::Materializer;
