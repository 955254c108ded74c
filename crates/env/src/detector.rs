use envlink_config::RuntimeSignals;
use envlink_core::RuntimeProfile;

/// Decides which hosting platform the process runs on
pub trait RuntimeDetector: Send + Sync {
    fn detect(&self) -> RuntimeProfile;
}

/// Detection from the identifiers the platform injects.
///
/// A function name wins over a service name when both are present.
#[derive(Debug, Clone)]
pub struct SignalDetector {
    signals: RuntimeSignals,
}

impl SignalDetector {
    #[must_use]
    pub fn new(signals: RuntimeSignals) -> Self {
        Self { signals }
    }
}

impl RuntimeDetector for SignalDetector {
    fn detect(&self) -> RuntimeProfile {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());

        if present(&self.signals.function_name) {
            RuntimeProfile::FunctionRuntime
        } else if present(&self.signals.service_name) {
            RuntimeProfile::ServiceRuntime
        } else {
            RuntimeProfile::Unknown
        }
    }
}

/// Detector that always reports the same profile
#[derive(Debug, Clone, Copy)]
pub struct FixedDetector(pub RuntimeProfile);

impl RuntimeDetector for FixedDetector {
    fn detect(&self) -> RuntimeProfile {
        self.0
    }
}
