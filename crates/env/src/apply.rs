//! Apply phase: writes resolved values into an environment

use envlink_core::{EntryStatus, ResolutionReport, ResolutionStage, Result};
use envlink_utils::SyncEnv;
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Destination for resolved variables
pub trait EnvironmentSink: Send + Sync {
    fn set(&self, variable: &str, value: &str) -> Result<()>;
}

/// The process environment table, written under a single global lock
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentSink for ProcessEnvironment {
    fn set(&self, variable: &str, value: &str) -> Result<()> {
        SyncEnv::set_var(variable, value)
    }
}

/// In-memory sink recording every write
#[derive(Debug, Default)]
pub struct MemoryEnvironment {
    vars: Mutex<BTreeMap<String, String>>,
}

impl MemoryEnvironment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, variable: &str) -> Option<String> {
        self.vars.lock().get(variable).cloned()
    }

    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.vars.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.lock().is_empty()
    }
}

impl EnvironmentSink for MemoryEnvironment {
    fn set(&self, variable: &str, value: &str) -> Result<()> {
        self.vars
            .lock()
            .insert(variable.to_string(), value.to_string());
        Ok(())
    }
}

/// Applying a finished report to an environment
pub trait ApplyReport {
    /// Write every resolved entry, in variable-name order, and return how
    /// many were written. Passthrough and failed entries are left untouched.
    ///
    /// A value the sink rejects turns that entry into a failure at
    /// [`ResolutionStage::Apply`]; the remaining entries are still written.
    fn apply(&mut self, sink: &dyn EnvironmentSink) -> usize;
}

impl ApplyReport for ResolutionReport {
    fn apply(&mut self, sink: &dyn EnvironmentSink) -> usize {
        let mut written = 0;
        for outcome in &mut self.outcomes {
            let EntryStatus::Resolved(result) = &outcome.status else {
                continue;
            };

            match sink.set(result.variable(), result.value()) {
                Ok(()) => {
                    tracing::debug!(variable = %outcome.variable, "Applied resolved value");
                    written += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        variable = %outcome.variable,
                        error = %error,
                        "Failed to apply resolved value, keeping declared value"
                    );
                    outcome.status = EntryStatus::Failed {
                        stage: ResolutionStage::Apply,
                        error,
                    };
                }
            }
        }
        written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envlink_core::{EntryOutcome, Error, MaterializedResult, PassStatus, RuntimeProfile};
    use serial_test::serial;
    use std::time::Duration;

    fn report() -> ResolutionReport {
        ResolutionReport {
            profile: RuntimeProfile::ServiceRuntime,
            outcomes: vec![
                EntryOutcome::resolved(MaterializedResult::inline("A", "1")),
                EntryOutcome::failed(
                    "B",
                    ResolutionStage::Fetch,
                    Error::object_fetch("https://k0/api", "denied", Some(403)),
                ),
                EntryOutcome::passthrough("C"),
                EntryOutcome::resolved(MaterializedResult::temp_file("D", "/tmp/envlink-x")),
            ],
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_apply_writes_only_resolved_entries() {
        let sink = MemoryEnvironment::new();
        let mut report = report();
        let written = report.apply(&sink);

        assert_eq!(written, 2);
        assert_eq!(sink.get("A").as_deref(), Some("1"));
        assert_eq!(sink.get("D").as_deref(), Some("/tmp/envlink-x"));
        assert_eq!(sink.get("B"), None);
        assert_eq!(sink.get("C"), None);
        assert_eq!(report.status(), PassStatus::Partial { failed: 1 });
    }

    /// Rejects one variable, records the rest
    #[derive(Default)]
    struct RejectingEnvironment {
        inner: MemoryEnvironment,
    }

    impl EnvironmentSink for RejectingEnvironment {
        fn set(&self, variable: &str, value: &str) -> Result<()> {
            if variable == "A" {
                return Err(Error::environment(variable, "value rejected"));
            }
            self.inner.set(variable, value)
        }
    }

    #[test]
    fn test_rejected_value_does_not_stop_later_entries() {
        let sink = RejectingEnvironment::default();
        let mut report = report();

        assert_eq!(report.apply(&sink), 1);
        assert_eq!(sink.inner.get("A"), None);
        assert_eq!(sink.inner.get("D").as_deref(), Some("/tmp/envlink-x"));

        assert_eq!(report.status(), PassStatus::Partial { failed: 2 });
        let (variable, stage, error) = report.failures().next().unwrap();
        assert_eq!(variable, "A");
        assert_eq!(stage, ResolutionStage::Apply);
        assert!(matches!(error, Error::Environment { .. }));
    }

    #[test]
    #[serial]
    fn test_process_environment_rejects_nul_and_continues() {
        let mut report = ResolutionReport {
            profile: RuntimeProfile::ServiceRuntime,
            outcomes: vec![
                EntryOutcome::resolved(MaterializedResult::inline("ENVLINK_TEST_A_BAD", "a\0b")),
                EntryOutcome::resolved(MaterializedResult::inline("ENVLINK_TEST_B_GOOD", "fine")),
            ],
            elapsed: Duration::ZERO,
        };

        assert_eq!(report.apply(&ProcessEnvironment), 1);
        assert_eq!(SyncEnv::var("ENVLINK_TEST_A_BAD"), None);
        assert_eq!(SyncEnv::var("ENVLINK_TEST_B_GOOD").as_deref(), Some("fine"));
        assert_eq!(report.status(), PassStatus::Partial { failed: 1 });

        SyncEnv::remove_var("ENVLINK_TEST_B_GOOD").unwrap();
    }

    #[test]
    #[serial]
    fn test_process_environment_sink() {
        let sink = ProcessEnvironment;
        sink.set("ENVLINK_TEST_APPLY", "applied").unwrap();
        assert_eq!(SyncEnv::var("ENVLINK_TEST_APPLY").as_deref(), Some("applied"));
        SyncEnv::remove_var("ENVLINK_TEST_APPLY").unwrap();
    }
}
