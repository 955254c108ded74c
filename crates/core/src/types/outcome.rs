//! Per-entry results and the report of a resolution pass

use super::reference::Materialization;
use super::runtime::RuntimeProfile;
use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Stage a reference had reached when its resolution failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStage {
    Parse,
    /// Waiting for a free resolution slot; no call has been made yet
    Queue,
    ClusterResolve,
    Fetch,
    Materialize,
    /// Writing the resolved value into the environment
    Apply,
}

impl fmt::Display for ResolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            ResolutionStage::Parse => "parse",
            ResolutionStage::Queue => "queue",
            ResolutionStage::ClusterResolve => "cluster-resolve",
            ResolutionStage::Fetch => "fetch",
            ResolutionStage::Materialize => "materialize",
            ResolutionStage::Apply => "apply",
        };
        f.write_str(stage)
    }
}

/// Final value for one variable: the decoded value itself, or the path of
/// the file holding it. Cleared from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct MaterializedResult {
    variable: String,
    value: String,
    #[zeroize(skip)]
    materialization: Materialization,
}

impl MaterializedResult {
    #[must_use]
    pub fn inline(variable: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            value: value.into(),
            materialization: Materialization::Inline,
        }
    }

    #[must_use]
    pub fn temp_file(variable: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            value: path.into(),
            materialization: Materialization::TempFile,
        }
    }

    #[must_use]
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// The value assigned to the variable
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn materialization(&self) -> Materialization {
        self.materialization
    }
}

impl fmt::Debug for MaterializedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self.materialization {
            Materialization::Inline => "<redacted>",
            Materialization::TempFile => self.value.as_str(),
        };
        f.debug_struct("MaterializedResult")
            .field("variable", &self.variable)
            .field("value", &value)
            .field("materialization", &self.materialization)
            .finish()
    }
}

/// What happened to one manifest entry
#[derive(Debug)]
pub enum EntryStatus {
    /// The value is not a reference and is used as declared
    Passthrough,
    /// The reference was resolved
    Resolved(MaterializedResult),
    /// Resolution failed; the variable keeps its declared value
    Failed { stage: ResolutionStage, error: Error },
}

#[derive(Debug)]
pub struct EntryOutcome {
    pub variable: String,
    pub status: EntryStatus,
}

impl EntryOutcome {
    #[must_use]
    pub fn passthrough(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            status: EntryStatus::Passthrough,
        }
    }

    #[must_use]
    pub fn resolved(result: MaterializedResult) -> Self {
        Self {
            variable: result.variable().to_string(),
            status: EntryStatus::Resolved(result),
        }
    }

    #[must_use]
    pub fn failed(variable: impl Into<String>, stage: ResolutionStage, error: Error) -> Self {
        Self {
            variable: variable.into(),
            status: EntryStatus::Failed { stage, error },
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self.status, EntryStatus::Failed { .. })
    }
}

/// Overall status of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassStatus {
    /// The runtime was unknown and nothing was attempted
    Skipped,
    /// Every reference resolved
    Complete,
    /// Some references failed and kept their declared values
    Partial { failed: usize },
}

/// Result of one resolution pass, in variable-name order
#[derive(Debug)]
pub struct ResolutionReport {
    pub profile: RuntimeProfile,
    pub outcomes: Vec<EntryOutcome>,
    pub elapsed: Duration,
}

impl ResolutionReport {
    /// Report for a pass that never started because the runtime was unknown
    #[must_use]
    pub fn skipped() -> Self {
        Self {
            profile: RuntimeProfile::Unknown,
            outcomes: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn status(&self) -> PassStatus {
        if !self.profile.is_known() {
            return PassStatus::Skipped;
        }
        match self.failures().count() {
            0 => PassStatus::Complete,
            failed => PassStatus::Partial { failed },
        }
    }

    /// Resolved values, ready to apply
    pub fn resolved(&self) -> impl Iterator<Item = &MaterializedResult> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.status {
            EntryStatus::Resolved(result) => Some(result),
            _ => None,
        })
    }

    /// Failed entries with the stage and error that stopped them
    pub fn failures(&self) -> impl Iterator<Item = (&str, ResolutionStage, &Error)> {
        self.outcomes.iter().filter_map(|outcome| match &outcome.status {
            EntryStatus::Failed { stage, error } => {
                Some((outcome.variable.as_str(), *stage, error))
            }
            _ => None,
        })
    }

    #[must_use]
    pub fn outcome(&self, variable: &str) -> Option<&EntryOutcome> {
        self.outcomes.iter().find(|o| o.variable == variable)
    }
}
