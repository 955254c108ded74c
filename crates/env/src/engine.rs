//! Resolution engine
//!
//! One pass detects the runtime, fetches the declared environment manifest
//! and resolves every reference in it. References are independent of each
//! other: a failure is recorded on its own entry and never stops the rest.
//! Writing the results into an environment is a separate, ordered step
//! (see [`ApplyReport`]).

use crate::apply::{ApplyReport, ProcessEnvironment};
use crate::detector::{RuntimeDetector, SignalDetector};
use crate::materializer::Materializer;
use envlink_config::{Config, ResolutionSettings};
use envlink_core::{
    EntryOutcome, Error, PassStatus, Reference, ResolutionReport, ResolutionStage, Result,
    RuntimeProfile,
};
use envlink_platform::{
    ClusterResolver, ContainerClusterResolver, KubernetesObjectFetcher, ManifestFetcher,
    ObjectFetcher, PlatformManifestFetcher,
};
use envlink_utils::Deadline;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Resolves environment references for the running deployment
pub struct Engine {
    detector: Arc<dyn RuntimeDetector>,
    manifests: Arc<dyn ManifestFetcher>,
    clusters: Arc<dyn ClusterResolver>,
    objects: Arc<dyn ObjectFetcher>,
    materializer: Materializer,
    deadline: Duration,
    max_concurrent: usize,
}

impl Engine {
    /// Builder with replaceable collaborators
    #[must_use]
    pub fn builder(settings: &ResolutionSettings) -> EngineBuilder {
        EngineBuilder::new(settings)
    }

    /// Engine wired to the platform APIs described by `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let settings = &config.settings;
        let tokens = envlink_platform::token_source(config)?;

        Self::builder(settings)
            .detector(Arc::new(SignalDetector::new(config.signals.clone())))
            .manifest_fetcher(Arc::new(PlatformManifestFetcher::new(
                config,
                Arc::clone(&tokens),
            )?))
            .cluster_resolver(Arc::new(ContainerClusterResolver::new(
                config.endpoints.container.clone(),
                Arc::clone(&tokens),
                settings.request_timeout,
            )?))
            .object_fetcher(Arc::new(KubernetesObjectFetcher::new(
                tokens,
                settings.request_timeout,
            )))
            .build()
    }

    /// Runtime the engine would resolve for
    #[must_use]
    pub fn profile(&self) -> RuntimeProfile {
        self.detector.detect()
    }

    /// Run one resolution pass without touching any environment.
    ///
    /// Fails only when the manifest cannot be fetched, or the deadline
    /// passes before it arrives. Per-entry failures are reported in the
    /// returned report.
    pub async fn resolve(&self) -> Result<ResolutionReport> {
        let started = Instant::now();
        let profile = self.detector.detect();

        if !profile.is_known() {
            tracing::info!("No known runtime detected, skipping resolution");
            return Ok(ResolutionReport::skipped());
        }

        let deadline = Deadline::after(self.deadline);
        tracing::debug!(profile = %profile, deadline = ?self.deadline, "Starting resolution pass");

        let manifest = deadline
            .run("fetch environment manifest", self.manifests.fetch(profile))
            .await
            .inspect_err(|e| {
                tracing::error!(profile = %profile, error = %e, "Failed to fetch environment manifest");
            })?;

        let semaphore = Semaphore::new(self.max_concurrent);
        let tasks = manifest
            .sorted()
            .into_iter()
            .map(|(variable, value)| self.resolve_entry(variable, value, &semaphore, deadline));
        let outcomes = join_all(tasks).await;

        let report = ResolutionReport {
            profile,
            outcomes,
            elapsed: started.elapsed(),
        };

        match report.status() {
            PassStatus::Partial { failed } => tracing::warn!(
                profile = %profile,
                entries = report.outcomes.len(),
                failed,
                elapsed = ?report.elapsed,
                "Resolution pass finished with failures"
            ),
            _ => tracing::info!(
                profile = %profile,
                entries = report.outcomes.len(),
                resolved = report.resolved().count(),
                elapsed = ?report.elapsed,
                "Resolution pass finished"
            ),
        }

        Ok(report)
    }

    /// Resolve, then write every resolved value into the process environment.
    ///
    /// Values the environment rejects are recorded as failures in the
    /// returned report.
    pub async fn run(&self) -> Result<ResolutionReport> {
        let mut report = self.resolve().await?;
        let written = report.apply(&ProcessEnvironment);
        tracing::debug!(written, status = ?report.status(), "Applied resolution pass");
        Ok(report)
    }

    async fn resolve_entry(
        &self,
        variable: &str,
        value: &str,
        semaphore: &Semaphore,
        deadline: Deadline,
    ) -> EntryOutcome {
        let reference = match Reference::parse(value) {
            Ok(Some(reference)) => reference,
            Ok(None) => return EntryOutcome::passthrough(variable),
            Err(e) => return failed(variable, ResolutionStage::Parse, e.into()),
        };

        let _permit = match deadline
            .run("wait for resolution slot", async {
                semaphore
                    .acquire()
                    .await
                    .map_err(|_| Error::configuration("resolution pool closed"))
            })
            .await
        {
            Ok(permit) => permit,
            Err(e) => return failed(variable, ResolutionStage::Queue, e),
        };

        let connection = match deadline
            .run("resolve cluster", self.clusters.resolve(reference.cluster()))
            .await
        {
            Ok(connection) => connection,
            Err(e) => return failed(variable, ResolutionStage::ClusterResolve, e),
        };

        let body = match deadline
            .run("fetch object", self.objects.fetch(&connection, &reference))
            .await
        {
            Ok(body) => body,
            Err(e) => return failed(variable, ResolutionStage::Fetch, e),
        };

        match self.materializer.materialize(variable, &reference, &body) {
            Ok(result) => {
                tracing::debug!(
                    variable = %variable,
                    kind = %reference.kind(),
                    materialization = ?result.materialization(),
                    "Resolved reference"
                );
                EntryOutcome::resolved(result)
            }
            Err(e) => failed(variable, ResolutionStage::Materialize, e),
        }
    }
}

fn failed(variable: &str, stage: ResolutionStage, error: Error) -> EntryOutcome {
    tracing::warn!(
        variable = %variable,
        stage = %stage,
        error = %error,
        "Failed to resolve reference, keeping declared value"
    );
    EntryOutcome::failed(variable, stage, error)
}

/// Assembles an [`Engine`] from its collaborators
pub struct EngineBuilder {
    detector: Option<Arc<dyn RuntimeDetector>>,
    manifests: Option<Arc<dyn ManifestFetcher>>,
    clusters: Option<Arc<dyn ClusterResolver>>,
    objects: Option<Arc<dyn ObjectFetcher>>,
    materializer: Materializer,
    deadline: Duration,
    max_concurrent: usize,
}

impl EngineBuilder {
    #[must_use]
    pub fn new(settings: &ResolutionSettings) -> Self {
        Self {
            detector: None,
            manifests: None,
            clusters: None,
            objects: None,
            materializer: Materializer::from_settings(settings),
            deadline: settings.deadline,
            max_concurrent: settings.max_concurrent,
        }
    }

    #[must_use]
    pub fn detector(mut self, detector: Arc<dyn RuntimeDetector>) -> Self {
        self.detector = Some(detector);
        self
    }

    #[must_use]
    pub fn manifest_fetcher(mut self, fetcher: Arc<dyn ManifestFetcher>) -> Self {
        self.manifests = Some(fetcher);
        self
    }

    #[must_use]
    pub fn cluster_resolver(mut self, resolver: Arc<dyn ClusterResolver>) -> Self {
        self.clusters = Some(resolver);
        self
    }

    #[must_use]
    pub fn object_fetcher(mut self, fetcher: Arc<dyn ObjectFetcher>) -> Self {
        self.objects = Some(fetcher);
        self
    }

    #[must_use]
    pub fn materializer(mut self, materializer: Materializer) -> Self {
        self.materializer = materializer;
        self
    }

    pub fn build(self) -> Result<Engine> {
        if self.max_concurrent == 0 {
            return Err(Error::configuration("max_concurrent must be at least 1"));
        }

        Ok(Engine {
            detector: self.detector.ok_or_else(|| missing("runtime detector"))?,
            manifests: self.manifests.ok_or_else(|| missing("manifest fetcher"))?,
            clusters: self.clusters.ok_or_else(|| missing("cluster resolver"))?,
            objects: self.objects.ok_or_else(|| missing("object fetcher"))?,
            materializer: self.materializer,
            deadline: self.deadline,
            max_concurrent: self.max_concurrent,
        })
    }
}

fn missing(what: &str) -> Error {
    Error::configuration(format!("engine has no {what}"))
}
