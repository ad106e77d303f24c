//! Bounded-concurrency generation scheduler
//!
//! Dispatches one pipeline per template specification and lets at most
//! the configured number run at once. Specs are independent; there is no
//! ordering between them beyond the concurrency cap, and one run's
//! failure never cancels another.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info};
use vmforge_client::ControlPlane;
use vmforge_core::domain::report::{GenerationReport, TemplateOutcome};
use vmforge_core::domain::stage::Stage;
use vmforge_core::domain::template::TemplateSpec;

use crate::cleanup::{CleanupManager, CleanupMatch};
use crate::image::ProviderRegistry;
use crate::pipeline::{EventSender, PipelineExecutor};
use crate::resolver::ResourceResolver;
use crate::retry::RetryPolicy;

/// Default number of concurrently executing pipelines.
///
/// Deliberately low: a default run should not overwhelm the control
/// plane. Operators raise it explicitly.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Runs generation passes over lists of template specifications.
pub struct GenerationScheduler {
    client: Arc<dyn ControlPlane>,
    providers: Arc<ProviderRegistry>,
    concurrency: usize,
    retry: RetryPolicy,
    cleanup_matching: CleanupMatch,
}

impl GenerationScheduler {
    pub fn new(client: Arc<dyn ControlPlane>, providers: ProviderRegistry) -> Self {
        Self {
            client,
            providers: Arc::new(providers),
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryPolicy::default(),
            cleanup_matching: CleanupMatch::Exact,
        }
    }

    /// Cap on concurrently executing pipelines. Clamped to at least one.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cleanup_matching(mut self, matching: CleanupMatch) -> Self {
        self.cleanup_matching = matching;
        self
    }

    /// Run one generation pass over `specs`.
    ///
    /// Stage transitions are reported on `events` (advisory; a dropped
    /// receiver is ignored). The batch always completes: failures are
    /// collected per template and a panicking pipeline task is folded
    /// into that template's outcome.
    pub async fn run(
        &self,
        specs: Vec<TemplateSpec>,
        events: Option<EventSender>,
    ) -> GenerationReport {
        // The resolver cache lives exactly as long as this pass.
        let resolver = Arc::new(ResourceResolver::new(self.client.clone(), self.retry));
        let semaphore = Arc::new(Semaphore::new(self.concurrency));

        info!(
            "generating {} template(s), at most {} in flight",
            specs.len(),
            self.concurrency
        );

        let mut handles = Vec::new();
        for spec in specs {
            let semaphore = Arc::clone(&semaphore);
            let executor = PipelineExecutor::new(
                self.client.clone(),
                resolver.clone(),
                self.providers.clone(),
                CleanupManager::new(self.client.clone()).with_matching(self.cleanup_matching),
                self.retry,
                events.clone(),
            );

            let name = spec.name().to_string();
            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("scheduler semaphore closed");
                executor.execute(&spec).await
            });
            handles.push((name, handle));
        }

        let mut report = GenerationReport::new();
        for (name, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    error!("pipeline task for '{}' died: {}", name, join_error);
                    TemplateOutcome::Failure {
                        stage: Stage::Pending,
                        error: format!("pipeline task aborted: {}", join_error),
                        rollback_warnings: Vec::new(),
                    }
                }
            };
            report.record(name, outcome);
        }

        info!(
            "generation finished: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        report
    }
}
