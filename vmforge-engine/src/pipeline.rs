//! Per-template pipeline execution
//!
//! Runs the ordered stages for one template end to end. Stages are
//! strictly sequential within a run; every failure is caught at this
//! boundary and folded into the run's terminal outcome, never propagated
//! raw to the scheduler.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use vmforge_client::{ClientError, ControlPlane};
use vmforge_core::domain::object::{ObjectKind, ObjectRef};
use vmforge_core::domain::report::TemplateOutcome;
use vmforge_core::domain::stage::{Stage, StageEvent};
use vmforge_core::domain::template::TemplateSpec;
use vmforge_core::dto::vm::CreateVmParams;

use crate::cleanup::CleanupManager;
use crate::error::{GenerateError, StageFailure};
use crate::image::{ImageProvider, ProviderRegistry};
use crate::resolver::ResourceResolver;
use crate::retry::{RetryPolicy, call_with_retry};

/// Boot the attached disk first, then optical media.
const BOOT_ORDER_DISK_FIRST: &str = "cd";

/// Channel the executor reports stage transitions on.
pub type EventSender = mpsc::UnboundedSender<StageEvent>;

/// Mutable execution record for one template run.
///
/// Owns the run's local artifacts; the platform objects recorded here are
/// deleted on failure only — on success their ownership stays with the
/// platform.
struct PipelineRun {
    build_id: i64,
    stage: Stage,
    work_dir: PathBuf,
    #[allow(dead_code)]
    image_path: Option<PathBuf>,
    disk: Option<ObjectRef>,
    vm: Option<ObjectRef>,
    #[allow(dead_code)]
    template: Option<ObjectRef>,
}

impl PipelineRun {
    fn new(spec: &TemplateSpec) -> Self {
        let build_id = Utc::now().timestamp();
        let work_dir =
            std::env::temp_dir().join(format!("vmforge-{}-{}", spec.name(), build_id));
        Self {
            build_id,
            stage: Stage::Pending,
            work_dir,
            image_path: None,
            disk: None,
            vm: None,
            template: None,
        }
    }
}

/// Executes the stages of one template pipeline.
pub struct PipelineExecutor {
    client: Arc<dyn ControlPlane>,
    resolver: Arc<ResourceResolver>,
    providers: Arc<ProviderRegistry>,
    cleanup: CleanupManager,
    retry: RetryPolicy,
    events: Option<EventSender>,
}

impl PipelineExecutor {
    pub fn new(
        client: Arc<dyn ControlPlane>,
        resolver: Arc<ResourceResolver>,
        providers: Arc<ProviderRegistry>,
        cleanup: CleanupManager,
        retry: RetryPolicy,
        events: Option<EventSender>,
    ) -> Self {
        Self {
            client,
            resolver,
            providers,
            cleanup,
            retry,
            events,
        }
    }

    /// Run all stages for `spec`, returning the terminal outcome.
    ///
    /// Errors never escape this method.
    pub async fn execute(&self, spec: &TemplateSpec) -> TemplateOutcome {
        let mut run = PipelineRun::new(spec);
        info!("[{}] starting pipeline (build {})", spec.name(), run.build_id);

        match self.run_stages(spec, &mut run).await {
            Ok((template, warnings)) => {
                info!("[{}] template ready: {}", spec.name(), template);
                TemplateOutcome::Success { template, warnings }
            }
            Err(failure) => {
                warn!(
                    "[{}] pipeline failed during {}: {}",
                    spec.name(),
                    failure.stage,
                    failure.error
                );
                failure.into_outcome()
            }
        }
    }

    async fn run_stages(
        &self,
        spec: &TemplateSpec,
        run: &mut PipelineRun,
    ) -> Result<(ObjectRef, Vec<String>), StageFailure> {
        self.advance(spec, run, Stage::PreparingImage);
        let provider = self.providers.get(&spec.source.distribution).ok_or_else(|| {
            StageFailure::new(
                Stage::PreparingImage,
                GenerateError::UnsupportedDistribution(spec.source.distribution.clone()),
            )
        })?;

        if let Err(err) = tokio::fs::create_dir_all(&run.work_dir).await {
            return Err(StageFailure::new(Stage::PreparingImage, err.into()));
        }

        let result = self.run_prepared(spec, run, provider.as_ref()).await;

        // Local artifacts never outlive the run, whatever the outcome.
        provider.cleanup(&run.work_dir).await;
        result
    }

    async fn run_prepared(
        &self,
        spec: &TemplateSpec,
        run: &mut PipelineRun,
        provider: &dyn ImageProvider,
    ) -> Result<(ObjectRef, Vec<String>), StageFailure> {
        let image_path = provider
            .prepare(&spec.source, &run.work_dir)
            .await
            .map_err(|e| StageFailure::new(Stage::PreparingImage, e))?;
        debug!("[{}] image ready: {}", spec.name(), image_path.display());
        run.image_path = Some(image_path.clone());

        self.advance(spec, run, Stage::ResolvingResources);
        let (network, sr, base_template) = tokio::try_join!(
            self.resolver
                .resolve(ObjectKind::Network, &spec.target.network),
            self.resolver
                .resolve(ObjectKind::StorageRepository, &spec.target.sr),
            self.resolver
                .resolve(ObjectKind::Template, &spec.source.base_template),
        )
        .map_err(|e| StageFailure::new(Stage::ResolvingResources, e))?;

        self.advance(spec, run, Stage::ImportingDisk);
        let upload_name = upload_name(&image_path, run.build_id);
        let disk = match call_with_retry(self.retry, "disk import", || {
            self.client.import_disk(&sr, &image_path, &upload_name)
        })
        .await
        {
            Ok(disk) => disk,
            Err(err) => {
                let mut warnings = Vec::new();
                // A half-created disk must not outlive the failed import.
                if let GenerateError::PermanentTransport(ClientError::ImportIncomplete {
                    ref disk,
                    ..
                }) = err
                {
                    let orphan = disk.clone();
                    self.delete_best_effort(ObjectKind::Disk, &orphan, &mut warnings)
                        .await;
                }
                return Err(StageFailure::new(Stage::ImportingDisk, err).with_warnings(warnings));
            }
        };
        run.disk = Some(disk.clone());

        self.advance(spec, run, Stage::CreatingVm);
        let params = CreateVmParams {
            name_label: spec.target.name.clone(),
            name_description: describe(spec, run.build_id),
            base_template,
            cpus: spec.target.cpu,
            memory_gib: spec.target.memory_gib,
            tags: tags(spec, run.build_id),
        };
        let vm = call_with_retry(self.retry, "VM creation", || self.client.create_vm(&params))
            .await
            .map_err(|e| StageFailure::new(Stage::CreatingVm, e))?;
        run.vm = Some(vm.clone());

        self.advance(spec, run, Stage::ConfiguringVm);
        if let Err(err) = self.configure_vm(&vm, &disk, &network).await {
            let warnings = self.rollback(run).await;
            return Err(StageFailure::new(Stage::ConfiguringVm, err).with_warnings(warnings));
        }

        self.advance(spec, run, Stage::ConvertingToTemplate);
        let template = match call_with_retry(self.retry, "template conversion", || {
            self.client.convert_to_template(&vm)
        })
        .await
        {
            Ok(template) => template,
            Err(err) => {
                let warnings = self.rollback(run).await;
                return Err(
                    StageFailure::new(Stage::ConvertingToTemplate, err).with_warnings(warnings)
                );
            }
        };
        // Point of no return: the template is the deliverable and is
        // never rolled back, whatever happens below.
        run.template = Some(template.clone());

        self.advance(spec, run, Stage::CleaningUpOld);
        let warnings = self
            .cleanup
            .retire_old_templates(&spec.target.name, &template)
            .await;

        self.advance(spec, run, Stage::Done);
        Ok((template, warnings))
    }

    /// Attach disk and network, then make the disk boot first.
    async fn configure_vm(
        &self,
        vm: &ObjectRef,
        disk: &ObjectRef,
        network: &ObjectRef,
    ) -> Result<(), GenerateError> {
        call_with_retry(self.retry, "disk attach", || {
            self.client.attach_disk(vm, disk)
        })
        .await?;
        call_with_retry(self.retry, "network attach", || {
            self.client.attach_network(vm, network)
        })
        .await?;
        call_with_retry(self.retry, "boot order", || {
            self.client.set_boot_order(vm, BOOT_ORDER_DISK_FIRST)
        })
        .await?;
        Ok(())
    }

    /// Delete the platform objects this run created, best-effort.
    async fn rollback(&self, run: &PipelineRun) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(vm) = &run.vm {
            self.delete_best_effort(ObjectKind::Vm, vm, &mut warnings)
                .await;
        }
        if let Some(disk) = &run.disk {
            self.delete_best_effort(ObjectKind::Disk, disk, &mut warnings)
                .await;
        }
        warnings
    }

    async fn delete_best_effort(
        &self,
        kind: ObjectKind,
        target: &ObjectRef,
        warnings: &mut Vec<String>,
    ) {
        if let Err(err) = self.client.delete_object(kind, target).await {
            let message = format!("rollback: failed to delete {} {}: {}", kind, target, err);
            warn!("{}", message);
            warnings.push(message);
        }
    }

    fn advance(&self, spec: &TemplateSpec, run: &mut PipelineRun, stage: Stage) {
        debug!("[{}] {} -> {}", spec.name(), run.stage, stage);
        run.stage = stage;
        if let Some(events) = &self.events {
            let _ = events.send(StageEvent {
                template: spec.name().to_string(),
                stage,
            });
        }
    }
}

/// Upload name for the imported disk, unique per build.
fn upload_name(image_path: &Path, build_id: i64) -> String {
    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("disk");
    let extension = image_path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("img");
    format!("{}.{}.{}", stem, build_id, extension)
}

fn describe(spec: &TemplateSpec, build_id: i64) -> String {
    format!(
        "{} {} {} {} template (build {})",
        spec.source.distribution,
        spec.source.version,
        spec.source.variant,
        spec.source.architecture,
        build_id
    )
}

fn tags(spec: &TemplateSpec, build_id: i64) -> Vec<String> {
    vec![
        format!("template.{}", spec.target.name),
        format!("build.{}", build_id),
        format!("arch.{}", spec.source.architecture),
        format!("version.{}", spec.source.version),
    ]
}
