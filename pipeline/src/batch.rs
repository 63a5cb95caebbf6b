use crate::generator::TestGenClient;
use crate::language::Language;
use crate::outdir::unique_output_dir;
use crate::provision::{ensure_java_toolchain, ProvisionError};
use crate::report::{archive_reports, render_report, write_report};
use crate::runner::{TestArtifact, TestRunner, DEFAULT_EXECUTION_TIMEOUT};
use crate::scanner::{scan_modules, SourceModule};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Failed to scan source directory {path}: {source}")]
    Scan { path: PathBuf, source: io::Error },

    #[error("Failed to create output directory {path}: {source}")]
    CreateOutputDir { path: PathBuf, source: io::Error },

    #[error("Toolchain provisioning failed: {0}")]
    Provision(#[from] ProvisionError),
}

/// Terminal state of one module's trip through the pipeline. Everything
/// short of a batch-fatal error lands in one of these, so callers and
/// tests can assert on structured outcomes instead of log output.
#[derive(Debug, Clone)]
pub enum ModuleOutcome {
    /// Generation failed or timed out; no artifact, no report.
    GenerationFailed { module: String },
    /// The generated test could not be persisted.
    ArtifactWriteFailed { module: String, error: String },
    /// The artifact ran to completion. `report` is absent when the report
    /// write itself failed; the run result is still recorded here.
    Executed {
        module: String,
        artifact: PathBuf,
        success: bool,
        report: Option<PathBuf>,
    },
}

impl ModuleOutcome {
    pub fn module(&self) -> &str {
        match self {
            ModuleOutcome::GenerationFailed { module }
            | ModuleOutcome::ArtifactWriteFailed { module, .. }
            | ModuleOutcome::Executed { module, .. } => module,
        }
    }
}

/// One completed invocation of the pipeline: the uniquely named output
/// directory, a terminal outcome per scanned module, and the aggregate
/// report archive (absent only when the archive write failed).
#[derive(Debug)]
pub struct BatchRun {
    pub output_dir: PathBuf,
    pub outcomes: Vec<ModuleOutcome>,
    pub archive: Option<PathBuf>,
}

impl BatchRun {
    pub fn artifacts(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                ModuleOutcome::Executed { artifact, .. } => Some(artifact.as_path()),
                _ => None,
            })
            .collect()
    }

    pub fn reports(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                ModuleOutcome::Executed {
                    report: Some(report),
                    ..
                } => Some(report.as_path()),
                _ => None,
            })
            .collect()
    }

    pub fn passed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, ModuleOutcome::Executed { success: true, .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome, ModuleOutcome::Executed { success: false, .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.passed() - self.failed()
    }
}

/// Drives the scan, generate, persist, run, report loop across every
/// matched module and bundles the produced reports into one archive.
///
/// One module's failure never aborts the batch: generation failures,
/// artifact-write failures, failing test runs, and report-write failures
/// are all recorded per module and the loop moves on. Only output
/// directory creation and toolchain provisioning are batch-fatal.
pub struct BatchAggregator {
    client: TestGenClient,
    http: reqwest::Client,
    execution_timeout: Duration,
}

impl BatchAggregator {
    pub fn new(client: TestGenClient) -> Self {
        Self {
            client,
            http: reqwest::Client::new(),
            execution_timeout: DEFAULT_EXECUTION_TIMEOUT,
        }
    }

    pub fn with_execution_timeout(mut self, timeout: Duration) -> Self {
        self.execution_timeout = timeout;
        self
    }

    pub async fn run_batch(
        &self,
        source_dir: &Path,
        target: Option<Language>,
        output_base: &Path,
    ) -> Result<BatchRun, BatchError> {
        let modules: Vec<SourceModule> = scan_modules(source_dir, target)
            .map_err(|source| BatchError::Scan {
                path: source_dir.to_path_buf(),
                source,
            })?
            .collect();
        info!(
            "Found {} candidate module(s) in {}",
            modules.len(),
            source_dir.display()
        );

        let label = target
            .map(|language| language.to_string())
            .unwrap_or_else(|| "mixed".to_string());
        let output_dir = unique_output_dir(output_base, &label);
        fs::create_dir_all(&output_dir).map_err(|source| BatchError::CreateOutputDir {
            path: output_dir.clone(),
            source,
        })?;
        info!("Batch output directory: {}", output_dir.display());

        let mut runner = TestRunner::new(
            source_dir.to_path_buf(),
            output_dir.clone(),
            self.execution_timeout,
        );

        if let Some(target) = target {
            if target.requires_provisioning() {
                let toolchain = ensure_java_toolchain(&self.http, &output_dir).await?;
                runner.set_java_toolchain(toolchain);
            }
        }

        let mut outcomes = Vec::with_capacity(modules.len());
        let mut reports = Vec::new();

        for module in &modules {
            // Per-file detection can surface a language no eager pass
            // provisioned for.
            if module.language.requires_provisioning() && !runner.has_java_toolchain() {
                let toolchain = ensure_java_toolchain(&self.http, &output_dir).await?;
                runner.set_java_toolchain(toolchain);
            }

            let Some(generated) = self.client.generate(module).await else {
                warn!("Skipping '{}': no test was generated", module.name);
                outcomes.push(ModuleOutcome::GenerationFailed {
                    module: module.name.clone(),
                });
                continue;
            };

            let artifact_path = output_dir.join(format!(
                "test_{}.{}",
                module.name,
                module.language.artifact_extension()
            ));
            if let Err(e) = fs::write(&artifact_path, &generated.body) {
                warn!(
                    "Skipping '{}': could not write {}: {}",
                    module.name,
                    artifact_path.display(),
                    e
                );
                outcomes.push(ModuleOutcome::ArtifactWriteFailed {
                    module: module.name.clone(),
                    error: e.to_string(),
                });
                continue;
            }
            info!("Wrote test artifact {}", artifact_path.display());

            let artifact = TestArtifact {
                path: artifact_path.clone(),
                language: module.language,
            };
            let result = runner.run(&artifact).await;

            let html = render_report(&module.name, &result);
            let report = match write_report(&output_dir, &module.name, &html) {
                Ok(path) => {
                    reports.push(path.clone());
                    Some(path)
                }
                Err(e) => {
                    warn!("Failed to write report for '{}': {}", module.name, e);
                    None
                }
            };

            outcomes.push(ModuleOutcome::Executed {
                module: module.name.clone(),
                artifact: artifact_path,
                success: result.success,
                report,
            });
        }

        let archive = match archive_reports(&output_dir, &reports) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Failed to write report archive: {}", e);
                None
            }
        };

        let run = BatchRun {
            output_dir,
            outcomes,
            archive,
        };
        info!(
            "Batch complete: {} module(s), {} passed, {} failed, {} skipped",
            run.outcomes.len(),
            run.passed(),
            run.failed(),
            run.skipped()
        );
        Ok(run)
    }
}
