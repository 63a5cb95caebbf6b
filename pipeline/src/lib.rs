pub mod batch;
pub mod config;
pub mod generator;
pub mod language;
pub mod outdir;
pub mod provision;
pub mod report;
pub mod runner;
pub mod scanner;

pub use batch::{BatchAggregator, BatchError, BatchRun, ModuleOutcome};
pub use config::{ConfigError, ExecutionSettings, GenerationSettings, PipelineConfig};
pub use generator::{
    strip_code_fences, with_deadline, GeneratedTest, TestGenClient, DEFAULT_GENERATION_DEADLINE,
};
pub use language::Language;
pub use outdir::unique_output_dir;
pub use provision::{ensure_java_toolchain, JavaToolchain, ProvisionError};
pub use report::{archive_reports, render_report, write_report, ArchiveError};
pub use runner::{ExecutionResult, TestArtifact, TestRunner, DEFAULT_EXECUTION_TIMEOUT};
pub use scanner::{scan_modules, SourceModule};
