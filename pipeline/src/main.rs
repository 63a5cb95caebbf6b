use clap::{Parser, Subcommand};
use model::{GeminiConfig, GeminiProvider, TextGenProvider};
use pipeline::{
    BatchAggregator, BatchRun, Language, ModuleOutcome, PipelineConfig, TestGenClient,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "testforge")]
#[command(about = "Generates, executes, and reports AI-written unit tests for source modules")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate, run, and report tests for every module in a directory
    Run {
        /// Directory containing the source modules under test
        #[arg(short, long)]
        source_dir: PathBuf,
        /// Base directory for batch output
        #[arg(short, long, default_value = "reports")]
        output_dir: PathBuf,
        /// Target language (omit to detect per file)
        #[arg(short, long, value_enum)]
        language: Option<Language>,
        /// Optional TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// The model to use (overrides the config file)
        #[arg(short, long)]
        model: Option<String>,
        /// Generation deadline per module, in seconds (overrides the config file)
        #[arg(long)]
        deadline: Option<u64>,
        /// Compile-and-execute timeout per artifact, in seconds (overrides the config file)
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// List supported languages
    Languages,
    /// Health check
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            source_dir,
            output_dir,
            language,
            config,
            model,
            deadline,
            timeout,
        } => {
            run_pipeline(
                source_dir, output_dir, language, config, model, deadline, timeout,
            )
            .await?;
        }
        Commands::Languages => {
            list_languages();
        }
        Commands::Health => {
            health_check().await?;
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn run_pipeline(
    source_dir: PathBuf,
    output_dir: PathBuf,
    language: Option<Language>,
    config: Option<PathBuf>,
    model: Option<String>,
    deadline: Option<u64>,
    timeout: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file_config = match config {
        Some(path) => PipelineConfig::load(&path)?,
        None => PipelineConfig::default(),
    };

    let model = model.unwrap_or_else(|| file_config.generation.model.clone());
    let deadline = Duration::from_secs(deadline.unwrap_or(file_config.generation.deadline_secs));
    let timeout = Duration::from_secs(timeout.unwrap_or(file_config.execution.timeout_secs));

    let mut gemini_config = GeminiConfig::from_env()?;
    if let Some(temperature) = file_config.generation.temperature {
        gemini_config = gemini_config.with_temperature(temperature);
    }
    let provider = Arc::new(GeminiProvider::new(gemini_config)?);

    info!(
        "Starting batch for {} (model: {})",
        source_dir.display(),
        model
    );

    let client = TestGenClient::new(provider, &model).with_deadline(deadline);
    let aggregator = BatchAggregator::new(client).with_execution_timeout(timeout);
    let run = aggregator
        .run_batch(&source_dir, language, &output_dir)
        .await?;

    print_summary(&run);
    Ok(())
}

fn print_summary(run: &BatchRun) {
    println!("Batch output: {}", run.output_dir.display());

    if run.outcomes.is_empty() {
        println!("  No supported source modules were found.");
    }

    for outcome in &run.outcomes {
        match outcome {
            ModuleOutcome::Executed { module, success: true, .. } => {
                println!("  ✓ {} passed", module);
            }
            ModuleOutcome::Executed { module, success: false, .. } => {
                println!("  ✗ {} failed (see report)", module);
            }
            ModuleOutcome::GenerationFailed { module } => {
                println!("  - {} skipped: test generation failed", module);
            }
            ModuleOutcome::ArtifactWriteFailed { module, error } => {
                println!("  - {} skipped: {}", module, error);
            }
        }
    }

    println!(
        "{} passed, {} failed, {} skipped",
        run.passed(),
        run.failed(),
        run.skipped()
    );

    match &run.archive {
        Some(archive) => println!("Report archive: {}", archive.display()),
        None => println!("Report archive could not be written."),
    }
}

fn list_languages() {
    println!("Supported languages:");
    for language in Language::ALL {
        println!(
            "  - {} (.{} files, {})",
            language,
            language.extension(),
            language.test_framework()
        );
    }
}

async fn health_check() -> Result<(), Box<dyn std::error::Error>> {
    println!("Performing health check...");

    let provider = GeminiProvider::from_env()?;

    match provider.health_check().await {
        Ok(()) => {
            println!("✓ Health check passed. The Gemini API is reachable.");
            info!("Health check successful");
        }
        Err(e) => {
            println!("✗ Health check failed: {}", e);
            error!("Health check failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
