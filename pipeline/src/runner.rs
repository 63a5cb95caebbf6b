use crate::language::Language;
use crate::provision::JavaToolchain;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Default wall-clock budget for compiling and executing one artifact.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(120);

/// A generated test persisted into the batch output directory. Never
/// mutated after write.
#[derive(Debug, Clone)]
pub struct TestArtifact {
    pub path: PathBuf,
    pub language: Language,
}

/// Captured outcome of running one artifact. A failing test run is a
/// normal, reportable outcome, not a pipeline error.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub artifact: PathBuf,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub duration: Duration,
}

struct CommandOutcome {
    stdout: String,
    stderr: String,
    success: bool,
}

impl CommandOutcome {
    fn failure(stderr: String) -> Self {
        Self {
            stdout: String::new(),
            stderr,
            success: false,
        }
    }
}

/// Compiles (where required) and executes generated test artifacts against
/// the language's toolchain. Per artifact the states are
/// written, compiled for languages with a build step, executed, reported;
/// compilation failure skips straight to the report with the compiler's
/// output as the failure text.
pub struct TestRunner {
    source_dir: PathBuf,
    output_dir: PathBuf,
    timeout: Duration,
    java_toolchain: Option<JavaToolchain>,
}

impl TestRunner {
    pub fn new(source_dir: PathBuf, output_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            source_dir,
            output_dir,
            timeout,
            java_toolchain: None,
        }
    }

    pub fn set_java_toolchain(&mut self, toolchain: JavaToolchain) {
        self.java_toolchain = Some(toolchain);
    }

    pub fn has_java_toolchain(&self) -> bool {
        self.java_toolchain.is_some()
    }

    /// Runs one artifact to completion. Never raises: compile errors,
    /// missing executables, non-zero exits, and timeouts are all captured
    /// as failure-carrying results.
    pub async fn run(&self, artifact: &TestArtifact) -> ExecutionResult {
        let started = Instant::now();

        let outcome = match artifact.language {
            Language::Python => self.run_python(artifact).await,
            Language::Javascript => self.run_javascript(artifact).await,
            Language::Java => self.run_java(artifact).await,
        };

        if !outcome.success {
            warn!("Test run failed for {}", artifact.path.display());
        }

        ExecutionResult {
            artifact: artifact.path.clone(),
            stdout: outcome.stdout,
            stderr: outcome.stderr,
            success: outcome.success,
            duration: started.elapsed(),
        }
    }

    async fn run_python(&self, artifact: &TestArtifact) -> CommandOutcome {
        // pytest runs from the parent of the source directory so that
        // `import <source_dir_name>.<module>` resolves.
        let work_dir = self
            .source_dir
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(&self.source_dir)
            .to_path_buf();

        self.run_command(
            "python3",
            vec![
                OsString::from("-m"),
                OsString::from("pytest"),
                artifact.path.clone().into_os_string(),
            ],
            &work_dir,
        )
        .await
    }

    async fn run_javascript(&self, artifact: &TestArtifact) -> CommandOutcome {
        self.run_command(
            "node",
            vec![artifact.path.clone().into_os_string()],
            &self.output_dir,
        )
        .await
    }

    async fn run_java(&self, artifact: &TestArtifact) -> CommandOutcome {
        let Some(toolchain) = &self.java_toolchain else {
            return CommandOutcome::failure(
                "JUnit toolchain is not provisioned for this batch".to_string(),
            );
        };

        let classpath = join_classpath(&[
            self.output_dir.as_path(),
            self.source_dir.as_path(),
            toolchain.junit_jar.as_path(),
            toolchain.hamcrest_jar.as_path(),
        ]);

        let compile = self
            .run_command(
                "javac",
                vec![
                    OsString::from("-cp"),
                    OsString::from(&classpath),
                    OsString::from("-sourcepath"),
                    self.source_dir.clone().into_os_string(),
                    OsString::from("-d"),
                    self.output_dir.clone().into_os_string(),
                    artifact.path.clone().into_os_string(),
                ],
                &self.output_dir,
            )
            .await;

        if !compile.success {
            debug!(
                "Compilation failed for {}; execution skipped",
                artifact.path.display()
            );
            return compile;
        }

        let class_name = artifact
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        self.run_command(
            "java",
            vec![
                OsString::from("-cp"),
                OsString::from(&classpath),
                OsString::from("org.junit.runner.JUnitCore"),
                OsString::from(class_name),
            ],
            &self.output_dir,
        )
        .await
    }

    async fn run_command(
        &self,
        program: &str,
        args: Vec<OsString>,
        work_dir: &Path,
    ) -> CommandOutcome {
        debug!("Running {} {:?} in {}", program, args, work_dir.display());

        let mut command = Command::new(program);
        command
            .args(&args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => CommandOutcome {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                success: output.status.success(),
            },
            Ok(Err(e)) => CommandOutcome::failure(format!("Failed to run {}: {}", program, e)),
            Err(_) => {
                CommandOutcome::failure(format!("Execution timed out after {:?}", self.timeout))
            }
        }
    }
}

fn join_classpath(parts: &[&Path]) -> String {
    let separator = if cfg!(windows) { ";" } else { ":" };
    parts
        .iter()
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(separator)
}
