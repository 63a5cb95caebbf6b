use crate::language::Language;
use crate::scanner::SourceModule;
use model::{GenerationRequest, TextGenProvider};
use regex::Regex;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default hard deadline for a single generation call.
pub const DEFAULT_GENERATION_DEADLINE: Duration = Duration::from_secs(200);

const SYSTEM_PROMPT: &str = "You are an expert in software development and automated testing. \
Your task is to generate a unit test for the module provided. \
Do not explain anything; answer only with the code of the unit test.";

/// Machine-generated test code for one module. Absence of a value for a
/// module means generation failed or timed out; the batch continues.
#[derive(Debug, Clone)]
pub struct GeneratedTest {
    pub module_name: String,
    pub language: Language,
    pub body: String,
}

/// Wraps the text-generation provider with a per-call wall-clock deadline
/// and response cleanup.
pub struct TestGenClient {
    provider: Arc<dyn TextGenProvider>,
    model: String,
    deadline: Duration,
}

impl TestGenClient {
    pub fn new(provider: Arc<dyn TextGenProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            deadline: DEFAULT_GENERATION_DEADLINE,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Requests a generated test for `module`. Timeouts, transport
    /// failures, and empty responses all yield `None` so one module's
    /// failure never aborts the batch.
    pub async fn generate(&self, module: &SourceModule) -> Option<GeneratedTest> {
        info!("Generating test for module '{}'", module.name);

        let request = GenerationRequest::new(&self.model, build_prompt(module))
            .with_system(SYSTEM_PROMPT);

        let provider = Arc::clone(&self.provider);
        let outcome =
            with_deadline(self.deadline, async move { provider.generate(request).await }).await;

        match outcome {
            Some(Ok(response)) => {
                let body = strip_code_fences(&response.text);
                if body.is_empty() {
                    warn!("Generation for '{}' returned no code", module.name);
                    return None;
                }
                debug!(
                    "Generated {} bytes of test code for '{}'",
                    body.len(),
                    module.name
                );
                Some(GeneratedTest {
                    module_name: module.name.clone(),
                    language: module.language,
                    body,
                })
            }
            Some(Err(e)) => {
                warn!("Generation for '{}' failed: {}", module.name, e);
                None
            }
            None => {
                warn!(
                    "Generation for '{}' timed out after {:?}",
                    module.name, self.deadline
                );
                None
            }
        }
    }
}

/// Runs `future` with a hard wall-clock deadline. On expiry the spawned
/// task is abandoned, not aborted: it may still complete in the
/// background, and its result is simply never observed.
pub async fn with_deadline<F, T>(deadline: Duration, future: F) -> Option<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let task = tokio::spawn(future);
    match tokio::time::timeout(deadline, task).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            error!("Deadline-bounded task did not complete: {}", e);
            None
        }
        Err(_) => None,
    }
}

fn build_prompt(module: &SourceModule) -> String {
    format!(
        "Generate a unit test in {language} using {framework} for the module below.\n\
         {guidance}\n\
         Module code:\n\
         {content}",
        language = module.language,
        framework = module.language.test_framework(),
        guidance = import_guidance(module),
        content = module.content,
    )
}

/// Language-specific import guidance, so the generated test can locate the
/// module under test from where the artifact is executed.
fn import_guidance(module: &SourceModule) -> String {
    let file_name = module
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| module.name.clone());
    let dir_name = module
        .path
        .parent()
        .and_then(|parent| parent.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "src".to_string());

    match module.language {
        Language::Python => format!(
            "The module under test is '{file}' inside a folder named '{dir}'. \
             Import it with:\n\n    import {dir}.{name}\n\n\
             and access its functions or classes as {dir}.{name}.MyClass().\n",
            file = file_name,
            dir = dir_name,
            name = module.name,
        ),
        Language::Javascript => format!(
            "The module under test is '{file}'. Import it by its absolute path:\n\n    \
             const {name} = require('{path}');\n\n\
             Use the built-in node:test and assert modules for the test itself.\n",
            file = file_name,
            name = module.name,
            path = module.path.display(),
        ),
        Language::Java => format!(
            "The class under test is declared in '{file}' in the default package; \
             do not add a package declaration to the test. \
             Name the public test class 'test_{name}' so it matches the test file name, \
             and use JUnit 4 annotations.\n",
            file = file_name,
            name = module.name,
        ),
    }
}

/// Strips leading/trailing Markdown code-fence markup from generated text.
/// Text that does not match the fence heuristic is returned as-is.
pub fn strip_code_fences(text: &str) -> String {
    static FENCE_OPEN: OnceLock<Regex> = OnceLock::new();
    static FENCE_CLOSE: OnceLock<Regex> = OnceLock::new();

    let open = FENCE_OPEN.get_or_init(|| Regex::new(r"^```[A-Za-z]*\r?\n?").expect("valid regex"));
    let close = FENCE_CLOSE.get_or_init(|| Regex::new(r"\r?\n?```\s*$").expect("valid regex"));

    let trimmed = text.trim();
    let without_open = open.replace(trimmed, "");
    let without_close = close.replace(&without_open, "");
    without_close.trim().to_string()
}
