use async_trait::async_trait;
use model::{
    GenerationError, GenerationRequest, GenerationResponse, GenerationResult, TextGenProvider,
};
use pipeline::{
    render_report, BatchAggregator, JavaToolchain, Language, ModuleOutcome, TestArtifact,
    TestGenClient, TestRunner,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

struct CannedProvider {
    text: String,
}

#[async_trait]
impl TextGenProvider for CannedProvider {
    async fn generate(&self, _request: GenerationRequest) -> GenerationResult<GenerationResponse> {
        Ok(GenerationResponse::new(self.text.clone()))
    }

    async fn health_check(&self) -> GenerationResult<()> {
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "canned"
    }
}

struct HangingProvider;

#[async_trait]
impl TextGenProvider for HangingProvider {
    async fn generate(&self, _request: GenerationRequest) -> GenerationResult<GenerationResponse> {
        std::future::pending().await
    }

    async fn health_check(&self) -> GenerationResult<()> {
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "hanging"
    }
}

struct FlakyProvider {
    fail_for: String,
}

#[async_trait]
impl TextGenProvider for FlakyProvider {
    async fn generate(&self, request: GenerationRequest) -> GenerationResult<GenerationResponse> {
        if request.prompt.contains(&self.fail_for) {
            Err(GenerationError::EmptyResponse)
        } else {
            Ok(GenerationResponse::new("```python\nassert True\n```"))
        }
    }

    async fn health_check(&self) -> GenerationResult<()> {
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "flaky"
    }
}

fn write_module(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn aggregator_with(provider: Arc<dyn TextGenProvider>) -> BatchAggregator {
    BatchAggregator::new(TestGenClient::new(provider, "test-model"))
}

#[tokio::test]
async fn test_python_batch_end_to_end_structure() {
    let dir = tempdir().unwrap();
    let source_dir = dir.path().join("src_modules");
    fs::create_dir(&source_dir).unwrap();
    write_module(&source_dir, "add.py", "def add(a, b):\n    return a + b\n");

    let provider = Arc::new(CannedProvider {
        text: "```python\nimport src_modules.add\n\ndef test_add():\n    assert src_modules.add.add(1, 2) == 3\n```".to_string(),
    });
    let run = aggregator_with(provider)
        .run_batch(&source_dir, Some(Language::Python), dir.path())
        .await
        .unwrap();

    // One artifact, one report, one archive entry, regardless of whether
    // the local interpreter made the generated test pass.
    assert_eq!(run.outcomes.len(), 1);
    let artifact = run.output_dir.join("test_add.py");
    assert!(artifact.exists());
    assert!(fs::read_to_string(&artifact)
        .unwrap()
        .starts_with("import src_modules.add"));

    let report = run.output_dir.join("report_add.html");
    assert!(report.exists());
    let html = fs::read_to_string(&report).unwrap();
    assert!(html.contains("Test report: add"));
    assert!(html.contains("Status: PASSED") || html.contains("Status: FAILED"));

    let archive = run.archive.as_ref().expect("archive must be written");
    let zip = zip::ZipArchive::new(fs::File::open(archive).unwrap()).unwrap();
    assert_eq!(zip.len(), 1);
}

#[tokio::test]
async fn test_generation_timeout_does_not_hang_the_batch() {
    let dir = tempdir().unwrap();
    let source_dir = dir.path().join("src_modules");
    fs::create_dir(&source_dir).unwrap();
    write_module(&source_dir, "add.py", "def add(a, b):\n    return a + b\n");
    write_module(&source_dir, "sub.py", "def sub(a, b):\n    return a - b\n");

    let client = TestGenClient::new(Arc::new(HangingProvider), "test-model")
        .with_deadline(Duration::from_millis(50));
    let run = tokio::time::timeout(
        Duration::from_secs(10),
        BatchAggregator::new(client).run_batch(&source_dir, Some(Language::Python), dir.path()),
    )
    .await
    .expect("batch must finish despite hanging generation calls")
    .unwrap();

    assert_eq!(run.outcomes.len(), 2);
    assert!(run
        .outcomes
        .iter()
        .all(|outcome| matches!(outcome, ModuleOutcome::GenerationFailed { .. })));
}

#[tokio::test]
async fn test_one_failing_module_leaves_the_rest_intact() {
    let dir = tempdir().unwrap();
    let source_dir = dir.path().join("src_modules");
    fs::create_dir(&source_dir).unwrap();
    write_module(&source_dir, "add.py", "def add(a, b):\n    return a + b\n");
    write_module(&source_dir, "sub.py", "def sub(a, b):\n    return a - b\n");

    let provider = Arc::new(FlakyProvider {
        fail_for: "def sub".to_string(),
    });
    let run = aggregator_with(provider)
        .run_batch(&source_dir, Some(Language::Python), dir.path())
        .await
        .unwrap();

    assert_eq!(run.outcomes.len(), 2);
    assert_eq!(run.artifacts().len(), 1);

    let generated: Vec<_> = run
        .outcomes
        .iter()
        .filter(|outcome| matches!(outcome, ModuleOutcome::Executed { .. }))
        .map(|outcome| outcome.module())
        .collect();
    assert_eq!(generated, ["add"]);

    let skipped: Vec<_> = run
        .outcomes
        .iter()
        .filter(|outcome| matches!(outcome, ModuleOutcome::GenerationFailed { .. }))
        .map(|outcome| outcome.module())
        .collect();
    assert_eq!(skipped, ["sub"]);
}

#[tokio::test]
async fn test_mixed_directory_detects_language_per_file() {
    let dir = tempdir().unwrap();
    let source_dir = dir.path().join("src_modules");
    fs::create_dir(&source_dir).unwrap();
    write_module(&source_dir, "add.py", "def add(a, b):\n    return a + b\n");
    write_module(&source_dir, "util.js", "module.exports = { id: x => x };\n");
    write_module(&source_dir, "notes.rb", "puts 'unsupported'\n");

    let provider = Arc::new(CannedProvider {
        text: "// trivial\n".to_string(),
    });
    let run = aggregator_with(provider)
        .run_batch(&source_dir, None, dir.path())
        .await
        .unwrap();

    let mut artifact_names: Vec<_> = run
        .artifacts()
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    artifact_names.sort();
    assert_eq!(artifact_names, ["test_add.py", "test_util.js"]);

    let dir_name = run
        .output_dir
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert!(dir_name.starts_with("mixed_"));
}

#[tokio::test]
async fn test_java_compile_failure_never_reaches_execution() {
    let dir = tempdir().unwrap();
    let source_dir = dir.path().join("src_modules");
    let output_dir = dir.path().join("out");
    fs::create_dir(&source_dir).unwrap();
    fs::create_dir(&output_dir).unwrap();

    let artifact_path = output_dir.join("test_Broken.java");
    fs::write(&artifact_path, "public class test_Broken { this is not java }\n").unwrap();

    let mut runner = TestRunner::new(source_dir, output_dir.clone(), Duration::from_secs(60));
    runner.set_java_toolchain(JavaToolchain {
        junit_jar: output_dir.join("junit-4.13.2.jar"),
        hamcrest_jar: output_dir.join("hamcrest-core-1.3.jar"),
    });

    let artifact = TestArtifact {
        path: artifact_path,
        language: Language::Java,
    };
    let result = runner.run(&artifact).await;

    // Whether javac rejected the source or was missing entirely, the
    // failure is captured and nothing was compiled to execute.
    assert!(!result.success);
    assert!(!result.stderr.is_empty());
    assert!(!output_dir.join("test_Broken.class").exists());

    let html = render_report("Broken", &result);
    assert!(html.contains("Status: FAILED"));
}
