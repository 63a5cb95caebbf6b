use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const JUNIT_JAR_URL: &str =
    "https://repo1.maven.org/maven2/junit/junit/4.13.2/junit-4.13.2.jar";
pub const HAMCREST_JAR_URL: &str =
    "https://repo1.maven.org/maven2/org/hamcrest/hamcrest-core/1.3/hamcrest-core-1.3.jar";

/// Locations of the JUnit runner jar and its Hamcrest matcher dependency.
/// Once fetched, the jars are read-only and shared by later runs.
#[derive(Debug, Clone)]
pub struct JavaToolchain {
    pub junit_jar: PathBuf,
    pub hamcrest_jar: PathBuf,
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Failed to download {url}: {source}")]
    Download {
        url: String,
        source: reqwest::Error,
    },

    #[error("Download of {url} returned HTTP {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Ensures the Java execution dependencies exist in `dir`, fetching any
/// that are missing. When both jars are already present no network access
/// occurs. Fetch failures are fatal for batches that need to run Java
/// artifacts.
pub async fn ensure_java_toolchain(
    http: &reqwest::Client,
    dir: &Path,
) -> Result<JavaToolchain, ProvisionError> {
    let junit_jar = dir.join(jar_file_name(JUNIT_JAR_URL));
    let hamcrest_jar = dir.join(jar_file_name(HAMCREST_JAR_URL));

    if junit_jar.exists() && hamcrest_jar.exists() {
        debug!("JUnit toolchain already provisioned in {}", dir.display());
        return Ok(JavaToolchain {
            junit_jar,
            hamcrest_jar,
        });
    }

    fetch_jar(http, JUNIT_JAR_URL, &junit_jar).await?;
    fetch_jar(http, HAMCREST_JAR_URL, &hamcrest_jar).await?;

    Ok(JavaToolchain {
        junit_jar,
        hamcrest_jar,
    })
}

fn jar_file_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

async fn fetch_jar(
    http: &reqwest::Client,
    url: &str,
    target: &Path,
) -> Result<(), ProvisionError> {
    if target.exists() {
        debug!("{} already present", target.display());
        return Ok(());
    }

    info!("Downloading {}", url);

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|source| ProvisionError::Download {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProvisionError::HttpStatus {
            url: url.to_string(),
            status,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|source| ProvisionError::Download {
            url: url.to_string(),
            source,
        })?;

    std::fs::write(target, &bytes).map_err(|source| ProvisionError::Write {
        path: target.to_path_buf(),
        source,
    })?;

    info!("Saved {} ({} bytes)", target.display(), bytes.len());
    Ok(())
}
