use crate::language::Language;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A source file selected for test generation. Immutable once read.
#[derive(Debug, Clone)]
pub struct SourceModule {
    pub path: PathBuf,
    /// File stem, used to name the generated artifact and report.
    pub name: String,
    pub language: Language,
    pub content: String,
}

/// Lists candidate source modules in `source_dir`.
///
/// Yields one module per regular file whose extension is recognized, or —
/// when `target` is set — whose extension matches that language only.
/// Directories and dangling symlinks are skipped silently; unsupported
/// extensions and unreadable files are logged and skipped. Re-invoking
/// re-reads the directory.
pub fn scan_modules(
    source_dir: &Path,
    target: Option<Language>,
) -> io::Result<impl Iterator<Item = SourceModule>> {
    let entries = fs::read_dir(source_dir)?;

    Ok(entries.filter_map(move |entry| {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable directory entry: {}", e);
                return None;
            }
        };

        let path = entry.path();
        if !path.is_file() {
            return None;
        }

        let extension = path.extension().and_then(|ext| ext.to_str())?;
        let language = match Language::from_extension(extension) {
            Some(language) => language,
            None => {
                debug!("Skipping {} (unsupported extension)", path.display());
                return None;
            }
        };

        if let Some(target) = target {
            if language != target {
                debug!(
                    "Skipping {} (not a {} module)",
                    path.display(),
                    target
                );
                return None;
            }
        }

        let name = path.file_stem()?.to_string_lossy().into_owned();

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                return None;
            }
        };

        Some(SourceModule {
            path,
            name,
            language,
            content,
        })
    }))
}
