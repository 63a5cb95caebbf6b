use chrono::Local;
use std::path::{Path, PathBuf};

/// Derives a collision-free output directory name for one batch run:
/// `<base>/<label>_<YYYYmmdd_HHMMSS>`, falling back to `_1`, `_2`, …
/// suffixes when the candidate already exists (two runs within the same
/// second, or a rerun against a preserved output tree).
///
/// The returned path does not exist at call time. The caller must create
/// it immediately; uniqueness is only guaranteed for single-threaded
/// creation.
pub fn unique_output_dir(base: &Path, label: &str) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let candidate = base.join(format!("{}_{}", label, stamp));
    if !candidate.exists() {
        return candidate;
    }

    let mut counter = 1;
    loop {
        let suffixed = base.join(format!("{}_{}_{}", label, stamp, counter));
        if !suffixed.exists() {
            return suffixed;
        }
        counter += 1;
    }
}
