use crate::runner::ExecutionResult;
use chrono::Local;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Renders one module's execution outcome as a self-contained HTML
/// document. Pure: the captured streams are embedded verbatim apart from
/// the escaping HTML itself requires.
pub fn render_report(module_name: &str, result: &ExecutionResult) -> String {
    let status = if result.success { "PASSED" } else { "FAILED" };

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><meta charset=\"utf-8\"><title>Test report: {module}</title></head>\n\
         <body>\n\
         <h1>Test report: {module}</h1>\n\
         <p>Status: {status}</p>\n\
         <p>Duration: {duration:.2}s</p>\n\
         <h2>Standard output</h2>\n\
         <pre>{stdout}</pre>\n\
         <h2>Standard error</h2>\n\
         <pre>{stderr}</pre>\n\
         </body>\n\
         </html>\n",
        module = escape_html(module_name),
        status = status,
        duration = result.duration.as_secs_f64(),
        stdout = escape_html(&result.stdout),
        stderr = escape_html(&result.stderr),
    )
}

/// Writes a rendered report into the batch output directory as
/// `report_<module>.html`.
pub fn write_report(output_dir: &Path, module_name: &str, html: &str) -> io::Result<PathBuf> {
    let path = output_dir.join(format!("report_{}.html", module_name));
    fs::write(&path, html)?;
    debug!("Wrote report {}", path.display());
    Ok(path)
}

/// Bundles every report produced by the batch into a single zip archive
/// inside the output directory, named `test-reports_<timestamp>.zip`.
pub fn archive_reports(output_dir: &Path, reports: &[PathBuf]) -> Result<PathBuf, ArchiveError> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let archive_path = output_dir.join(format!("test-reports_{}.zip", stamp));

    let file = File::create(&archive_path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for report in reports {
        let name = report
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.html".to_string());
        writer.start_file(name, options)?;
        writer.write_all(&fs::read(report)?)?;
    }

    writer.finish()?;
    debug!(
        "Archived {} report(s) into {}",
        reports.len(),
        archive_path.display()
    );
    Ok(archive_path)
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
