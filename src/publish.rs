use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::config::Config;
use crate::document::{self, MARKER_END, MARKER_START};
use crate::error::BenchError;
use crate::record::RunResult;
use crate::report;

/// Content used when the target document does not exist yet.
pub const DEFAULT_DOCUMENT: &str = "# OpenAI API Availability Monitor\n\n";

/// Render `result` into the configured document and the optional step
/// summary. A document that cannot be updated stays as it was and the
/// returned result is downgraded to RUNTIME_ERROR; a step summary failure is
/// only logged.
pub fn publish(result: RunResult, config: &Config, step_summary: Option<&Path>) -> RunResult {
    let block = report::render(&result, config);
    let result = match update_document(&config.document_path, &block) {
        Ok(()) => result,
        Err(e) => {
            tracing::error!(
                path = %config.document_path.display(),
                error = %e,
                "document left unchanged"
            );
            result.into_runtime_error(format!("Unexpected runtime error: {e}"))
        }
    };

    if let Err(e) = append_step_summary(step_summary, &report::render_step_summary(&result, config)) {
        tracing::warn!(error = %e, "failed to write step summary");
    }
    result
}

/// Read the document, swap in `block`, and write it back. The file is left
/// untouched when its markers are malformed.
pub fn update_document(path: &Path, block: &str) -> Result<(), BenchError> {
    let current = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "document missing, creating it");
            DEFAULT_DOCUMENT.to_string()
        }
        Err(e) => return Err(io_error(path, e)),
    };

    let updated = document::replace_block(&current, MARKER_START, MARKER_END, block)?;
    std::fs::write(path, updated).map_err(|e| io_error(path, e))?;

    tracing::info!(path = %path.display(), "document updated");
    Ok(())
}

/// Append to the CI step summary file if one is configured.
pub fn append_step_summary(path: Option<&Path>, summary: &str) -> Result<(), BenchError> {
    let Some(path) = path else {
        return Ok(());
    };

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_error(path, e))?;
    file.write_all(summary.as_bytes())
        .and_then(|_| file.write_all(b"\n"))
        .map_err(|e| io_error(path, e))
}

fn io_error(path: &Path, source: std::io::Error) -> BenchError {
    BenchError::Io {
        path: path.display().to_string(),
        source,
    }
}
