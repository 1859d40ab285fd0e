//! `govwatch export` and `govwatch import`.
//!
//! Export writes the canonical list as a pretty-printed JSON array, the
//! same format import accepts. Without `--output` the JSON goes to stdout
//! for piping; a directory as `--output` receives a timestamped
//! `governance-reports-*.json` file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::tracker::{Notice, Tracker};

/// Turn a tracker error into the notice the user sees, keeping the detail
/// in the log.
pub fn notice_error(err: govwatch_core::TrackerError) -> anyhow::Error {
    tracing::debug!(error = %err, "action failed");
    anyhow::anyhow!(Notice::from(&err))
}

fn resolve_output(output: &Path, filename: &str) -> PathBuf {
    if output.is_dir() {
        output.join(filename)
    } else {
        output.to_path_buf()
    }
}

pub async fn run_export(tracker: &Tracker, output: Option<&Path>) -> Result<()> {
    let file = tracker.export().await.map_err(notice_error)?;

    match output {
        Some(output) => {
            let path = resolve_output(output, &file.filename);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(&path, &file.contents)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{}", Notice::exported(&path.display().to_string()));
        }
        None => {
            println!("{}", file.contents);
        }
    }
    Ok(())
}

pub async fn run_import(tracker: &Tracker, input: &Path) -> Result<()> {
    let payload = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let count = tracker.import_json(&payload).await.map_err(notice_error)?;
    println!("{}", Notice::imported(count));
    Ok(())
}
