//! Atomic file writes for persisted run state
//!
//! A state file is replaced in one step: content goes to a temporary file
//! in the target directory, is fsynced, then renamed over the target. A
//! reader therefore sees either the previous state or the new one, never a
//! partial write. When the rename crosses a filesystem boundary the content
//! is copied into a second temporary file next to the target first.

use anyhow::{Context, Result};
use camino::Utf8Path;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Outcome details of an atomic write
#[derive(Debug, Clone, Default)]
pub struct AtomicWriteResult {
    /// Number of bytes that ended up in the target file
    pub bytes_written: usize,
    /// Whether the cross-filesystem copy path was taken
    pub used_cross_filesystem_fallback: bool,
    /// Non-fatal observations made while writing
    pub warnings: Vec<String>,
}

/// Atomically replace `path` with `content`, creating parent directories.
///
/// Line endings are normalized to LF so state files diff cleanly across
/// platforms.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<AtomicWriteResult> {
    let mut result = AtomicWriteResult::default();
    let normalized = normalize_line_endings(content);

    let parent = match path.parent() {
        Some(p) if !p.as_str().is_empty() => p,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent)
        .with_context(|| format!("Failed to create parent directory: {parent}"))?;

    let mut temp_file = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in: {parent}"))?;
    temp_file
        .write_all(normalized.as_bytes())
        .context("Failed to write content to temporary file")?;
    temp_file
        .as_file()
        .sync_all()
        .context("Failed to fsync temporary file")?;

    let temp_path = temp_file.path().to_path_buf();
    match temp_file.persist(path.as_std_path()) {
        Ok(_) => {}
        Err(e) if is_cross_filesystem_error(&e.error) => {
            tracing::debug!(target_path = %path, "rename crossed filesystems, copying instead");
            result.used_cross_filesystem_fallback = true;
            result
                .warnings
                .push("Used cross-filesystem fallback (copy, fsync, replace)".to_string());
            // Keep the temp file alive until the copy has been made.
            let _keep = e.file;
            copy_then_replace(&temp_path, path, parent)?;
        }
        Err(e) => {
            return Err(anyhow::anyhow!(e.error))
                .with_context(|| format!("Failed to atomically write file: {path}"));
        }
    }

    result.bytes_written = normalized.len();
    Ok(result)
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

#[cfg(unix)]
fn is_cross_filesystem_error(err: &std::io::Error) -> bool {
    // EXDEV
    err.raw_os_error() == Some(18)
}

#[cfg(not(unix))]
fn is_cross_filesystem_error(_err: &std::io::Error) -> bool {
    false
}

fn copy_then_replace(temp_path: &Path, target: &Utf8Path, target_dir: &Utf8Path) -> Result<()> {
    let content =
        fs::read(temp_path).context("Failed to read temporary file for cross-filesystem copy")?;

    let mut target_temp = NamedTempFile::new_in(target_dir)
        .with_context(|| format!("Failed to create temp file in target directory: {target_dir}"))?;
    target_temp
        .write_all(&content)
        .context("Failed to write content during cross-filesystem copy")?;
    target_temp
        .as_file()
        .sync_all()
        .context("Failed to fsync during cross-filesystem copy")?;
    target_temp
        .persist(target.as_std_path())
        .map_err(|e| anyhow::anyhow!(e.error))
        .context("Failed to persist during cross-filesystem copy")?;

    Ok(())
}
