//! Whole-file replacement on disk.

use std::fs;
use std::io::{
    self,
    Write,
};
use std::path::Path;

/// Writes `bytes` to `path` so readers see either the old or the new file.
///
/// The content goes to a hidden sibling temporary file, is synced, and is then
/// renamed over `path`. The temporary file is removed if anything fails.
///
/// # Errors
/// Returns an error if writing, syncing or renaming fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or("snapshot");
    let temp_path = parent.join(format!(".{file_name}.tmp.{}", std::process::id()));

    let result = write_and_sync(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if let Ok(dir) = fs::File::open(parent) {
        let _ = dir.sync_all();
    }
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Replaced file");
    Ok(())
}

/// Creates `path` and flushes `bytes` to the device.
fn write_and_sync(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
