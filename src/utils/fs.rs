use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Deletes `target` whether it is a file or a directory and reports whether
/// it is gone afterwards. A missing target is already gone, not an error.
pub fn remove_path(target: &Path) -> io::Result<bool> {
    if target.exists() {
        if target.is_dir() {
            fs::remove_dir_all(target)?;
        } else {
            fs::remove_file(target)?;
        }
    }

    Ok(!target.exists())
}

/// Writes `contents` through a sibling temp file and renames it into place so
/// a crash never leaves a half-written file behind.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let temp_path = path.with_extension("tmp");
    if let Some(parent) = temp_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(&temp_path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);
    fs::rename(temp_path, path)?;
    Ok(())
}
