use std::path::{Path, PathBuf};

fn ensure_dir(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        return None;
    }
    if std::fs::create_dir_all(path).is_ok() {
        return Some(path.to_path_buf());
    }
    None
}

/// Directory holding the launcher's record stores.
///
/// Resolution order: `BITMAP_DATA_DIR` override, the platform user-data
/// directory, then the working directory as the development fallback.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(value) = std::env::var("BITMAP_DATA_DIR") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            let path = PathBuf::from(trimmed);
            if let Some(dir) = ensure_dir(&path) {
                return dir;
            }
        }
    }

    if let Some(data_dir) = dirs::data_dir() {
        let candidate = data_dir.join("Bitmap");
        if let Some(dir) = ensure_dir(&candidate) {
            return dir;
        }
    }

    PathBuf::from(".")
}

pub fn resolve_log_dir() -> PathBuf {
    if let Ok(value) = std::env::var("BITMAP_LOG_DIR") {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            let path = PathBuf::from(trimmed);
            if let Some(dir) = ensure_dir(&path) {
                return dir;
            }
        }
    }

    let candidate = resolve_data_dir().join("logs");
    ensure_dir(&candidate).unwrap_or_else(|| PathBuf::from("logs"))
}
