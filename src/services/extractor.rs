use std::fs::{self, File};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::errors::{LauncherError, Result};
use crate::progress::Reporter;
use crate::services::process::ProcessLauncher;
use crate::utils::fs::remove_path;

/// Unpacks a downloaded archive next to itself, reporting per-entry progress
/// on the extract channel and deleting the archive on success.
#[derive(Clone, Default)]
pub struct ArchiveExtractor {
    launcher: ProcessLauncher,
}

impl ArchiveExtractor {
    pub fn new(launcher: ProcessLauncher) -> Self {
        Self { launcher }
    }

    /// Extracts every entry of `archive_path` into its parent directory,
    /// preserving relative paths, and returns that directory.
    ///
    /// An archive of N entries produces exactly N ticks of
    /// `round(i / N * 100)`. Entries whose names escape the target directory
    /// are drained without extraction but still counted. Partially extracted
    /// entries are not rolled back on failure.
    pub fn extract(&self, archive_path: &Path, reporter: &Reporter) -> Result<PathBuf> {
        let destination = archive_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .ok_or_else(|| {
                LauncherError::Extract(format!(
                    "archive {} has no parent directory",
                    archive_path.display()
                ))
            })?
            .to_path_buf();

        tracing::info!(
            "extracting {} -> {}",
            archive_path.display(),
            destination.display()
        );

        let file = File::open(archive_path).map_err(LauncherError::extract)?;
        let mut archive = ZipArchive::new(file).map_err(LauncherError::extract)?;
        let total = archive.len();

        for index in 0..total {
            let mut entry = archive.by_index(index).map_err(LauncherError::extract)?;

            match entry.enclosed_name().map(Path::to_path_buf) {
                Some(relative) => {
                    let out_path = destination.join(relative);
                    if entry.is_dir() {
                        fs::create_dir_all(&out_path).map_err(LauncherError::extract)?;
                    } else {
                        if let Some(parent) = out_path.parent() {
                            fs::create_dir_all(parent).map_err(LauncherError::extract)?;
                        }
                        let mut out_file =
                            File::create(&out_path).map_err(LauncherError::extract)?;
                        std::io::copy(&mut entry, &mut out_file).map_err(LauncherError::extract)?;
                    }
                }
                None => {
                    tracing::warn!("skipping entry with unsafe path: {}", entry.name());
                }
            }

            reporter.report(((index + 1) as f64 / total as f64 * 100.0).round());
        }

        remove_path(archive_path).map_err(LauncherError::extract)?;
        repair_permissions(&self.launcher, &destination);

        Ok(destination)
    }
}

// After extraction macOS bundles routinely arrive with their execute bits
// stripped; the repair is best-effort and never fails the extraction.
#[cfg(target_os = "macos")]
fn repair_permissions(launcher: &ProcessLauncher, dir: &Path) {
    if let Err(err) = launcher.run(&format!("chmod -R 755 \"{}\"", dir.display())) {
        tracing::warn!("permission repair failed for {}: {err}", dir.display());
    }
}

#[cfg(not(target_os = "macos"))]
fn repair_permissions(_launcher: &ProcessLauncher, _dir: &Path) {}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::testing::write_zip;
    use super::*;
    use crate::progress::testing::RecordingSink;
    use crate::progress::{ProgressBus, ProgressKind};

    fn extract_reporter(bus: &ProgressBus) -> (Reporter, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        bus.subscribe(sink.clone());
        (bus.reporter(ProgressKind::Extract), sink)
    }

    #[test]
    fn extracts_into_parent_and_deletes_the_archive() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("game.zip");
        write_zip(&archive, &["readme.txt", "data/", "data/level.bin"]);

        let bus = ProgressBus::new();
        let (reporter, _sink) = extract_reporter(&bus);
        let extracted = ArchiveExtractor::default()
            .extract(&archive, &reporter)
            .unwrap();

        assert_eq!(extracted, dir.path());
        assert!(dir.path().join("readme.txt").is_file());
        assert!(dir.path().join("data").join("level.bin").is_file());
        assert!(!archive.exists());
    }

    #[test]
    fn reports_one_rounded_tick_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("game.zip");
        write_zip(&archive, &["a.txt", "b.txt", "c.txt"]);

        let bus = ProgressBus::new();
        let (reporter, sink) = extract_reporter(&bus);
        ArchiveExtractor::default()
            .extract(&archive, &reporter)
            .unwrap();

        let percents = sink.percents(ProgressKind::Extract);
        assert_eq!(percents, vec![33.0, 67.0, 100.0]);
    }

    #[test]
    fn zero_entry_archive_completes_without_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("empty.zip");
        write_zip(&archive, &[]);

        let bus = ProgressBus::new();
        let (reporter, sink) = extract_reporter(&bus);
        let extracted = ArchiveExtractor::default()
            .extract(&archive, &reporter)
            .unwrap();

        assert_eq!(extracted, dir.path());
        assert!(sink.percents(ProgressKind::Extract).is_empty());
        assert!(!archive.exists());
    }

    #[test]
    fn missing_archive_is_an_extract_error() {
        let dir = tempfile::tempdir().unwrap();
        let bus = ProgressBus::new();
        let (reporter, _sink) = extract_reporter(&bus);

        let err = ArchiveExtractor::default()
            .extract(&dir.path().join("nope.zip"), &reporter)
            .unwrap_err();
        assert!(matches!(err, LauncherError::Extract(_)));
    }

    #[test]
    fn garbage_archive_is_an_extract_error_and_stays_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        std::fs::write(&archive, b"this is not a zip").unwrap();

        let bus = ProgressBus::new();
        let (reporter, _sink) = extract_reporter(&bus);
        let err = ArchiveExtractor::default()
            .extract(&archive, &reporter)
            .unwrap_err();

        assert!(matches!(err, LauncherError::Extract(_)));
        assert!(archive.exists());
    }
}
