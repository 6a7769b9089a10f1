use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::json;

use crate::errors::{LauncherError, Result};
use crate::models::{GameInstallRecord, InstallState};
use crate::progress::{ProgressBus, ProgressKind};
use crate::services::extractor::ArchiveExtractor;
use crate::services::fetcher::ArchiveFetcher;
use crate::store::queries::InstallStore;

#[cfg(target_os = "macos")]
const MARKER_EXTENSION: &str = ".app";
#[cfg(not(target_os = "macos"))]
const MARKER_EXTENSION: &str = ".exe";

#[derive(Clone, Debug)]
pub struct InstallRequest {
    pub game_id: i64,
    pub url: String,
    /// Where the archive is downloaded to; its parent directory becomes the
    /// installation directory.
    pub archive_path: PathBuf,
    pub version: String,
}

/// One in-flight pipeline per game id. The token releases its key on drop,
/// so early returns and failures never leave a key stuck.
#[derive(Clone, Default)]
pub struct InflightInstalls {
    inner: Arc<Mutex<HashSet<i64>>>,
}

impl InflightInstalls {
    pub fn try_begin(&self, game_id: i64) -> Option<InflightToken> {
        let mut keys = self.lock();
        if !keys.insert(game_id) {
            return None;
        }
        Some(InflightToken {
            inner: self.inner.clone(),
            game_id,
        })
    }

    pub fn is_active(&self, game_id: i64) -> bool {
        self.lock().contains(&game_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<i64>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

pub struct InflightToken {
    inner: Arc<Mutex<HashSet<i64>>>,
    game_id: i64,
}

impl Drop for InflightToken {
    fn drop(&mut self) {
        let mut keys = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        keys.remove(&self.game_id);
    }
}

/// Drives a game's install record through
/// `Downloading -> Extracting -> Installed`, persisting every transition so
/// the UI can resume rendering correct state across restarts. Failures land
/// the record in `InstallError`; a later install call for the same game
/// re-enters `Downloading` and overwrites whatever partial files remain.
#[derive(Clone)]
pub struct Installer {
    store: InstallStore,
    fetcher: ArchiveFetcher,
    extractor: ArchiveExtractor,
    progress: ProgressBus,
    inflight: InflightInstalls,
}

impl Installer {
    pub fn new(
        store: InstallStore,
        fetcher: ArchiveFetcher,
        extractor: ArchiveExtractor,
        progress: ProgressBus,
    ) -> Self {
        Self {
            store,
            fetcher,
            extractor,
            progress,
            inflight: InflightInstalls::default(),
        }
    }

    pub async fn install(&self, request: InstallRequest) -> Result<GameInstallRecord> {
        let _token = self.inflight.try_begin(request.game_id).ok_or_else(|| {
            LauncherError::Config(format!(
                "install already in progress for game {}",
                request.game_id
            ))
        })?;

        let install_dir = request
            .archive_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .ok_or_else(|| {
                LauncherError::Config(format!(
                    "destination {} has no parent directory",
                    request.archive_path.display()
                ))
            })?
            .to_path_buf();

        tracing::info!(
            "starting install of game {} from {}",
            request.game_id,
            request.url
        );
        self.persist_started(&request, &install_dir)?;

        let download = self.progress.reporter(ProgressKind::Download);
        if let Err(err) = self
            .fetcher
            .fetch(&request.url, &request.archive_path, &download)
            .await
        {
            self.mark_error(request.game_id, &err);
            return Err(err);
        }

        self.store
            .set_state(request.game_id, InstallState::Extracting)?;

        let extract = self.progress.reporter(ProgressKind::Extract);
        let extracted_dir = match self.extractor.extract(&request.archive_path, &extract) {
            Ok(dir) => dir,
            Err(err) => {
                self.mark_error(request.game_id, &err);
                return Err(err);
            }
        };

        let final_state = if check_path_valid(&extracted_dir) {
            InstallState::Installed
        } else {
            tracing::warn!(
                "no {MARKER_EXTENSION} marker found under {} after extracting game {}",
                extracted_dir.display(),
                request.game_id
            );
            InstallState::InstallError
        };

        self.store.update(
            request.game_id,
            &json!({
                "installPath": extracted_dir.to_string_lossy(),
                "installState": serde_json::to_value(final_state)?,
            }),
        )?;

        self.store.get_by_key(request.game_id)?.ok_or_else(|| {
            LauncherError::Store(format!(
                "install record for game {} missing after update",
                request.game_id
            ))
        })
    }

    /// Removes only the record; deleting the installed files is the separate
    /// explicit remove-path operation.
    pub fn uninstall(&self, game_id: i64) -> Result<usize> {
        tracing::info!("uninstalling game {game_id}");
        self.store.delete(game_id)
    }

    // Update-then-insert: the store itself accepts duplicate keys, so the
    // orchestrator is the place that keeps one record per game.
    fn persist_started(&self, request: &InstallRequest, install_dir: &Path) -> Result<()> {
        let patch = json!({
            "installPath": install_dir.to_string_lossy(),
            "installedVersion": request.version,
            "installState": serde_json::to_value(InstallState::Downloading)?,
        });
        if self.store.update(request.game_id, &patch)? == 0 {
            self.store.insert(&GameInstallRecord {
                game_id: request.game_id,
                install_path: install_dir.to_string_lossy().to_string(),
                installed_version: request.version.clone(),
                install_state: InstallState::Downloading,
            })?;
        }
        Ok(())
    }

    fn mark_error(&self, game_id: i64, err: &LauncherError) {
        tracing::error!("install of game {game_id} failed: {err}");
        if let Err(store_err) = self.store.set_state(game_id, InstallState::InstallError) {
            tracing::error!("failed to record install error for game {game_id}: {store_err}");
        }
    }
}

/// Whether a platform install marker exists for `path`: either the sibling
/// `path` + extension (`.app` bundle directory on macOS, `.exe` file
/// elsewhere), or any matching entry anywhere under `path`. I/O failures
/// count as "not found"; this never errors.
pub fn check_path_valid(path: &Path) -> bool {
    let direct = PathBuf::from(format!("{}{}", path.display(), MARKER_EXTENSION));
    if marker_matches(&direct) {
        return true;
    }
    scan_for_marker(path)
}

#[cfg(target_os = "macos")]
fn marker_matches(path: &Path) -> bool {
    path.is_dir()
}

#[cfg(not(target_os = "macos"))]
fn marker_matches(path: &Path) -> bool {
    path.is_file()
}

fn scan_for_marker(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let named_like_marker = path
            .file_name()
            .and_then(OsStr::to_str)
            .is_some_and(|name| name.ends_with(MARKER_EXTENSION));
        if named_like_marker && marker_matches(&path) {
            return true;
        }
        if path.is_dir() && scan_for_marker(&path) {
            return true;
        }
    }
    false
}
