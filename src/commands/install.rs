use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::models::GameInstallRecord;
use crate::progress::ProgressKind;
use crate::services::installer;
use crate::services::InstallRequest;
use crate::LauncherContext;

pub async fn start_install(
    ctx: &LauncherContext,
    request: InstallRequest,
) -> Result<GameInstallRecord> {
    ctx.installer.install(request).await
}

pub async fn uninstall(ctx: &LauncherContext, game_id: i64) -> Result<usize> {
    ctx.installer.uninstall(game_id)
}

/// Downloads a remote archive without driving the install state machine.
pub async fn download_file(ctx: &LauncherContext, url: &str, save_path: &Path) -> Result<PathBuf> {
    let reporter = ctx.progress.reporter(ProgressKind::Download);
    ctx.fetcher.fetch(url, save_path, &reporter).await
}

/// Extracts an already-downloaded archive into its parent directory.
pub fn extract_archive(ctx: &LauncherContext, archive_path: &Path) -> Result<PathBuf> {
    let reporter = ctx.progress.reporter(ProgressKind::Extract);
    ctx.extractor.extract(archive_path, &reporter)
}

pub fn check_path_valid(path: &Path) -> bool {
    installer::check_path_valid(path)
}

pub fn remove_path(target: &Path) -> Result<bool> {
    Ok(crate::utils::fs::remove_path(target)?)
}
