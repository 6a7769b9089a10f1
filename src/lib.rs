//! Core of the Bitmap desktop launcher: the download-and-install pipeline,
//! the record stores backing it, and the operation surface the UI layer
//! invokes. Window chrome and rendering live in the embedding application.

pub mod commands;
pub mod errors;
pub mod logging;
pub mod models;
pub mod progress;
pub mod services;
pub mod store;
pub mod utils;

use std::fs;
use std::path::Path;

pub use errors::{LauncherError, Result};
pub use models::{GameInstallRecord, InstallState};
pub use services::{ArchiveExtractor, ArchiveFetcher, InstallRequest, Installer, ProcessLauncher};

use progress::ProgressBus;
use store::queries::{InstallStore, SettingsStore};

/// Explicitly constructed application context owning every collaborator the
/// command surface needs. Built once at application start and passed to the
/// boundary handlers; there are no process-wide singletons behind it.
#[derive(Clone)]
pub struct LauncherContext {
    pub installs: InstallStore,
    pub settings: SettingsStore,
    pub fetcher: ArchiveFetcher,
    pub extractor: ArchiveExtractor,
    pub installer: Installer,
    pub processes: ProcessLauncher,
    pub progress: ProgressBus,
}

impl LauncherContext {
    /// Wires the context against record stores under `data_dir`
    /// (`gameInstallInfo.db` and `settings.db`, one collection per file).
    pub fn new(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;

        let installs = InstallStore::open(data_dir.join("gameInstallInfo.db"))?;
        let settings = SettingsStore::open(data_dir.join("settings.db"))?;
        let progress = ProgressBus::new();
        let processes = ProcessLauncher::new();
        let fetcher = ArchiveFetcher::new();
        let extractor = ArchiveExtractor::new(processes.clone());
        let installer = Installer::new(
            installs.clone(),
            fetcher.clone(),
            extractor.clone(),
            progress.clone(),
        );

        Ok(Self {
            installs,
            settings,
            fetcher,
            extractor,
            installer,
            processes,
            progress,
        })
    }

    /// Context rooted at the resolved platform data directory.
    pub fn init() -> Result<Self> {
        Self::new(&utils::paths::resolve_data_dir())
    }
}
