pub mod extractor;
pub mod fetcher;
pub mod installer;
pub mod process;

pub use extractor::ArchiveExtractor;
pub use fetcher::ArchiveFetcher;
pub use installer::{InstallRequest, Installer};
pub use process::ProcessLauncher;
