use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;

use crate::errors::{LauncherError, Result};
use crate::progress::Reporter;

/// Streams a remote archive to a local path, reporting percent complete on
/// the download channel.
#[derive(Clone, Default)]
pub struct ArchiveFetcher {
    client: reqwest::Client,
}

impl ArchiveFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Downloads `url` into `destination`, creating missing parent
    /// directories first. Resolves with the destination path once the file
    /// write has completed.
    ///
    /// When the response carries no content length no ticks are emitted for
    /// the transfer. On error the partially written file is left on disk;
    /// cleanup is the caller's decision.
    pub async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        reporter: &Reporter,
    ) -> Result<PathBuf> {
        if let Some(parent) = destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(LauncherError::fetch)?;
            }
        }

        tracing::info!("fetching {url} -> {}", destination.display());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(LauncherError::fetch)?;
        if !response.status().is_success() {
            return Err(LauncherError::Fetch(format!(
                "server returned {} for {url}",
                response.status()
            )));
        }

        let total = response.content_length().unwrap_or(0);
        let mut received: u64 = 0;
        let mut file = File::create(destination).map_err(LauncherError::fetch)?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(LauncherError::fetch)?;
            file.write_all(&chunk).map_err(LauncherError::fetch)?;
            received += chunk.len() as u64;

            if total > 0 {
                reporter.report(received as f64 / total as f64 * 100.0);
            }
        }

        file.flush().map_err(LauncherError::fetch)?;
        file.sync_all().map_err(LauncherError::fetch)?;

        tracing::info!("fetched {received} bytes to {}", destination.display());
        Ok(destination.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;
    use crate::progress::testing::RecordingSink;
    use crate::progress::{ProgressBus, ProgressKind};

    /// One-shot HTTP responder on a random local port.
    async fn serve_once(status_line: &'static str, body: Vec<u8>, with_length: bool) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;

            let header = if with_length {
                format!(
                    "{status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                )
            } else {
                format!("{status_line}\r\nConnection: close\r\n\r\n")
            };
            socket.write_all(header.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}/game.zip")
    }

    fn download_reporter(bus: &ProgressBus) -> (Reporter, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        bus.subscribe(sink.clone());
        (bus.reporter(ProgressKind::Download), sink)
    }

    #[tokio::test]
    async fn fetch_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("games").join("42").join("game.zip");
        let url = serve_once("HTTP/1.1 200 OK", b"payload".to_vec(), true).await;

        let bus = ProgressBus::new();
        let (reporter, _sink) = download_reporter(&bus);
        let fetched = ArchiveFetcher::new()
            .fetch(&url, &destination, &reporter)
            .await
            .unwrap();

        assert_eq!(fetched, destination);
        assert_eq!(std::fs::read(&destination).unwrap(), b"payload");
    }

    #[tokio::test]
    async fn fetch_into_existing_directory_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("games").join("game.zip");
        std::fs::create_dir_all(destination.parent().unwrap()).unwrap();

        let url = serve_once("HTTP/1.1 200 OK", b"again".to_vec(), true).await;
        let bus = ProgressBus::new();
        let (reporter, _sink) = download_reporter(&bus);
        ArchiveFetcher::new()
            .fetch(&url, &destination, &reporter)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&destination).unwrap(), b"again");
    }

    #[tokio::test]
    async fn progress_is_bounded_and_non_decreasing() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("game.zip");
        let url = serve_once("HTTP/1.1 200 OK", vec![7u8; 256 * 1024], true).await;

        let bus = ProgressBus::new();
        let (reporter, sink) = download_reporter(&bus);
        ArchiveFetcher::new()
            .fetch(&url, &destination, &reporter)
            .await
            .unwrap();

        let percents = sink.percents(ProgressKind::Download);
        assert!(!percents.is_empty());
        for pair in percents.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        for percent in &percents {
            assert!((0.0..=100.0).contains(percent));
        }
        assert_eq!(*percents.last().unwrap(), 100.0);
    }

    #[tokio::test]
    async fn unknown_total_still_downloads_without_ticks() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("game.zip");
        let url = serve_once("HTTP/1.1 200 OK", b"no-length-header".to_vec(), false).await;

        let bus = ProgressBus::new();
        let (reporter, sink) = download_reporter(&bus);
        ArchiveFetcher::new()
            .fetch(&url, &destination, &reporter)
            .await
            .unwrap();

        assert!(sink.percents(ProgressKind::Download).is_empty());
        assert_eq!(std::fs::read(&destination).unwrap(), b"no-length-header");
    }

    #[tokio::test]
    async fn http_error_status_is_a_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("game.zip");
        let url = serve_once("HTTP/1.1 404 Not Found", Vec::new(), true).await;

        let bus = ProgressBus::new();
        let (reporter, _sink) = download_reporter(&bus);
        let err = ArchiveFetcher::new()
            .fetch(&url, &destination, &reporter)
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::Fetch(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("game.zip");

        // Bind then drop to get a port nothing is listening on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let bus = ProgressBus::new();
        let (reporter, _sink) = download_reporter(&bus);
        let err = ArchiveFetcher::new()
            .fetch(&format!("http://{addr}/game.zip"), &destination, &reporter)
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::Fetch(_)));
    }
}
