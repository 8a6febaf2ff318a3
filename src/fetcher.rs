use std::path::Path;

use log::debug;
use tempfile::TempPath;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::DownloadError;

/// Write granularity for downloaded bodies (8 KiB)
pub const CHUNK_SIZE: usize = 8 * 1024;

const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "avi", "mov", "mkv", "webm", "flv"];

/// Bytes received so far, and the expected total when the server sent one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: Option<u64>,
}

impl DownloadProgress {
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some(self.downloaded as f64 * 100.0 / total as f64),
            _ => None,
        }
    }
}

/// A downloaded video in a temporary file. Deleted on `close` or drop.
#[derive(Debug)]
pub struct TempVideo {
    path: TempPath,
}

impl TempVideo {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, reporting any failure
    pub fn close(self) -> std::io::Result<()> {
        self.path.close()
    }
}

/// Temp-file suffix for a video URL, `.mp4` unless the path names a known video type
pub fn video_suffix(url: &str) -> String {
    let path = reqwest::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.split(['?', '#']).next().unwrap_or_default().to_string());

    Path::new(&path)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .filter(|e| VIDEO_EXTENSIONS.contains(&e.as_str()))
        .map(|e| format!(".{e}"))
        .unwrap_or_else(|| ".mp4".to_string())
}

/// Download `url` into a fresh file in the system temp directory.
///
/// `on_progress` is called after every chunk is written. A partially written
/// file is removed before an error is returned.
pub async fn download(
    client: &reqwest::Client,
    url: &str,
    on_progress: impl FnMut(DownloadProgress),
) -> Result<TempVideo, DownloadError> {
    download_in(client, url, &std::env::temp_dir(), on_progress).await
}

/// Like [`download`], creating the temporary file inside `dir`
pub async fn download_in(
    client: &reqwest::Client,
    url: &str,
    dir: &Path,
    mut on_progress: impl FnMut(DownloadProgress),
) -> Result<TempVideo, DownloadError> {
    debug!("Downloading video: {url}");

    let mut resp = client.get(url).send().await?.error_for_status()?;
    let total = resp.content_length();

    let (file, path) = tempfile::Builder::new()
        .prefix("video-analyzer-")
        .suffix(&video_suffix(url))
        .tempfile_in(dir)?
        .into_parts();
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, tokio::fs::File::from_std(file));
    let mut downloaded = 0u64;

    while let Some(chunk) = resp.chunk().await? {
        for piece in chunk.chunks(CHUNK_SIZE) {
            writer.write_all(piece).await?;
            downloaded += piece.len() as u64;
            on_progress(DownloadProgress { downloaded, total });
        }
    }
    writer.flush().await?;

    debug!("Downloaded {downloaded} bytes to {}", path.display());
    Ok(TempVideo { path })
}
