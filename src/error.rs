use std::path::PathBuf;
use std::time::Duration;

/// Errors returned by a [`crate::provider::Provider`] implementation
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("download request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("could not write downloaded video: {0}")]
    Io(#[from] std::io::Error),
}

/// Webhook delivery failures. Logged by the notifier, never surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webhook returned {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("video file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("upload failed: {0}")]
    Upload(#[source] ProviderError),
    #[error("could not query file status: {0}")]
    Status(#[source] ProviderError),
    #[error("video file processing failed")]
    ProcessingFailed { name: String },
    #[error("file {name} still processing after {waited:?}")]
    ProcessingTimeout { name: String, waited: Duration },
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error("generation failed: {0}")]
    Generation(#[source] ProviderError),
}
