pub mod analyzer;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod gemini;
pub mod lifecycle;
pub mod output;
pub mod provider;
pub mod webhook;

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub use analyzer::{Analyzer, AnalyzerSettings};
pub use error::{AnalyzerError, DownloadError, ProviderError, WebhookError};
pub use provider::{FileState, Part, Provider, RemoteFile};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Prompt used when the caller supplies none
pub const DEFAULT_PROMPT: &str = include_str!("prompts/default.txt");

/// The video to analyze
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    YouTube(String),
    Local(PathBuf),
    Remote(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub prompt: Option<String>,
    pub source: VideoSource,
    pub model: String,
}

/// Kind of analysis, as named in webhook payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnalysisKind {
    #[serde(rename = "youtube_video_analysis")]
    YouTube,
    #[serde(rename = "local_video_analysis")]
    LocalFile,
    #[serde(rename = "url_video_analysis")]
    RemoteUrl,
}

/// Outcome of one analysis: the generated text or a readable error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisResult {
    #[serde(rename = "result")]
    Text(String),
    Error(String),
}

impl AnalysisResult {
    pub fn is_error(&self) -> bool {
        matches!(self, AnalysisResult::Error(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            AnalysisResult::Text(text) => Some(text),
            AnalysisResult::Error(_) => None,
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisKind::YouTube => write!(f, "youtube"),
            AnalysisKind::LocalFile => write!(f, "local file"),
            AnalysisKind::RemoteUrl => write!(f, "remote url"),
        }
    }
}

static YOUTUBE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:(?:www\.|m\.)?youtube\.com/(?:watch\?(?:.*&)?v=|embed/|shorts/|live/)|youtu\.be/)([a-zA-Z0-9_-]{11})",
    )
    .unwrap()
});

static BARE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").unwrap());

/// Canonical watch URL for a YouTube link or bare video ID.
///
/// Returns `None` when no video ID can be found.
pub fn normalize_youtube_url(input: &str) -> Option<String> {
    let input = input.trim();

    let id = if BARE_ID.is_match(input) {
        input
    } else {
        YOUTUBE_ID.captures(input)?.get(1)?.as_str()
    };

    Some(format!("https://www.youtube.com/watch?v={id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    #[test]
    fn test_normalize_bare_id() {
        assert_eq!(normalize_youtube_url("dQw4w9WgXcQ").as_deref(), Some(CANONICAL));
    }

    #[test]
    fn test_normalize_url_forms() {
        for input in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "youtu.be/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "  https://www.youtube.com/live/dQw4w9WgXcQ  ",
        ] {
            assert_eq!(normalize_youtube_url(input).as_deref(), Some(CANONICAL), "{input}");
        }
    }

    #[test]
    fn test_normalize_rejects_other_urls() {
        assert_eq!(normalize_youtube_url("https://vimeo.com/123456"), None);
        assert_eq!(normalize_youtube_url("not-an-id"), None);
        assert_eq!(normalize_youtube_url(""), None);
    }

    #[test]
    fn test_result_serializes_with_key() {
        let ok = serde_json::to_value(AnalysisResult::Text("hi".into())).unwrap();
        assert_eq!(ok, serde_json::json!({ "result": "hi" }));
        let err = serde_json::to_value(AnalysisResult::Error("boom".into())).unwrap();
        assert_eq!(err, serde_json::json!({ "error": "boom" }));
    }

    #[test]
    fn test_default_prompt_is_not_blank() {
        assert!(!DEFAULT_PROMPT.trim().is_empty());
    }
}
