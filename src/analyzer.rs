use std::path::Path;

use log::{debug, error, info, warn};

use crate::error::AnalyzerError;
use crate::fetcher::{self, DownloadProgress};
use crate::lifecycle::{self, PollConfig};
use crate::provider::{FileState, Part, Provider, RemoteFile};
use crate::webhook::{self, VideoRef, WebhookPayload};
use crate::{AnalysisKind, AnalysisRequest, AnalysisResult, DEFAULT_PROMPT, VideoSource};

#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    /// Used whenever a call has no prompt or a blank one
    pub default_prompt: String,
    pub poll: PollConfig,
    /// Print download percentages to stderr
    pub show_progress: bool,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            default_prompt: DEFAULT_PROMPT.to_string(),
            poll: PollConfig::default(),
            show_progress: false,
        }
    }
}

/// Runs one analysis per call and reports it to an optional webhook.
///
/// Every entry point returns an [`AnalysisResult`]; failures along the way
/// become its `Error` variant instead of propagating.
pub struct Analyzer<P> {
    provider: P,
    client: reqwest::Client,
    settings: AnalyzerSettings,
}

impl<P: Provider> Analyzer<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            client: reqwest::Client::new(),
            settings: AnalyzerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: AnalyzerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Client used for remote downloads and webhook delivery
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn analyze(&self, request: &AnalysisRequest, webhook: Option<&str>) -> AnalysisResult {
        let prompt = request.prompt.as_deref();
        let model = request.model.as_str();
        match &request.source {
            VideoSource::YouTube(url) => self.analyze_youtube(url, prompt, model, webhook).await,
            VideoSource::Local(path) => self.analyze_local(path, prompt, model, webhook).await,
            VideoSource::Remote(url) => self.analyze_url(url, prompt, model, webhook).await,
        }
    }

    /// The provider reads the video straight from YouTube; nothing is downloaded.
    pub async fn analyze_youtube(
        &self,
        url: &str,
        prompt: Option<&str>,
        model: &str,
        webhook: Option<&str>,
    ) -> AnalysisResult {
        let prompt = self.effective_prompt(prompt);
        info!("Analyzing YouTube video {url} with {model}");

        let outcome = self
            .provider
            .generate(model, &[Part::text(prompt), Part::youtube(url)])
            .await
            .map_err(AnalyzerError::Generation);

        self.finish(AnalysisKind::YouTube, prompt, VideoRef::VideoUrl(url.to_string()), model, outcome, webhook)
            .await
    }

    pub async fn analyze_local(
        &self,
        path: &Path,
        prompt: Option<&str>,
        model: &str,
        webhook: Option<&str>,
    ) -> AnalysisResult {
        let prompt = self.effective_prompt(prompt);
        info!("Analyzing local video {} with {model}", path.display());

        let outcome = self.analyze_file(path, prompt, model).await;

        let video = VideoRef::VideoPath(path.display().to_string());
        self.finish(AnalysisKind::LocalFile, prompt, video, model, outcome, webhook)
            .await
    }

    /// Download the video to a temporary file, analyze it, then remove the file.
    pub async fn analyze_url(
        &self,
        url: &str,
        prompt: Option<&str>,
        model: &str,
        webhook: Option<&str>,
    ) -> AnalysisResult {
        let prompt = self.effective_prompt(prompt);
        info!("Analyzing remote video {url} with {model}");

        let outcome = self.download_and_analyze(url, prompt, model).await;

        self.finish(AnalysisKind::RemoteUrl, prompt, VideoRef::VideoUrl(url.to_string()), model, outcome, webhook)
            .await
    }

    fn effective_prompt<'a>(&'a self, prompt: Option<&'a str>) -> &'a str {
        prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(self.settings.default_prompt.as_str())
    }

    async fn download_and_analyze(&self, url: &str, prompt: &str, model: &str) -> Result<String, AnalyzerError> {
        let video = fetcher::download(&self.client, url, progress_reporter(self.settings.show_progress)).await?;
        if self.settings.show_progress {
            eprintln!();
        }

        let outcome = self.analyze_file(video.path(), prompt, model).await;

        let path = video.path().to_path_buf();
        match video.close() {
            Ok(()) => debug!("Removed temporary file {}", path.display()),
            Err(e) => warn!("Failed to remove temporary file {}: {e}", path.display()),
        }

        outcome
    }

    /// Upload, wait, generate. The remote copy is deleted once uploaded, whatever happens next.
    async fn analyze_file(&self, path: &Path, prompt: &str, model: &str) -> Result<String, AnalyzerError> {
        if !path.is_file() {
            return Err(AnalyzerError::FileNotFound(path.to_path_buf()));
        }

        let file = lifecycle::upload(&self.provider, path).await?;
        let outcome = self.generate_from(&file, prompt, model).await;
        lifecycle::delete(&self.provider, &file).await;
        outcome
    }

    async fn generate_from(&self, file: &RemoteFile, prompt: &str, model: &str) -> Result<String, AnalyzerError> {
        let ready = lifecycle::await_ready(&self.provider, file, &self.settings.poll).await?;
        if ready.state == FileState::Failed {
            return Err(AnalyzerError::ProcessingFailed { name: ready.name });
        }

        self.provider
            .generate(model, &[Part::text(prompt), Part::remote_file(&ready)])
            .await
            .map_err(AnalyzerError::Generation)
    }

    async fn finish(
        &self,
        kind: AnalysisKind,
        prompt: &str,
        video: VideoRef,
        model: &str,
        outcome: Result<String, AnalyzerError>,
        webhook: Option<&str>,
    ) -> AnalysisResult {
        let result = match outcome {
            Ok(text) => {
                info!("{kind} analysis finished ({} chars)", text.len());
                AnalysisResult::Text(text)
            }
            Err(e) => {
                error!("{kind} analysis failed: {e}");
                AnalysisResult::Error(error_message(&e))
            }
        };

        if let Some(url) = webhook {
            let payload = WebhookPayload::new(kind, prompt, video, model, &result);
            webhook::notify(&self.client, url, &payload).await;
        }

        result
    }
}

fn error_message(e: &AnalyzerError) -> String {
    match e {
        AnalyzerError::ProcessingFailed { .. } => e.to_string(),
        _ => format!("analysis failed: {e}"),
    }
}

fn progress_reporter(show: bool) -> impl FnMut(DownloadProgress) {
    let mut last_logged = None;
    move |progress: DownloadProgress| {
        let Some(percent) = progress.percent() else {
            return;
        };
        if show {
            eprint!("\rDownloading: {percent:.1}%");
        }
        let decile = (percent / 10.0) as u64;
        if last_logged != Some(decile) {
            last_logged = Some(decile);
            debug!("Download progress: {percent:.1}% ({} bytes)", progress.downloaded);
        }
    }
}
