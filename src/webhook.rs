use std::time::Duration;

use log::{info, warn};
use serde::Serialize;

use crate::error::WebhookError;
use crate::{AnalysisKind, AnalysisResult};

pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

pub const USER_AGENT: &str = concat!("video-analyzer/", env!("CARGO_PKG_VERSION"));

/// Where the analyzed video came from, as reported to the webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoRef {
    VideoUrl(String),
    VideoPath(String),
}

/// Body of the single notification sent per analysis
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
    pub prompt: String,
    #[serde(flatten)]
    pub video: VideoRef,
    pub model: String,
    #[serde(flatten)]
    pub outcome: AnalysisResult,
    pub timestamp: String,
}

impl WebhookPayload {
    pub fn new(kind: AnalysisKind, prompt: &str, video: VideoRef, model: &str, outcome: &AnalysisResult) -> Self {
        Self {
            kind,
            prompt: prompt.to_string(),
            video,
            model: model.to_string(),
            outcome: outcome.clone(),
            timestamp: chrono::Local::now().to_rfc3339(),
        }
    }
}

/// POST `payload` to `url`. Returns true only when the endpoint answers 200.
pub async fn notify(client: &reqwest::Client, url: &str, payload: &WebhookPayload) -> bool {
    match deliver(client, url, payload).await {
        Ok(()) => {
            info!("Webhook delivered to {url}");
            true
        }
        Err(e) => {
            warn!("Webhook delivery to {url} failed: {e}");
            false
        }
    }
}

async fn deliver(client: &reqwest::Client, url: &str, payload: &WebhookPayload) -> Result<(), WebhookError> {
    let resp = client
        .post(url)
        .timeout(WEBHOOK_TIMEOUT)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .json(payload)
        .send()
        .await?;

    if resp.status() != reqwest::StatusCode::OK {
        return Err(WebhookError::Status(resp.status()));
    }
    Ok(())
}
