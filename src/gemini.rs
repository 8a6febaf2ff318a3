use std::path::Path;

use log::debug;
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::error::ProviderError;
use crate::provider::{FileState, Part, Provider, RemoteFile};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini REST client covering content generation and the Files API
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    uri: String,
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileResource,
}

impl From<FileResource> for RemoteFile {
    fn from(file: FileResource) -> Self {
        RemoteFile {
            state: parse_state(file.state.as_deref()),
            name: file.name,
            mime_type: file.mime_type,
            uri: file.uri,
        }
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        return Err(ProviderError::Api { status, message });
    }
    Ok(resp)
}

impl Provider for GeminiClient {
    async fn generate(&self, model: &str, parts: &[Part]) -> Result<String, ProviderError> {
        debug!("Generating content with model {model} ({} parts)", parts.len());

        let resp = self
            .client
            .post(format!("{}/v1beta/models/{model}:generateContent", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(parts))
            .send()
            .await?;

        let json: serde_json::Value = check_status(resp).await?.json().await?;
        extract_text(&json)
    }

    async fn upload_file(&self, path: &Path, mime_type: &str) -> Result<RemoteFile, ProviderError> {
        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();
        let display_name = path.file_name().unwrap_or_default().to_string_lossy().to_string();

        debug!("Starting upload of {} ({size} bytes, {mime_type})", path.display());

        let resp = self
            .client
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;

        let resp = check_status(resp).await?;
        let upload_url = resp
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| ProviderError::UnexpectedResponse("upload session URL missing".into()))?;

        let resp = self
            .client
            .post(&upload_url)
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header(reqwest::header::CONTENT_LENGTH, size)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;

        let uploaded: UploadResponse = check_status(resp).await?.json().await?;
        debug!("Uploaded {} as {}", path.display(), uploaded.file.name);
        Ok(uploaded.file.into())
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile, ProviderError> {
        let resp = self
            .client
            .get(format!("{}/v1beta/{name}", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        let file: FileResource = check_status(resp).await?.json().await?;
        Ok(file.into())
    }

    async fn delete_file(&self, name: &str) -> Result<(), ProviderError> {
        let resp = self
            .client
            .delete(format!("{}/v1beta/{name}", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;

        check_status(resp).await?;
        Ok(())
    }
}

/// `ACTIVE` and unspecified states are both usable for generation
fn parse_state(state: Option<&str>) -> FileState {
    match state {
        Some("PROCESSING") => FileState::Processing,
        Some("FAILED") => FileState::Failed,
        _ => FileState::Ready,
    }
}

fn request_body(parts: &[Part]) -> serde_json::Value {
    let parts: Vec<serde_json::Value> = parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => serde_json::json!({ "text": text }),
            Part::File {
                mime_type: Some(mime_type),
                uri,
            } => serde_json::json!({ "file_data": { "mime_type": mime_type, "file_uri": uri } }),
            Part::File { mime_type: None, uri } => serde_json::json!({ "file_data": { "file_uri": uri } }),
        })
        .collect();

    serde_json::json!({
        "contents": [
            {
                "parts": parts
            }
        ]
    })
}

fn extract_text(json: &serde_json::Value) -> Result<String, ProviderError> {
    let text = json
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part.get("text")?.as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if !text.is_empty() {
        return Ok(text);
    }

    if let Some(reason) = json.pointer("/promptFeedback/blockReason").and_then(|r| r.as_str()) {
        return Err(ProviderError::UnexpectedResponse(format!("prompt blocked: {reason}")));
    }

    if let Some(reason) = json.pointer("/candidates/0/finishReason").and_then(|r| r.as_str()) {
        return Err(ProviderError::UnexpectedResponse(format!(
            "no text returned (finish reason: {reason})"
        )));
    }

    Err(ProviderError::UnexpectedResponse(
        "unexpected Gemini API response format".into(),
    ))
}
