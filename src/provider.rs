use std::future::Future;
use std::path::Path;

use crate::error::ProviderError;

/// Processing state of a file held in the provider's file store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Processing,
    Ready,
    Failed,
}

/// Provider-side reference to an uploaded video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub name: String,
    pub mime_type: String,
    pub uri: String,
    pub state: FileState,
}

/// One piece of a generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    File { mime_type: Option<String>, uri: String },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    /// Reference an uploaded file by its provider URI
    pub fn remote_file(file: &RemoteFile) -> Self {
        Part::File {
            mime_type: Some(file.mime_type.clone()),
            uri: file.uri.clone(),
        }
    }

    /// Reference a YouTube video by URL; the provider fetches it itself
    pub fn youtube(url: impl Into<String>) -> Self {
        Part::File {
            mime_type: None,
            uri: url.into(),
        }
    }
}

/// The generative AI service: content generation plus its file store.
pub trait Provider {
    fn generate(&self, model: &str, parts: &[Part]) -> impl Future<Output = Result<String, ProviderError>> + Send;

    fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
    ) -> impl Future<Output = Result<RemoteFile, ProviderError>> + Send;

    fn get_file(&self, name: &str) -> impl Future<Output = Result<RemoteFile, ProviderError>> + Send;

    fn delete_file(&self, name: &str) -> impl Future<Output = Result<(), ProviderError>> + Send;
}
