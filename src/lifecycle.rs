//! Upload, readiness polling and removal of videos in the provider's file store.

use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::error::AnalyzerError;
use crate::provider::{FileState, Provider, RemoteFile};

/// How `await_ready` paces and bounds its status checks
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    /// Multiplier applied to the delay after every check
    pub backoff: f64,
    pub max_interval: Duration,
    /// `None` polls until the provider leaves the processing state
    pub max_wait: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            backoff: 1.5,
            max_interval: Duration::from_secs(10),
            max_wait: Some(Duration::from_secs(600)),
        }
    }
}

impl PollConfig {
    fn next_delay(&self, current: Duration) -> Duration {
        let cap = self.max_interval.max(self.interval);
        let backoff = if self.backoff.is_finite() { self.backoff.max(1.0) } else { 1.0 };
        Duration::try_from_secs_f64(current.as_secs_f64() * backoff)
            .unwrap_or(cap)
            .min(cap)
    }
}

/// MIME type sent with an upload, derived from the file extension
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "flv" => "video/x-flv",
        _ => "video/mp4",
    }
}

pub async fn upload<P: Provider>(provider: &P, path: &Path) -> Result<RemoteFile, AnalyzerError> {
    info!("Uploading {}", path.display());
    provider
        .upload_file(path, mime_type_for(path))
        .await
        .map_err(AnalyzerError::Upload)
}

/// Poll until the file leaves the processing state.
///
/// Returns the refreshed handle in `Ready` or `Failed`; deciding what a
/// failed file means is left to the caller.
pub async fn await_ready<P: Provider>(
    provider: &P,
    file: &RemoteFile,
    poll: &PollConfig,
) -> Result<RemoteFile, AnalyzerError> {
    let started = Instant::now();
    let mut delay = poll.interval;
    let mut current = provider.get_file(&file.name).await.map_err(AnalyzerError::Status)?;

    while current.state == FileState::Processing {
        if let Some(max_wait) = poll.max_wait {
            let waited = started.elapsed();
            if waited >= max_wait {
                return Err(AnalyzerError::ProcessingTimeout {
                    name: file.name.clone(),
                    waited,
                });
            }
            delay = delay.min(max_wait - waited);
        }

        debug!("{} still processing, checking again in {delay:?}", file.name);
        tokio::time::sleep(delay).await;
        delay = poll.next_delay(delay.max(poll.interval));

        current = provider.get_file(&file.name).await.map_err(AnalyzerError::Status)?;
    }

    debug!("{} left processing as {:?} after {:?}", file.name, current.state, started.elapsed());
    Ok(current)
}

/// Remove the remote copy. Failures are logged and swallowed.
pub async fn delete<P: Provider>(provider: &P, file: &RemoteFile) {
    match provider.delete_file(&file.name).await {
        Ok(()) => debug!("Deleted remote file {}", file.name),
        Err(e) => warn!("Failed to delete remote file {}: {e}", file.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::provider::Part;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedStore {
        states: Mutex<VecDeque<FileState>>,
        polls: AtomicUsize,
        fail_delete: bool,
    }

    impl ScriptedStore {
        fn new(states: &[FileState]) -> Self {
            Self {
                states: Mutex::new(states.iter().copied().collect()),
                polls: AtomicUsize::new(0),
                fail_delete: false,
            }
        }

        fn file(state: FileState) -> RemoteFile {
            RemoteFile {
                name: "files/test".to_string(),
                mime_type: "video/mp4".to_string(),
                uri: "https://example.test/files/test".to_string(),
                state,
            }
        }
    }

    impl Provider for ScriptedStore {
        async fn generate(&self, _model: &str, _parts: &[Part]) -> Result<String, ProviderError> {
            unreachable!("lifecycle never generates")
        }

        async fn upload_file(&self, _path: &Path, mime_type: &str) -> Result<RemoteFile, ProviderError> {
            let mut file = Self::file(FileState::Processing);
            file.mime_type = mime_type.to_string();
            Ok(file)
        }

        async fn get_file(&self, _name: &str) -> Result<RemoteFile, ProviderError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            let mut states = self.states.lock().unwrap();
            // The last scripted state repeats forever
            let state = if states.len() > 1 {
                states.pop_front().unwrap()
            } else {
                states[0]
            };
            Ok(Self::file(state))
        }

        async fn delete_file(&self, name: &str) -> Result<(), ProviderError> {
            if self.fail_delete {
                return Err(ProviderError::Api {
                    status: 404,
                    message: format!("{name} not found"),
                });
            }
            Ok(())
        }
    }

    fn fast_poll() -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(1),
            backoff: 2.0,
            max_interval: Duration::from_millis(4),
            max_wait: Some(Duration::from_secs(5)),
        }
    }

    #[test]
    fn test_mime_type_for() {
        assert_eq!(mime_type_for(Path::new("clip.mp4")), "video/mp4");
        assert_eq!(mime_type_for(Path::new("clip.MOV")), "video/quicktime");
        assert_eq!(mime_type_for(Path::new("clip.mkv")), "video/x-matroska");
        assert_eq!(mime_type_for(Path::new("clip.webm")), "video/webm");
        assert_eq!(mime_type_for(Path::new("clip.avi")), "video/x-msvideo");
        assert_eq!(mime_type_for(Path::new("clip.flv")), "video/x-flv");
        assert_eq!(mime_type_for(Path::new("clip")), "video/mp4");
        assert_eq!(mime_type_for(Path::new("clip.txt")), "video/mp4");
    }

    #[test]
    fn test_next_delay_backs_off_and_caps() {
        let poll = PollConfig {
            interval: Duration::from_secs(2),
            backoff: 2.0,
            max_interval: Duration::from_secs(5),
            max_wait: None,
        };
        assert_eq!(poll.next_delay(Duration::from_secs(2)), Duration::from_secs(4));
        assert_eq!(poll.next_delay(Duration::from_secs(4)), Duration::from_secs(5));
    }

    #[test]
    fn test_next_delay_survives_extreme_values() {
        let poll = PollConfig {
            interval: Duration::from_secs(2),
            backoff: f64::INFINITY,
            max_interval: Duration::from_secs(10),
            max_wait: None,
        };
        assert_eq!(poll.next_delay(Duration::from_secs(2)), Duration::from_secs(2));

        let huge = PollConfig {
            backoff: 1e300,
            ..poll
        };
        assert_eq!(huge.next_delay(Duration::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_next_delay_fixed_interval() {
        let poll = PollConfig {
            backoff: 1.0,
            ..PollConfig::default()
        };
        assert_eq!(poll.next_delay(Duration::from_secs(2)), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_upload_passes_mime_type() {
        let store = ScriptedStore::new(&[FileState::Ready]);
        let file = upload(&store, Path::new("/tmp/clip.webm")).await.unwrap();
        assert_eq!(file.mime_type, "video/webm");
    }

    #[tokio::test]
    async fn test_await_ready_polls_until_ready() {
        let store = ScriptedStore::new(&[FileState::Processing, FileState::Processing, FileState::Ready]);
        let file = ScriptedStore::file(FileState::Processing);

        let ready = await_ready(&store, &file, &fast_poll()).await.unwrap();
        assert_eq!(ready.state, FileState::Ready);
        assert_eq!(store.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_await_ready_returns_failed_state() {
        let store = ScriptedStore::new(&[FileState::Processing, FileState::Failed]);
        let file = ScriptedStore::file(FileState::Processing);

        let done = await_ready(&store, &file, &fast_poll()).await.unwrap();
        assert_eq!(done.state, FileState::Failed);
    }

    #[tokio::test]
    async fn test_await_ready_times_out() {
        let store = ScriptedStore::new(&[FileState::Processing]);
        let file = ScriptedStore::file(FileState::Processing);
        let poll = PollConfig {
            max_wait: Some(Duration::from_millis(20)),
            ..fast_poll()
        };

        let err = await_ready(&store, &file, &poll).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::ProcessingTimeout { .. }));
        assert!(store.polls.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn test_delete_failure_is_swallowed() {
        let store = ScriptedStore {
            fail_delete: true,
            ..ScriptedStore::new(&[FileState::Ready])
        };
        delete(&store, &ScriptedStore::file(FileState::Ready)).await;
    }
}
