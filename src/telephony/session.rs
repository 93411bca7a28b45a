use chrono::{DateTime, Local};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

use super::config::CallTimings;
use super::provider::{CallStatus, RecordingRef, TelephonyProvider};
use crate::error::{HotlineError, Result};
use crate::poll::{poll_until, PollOutcome, Probe};

/// Call instructions: start recording as soon as the far end answers
pub const RECORD_ON_ANSWER_TWIML: &str = "<Response><Record/></Response>";

/// Where a call session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// No call placed yet
    Created,
    /// Call placed, status not yet terminal
    Polling,
    /// Provider reported a terminal status
    Finished(CallStatus),
    /// Wait budget ran out before a terminal status
    TimedOut,
}

/// One outbound call and the recording it produces
pub struct CallSession {
    /// Telephony provider used for every remote operation
    provider: Arc<dyn TelephonyProvider>,

    /// Poll cadence, wait budget and recording grace period
    timings: CallTimings,

    state: CallState,

    /// Provider call identifier, set once by `place`
    call_id: Option<String>,

    /// Set once by `locate_recording`
    recording: Option<RecordingRef>,

    /// Set once by a successful `download_recording`
    local_audio_path: Option<PathBuf>,

    /// Whether the remote recording deletion has been attempted
    recording_released: bool,
}

impl CallSession {
    pub fn new(provider: Arc<dyn TelephonyProvider>, timings: CallTimings) -> Self {
        Self {
            provider,
            timings,
            state: CallState::Created,
            call_id: None,
            recording: None,
            local_audio_path: None,
            recording_released: false,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn call_id(&self) -> Option<&str> {
        self.call_id.as_deref()
    }

    pub fn recording(&self) -> Option<&RecordingRef> {
        self.recording.as_ref()
    }

    pub fn local_audio_path(&self) -> Option<&Path> {
        self.local_audio_path.as_deref()
    }

    /// Place the outbound call
    pub async fn place(&mut self, from: &str, to: &str, twiml: &str) -> Result<String> {
        if let Some(call_id) = &self.call_id {
            warn!("Call {} already placed", call_id);
            return Ok(call_id.clone());
        }

        info!("Initiating call to {} via {}", to, self.provider.name());

        let call_id = self.provider.create_call(from, to, twiml).await.map_err(|e| {
            error!("Failed to initiate call: {}", e);
            HotlineError::Telephony(e)
        })?;

        info!("Call initiated with id {}", call_id);
        self.call_id = Some(call_id.clone());
        self.state = CallState::Polling;
        Ok(call_id)
    }

    /// Poll until the call reaches a terminal status.
    ///
    /// Returns the terminal status, which may be something other than
    /// `Completed`; callers must not look for a recording in that case.
    pub async fn await_completion(&mut self) -> Result<CallStatus> {
        let call_id = self.placed_call_id()?;

        if let CallState::Finished(status) = self.state {
            return Ok(status);
        }

        info!(
            "Waiting for call {} to complete (poll every {}s, up to {}s)",
            call_id,
            self.timings.poll_interval.as_secs(),
            self.timings.max_wait.as_secs()
        );

        let provider = Arc::clone(&self.provider);
        let outcome = poll_until(self.timings.poll_policy(), || {
            let provider = Arc::clone(&provider);
            let call_id = call_id.clone();
            async move {
                match provider.fetch_call_status(&call_id).await {
                    Ok(status) => {
                        info!("Call status: {}", status);
                        if status.is_terminal() {
                            Probe::Ready(status)
                        } else {
                            Probe::Pending
                        }
                    }
                    Err(e) if e.is_retriable() => Probe::Transient(e),
                    Err(e) => Probe::Fatal(e),
                }
            }
        })
        .await;

        match outcome {
            PollOutcome::Ready { value: status, waited } => {
                info!("Call {} reached {} after {}s", call_id, status, waited.as_secs());
                self.state = CallState::Finished(status);
                Ok(status)
            }
            PollOutcome::TimedOut { waited } => {
                error!("Call {} did not complete within {}s", call_id, waited.as_secs());
                self.state = CallState::TimedOut;
                Err(HotlineError::Timeout { call_id, waited })
            }
            PollOutcome::Faulted { error: e, .. } => {
                error!("Failed to fetch status of call {}: {}", call_id, e);
                Err(HotlineError::Telephony(e))
            }
        }
    }

    /// Find the most recent recording of a completed call
    pub async fn locate_recording(&mut self) -> Result<RecordingRef> {
        let call_id = self.placed_call_id()?;

        if let Some(recording) = &self.recording {
            return Ok(recording.clone());
        }

        match self.state {
            CallState::Finished(CallStatus::Completed) => {}
            CallState::Finished(status) => {
                return Err(HotlineError::CallEnded { call_id, status });
            }
            _ => {
                return Err(HotlineError::SessionState(format!(
                    "call {} has not reached a terminal status",
                    call_id
                )));
            }
        }

        info!("Call completed, fetching recordings");

        match self.provider.latest_recording(&call_id).await {
            Ok(Some(recording)) => {
                info!("Found recording {}", recording.recording_id);
                self.recording = Some(recording.clone());
                Ok(recording)
            }
            Ok(None) => {
                error!("No recordings found for call {}", call_id);
                Err(HotlineError::RecordingNotFound { call_id })
            }
            Err(e) => {
                error!("Failed to list recordings: {}", e);
                Err(HotlineError::Telephony(e))
            }
        }
    }

    /// Download the located recording into `destination_dir`.
    ///
    /// Waits the grace period first, then streams the media to a new
    /// timestamped file. On failure the partial file is removed.
    pub async fn download_recording(&mut self, destination_dir: &Path) -> Result<PathBuf> {
        if let Some(path) = &self.local_audio_path {
            return Ok(path.clone());
        }

        let recording = self.recording.clone().ok_or_else(|| HotlineError::Download {
            path: destination_dir.to_path_buf(),
            reason: "no recording has been located".to_string(),
        })?;

        info!(
            "Waiting {}s for recording media to finalize",
            self.timings.recording_grace.as_secs()
        );
        tokio::time::sleep(self.timings.recording_grace).await;

        let path = destination_dir.join(recording_file_name(Local::now()));
        info!("Downloading recording {} to {}", recording.recording_id, path.display());

        match self.stream_to_file(&recording.media_uri, &path).await {
            Ok(bytes) => {
                info!("Recording saved to {} ({} bytes)", path.display(), bytes);
                self.local_audio_path = Some(path.clone());
                Ok(path)
            }
            Err(reason) => {
                error!("Error downloading recording: {}", reason);
                remove_partial(&path).await;
                Err(HotlineError::Download { path, reason })
            }
        }
    }

    /// Delete the remote recording. Best effort: failures are logged and
    /// reported as `false`. Only the first call reaches the provider.
    pub async fn delete_remote_recording(&mut self) -> bool {
        let Some(recording) = &self.recording else {
            return false;
        };
        if self.recording_released {
            warn!("Recording {} already released", recording.recording_id);
            return false;
        }
        self.recording_released = true;

        match self.provider.delete_recording(&recording.recording_id).await {
            Ok(()) => {
                info!("Deleted recording {}", recording.recording_id);
                true
            }
            Err(e) => {
                error!("Error deleting recording {}: {}", recording.recording_id, e);
                false
            }
        }
    }

    fn placed_call_id(&self) -> Result<String> {
        self.call_id
            .clone()
            .ok_or_else(|| HotlineError::SessionState("no call has been placed".to_string()))
    }

    async fn stream_to_file(&self, media_uri: &str, path: &Path) -> std::result::Result<u64, String> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create {}: {}", parent.display(), e))?;
        }

        let mut stream = self
            .provider
            .open_media(media_uri)
            .await
            .map_err(|e| e.to_string())?;

        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| format!("failed to create {}: {}", path.display(), e))?;

        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| e.to_string())?;
            file.write_all(&chunk)
                .await
                .map_err(|e| format!("failed to write {}: {}", path.display(), e))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| format!("failed to flush {}: {}", path.display(), e))?;

        Ok(written)
    }
}

/// File name for a recording fetched at `at`.
/// The random suffix keeps two downloads within the same second apart.
pub fn recording_file_name(at: DateTime<Local>) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("recording_{}_{}.wav", at.format("%Y%m%d_%H%M%S"), &suffix[..8])
}

async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => info!("Removed partial download {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove partial download {}: {}", path.display(), e),
    }
}
