use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::config::AnalysisSettings;
use super::outcome::{AnalysisFailure, AnalysisOutcome, FailureKind};
use super::parse::parse_response;
use super::provider::{FileState, GenerateRequest, InferenceProvider, RemoteFile};
use crate::poll::{poll_until, PollOutcome, PollPolicy, Probe};

/// Runs one recording through the inference provider
pub struct RemoteAnalysisClient {
    provider: Arc<dyn InferenceProvider>,
    settings: AnalysisSettings,
}

impl RemoteAnalysisClient {
    pub fn new(provider: Arc<dyn InferenceProvider>, settings: AnalysisSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Analyze a local audio file.
    ///
    /// Once an upload succeeds the remote file is deleted before this returns,
    /// whichever way the rest of the request goes.
    pub async fn analyze_file(&self, path: &Path) -> AnalysisOutcome {
        info!("Analyzing {} with {}", path.display(), self.provider.name());

        let remote = match self.upload(path).await {
            Ok(remote) => remote,
            Err(failure) => return AnalysisOutcome::Failed(failure),
        };

        let outcome = self.process(&remote).await;
        self.release(&remote).await;
        outcome
    }

    /// Upload with a fixed number of independent attempts
    pub async fn upload(&self, path: &Path) -> Result<RemoteFile, AnalysisFailure> {
        let attempts = self.settings.upload_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.provider.upload_file(path, &self.settings.mime_type).await {
                Ok(remote) => {
                    info!("Uploaded {} as {}", path.display(), remote.name);
                    return Ok(remote);
                }
                Err(e) => {
                    warn!(attempt, max_attempts = attempts, "Upload attempt failed: {}", e);
                    last_error = e.to_string();
                }
            }

            if attempt < attempts {
                info!(
                    "Retrying upload in {}s",
                    self.settings.upload_retry_delay.as_secs()
                );
                tokio::time::sleep(self.settings.upload_retry_delay).await;
            }
        }

        error!("Max upload retries reached, failing analysis");
        Err(AnalysisFailure::new(
            FailureKind::Uploading,
            format!("Max upload retries reached: {}", last_error),
        ))
    }

    /// Wait until the uploaded file is usable
    pub async fn await_active(&self, remote: &RemoteFile) -> Result<RemoteFile, AnalysisFailure> {
        match remote.state {
            FileState::Active => return Ok(remote.clone()),
            FileState::Failed => return Err(processing_failed(remote)),
            FileState::Processing => {}
        }

        let policy = PollPolicy {
            interval: self.settings.file_poll_interval,
            max_wait: self.settings.file_max_wait,
        };

        let outcome = poll_until(policy, || {
            let provider = Arc::clone(&self.provider);
            let name = remote.name.clone();
            async move {
                match provider.get_file(&name).await {
                    Ok(file) if file.state == FileState::Processing => {
                        info!("Waiting for file processing...");
                        Probe::Pending
                    }
                    Ok(file) => Probe::Ready(file),
                    Err(e) if e.is_retriable() => Probe::Transient(e),
                    Err(e) => Probe::Fatal(e),
                }
            }
        })
        .await;

        match outcome {
            PollOutcome::Ready { value: file, .. } if file.state == FileState::Active => Ok(file),
            PollOutcome::Ready { value: file, .. } => Err(processing_failed(&file)),
            PollOutcome::TimedOut { waited } => Err(AnalysisFailure::new(
                FailureKind::Uploading,
                format!(
                    "Uploaded file {} was not active after {}s",
                    remote.name,
                    waited.as_secs()
                ),
            )),
            PollOutcome::Faulted { error: e, .. } => Err(AnalysisFailure::new(
                FailureKind::Uploading,
                format!("Failed to fetch state of {}: {}", remote.name, e),
            )),
        }
    }

    /// Ask the model about an active file and classify the answer
    pub async fn analyze(&self, remote: &RemoteFile) -> AnalysisOutcome {
        info!("Requesting analysis of {}", remote.name);

        let request = GenerateRequest {
            prompt: self.settings.prompt.clone(),
            file: remote.clone(),
            timeout: self.settings.request_timeout,
        };

        match self.provider.generate(&request).await {
            Ok(text) => parse_response(&text),
            Err(e) if e.is_api_level() => {
                error!("API error during analysis request: {}", e);
                AnalysisOutcome::Failed(AnalysisFailure::new(
                    FailureKind::Api,
                    format!("API error: {}", e),
                ))
            }
            Err(e) => {
                error!("Error during analysis request: {}", e);
                AnalysisOutcome::Failed(AnalysisFailure::new(
                    FailureKind::Unknown,
                    format!("Unknown analysis error: {}", e),
                ))
            }
        }
    }

    /// Delete the uploaded file. Failures are warnings only.
    pub async fn release(&self, remote: &RemoteFile) -> bool {
        info!("Deleting uploaded file {}", remote.name);
        match self.provider.delete_file(&remote.name).await {
            Ok(()) => {
                info!("Deleted uploaded file {}", remote.name);
                true
            }
            Err(e) => {
                warn!("Failed to delete uploaded file {}: {}", remote.name, e);
                false
            }
        }
    }

    async fn process(&self, remote: &RemoteFile) -> AnalysisOutcome {
        match self.await_active(remote).await {
            Ok(active) => self.analyze(&active).await,
            Err(failure) => AnalysisOutcome::Failed(failure),
        }
    }
}

fn processing_failed(remote: &RemoteFile) -> AnalysisFailure {
    AnalysisFailure::new(
        FailureKind::Uploading,
        format!("Audio file processing failed for {}", remote.name),
    )
}
