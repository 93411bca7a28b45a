use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Processing state of an uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Processing,
    Active,
    Failed,
}

impl FileState {
    /// Map the provider's state name. Anything that is neither processing nor
    /// active can never be analyzed and counts as failed.
    pub fn from_api(state: &str) -> Self {
        match state {
            "PROCESSING" => Self::Processing,
            "ACTIVE" => Self::Active,
            _ => Self::Failed,
        }
    }
}

/// A file held by the inference provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Resource name used to fetch and delete the file (e.g. `files/abc123`)
    pub name: String,
    /// URI referenced from generate requests
    pub uri: String,
    pub mime_type: String,
    pub state: FileState,
}

/// A single generate-content request: instruction text plus one uploaded file
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub file: RemoteFile,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum InferenceError {
    /// The service answered with an error status (quota, bad request, auth)
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The request never got a complete answer (network, timeout)
    #[error("request failed: {0}")]
    Transport(String),

    /// Anything else: unreadable local file, response without text, …
    #[error("{0}")]
    Unexpected(String),
}

impl InferenceError {
    /// Errors raised by the remote API or on the way to it
    pub fn is_api_level(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Transport(_))
    }

    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Transport(_) => true,
            Self::Unexpected(_) => false,
        }
    }
}

/// Inference operations the analysis lifecycle needs
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Upload a local file
    async fn upload_file(&self, path: &Path, mime_type: &str) -> Result<RemoteFile, InferenceError>;

    /// Fetch the current state of an uploaded file
    async fn get_file(&self, name: &str) -> Result<RemoteFile, InferenceError>;

    /// Run a generate request, returning the response text
    async fn generate(&self, request: &GenerateRequest) -> Result<String, InferenceError>;

    /// Delete an uploaded file
    async fn delete_file(&self, name: &str) -> Result<(), InferenceError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_state_mapping() {
        assert_eq!(FileState::from_api("PROCESSING"), FileState::Processing);
        assert_eq!(FileState::from_api("ACTIVE"), FileState::Active);
        assert_eq!(FileState::from_api("FAILED"), FileState::Failed);
        assert_eq!(FileState::from_api("STATE_UNSPECIFIED"), FileState::Failed);
    }

    #[test]
    fn test_error_classification() {
        let quota = InferenceError::Api {
            status: 429,
            message: "RESOURCE_EXHAUSTED".into(),
        };
        assert!(quota.is_api_level());
        assert!(quota.is_retriable());
        assert!(InferenceError::Transport("timed out".into()).is_api_level());
        assert!(!InferenceError::Unexpected("no text".into()).is_api_level());
    }
}
