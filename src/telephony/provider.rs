use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::pin::Pin;
use thiserror::Error;

/// Call status as reported by the telephony provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallStatus {
    Queued,
    Ringing,
    InProgress,
    Completed,
    Busy,
    Failed,
    NoAnswer,
    Canceled,
    /// Anything the provider reports that we do not model (e.g. `initiated`)
    #[serde(other)]
    Unknown,
}

impl CallStatus {
    /// Statuses the provider never transitions out of
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Busy | Self::Failed | Self::NoAnswer | Self::Canceled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Ringing => "ringing",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Busy => "busy",
            Self::Failed => "failed",
            Self::NoAnswer => "no-answer",
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The most recent recording attached to a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingRef {
    /// Provider identifier, used for deletion
    pub recording_id: String,
    /// Absolute URL of the recording audio
    pub media_uri: String,
}

#[derive(Debug, Error)]
pub enum TelephonyError {
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl TelephonyError {
    /// Whether the same request may succeed if repeated later.
    /// Rate limits, server errors and network failures are; bad credentials,
    /// unknown resources and malformed requests are not.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Transport(_) => true,
            Self::Decode(_) => false,
        }
    }
}

/// Streamed recording media
pub type MediaStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TelephonyError>> + Send>>;

/// Telephony operations the call session needs
///
/// Implementations:
/// - `TwilioClient`: Twilio REST API
/// - scripted fakes in tests
#[async_trait]
pub trait TelephonyProvider: Send + Sync {
    /// Place an outbound call, returning its identifier
    async fn create_call(&self, from: &str, to: &str, twiml: &str) -> Result<String, TelephonyError>;

    /// Current status of a call
    async fn fetch_call_status(&self, call_id: &str) -> Result<CallStatus, TelephonyError>;

    /// Most recent recording for a call, if any
    async fn latest_recording(&self, call_id: &str) -> Result<Option<RecordingRef>, TelephonyError>;

    /// Open an authenticated stream over the recording audio
    async fn open_media(&self, media_uri: &str) -> Result<MediaStream, TelephonyError>;

    /// Delete a recording from the provider
    async fn delete_recording(&self, recording_id: &str) -> Result<(), TelephonyError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
