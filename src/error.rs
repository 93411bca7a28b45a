//! Run-level faults
//!
//! Every failure that can halt (or partially halt) a run is one variant here.
//! Analysis failures are not in this list: they are returned as data
//! (see [`crate::analysis::AnalysisOutcome`]).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::telephony::{CallStatus, TelephonyError};

#[derive(Debug, Error)]
pub enum HotlineError {
    /// Missing or invalid configuration, detected before any remote call
    #[error("configuration error: {0}")]
    Config(String),

    /// Call placement, status, listing or deletion failed at the provider
    #[error("telephony error: {0}")]
    Telephony(#[from] TelephonyError),

    /// The call never reached a terminal status
    #[error("call {call_id} did not complete within {}s", waited.as_secs())]
    Timeout { call_id: String, waited: Duration },

    /// The call finished, but not with `completed`
    #[error("call {call_id} ended with status: {status}")]
    CallEnded { call_id: String, status: CallStatus },

    /// The provider reports no recording for a completed call
    #[error("no recordings found for call {call_id}")]
    RecordingNotFound { call_id: String },

    /// Fetching or writing the recording media failed
    #[error("failed to download recording to {}: {reason}", path.display())]
    Download { path: PathBuf, reason: String },

    /// An operation was called out of lifecycle order
    #[error("invalid call session state: {0}")]
    SessionState(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HotlineError {
    /// Label written to the result log for this fault
    pub fn log_label(&self) -> &'static str {
        match self {
            Self::Config(_) => "error_config",
            Self::Telephony(_) => "error_telephony",
            Self::Timeout { .. } => "error_timeout",
            Self::CallEnded { .. } => "error_call_ended",
            Self::RecordingNotFound { .. } => "error_file",
            Self::Download { .. } => "error_download",
            Self::SessionState(_) => "error_state",
            Self::Io(_) => "error_io",
        }
    }

    /// Notification title for this fault
    pub fn notification_title(&self) -> &'static str {
        match self {
            Self::Config(_) => "Hotline Config Error",
            Self::Telephony(_) => "Hotline Telephony Error",
            Self::Timeout { .. } => "Hotline Critical Error: Call Timeout",
            Self::CallEnded { .. } => "Hotline Call Not Completed",
            Self::RecordingNotFound { .. } => "Hotline File Error",
            Self::Download { .. } => "Hotline Download Error",
            Self::SessionState(_) => "Hotline Critical Unhandled Error",
            Self::Io(_) => "Hotline I/O Error",
        }
    }
}

impl From<config::ConfigError> for HotlineError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HotlineError>;
