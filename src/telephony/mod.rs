//! Outbound call lifecycle
//!
//! This module provides the `CallSession` state machine that:
//! - Places the outbound call with record-on-answer instructions
//! - Polls call status until a terminal status or the wait budget runs out
//! - Locates and downloads the call's recording
//! - Deletes the remote recording once the run is over

mod config;
pub mod messages;
mod provider;
mod session;
mod twilio;

pub use config::CallTimings;
pub use provider::{CallStatus, MediaStream, RecordingRef, TelephonyError, TelephonyProvider};
pub use session::{recording_file_name, CallSession, CallState, RECORD_ON_ANSWER_TWIML};
pub use twilio::TwilioClient;
