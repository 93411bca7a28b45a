pub mod analysis;
pub mod audio;
pub mod config;
pub mod error;
pub mod notify;
pub mod orchestrator;
pub mod poll;
pub mod result_log;
pub mod telephony;

pub use analysis::{AnalysisOutcome, GeminiClient, InferenceProvider, RemoteAnalysisClient};
pub use audio::RecordingInfo;
pub use config::{Config, RawSettings};
pub use error::HotlineError;
pub use notify::{Notification, NotificationSink, NtfyNotifier, Priority};
pub use orchestrator::{Orchestrator, RunReport};
pub use result_log::ResultLog;
pub use telephony::{CallSession, CallStatus, TelephonyProvider, TwilioClient};
