use std::time::Duration;

use super::prompt::HOTLINE_PROMPT;

/// Settings for one analysis request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSettings {
    /// Instruction sent alongside the audio
    pub prompt: String,

    /// Upload attempts before giving up
    /// Default: 3
    pub upload_attempts: u32,

    /// Fixed delay between upload attempts
    /// Default: 5 seconds
    pub upload_retry_delay: Duration,

    /// Delay between file-state fetches while the upload is processed
    /// Default: 5 seconds
    pub file_poll_interval: Duration,

    /// Upper bound on waiting for the file to become active (`None` = no bound)
    pub file_max_wait: Option<Duration>,

    /// Timeout for the generate request
    /// Default: 120 seconds
    pub request_timeout: Duration,

    /// MIME type declared for uploaded recordings
    pub mime_type: String,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            prompt: HOTLINE_PROMPT.to_string(),
            upload_attempts: 3,
            upload_retry_delay: Duration::from_secs(5),
            file_poll_interval: Duration::from_secs(5),
            file_max_wait: None,
            request_timeout: Duration::from_secs(120),
            mime_type: "audio/wav".to_string(),
        }
    }
}
