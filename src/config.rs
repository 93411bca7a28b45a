use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::analysis::AnalysisSettings;
use crate::error::{HotlineError, Result};
use crate::notify::NtfyCredentials;
use crate::telephony::CallTimings;

const RECORDINGS_DIR: &str = "recordings";
const LOGS_DIR: &str = "logs";
const LOG_FILE_NAME: &str = "hotline_log.md";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Validated runtime configuration, built once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub recordings_dir: PathBuf,
    pub log_file: PathBuf,
    pub twilio: TwilioConfig,
    /// Number the run calls
    pub hotline_phone_number: String,
    pub gemini: GeminiConfig,
    pub ntfy: NtfyConfig,
    /// Color that triggers the alert notification
    pub target_color: Option<String>,
    pub call: CallTimings,
    pub analysis: AnalysisSettings,
}

#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Caller ID for the outbound call
    pub phone_number: String,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct NtfyConfig {
    pub credentials: NtfyCredentials,
    pub topic_logs: String,
    pub topic_errors: String,
    pub topic_alerts: String,
}

/// Settings as read from the sources, before validation.
///
/// Keys match the environment variable names, lowercased.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawSettings {
    pub hotline_data_dir: Option<String>,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_phone_number: Option<String>,
    pub hotline_phone_number: Option<String>,
    pub google_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub ntfy_server_url: Option<String>,
    pub ntfy_topic_logs: Option<String>,
    pub ntfy_topic_errors: Option<String>,
    pub ntfy_topic_alerts: Option<String>,
    pub ntfy_username: Option<String>,
    pub ntfy_password: Option<String>,
    pub target_color: Option<String>,
    pub call_poll_interval_secs: Option<u64>,
    pub call_max_wait_secs: Option<u64>,
    pub recording_grace_secs: Option<u64>,
    pub upload_attempts: Option<u32>,
    pub upload_retry_delay_secs: Option<u64>,
    pub file_poll_interval_secs: Option<u64>,
    pub file_max_wait_secs: Option<u64>,
    pub analysis_timeout_secs: Option<u64>,
}

impl Config {
    /// Create the recordings and log directories
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [Some(self.recordings_dir.as_path()), self.log_file.parent()]
            .into_iter()
            .flatten()
        {
            std::fs::create_dir_all(dir)?;
            info!("Ensured directory exists: {}", dir.display());
        }
        Ok(())
    }
}

impl RawSettings {
    /// Read an optional settings file overlaid with the process environment
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = config_file {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(config::Environment::default())
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Check required keys (all missing ones are reported together) and
    /// derive paths and timings.
    pub fn validate(self) -> Result<Config> {
        let mut missing = Vec::new();

        let data_dir = required(&self.hotline_data_dir, "HOTLINE_DATA_DIR", &mut missing);
        let account_sid = required(&self.twilio_account_sid, "TWILIO_ACCOUNT_SID", &mut missing);
        let auth_token = required(&self.twilio_auth_token, "TWILIO_AUTH_TOKEN", &mut missing);
        let twilio_number =
            required(&self.twilio_phone_number, "TWILIO_PHONE_NUMBER", &mut missing);
        let hotline_number =
            required(&self.hotline_phone_number, "HOTLINE_PHONE_NUMBER", &mut missing);
        let api_key = required(&self.google_api_key, "GOOGLE_API_KEY", &mut missing);
        let server_url = required(&self.ntfy_server_url, "NTFY_SERVER_URL", &mut missing);
        let topic_logs = required(&self.ntfy_topic_logs, "NTFY_TOPIC_LOGS", &mut missing);
        let topic_errors = required(&self.ntfy_topic_errors, "NTFY_TOPIC_ERRORS", &mut missing);
        let username = required(&self.ntfy_username, "NTFY_USERNAME", &mut missing);
        let password = required(&self.ntfy_password, "NTFY_PASSWORD", &mut missing);

        if !missing.is_empty() {
            return Err(HotlineError::Config(format!(
                "missing or empty required settings: {}",
                missing.join(", ")
            )));
        }

        let call_defaults = CallTimings::default();
        let call = CallTimings {
            poll_interval: seconds(
                self.call_poll_interval_secs,
                call_defaults.poll_interval,
                "CALL_POLL_INTERVAL_SECS",
            )?,
            max_wait: seconds(
                self.call_max_wait_secs,
                call_defaults.max_wait,
                "CALL_MAX_WAIT_SECS",
            )?,
            recording_grace: match self.recording_grace_secs {
                Some(secs) => Duration::from_secs(secs),
                None => call_defaults.recording_grace,
            },
        };

        let analysis_defaults = AnalysisSettings::default();
        let upload_attempts = self.upload_attempts.unwrap_or(analysis_defaults.upload_attempts);
        if upload_attempts == 0 {
            return Err(HotlineError::Config("UPLOAD_ATTEMPTS must be at least 1".to_string()));
        }
        let analysis = AnalysisSettings {
            upload_attempts,
            upload_retry_delay: match self.upload_retry_delay_secs {
                Some(secs) => Duration::from_secs(secs),
                None => analysis_defaults.upload_retry_delay,
            },
            file_poll_interval: seconds(
                self.file_poll_interval_secs,
                analysis_defaults.file_poll_interval,
                "FILE_POLL_INTERVAL_SECS",
            )?,
            file_max_wait: self.file_max_wait_secs.map(Duration::from_secs),
            request_timeout: seconds(
                self.analysis_timeout_secs,
                analysis_defaults.request_timeout,
                "ANALYSIS_TIMEOUT_SECS",
            )?,
            ..analysis_defaults
        };

        let data_dir = PathBuf::from(data_dir);
        let topic_alerts = optional(&self.ntfy_topic_alerts).unwrap_or_else(|| topic_logs.clone());

        Ok(Config {
            recordings_dir: data_dir.join(RECORDINGS_DIR),
            log_file: data_dir.join(LOGS_DIR).join(LOG_FILE_NAME),
            data_dir,
            twilio: TwilioConfig {
                account_sid,
                auth_token,
                phone_number: twilio_number,
            },
            hotline_phone_number: hotline_number,
            gemini: GeminiConfig {
                api_key,
                model: optional(&self.gemini_model).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            },
            ntfy: NtfyConfig {
                credentials: NtfyCredentials {
                    server_url,
                    username,
                    password,
                },
                topic_logs,
                topic_errors,
                topic_alerts,
            },
            target_color: optional(&self.target_color).map(|c| c.to_lowercase()),
            call,
            analysis,
        })
    }

    /// Where to report a configuration fault, if enough of the ntfy
    /// settings were present
    pub fn error_destination(&self) -> Option<(NtfyCredentials, String)> {
        Some((
            NtfyCredentials {
                server_url: optional(&self.ntfy_server_url)?,
                username: optional(&self.ntfy_username)?,
                password: optional(&self.ntfy_password)?,
            },
            optional(&self.ntfy_topic_errors)?,
        ))
    }
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn required(value: &Option<String>, key: &'static str, missing: &mut Vec<&'static str>) -> String {
    optional(value).unwrap_or_else(|| {
        missing.push(key);
        String::new()
    })
}

fn seconds(value: Option<u64>, default: Duration, key: &str) -> Result<Duration> {
    match value {
        None => Ok(default),
        Some(0) => Err(HotlineError::Config(format!("{} must be greater than zero", key))),
        Some(secs) => Ok(Duration::from_secs(secs)),
    }
}
