// Scripted stand-ins for the remote services
//
// Each fake records the calls it receives so tests can check how often the
// lifecycle code reached out, and in which order.

#![allow(dead_code)]

use async_trait::async_trait;
use hotline_monitor::analysis::{FileState, GenerateRequest, InferenceError, InferenceProvider, RemoteFile};
use hotline_monitor::notify::{Notification, NotificationSink};
use hotline_monitor::telephony::{
    CallStatus, MediaStream, RecordingRef, TelephonyError, TelephonyProvider,
};
use hotline_monitor::{Config, RawSettings};
use std::collections::VecDeque;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const CALL_ID: &str = "CA0001";
pub const RECORDING_ID: &str = "RE0001";

/// Telephony provider that replays a status script
pub struct FakeTelephony {
    statuses: Mutex<VecDeque<Result<CallStatus, TelephonyError>>>,
    recording: Option<RecordingRef>,
    media: Mutex<Vec<Result<Vec<u8>, TelephonyError>>>,
    pub calls_created: AtomicUsize,
    pub status_fetches: AtomicUsize,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeTelephony {
    /// Once the script runs out, the call stays `ringing`
    pub fn new(statuses: Vec<Result<CallStatus, TelephonyError>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            recording: Some(RecordingRef {
                recording_id: RECORDING_ID.to_string(),
                media_uri: format!("https://media.test/{}.wav", RECORDING_ID),
            }),
            media: Mutex::new(vec![Ok(wav_bytes())]),
            calls_created: AtomicUsize::new(0),
            status_fetches: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn completing() -> Self {
        Self::new(vec![
            Ok(CallStatus::Queued),
            Ok(CallStatus::InProgress),
            Ok(CallStatus::Completed),
        ])
    }

    pub fn without_recording(mut self) -> Self {
        self.recording = None;
        self
    }

    pub fn with_media(self, chunks: Vec<Result<Vec<u8>, TelephonyError>>) -> Self {
        *self.media.lock().unwrap() = chunks;
        self
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelephonyProvider for FakeTelephony {
    async fn create_call(&self, _from: &str, _to: &str, _twiml: &str) -> Result<String, TelephonyError> {
        self.calls_created.fetch_add(1, Ordering::SeqCst);
        Ok(CALL_ID.to_string())
    }

    async fn fetch_call_status(&self, _call_id: &str) -> Result<CallStatus, TelephonyError> {
        self.status_fetches.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(CallStatus::Ringing))
    }

    async fn latest_recording(&self, _call_id: &str) -> Result<Option<RecordingRef>, TelephonyError> {
        Ok(self.recording.clone())
    }

    async fn open_media(&self, _media_uri: &str) -> Result<MediaStream, TelephonyError> {
        let chunks = std::mem::take(&mut *self.media.lock().unwrap());
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    async fn delete_recording(&self, recording_id: &str) -> Result<(), TelephonyError> {
        self.deleted.lock().unwrap().push(recording_id.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "fake-telephony"
    }
}

/// Inference provider with a scripted upload, file-state and answer sequence
pub struct FakeInference {
    upload_failures: AtomicUsize,
    initial_state: FileState,
    states: Mutex<VecDeque<FileState>>,
    answer: Mutex<Option<Result<String, InferenceError>>>,
    pub uploads: AtomicUsize,
    pub state_fetches: AtomicUsize,
    pub generates: AtomicUsize,
    pub deleted: Mutex<Vec<String>>,
}

impl FakeInference {
    pub fn answering(text: &str) -> Self {
        Self {
            upload_failures: AtomicUsize::new(0),
            initial_state: FileState::Active,
            states: Mutex::new(VecDeque::new()),
            answer: Mutex::new(Some(Ok(text.to_string()))),
            uploads: AtomicUsize::new(0),
            state_fetches: AtomicUsize::new(0),
            generates: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_generate(error: InferenceError) -> Self {
        let fake = Self::answering("");
        *fake.answer.lock().unwrap() = Some(Err(error));
        fake
    }

    /// The first `n` uploads fail with a server error
    pub fn with_upload_failures(self, n: usize) -> Self {
        self.upload_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Uploads start out `Processing` and report `states` on later fetches
    pub fn with_processing(mut self, states: Vec<FileState>) -> Self {
        self.initial_state = FileState::Processing;
        *self.states.lock().unwrap() = states.into();
        self
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    fn file(&self, state: FileState) -> RemoteFile {
        RemoteFile {
            name: "files/abc123".to_string(),
            uri: "https://files.test/abc123".to_string(),
            mime_type: "audio/wav".to_string(),
            state,
        }
    }
}

#[async_trait]
impl InferenceProvider for FakeInference {
    async fn upload_file(&self, _path: &Path, _mime_type: &str) -> Result<RemoteFile, InferenceError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let remaining = self.upload_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.upload_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(InferenceError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        Ok(self.file(self.initial_state))
    }

    async fn get_file(&self, _name: &str) -> Result<RemoteFile, InferenceError> {
        self.state_fetches.fetch_add(1, Ordering::SeqCst);
        let state = self
            .states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FileState::Active);
        Ok(self.file(state))
    }

    async fn generate(&self, _request: &GenerateRequest) -> Result<String, InferenceError> {
        self.generates.fetch_add(1, Ordering::SeqCst);
        self.answer
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(InferenceError::Unexpected("no scripted answer".to_string())))
    }

    async fn delete_file(&self, name: &str) -> Result<(), InferenceError> {
        self.deleted.lock().unwrap().push(name.to_string());
        Ok(())
    }

    fn name(&self) -> &str {
        "fake-inference"
    }
}

/// Notification sink that keeps everything it is given
#[derive(Default)]
pub struct CapturingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl CapturingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for CapturingNotifier {
    async fn send(&self, notification: &Notification) -> bool {
        self.sent.lock().unwrap().push(notification.clone());
        true
    }
}

/// A complete settings set rooted at `data_dir`
pub fn raw_settings(data_dir: &Path) -> RawSettings {
    RawSettings {
        hotline_data_dir: Some(data_dir.display().to_string()),
        twilio_account_sid: Some("AC123".to_string()),
        twilio_auth_token: Some("token".to_string()),
        twilio_phone_number: Some("+15550001111".to_string()),
        hotline_phone_number: Some("+15550002222".to_string()),
        google_api_key: Some("key".to_string()),
        ntfy_server_url: Some("https://ntfy.test".to_string()),
        ntfy_topic_logs: Some("hotline-logs".to_string()),
        ntfy_topic_errors: Some("hotline-errors".to_string()),
        ntfy_username: Some("user".to_string()),
        ntfy_password: Some("pass".to_string()),
        ..RawSettings::default()
    }
}

pub fn config(data_dir: &Path) -> Config {
    raw_settings(data_dir).validate().unwrap()
}

/// One second of 8 kHz mono silence, as a WAV file
pub fn wav_bytes() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..8000 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}
