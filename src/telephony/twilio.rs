use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, info};

use super::messages::{CallResource, ErrorBody, RecordingPage};
use super::provider::{CallStatus, MediaStream, RecordingRef, TelephonyError, TelephonyProvider};

const DEFAULT_BASE_URL: &str = "https://api.twilio.com";
const API_TIMEOUT: Duration = Duration::from_secs(30);
const MEDIA_TIMEOUT: Duration = Duration::from_secs(300);

/// Twilio REST API (2010-04-01) client
pub struct TwilioClient {
    client: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
}

impl TwilioClient {
    pub fn new(account_sid: &str, auth_token: &str) -> Result<Self, TelephonyError> {
        Self::with_base_url(DEFAULT_BASE_URL, account_sid, auth_token)
    }

    /// Point the client at a different host (used for local stand-ins)
    pub fn with_base_url(
        base_url: &str,
        account_sid: &str,
        auth_token: &str,
    ) -> Result<Self, TelephonyError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TelephonyError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
        })
    }

    fn account_url(&self) -> String {
        format!("{}/2010-04-01/Accounts/{}", self.base_url, self.account_sid)
    }

    /// Recording resources are listed as `.json` paths; the audio lives at
    /// the same path with a `.wav` extension.
    fn media_uri(&self, resource_uri: &str) -> String {
        let path = match resource_uri.strip_suffix(".json") {
            Some(stem) => format!("{}.wav", stem),
            None if resource_uri.ends_with(".wav") => resource_uri.to_string(),
            None => format!("{}.wav", resource_uri),
        };
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, TelephonyError> {
        let response = request
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .map_err(|e| TelephonyError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| match b.code {
                Some(code) => format!("{} (code {})", b.message, code),
                None => b.message,
            })
            .unwrap_or(body);

        Err(TelephonyError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, TelephonyError> {
        response
            .json::<T>()
            .await
            .map_err(|e| TelephonyError::Decode(e.to_string()))
    }
}

#[async_trait]
impl TelephonyProvider for TwilioClient {
    async fn create_call(&self, from: &str, to: &str, twiml: &str) -> Result<String, TelephonyError> {
        let url = format!("{}/Calls.json", self.account_url());
        info!("Creating call to {}", to);

        let request = self
            .client
            .post(&url)
            .timeout(API_TIMEOUT)
            .form(&[("To", to), ("From", from), ("Twiml", twiml)]);

        let call: CallResource = Self::decode(self.send(request).await?).await?;
        debug!("Call {} created with status {}", call.sid, call.status);
        Ok(call.sid)
    }

    async fn fetch_call_status(&self, call_id: &str) -> Result<CallStatus, TelephonyError> {
        let url = format!("{}/Calls/{}.json", self.account_url(), call_id);
        let request = self.client.get(&url).timeout(API_TIMEOUT);
        let call: CallResource = Self::decode(self.send(request).await?).await?;
        Ok(call.status)
    }

    async fn latest_recording(&self, call_id: &str) -> Result<Option<RecordingRef>, TelephonyError> {
        let url = format!("{}/Recordings.json", self.account_url());
        let request = self
            .client
            .get(&url)
            .timeout(API_TIMEOUT)
            .query(&[("CallSid", call_id), ("PageSize", "1")]);

        let page: RecordingPage = Self::decode(self.send(request).await?).await?;
        Ok(page.recordings.into_iter().next().map(|r| RecordingRef {
            media_uri: self.media_uri(&r.uri),
            recording_id: r.sid,
        }))
    }

    async fn open_media(&self, media_uri: &str) -> Result<MediaStream, TelephonyError> {
        let request = self.client.get(media_uri).timeout(MEDIA_TIMEOUT);
        let response = self.send(request).await?;

        let stream = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| TelephonyError::Transport(e.to_string()))
            });

        Ok(Box::pin(stream))
    }

    async fn delete_recording(&self, recording_id: &str) -> Result<(), TelephonyError> {
        let url = format!("{}/Recordings/{}.json", self.account_url(), recording_id);
        let request = self.client.delete(&url).timeout(API_TIMEOUT);
        self.send(request).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "twilio"
    }
}
