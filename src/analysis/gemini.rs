use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::messages::{ErrorEnvelope, FileResource, GenerateResponse, UploadResponse};
use super::provider::{FileState, GenerateRequest, InferenceError, InferenceProvider, RemoteFile};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_TIMEOUT: Duration = Duration::from_secs(60);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Google Generative Language API (Gemini) client: Files API + generateContent
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self, InferenceError> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, model)
    }

    /// Point the client at a different host (used for local stand-ins)
    pub fn with_base_url(base_url: &str, api_key: &str, model: &str) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| InferenceError::Unexpected(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.trim_start_matches("models/").to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, InferenceError> {
        let response = request
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|envelope| match envelope.error.status {
                Some(code) => format!("{}: {}", code, envelope.error.message),
                None => envelope.error.message,
            })
            .unwrap_or(body);

        Err(InferenceError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, InferenceError> {
        response
            .json::<T>()
            .await
            .map_err(|e| InferenceError::Unexpected(format!("failed to parse response: {}", e)))
    }

    fn remote_file(resource: FileResource, fallback_mime: &str) -> RemoteFile {
        RemoteFile {
            state: resource
                .state
                .as_deref()
                .map(FileState::from_api)
                .unwrap_or(FileState::Processing),
            mime_type: resource.mime_type.unwrap_or_else(|| fallback_mime.to_string()),
            uri: resource.uri,
            name: resource.name,
        }
    }
}

#[async_trait]
impl InferenceProvider for GeminiClient {
    /// Resumable upload: a `start` request that returns an upload URL, then a
    /// single `upload, finalize` request carrying the whole file.
    async fn upload_file(&self, path: &Path, mime_type: &str) -> Result<RemoteFile, InferenceError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            InferenceError::Unexpected(format!("failed to read {}: {}", path.display(), e))
        })?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recording".to_string());

        info!("Uploading {} ({} bytes)", display_name, bytes.len());

        let start = self
            .client
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .timeout(API_TIMEOUT)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }));

        let response = self.send(start).await?;
        let upload_url = response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| InferenceError::Unexpected("upload start returned no upload URL".into()))?;

        let finalize = self
            .client
            .post(&upload_url)
            .timeout(UPLOAD_TIMEOUT)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes);

        let uploaded: UploadResponse = Self::decode(self.send(finalize).await?).await?;
        debug!("Uploaded as {}", uploaded.file.name);
        Ok(Self::remote_file(uploaded.file, mime_type))
    }

    async fn get_file(&self, name: &str) -> Result<RemoteFile, InferenceError> {
        let request = self
            .client
            .get(format!("{}/v1beta/{}", self.base_url, name))
            .timeout(API_TIMEOUT);
        let resource: FileResource = Self::decode(self.send(request).await?).await?;
        Ok(Self::remote_file(resource, "application/octet-stream"))
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, InferenceError> {
        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": request.prompt },
                    { "file_data": {
                        "mime_type": request.file.mime_type,
                        "file_uri": request.file.uri,
                    }},
                ],
            }],
        });

        let http_request = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .timeout(request.timeout)
            .json(&body);

        let response: GenerateResponse = Self::decode(self.send(http_request).await?).await?;
        response.text().ok_or_else(|| {
            let reason = response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "no candidates".to_string());
            InferenceError::Unexpected(format!("response contained no text ({})", reason))
        })
    }

    async fn delete_file(&self, name: &str) -> Result<(), InferenceError> {
        let request = self
            .client
            .delete(format!("{}/v1beta/{}", self.base_url, name))
            .timeout(API_TIMEOUT);
        self.send(request).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
