//! Transcription service API (AssemblyAI-shaped)

use async_trait::async_trait;
use serde::Deserialize;

use crate::{Error, Result};

/// Transcript job lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptStatus {
    Queued,
    Processing,
    Completed,
    Error,
}

/// A transcript job as reported by the service
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptJob {
    pub id: String,
    pub status: TranscriptStatus,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Capability interface for the three-step transcription flow
#[async_trait]
pub trait TranscriptApi: Send + Sync {
    /// Upload raw audio bytes, returning the hosted audio URL
    ///
    /// # Errors
    ///
    /// Returns error if the upload is rejected or fails in transit
    async fn upload(&self, audio: Vec<u8>) -> Result<String>;

    /// Submit a transcription job for a hosted audio URL, returning its id
    ///
    /// # Errors
    ///
    /// Returns error if the job cannot be created
    async fn submit(&self, audio_url: &str, language_code: &str) -> Result<String>;

    /// Fetch the current state of a transcript job
    ///
    /// # Errors
    ///
    /// Returns error if the job cannot be fetched
    async fn poll(&self, id: &str) -> Result<TranscriptJob>;
}

/// HTTP implementation of the transcription service API
pub struct HttpTranscriptApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpTranscriptApi {
    /// Create a new API client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "transcription API key required".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl TranscriptApi for HttpTranscriptApi {
    async fn upload(&self, audio: Vec<u8>) -> Result<String> {
        #[derive(Deserialize)]
        struct UploadResponse {
            upload_url: String,
        }

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .header("authorization", &self.api_key)
            .header("content-type", "application/octet-stream")
            .body(audio)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stt(format!("upload failed {status}: {body}")));
        }

        let parsed: UploadResponse = response.json().await?;
        Ok(parsed.upload_url)
    }

    async fn submit(&self, audio_url: &str, language_code: &str) -> Result<String> {
        #[derive(serde::Serialize)]
        struct SubmitRequest<'a> {
            audio_url: &'a str,
            language_code: &'a str,
        }

        #[derive(Deserialize)]
        struct SubmitResponse {
            id: String,
        }

        let request = SubmitRequest {
            audio_url,
            language_code,
        };

        let response = self
            .client
            .post(format!("{}/transcript", self.base_url))
            .header("authorization", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stt(format!("submit failed {status}: {body}")));
        }

        let parsed: SubmitResponse = response.json().await?;
        Ok(parsed.id)
    }

    async fn poll(&self, id: &str) -> Result<TranscriptJob> {
        let response = self
            .client
            .get(format!("{}/transcript/{id}", self.base_url))
            .header("authorization", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Stt(format!("poll failed {status}: {body}")));
        }

        let job: TranscriptJob = response.json().await?;
        Ok(job)
    }
}
