//! Client for the external media-upload collaborator.
//!
//! Takes a locally staged file path plus a target folder hint, returns the
//! hosted URL (and, for video files, the probed duration).

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Could not read staged file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected by media service: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadedMedia {
    pub url: String,
    #[serde(default)]
    pub duration: Option<f64>,
}

pub struct MediaClient {
    base_url: String,
    http: reqwest::Client,
}

static CLIENT: Lazy<MediaClient> = Lazy::new(MediaClient::from_config);

/// Process-wide media client
pub fn client() -> &'static MediaClient {
    &CLIENT
}

impl MediaClient {
    pub fn from_config() -> Self {
        let media = &config::config().media;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(media.request_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            base_url: media.upload_base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Upload a locally staged file into the given target folder
    pub async fn upload(&self, local_path: &str, folder: &str) -> Result<UploadedMedia, UploadError> {
        let bytes = tokio::fs::read(local_path).await?;
        let file_name = Path::new(local_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new()
            .text("folder", folder.to_string())
            .part("file", part);

        let response = self
            .http
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::Rejected(format!("{}: {}", status, body)));
        }

        Ok(response.json::<UploadedMedia>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploaded_media_parses_with_and_without_duration() {
        let with: UploadedMedia =
            serde_json::from_str(r#"{"url":"https://cdn/x.mp4","duration":12.5}"#).unwrap();
        assert_eq!(with.duration, Some(12.5));

        let without: UploadedMedia =
            serde_json::from_str(r#"{"url":"https://cdn/x.png"}"#).unwrap();
        assert_eq!(without.url, "https://cdn/x.png");
        assert_eq!(without.duration, None);
    }

    #[tokio::test]
    async fn missing_staged_file_is_an_io_error() {
        let client = MediaClient {
            base_url: "http://localhost:9".to_string(),
            http: reqwest::Client::new(),
        };
        let err = client
            .upload("/definitely/not/a/real/file.mp4", "videos")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Io(_)));
    }
}
