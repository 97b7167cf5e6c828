//! Client for the third-party image host.
//!
//! Recipe images are uploaded here first and the returned URL is stored on
//! the recipe. The host takes a multipart form with a single `image` part and
//! answers with either `{ "url": ... }` or `{ "data": { "url": ... } }`.

use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use super::ApiError;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Could not read image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image upload failed: {0}")]
    Upload(#[from] ApiError),

    #[error("Image host response did not include a URL")]
    MissingUrl,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Option<String>,
    data: Option<UploadData>,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    url: Option<String>,
}

impl UploadResponse {
    fn into_url(self) -> Option<String> {
        self.url
            .or_else(|| self.data.and_then(|d| d.url))
            .filter(|url| !url.trim().is_empty())
    }
}

#[derive(Clone)]
pub struct ImageHost {
    client: Client,
    upload_url: String,
    api_key: Option<String>,
}

impl ImageHost {
    /// Share an existing connection pool (see `ApiClient::http`)
    pub fn new(client: Client, upload_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            upload_url: upload_url.into(),
            api_key,
        }
    }

    /// Upload a local image file and return its hosted URL
    pub async fn upload(&self, path: &Path) -> Result<String, ImageError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ImageError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        self.upload_bytes(bytes, file_name).await
    }

    pub async fn upload_bytes(&self, bytes: Vec<u8>, file_name: String) -> Result<String, ImageError> {
        debug!(file = %file_name, size = bytes.len(), "Uploading image");

        let form = Form::new().part("image", Part::bytes(bytes).file_name(file_name));

        let mut request = self.client.post(&self.upload_url).multipart(form);
        if let Some(ref key) = self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let response = request.send().await.map_err(ApiError::from)?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body).into());
        }

        let text = response.text().await.map_err(ApiError::from)?;
        let parsed: UploadResponse = serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("image host: {}", e)))?;

        let url = parsed.into_url().ok_or(ImageError::MissingUrl)?;
        info!(url = %url, "Image uploaded");
        Ok(url)
    }
}
