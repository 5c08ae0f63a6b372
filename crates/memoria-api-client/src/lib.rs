//! HTTP client for the interment record store.
//!
//! Provides a minimal client with optional Bearer auth, generic GET/POST/DELETE helpers
//! that map failures onto [`StoreError`], and the [`RecordStore`](memoria_core::RecordStore)
//! implementation in [`api`].

pub mod api;

use anyhow::{Context, Result};
use memoria_core::models::{ErrorBody, PhotoFile};
use memoria_core::{StoreError, StoreResult, UploadConfig};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the record store.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: String, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(config: &UploadConfig) -> Result<Self> {
        Self::new(
            config.api_url.clone(),
            config.api_token.clone(),
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Send a request and turn non-success statuses into [`StoreError::Status`].
    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = self
            .apply_auth(request)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        tracing::debug!(status = status.as_u16(), code = ?body.code, "Record store request failed");

        Err(StoreError::Status {
            status: status.as_u16(),
            message: body.message,
            code: body.code,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        // An empty body reads as JSON null.
        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &bytes
        };
        serde_json::from_slice(body).map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// GET request. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> StoreResult<T> {
        let response = self.send(self.client.get(self.build_url(path))).await?;
        Self::decode(response).await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> StoreResult<T> {
        let request = self.client.post(self.build_url(path)).multipart(form);
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    /// DELETE request with a JSON body.
    pub async fn delete_json<T: DeserializeOwned, B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> StoreResult<T> {
        let request = self.client.delete(self.build_url(path)).json(body);
        let response = self.send(request).await?;
        Self::decode(response).await
    }
}

/// Encode a document number for use as a path segment.
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Multipart part for a photo, carrying its file name and MIME type.
pub(crate) fn file_part(file: &PhotoFile) -> Part {
    let part = Part::bytes(file.bytes.to_vec()).file_name(file.filename.clone());
    match part.mime_str(&file.content_type) {
        Ok(part) => part,
        Err(_) => Part::bytes(file.bytes.to_vec()).file_name(file.filename.clone()),
    }
}

pub(crate) fn text_form(fields: Vec<(String, String)>) -> Form {
    fields
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_trims_trailing_slash() {
        let client = ApiClient::new(
            "http://localhost:8000/api/".to_string(),
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(
            client.build_url("/interments/12345"),
            "http://localhost:8000/api/interments/12345"
        );
    }

    #[test]
    fn test_segment_encodes_reserved_characters() {
        assert_eq!(segment("12345"), "12345");
        assert_eq!(segment("A/12 B"), "A%2F12%20B");
    }
}
