// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloudinary image upload client.
//!
//! Single-attempt unsigned uploads, no retry, no resumability. Cloudinary
//! can report an error inside an HTTP 200 body, so success responses are
//! checked for an embedded `error` before the URL is read.

use crate::error::{AppError, Result};
use serde_json::Value;
use std::path::Path;

/// Cloudinary HTTP upload client.
#[derive(Clone)]
pub struct CloudinaryClient {
    http: reqwest::Client,
    upload_url: String,
    upload_preset: String,
}

impl CloudinaryClient {
    /// Create a client for one Cloudinary account and unsigned preset.
    pub fn new(cloud_name: &str, upload_preset: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            upload_url: format!(
                "https://api.cloudinary.com/v1_1/{}/image/upload",
                cloud_name
            ),
            upload_preset: upload_preset.to_string(),
        }
    }

    /// Upload image bytes and return the public URL.
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        folder: &str,
    ) -> Result<String> {
        tracing::debug!(file_name, folder, size = bytes.len(), "Starting upload");

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("image/jpeg")
            .map_err(|e| AppError::Upload(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", folder.to_string())
            .text("resource_type", "image")
            .text("quality", "auto:best");

        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upload(e.to_string()))?;

        if !status.is_success() {
            return Err(AppError::Upload(format!("HTTP {}: {}", status, body)));
        }

        let url = parse_upload_response(&body)?;
        tracing::debug!(url = %url, "Upload successful");
        Ok(url)
    }

    /// Upload an image file from disk.
    pub async fn upload_file(&self, path: &Path, folder: &str) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::Upload(format!("Unable to read {}: {}", path.display(), e)))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("photo.jpg");
        self.upload_image(bytes, file_name, folder).await
    }
}

/// Extract the uploaded URL from a Cloudinary success response.
///
/// Prefers `secure_url`, falls back to `url`; an `error` field (object or
/// plain string) takes precedence even under an HTTP success status.
fn parse_upload_response(body: &str) -> Result<String> {
    let json: Value = serde_json::from_str(body)
        .map_err(|e| AppError::Upload(format!("Malformed response: {}", e)))?;

    if let Some(error) = json.get("error") {
        let message = match error {
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(AppError::Upload(message));
    }

    json.get("secure_url")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            json.get("url")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .map(str::to_string)
        .ok_or_else(|| AppError::Upload("Response missing URL".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prefers_secure_url() {
        let url = parse_upload_response(
            r#"{"secure_url": "https://res.example/s.jpg", "url": "http://res.example/p.jpg", "public_id": "abc"}"#,
        )
        .unwrap();
        assert_eq!(url, "https://res.example/s.jpg");
    }

    #[test]
    fn test_parse_falls_back_to_url() {
        let url = parse_upload_response(
            r#"{"secure_url": "", "url": "http://res.example/p.jpg"}"#,
        )
        .unwrap();
        assert_eq!(url, "http://res.example/p.jpg");
    }

    #[test]
    fn test_parse_error_object_wins_over_url() {
        let err = parse_upload_response(
            r#"{"secure_url": "https://res.example/s.jpg", "error": {"message": "Invalid preset"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Upload(ref m) if m == "Invalid preset"));
    }

    #[test]
    fn test_parse_error_string() {
        let err = parse_upload_response(r#"{"error": "quota exceeded"}"#).unwrap_err();
        assert!(matches!(err, AppError::Upload(ref m) if m == "quota exceeded"));
    }

    #[test]
    fn test_parse_missing_url() {
        let err = parse_upload_response(r#"{"public_id": "abc"}"#).unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
    }

    #[test]
    fn test_parse_malformed_body() {
        let err = parse_upload_response("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
    }
}
