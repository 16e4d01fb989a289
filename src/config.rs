// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID for Firestore
    pub gcp_project_id: String,
    /// Cloudinary cloud name (part of the upload URL); only needed when an
    /// upload client is built
    pub cloudinary_cloud_name: Option<String>,
    /// Cloudinary unsigned upload preset
    pub cloudinary_upload_preset: String,
    /// Default Cloudinary folder for uploads
    pub cloudinary_folder: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            cloudinary_cloud_name: Some("test-cloud".to_string()),
            cloudinary_upload_preset: "fitness_app".to_string(),
            cloudinary_folder: "fitness-app/profiles".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// For local development a `.env` file is honored.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            cloudinary_cloud_name: env::var("CLOUDINARY_CLOUD_NAME")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            cloudinary_upload_preset: env::var("CLOUDINARY_UPLOAD_PRESET")
                .unwrap_or_else(|_| "fitness_app".to_string()),
            cloudinary_folder: env::var("CLOUDINARY_FOLDER")
                .unwrap_or_else(|_| "fitness-app/profiles".to_string()),
        })
    }

    /// Cloud name for uploads, required only at the point an upload client
    /// is actually built.
    pub fn require_cloudinary_cloud_name(&self) -> Result<&str, ConfigError> {
        self.cloudinary_cloud_name
            .as_deref()
            .ok_or(ConfigError::Missing("CLOUDINARY_CLOUD_NAME"))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
