// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types.

/// Application error type shared by the sync core and its adapters.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Failed to decode document: {0}")]
    Decode(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, AppError>;
