// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the admin client.

use crate::config::ConfigError;
use reqwest::StatusCode;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AdminError>;

/// Failures raised below the decoding pipeline (connection, HTTP status).
///
/// None of these are retried by the client.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("broker returned {status}: {reason}")]
    Status { status: StatusCode, reason: String },

    #[error("invalid endpoint URL: {0}")]
    Url(String),
}

/// Admin client errors.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("invalid message ID {value:?}: {reason}")]
    InvalidMessageId { value: String, reason: String },

    #[error("failed to read response body: {0}")]
    BodyRead(#[source] std::io::Error),

    #[error(
        "batch stream truncated at offset {offset}: needed {needed} bytes, {remaining} remaining"
    )]
    TruncatedStream {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("malformed single message metadata at offset {offset}: {reason}")]
    MalformedMetadata { offset: usize, reason: String },

    #[error("invalid batch size header {value:?}")]
    InvalidBatchSize { value: String },

    #[error("invalid topic name {name:?}: {reason}")]
    InvalidTopicName { name: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl AdminError {
    /// HTTP status returned by the broker, if this is a status failure.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(TransportError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }

    /// True for 404 responses (unknown topic, subscription, or position past the backlog).
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}
