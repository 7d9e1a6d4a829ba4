//! Error types for Oneul.

use thiserror::Error;

/// Result type alias using Oneul's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Oneul.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Request Errors
    // =========================================================================
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    // =========================================================================
    // Upstream Provider Errors
    // =========================================================================
    #[error("Upstream format error: {0}")]
    UpstreamFormat(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    // =========================================================================
    // Audio Errors
    // =========================================================================
    #[error("Detection error: {0}")]
    Detection(String),

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a payload too large error.
    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::PayloadTooLarge(msg.into())
    }

    /// Create an upstream format error.
    pub fn upstream_format(msg: impl Into<String>) -> Self {
        Self::UpstreamFormat(msg.into())
    }

    /// Create an upstream provider error.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create an upstream timeout error.
    pub fn upstream_timeout(msg: impl Into<String>) -> Self {
        Self::UpstreamTimeout(msg.into())
    }

    /// Create a storage error.
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a detection error.
    pub fn detection(msg: impl Into<String>) -> Self {
        Self::Detection(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code reported in error envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "VALIDATION_ERROR",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::UpstreamFormat(_) => "UPSTREAM_FORMAT_ERROR",
            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Detection(_) => "DETECTION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Serialization(_) | Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }
}
