//! Audio traits.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::types::ShoutDetection;

/// Retrieves audio bytes from a remote location.
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Download the audio at `url`.
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// Scans encoded audio for a shout episode.
#[async_trait]
pub trait ShoutDetector: Send + Sync {
    /// Detect a shout in an encoded clip (WAV, MP3, ...).
    ///
    /// Returns `Error::Detection` when the clip cannot be decoded.
    async fn detect(&self, audio: Bytes) -> Result<ShoutDetection>;
}
