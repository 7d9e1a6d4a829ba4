//! Vision classifier trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EmotionResult, ImageSource};

/// Classifies the emotional state shown in an image.
///
/// Implementations must only return labels from the closed taxonomies and
/// report anything else as `Error::UpstreamFormat`.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Classify a single image.
    async fn classify(&self, image: &ImageSource) -> Result<EmotionResult>;
}
