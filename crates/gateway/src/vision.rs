//! Vision processing for image emotion analysis.
//!
//! Coordinates upload validation, storage, and the configured
//! `EmotionClassifier`.

use std::sync::Arc;

use oneul_core::{
    traits::{EmotionClassifier, MediaStore},
    types::{EmotionResult, ImageSource, MediaUpload, StoredMedia},
    Error, Result,
};

/// Vision processor for analyzing images.
pub struct VisionProcessor {
    classifier: Arc<dyn EmotionClassifier>,
    store: Arc<dyn MediaStore>,
    /// Send uploads inline rather than by their public URL.
    inline_uploads: bool,
}

impl VisionProcessor {
    /// Create a new vision processor.
    pub fn new(classifier: Arc<dyn EmotionClassifier>, store: Arc<dyn MediaStore>) -> Self {
        Self {
            classifier,
            store,
            inline_uploads: false,
        }
    }

    /// Classify uploads from their bytes instead of their public URL.
    pub fn with_inline_uploads(mut self, inline: bool) -> Self {
        self.inline_uploads = inline;
        self
    }

    /// Classify an image the provider can fetch by URL.
    pub async fn analyze_url(&self, url: &str) -> Result<EmotionResult> {
        self.classifier.classify(&ImageSource::Url(url.to_string())).await
    }

    /// Validate, store, and classify an uploaded image.
    pub async fn analyze_upload(
        &self,
        mut upload: MediaUpload,
    ) -> Result<(StoredMedia, EmotionResult)> {
        let info = validate_image(&upload.data)?;
        if upload.content_type.as_deref().map_or(true, |ct| !ct.starts_with("image/")) {
            upload.content_type = Some(info.mime_type.to_string());
        }

        let data = upload.data.clone();
        let stored = self.store.put(upload).await?;

        tracing::info!(
            key = %stored.key,
            format = %info.format,
            size = info.size_bytes,
            "Image stored"
        );

        let source = if self.inline_uploads {
            ImageSource::Inline {
                data,
                mime_type: info.mime_type.to_string(),
            }
        } else {
            ImageSource::Url(stored.url.clone())
        };

        let analysis = self.classifier.classify(&source).await?;
        Ok((stored, analysis))
    }
}

/// Validate image format from its magic bytes.
pub fn validate_image(image_data: &[u8]) -> Result<ImageInfo> {
    if image_data.is_empty() {
        return Err(Error::invalid_request("image_file is empty"));
    }

    let format = image::guess_format(image_data)
        .map_err(|_| Error::invalid_request("image_file is not a recognized image"))?;

    Ok(ImageInfo {
        format: format!("{:?}", format),
        mime_type: format.to_mime_type(),
        size_bytes: image_data.len(),
    })
}

/// Information about an image.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Image format (Png, Jpeg, etc.).
    pub format: String,
    /// MIME type of the format.
    pub mime_type: &'static str,
    /// Size in bytes.
    pub size_bytes: usize,
}
