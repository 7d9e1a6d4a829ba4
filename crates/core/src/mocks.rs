//! Mock implementations of core traits for testing.
//!
//! These mocks record their inputs so HTTP-level tests can assert on what
//! the router handed to each collaborator.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Mutex;

use crate::{
    traits::{AudioSource, EmotionClassifier, MediaStore, ShoutDetector},
    types::{EmotionResult, ImageSource, MediaUpload, ShoutDetection, StoredMedia},
    Error, Result,
};

type ErrorFactory = Box<dyn Fn() -> Error + Send + Sync>;

// =============================================================================
// Mock Classifier
// =============================================================================

/// Classifier that returns a fixed result (or a fixed failure).
pub struct MockClassifier {
    result: Option<EmotionResult>,
    failure: Option<ErrorFactory>,
    seen: Mutex<Vec<String>>,
}

impl MockClassifier {
    /// Always classify as `result`.
    pub fn returning(result: EmotionResult) -> Self {
        Self {
            result: Some(result),
            failure: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with the error built by `failure`.
    pub fn failing(failure: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        Self {
            result: None,
            failure: Some(Box::new(failure)),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Descriptions of every image classified so far.
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmotionClassifier for MockClassifier {
    async fn classify(&self, image: &ImageSource) -> Result<EmotionResult> {
        self.seen.lock().unwrap().push(image.describe());
        if let Some(failure) = &self.failure {
            return Err(failure());
        }
        self.result
            .clone()
            .ok_or_else(|| Error::internal("mock classifier has no result"))
    }
}

// =============================================================================
// Mock Audio
// =============================================================================

/// Audio source serving the same bytes for every URL.
pub struct MockAudioSource {
    data: Bytes,
    failure: Option<ErrorFactory>,
    fetched: Mutex<Vec<String>>,
}

impl MockAudioSource {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            failure: None,
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(failure: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        Self {
            data: Bytes::new(),
            failure: Some(Box::new(failure)),
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// URLs fetched so far.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioSource for MockAudioSource {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        self.fetched.lock().unwrap().push(url.to_string());
        match &self.failure {
            Some(failure) => Err(failure()),
            None => Ok(self.data.clone()),
        }
    }
}

/// Detector returning a scripted outcome.
pub struct MockShoutDetector {
    result: ShoutDetection,
    failure: Option<ErrorFactory>,
    calls: Mutex<Vec<usize>>,
}

impl MockShoutDetector {
    pub fn returning(result: ShoutDetection) -> Self {
        Self {
            result,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(failure: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        Self {
            result: ShoutDetection::absent(),
            failure: Some(Box::new(failure)),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sizes of every clip analyzed so far.
    pub fn calls(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShoutDetector for MockShoutDetector {
    async fn detect(&self, audio: Bytes) -> Result<ShoutDetection> {
        self.calls.lock().unwrap().push(audio.len());
        match &self.failure {
            Some(failure) => Err(failure()),
            None => Ok(self.result.clone()),
        }
    }
}

// =============================================================================
// Mock Store
// =============================================================================

/// Store that only records uploads, or fails every put.
pub struct MockMediaStore {
    public_base: String,
    failure: Option<ErrorFactory>,
    uploads: Mutex<Vec<MediaUpload>>,
}

impl MockMediaStore {
    pub fn new(public_base: impl Into<String>) -> Self {
        Self {
            public_base: public_base.into(),
            failure: None,
            uploads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(failure: impl Fn() -> Error + Send + Sync + 'static) -> Self {
        Self {
            public_base: String::new(),
            failure: Some(Box::new(failure)),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Uploads received so far.
    pub fn uploads(&self) -> Vec<MediaUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaStore for MockMediaStore {
    async fn put(&self, upload: MediaUpload) -> Result<StoredMedia> {
        if let Some(failure) = &self.failure {
            return Err(failure());
        }
        let mut uploads = self.uploads.lock().unwrap();
        let key = format!(
            "mock/{}/{}/{}",
            upload.kind.segment(),
            upload.session_id,
            uploads.len()
        );
        uploads.push(upload);
        Ok(StoredMedia {
            url: format!("{}/{}", self.public_base.trim_end_matches('/'), key),
            key,
        })
    }
}
