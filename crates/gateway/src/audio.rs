//! Audio handling: format sniffing, remote retrieval, and the audio processor
//! that coordinates storage and shout detection.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;

use oneul_core::{
    config::AudioConfig,
    traits::{AudioSource, MediaStore, ShoutDetector},
    types::{MediaUpload, ShoutDetection, StoredMedia},
    Error, Result,
};

/// Supported audio formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Mp4,
    M4a,
    Wav,
    Webm,
    Ogg,
    Flac,
}

impl AudioFormat {
    /// Get the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Mp4 => "audio/mp4",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Webm => "audio/webm",
            AudioFormat::Ogg => "audio/ogg",
            AudioFormat::Flac => "audio/flac",
        }
    }

    /// Get the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Mp4 => "mp4",
            AudioFormat::M4a => "m4a",
            AudioFormat::Wav => "wav",
            AudioFormat::Webm => "webm",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Flac => "flac",
        }
    }

    /// Detect format from bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // Check magic bytes
        if data.starts_with(b"RIFF") && data.len() >= 12 && &data[8..12] == b"WAVE" {
            return Some(AudioFormat::Wav);
        }
        if data.starts_with(b"OggS") {
            return Some(AudioFormat::Ogg);
        }
        if data.starts_with(b"fLaC") {
            return Some(AudioFormat::Flac);
        }
        if data.starts_with(b"ID3") || (data[0] == 0xFF && data[1] & 0xE0 == 0xE0) {
            return Some(AudioFormat::Mp3);
        }
        if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
            return Some(AudioFormat::Webm);
        }
        if data.len() >= 12 && &data[4..8] == b"ftyp" {
            if &data[8..11] == b"M4A" {
                return Some(AudioFormat::M4a);
            }
            return Some(AudioFormat::Mp4);
        }

        None
    }
}

// =============================================================================
// Remote Retrieval
// =============================================================================

/// Downloads audio over HTTP(S) with a bounded timeout and size.
pub struct HttpAudioSource {
    http: reqwest::Client,
    max_bytes: usize,
}

impl HttpAudioSource {
    /// Create a source from configuration.
    pub fn from_config(config: &AudioConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.download_timeout_ms))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            max_bytes: config.max_download_bytes,
        })
    }
}

#[async_trait]
impl AudioSource for HttpAudioSource {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(download_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(url = %url, status = %status, "Audio download rejected");
            return Err(Error::storage(format!(
                "failed to download audio ({})",
                status
            )));
        }

        if let Some(length) = response.content_length() {
            if length as usize > self.max_bytes {
                return Err(Error::storage(format!(
                    "audio is too large ({} bytes, limit {})",
                    length, self.max_bytes
                )));
            }
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(download_error)?;
            if body.len() + chunk.len() > self.max_bytes {
                return Err(Error::storage(format!(
                    "audio exceeds the {} byte limit",
                    self.max_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(url = %url, size = body.len(), "Audio downloaded");
        Ok(body.freeze())
    }
}

fn download_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::upstream_timeout("audio download timed out")
    } else {
        Error::storage(format!("failed to download audio: {}", err))
    }
}

// =============================================================================
// Audio Processor
// =============================================================================

/// Coordinates audio retrieval, storage, and shout detection.
pub struct AudioProcessor {
    source: Arc<dyn AudioSource>,
    detector: Arc<dyn ShoutDetector>,
    store: Arc<dyn MediaStore>,
}

impl AudioProcessor {
    /// Create a new audio processor.
    pub fn new(
        source: Arc<dyn AudioSource>,
        detector: Arc<dyn ShoutDetector>,
        store: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            source,
            detector,
            store,
        }
    }

    /// Download a clip. Failures here are fatal to the request.
    pub async fn fetch(&self, url: &str) -> Result<Bytes> {
        tracing::info!(url = %url, "Fetching audio for shout detection");
        self.source.fetch(url).await
    }

    /// Store an uploaded clip, filling in the content type from magic bytes
    /// when the client sent none.
    pub async fn store_audio(&self, mut upload: MediaUpload) -> Result<StoredMedia> {
        if upload.content_type.is_none() {
            upload.content_type =
                AudioFormat::detect(&upload.data).map(|f| f.mime_type().to_string());
        }
        self.store.put(upload).await
    }

    /// Run shout detection on an encoded clip.
    pub async fn detect(&self, audio: Bytes) -> Result<ShoutDetection> {
        let size = audio.len();
        let result = self.detector.detect(audio).await;
        match &result {
            Ok(shout) => tracing::info!(size, present = shout.present, "Shout detection finished"),
            Err(e) => tracing::warn!(size, error = %e, "Shout detection failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use oneul_core::mocks::{MockAudioSource, MockMediaStore, MockShoutDetector};
    use oneul_core::types::MediaKind;

    async fn stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn source(max_download_bytes: usize, download_timeout_ms: u64) -> HttpAudioSource {
        HttpAudioSource::from_config(&AudioConfig {
            download_timeout_ms,
            max_download_bytes,
            ..AudioConfig::default()
        })
        .unwrap()
    }

    fn audio_routes() -> Router {
        Router::new()
            .route("/clip.wav", get(|| async { vec![7u8; 512] }))
            .route("/missing.wav", get(|| async { StatusCode::NOT_FOUND }))
            .route("/large.wav", get(|| async { vec![0u8; 4096] }))
            .route(
                "/chunked.wav",
                get(|| async {
                    let chunks = (0..8).map(|_| Ok::<_, std::io::Error>(Bytes::from(vec![0u8; 512])));
                    Body::from_stream(futures::stream::iter(chunks))
                }),
            )
            .route(
                "/slow.wav",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(1_500)).await;
                    vec![0u8; 16]
                }),
            )
    }

    #[tokio::test]
    async fn test_fetch_downloads_body() {
        let base = stub(audio_routes()).await;
        let data = source(1024, 5_000)
            .fetch(&format!("{}/clip.wav", base))
            .await
            .unwrap();
        assert_eq!(data.len(), 512);
        assert!(data.iter().all(|&b| b == 7));
    }

    #[tokio::test]
    async fn test_fetch_rejected_status_is_storage_error() {
        let base = stub(audio_routes()).await;
        let err = source(1024, 5_000)
            .fetch(&format!("{}/missing.wav", base))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_fetch_declared_length_over_limit() {
        let base = stub(audio_routes()).await;
        let err = source(1024, 5_000)
            .fetch(&format!("{}/large.wav", base))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.to_string().contains("too large"));
    }

    #[tokio::test]
    async fn test_fetch_streamed_body_over_limit() {
        let base = stub(audio_routes()).await;
        let err = source(1024, 5_000)
            .fetch(&format!("{}/chunked.wav", base))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert!(err.to_string().contains("byte limit"));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let base = stub(audio_routes()).await;
        let err = source(1024, 200)
            .fetch(&format!("{}/slow.wav", base))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UpstreamTimeout(_)));
    }

    #[test]
    fn test_audio_format_detection() {
        // WAV header
        let wav = b"RIFF\x00\x00\x00\x00WAVEfmt ";
        assert_eq!(AudioFormat::detect(wav), Some(AudioFormat::Wav));

        // Ogg header
        let ogg = b"OggS\x00\x02";
        assert_eq!(AudioFormat::detect(ogg), Some(AudioFormat::Ogg));

        // MP3 frame sync and ID3 tag
        assert_eq!(AudioFormat::detect(&[0xFF, 0xFB, 0x90, 0x00]), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::detect(b"ID3\x04\x00"), Some(AudioFormat::Mp3));

        // M4A brand
        let m4a = b"\x00\x00\x00\x20ftypM4A \x00\x00";
        assert_eq!(AudioFormat::detect(m4a), Some(AudioFormat::M4a));

        assert_eq!(AudioFormat::detect(b"fLaC\x00"), Some(AudioFormat::Flac));
        assert_eq!(AudioFormat::detect(b"hello world"), None);
        assert_eq!(AudioFormat::detect(b"ab"), None);
    }

    #[test]
    fn test_audio_format_mime_type() {
        assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mpeg");
        assert_eq!(AudioFormat::Wav.mime_type(), "audio/wav");
    }

    #[tokio::test]
    async fn test_store_audio_fills_content_type() {
        let store = Arc::new(MockMediaStore::new("https://cdn.example.com"));
        let processor = AudioProcessor::new(
            Arc::new(MockAudioSource::new(Bytes::new())),
            Arc::new(MockShoutDetector::returning(ShoutDetection::absent())),
            store.clone(),
        );

        processor
            .store_audio(MediaUpload {
                kind: MediaKind::Audio,
                session_id: "s1".into(),
                filename: None,
                content_type: None,
                data: Bytes::from_static(b"RIFF\x00\x00\x00\x00WAVEfmt "),
            })
            .await
            .unwrap();

        let uploads = store.uploads();
        assert_eq!(uploads[0].content_type.as_deref(), Some("audio/wav"));
    }
}
