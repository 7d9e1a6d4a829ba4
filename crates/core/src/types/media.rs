use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Kind of media being stored; selects the key segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    /// Key segment under the bucket root.
    pub fn segment(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
        }
    }
}

/// A client upload waiting to be written to object storage.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub kind: MediaKind,
    pub session_id: String,
    /// Original filename as sent by the client, if any.
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Location of an object after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredMedia {
    /// Object key inside the bucket.
    pub key: String,
    /// Publicly reachable URL for the object.
    pub url: String,
}

/// How an image is handed to the vision provider.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// A URL the provider fetches itself.
    Url(String),
    /// Raw bytes embedded in the request.
    Inline { data: Bytes, mime_type: String },
}

impl ImageSource {
    /// Short description for logs; never includes inline payloads.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Inline { data, mime_type } => {
                format!("inline {} ({} bytes)", mime_type, data.len())
            }
        }
    }
}
