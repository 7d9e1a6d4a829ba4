//! Object key layout and public URL construction.

use std::path::Path;

use oneul_core::types::MediaUpload;

const FALLBACK_EXTENSION: &str = ".bin";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Deterministic key layout for uploaded media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    root: String,
}

impl KeyLayout {
    /// Create a layout rooted at `root_prefix`.
    ///
    /// A leading `<bucket>/` in the prefix is dropped so that
    /// `media-bucket/oneuld` and `oneuld` produce the same keys.
    pub fn new(root_prefix: &str, bucket: Option<&str>) -> Self {
        let mut root = root_prefix.trim_matches('/');
        if let Some(bucket) = bucket {
            if let Some(rest) = root.strip_prefix(bucket).and_then(|r| r.strip_prefix('/')) {
                root = rest;
            }
        }
        Self {
            root: root.trim_end_matches('/').to_string(),
        }
    }

    /// Generate a fresh key for an upload.
    pub fn key_for(&self, upload: &MediaUpload) -> String {
        let name = format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            extension_for(upload.filename.as_deref(), upload.content_type.as_deref())
        );
        let session = sanitize_segment(&upload.session_id);

        if self.root.is_empty() {
            format!("{}/{}/{}", upload.kind.segment(), session, name)
        } else {
            format!("{}/{}/{}/{}", self.root, upload.kind.segment(), session, name)
        }
    }
}

/// Join the public base and a key with exactly one slash.
pub fn public_url(public_base: &str, key: &str) -> String {
    format!(
        "{}/{}",
        public_base.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}

/// Content type to store the object with.
pub fn content_type_for(upload: &MediaUpload) -> String {
    if let Some(content_type) = upload.content_type.as_deref().filter(|c| !c.is_empty()) {
        return content_type.to_string();
    }
    upload
        .filename
        .as_deref()
        .and_then(|name| mime_guess::from_path(name).first_raw())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string()
}

fn extension_for(filename: Option<&str>, content_type: Option<&str>) -> String {
    let from_name = filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase());

    let from_type = || {
        content_type
            .and_then(mime_guess::get_mime_extensions_str)
            .and_then(|exts| exts.first())
            .map(|ext| ext.to_string())
    };

    match from_name.or_else(from_type) {
        Some(ext) => format!(".{}", ext),
        None => FALLBACK_EXTENSION.to_string(),
    }
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
