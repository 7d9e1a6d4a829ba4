//! In-memory media store implementation using DashMap.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use oneul_core::{
    traits::MediaStore,
    types::{MediaUpload, StoredMedia},
    Error, Result,
};

use crate::keys::{content_type_for, public_url, KeyLayout};

/// Stored object with metadata.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// In-memory media store for local development and tests.
///
/// Produces the same keys and URLs as the S3 store, but nothing is served
/// from the returned URLs.
#[derive(Debug)]
pub struct InMemoryMediaStore {
    layout: KeyLayout,
    public_base: String,
    objects: DashMap<String, StoredObject>,
}

impl InMemoryMediaStore {
    /// Create a new in-memory store.
    pub fn new(layout: KeyLayout, public_base: impl Into<String>) -> Self {
        Self {
            layout,
            public_base: public_base.into(),
            objects: DashMap::new(),
        }
    }

    /// Look up a stored object by key.
    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.get(key).map(|r| r.value().clone())
    }

    /// Get the number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn put(&self, upload: MediaUpload) -> Result<StoredMedia> {
        if upload.data.is_empty() {
            return Err(Error::invalid_request("upload is empty"));
        }

        let key = self.layout.key_for(&upload);
        let content_type = content_type_for(&upload);

        tracing::trace!(
            key = %key,
            size = upload.data.len(),
            content_type = %content_type,
            "Storing media in memory"
        );

        self.objects.insert(
            key.clone(),
            StoredObject {
                data: upload.data,
                content_type,
            },
        );

        Ok(StoredMedia {
            url: public_url(&self.public_base, &key),
            key,
        })
    }
}
