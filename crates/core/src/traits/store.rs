//! Storage gateway trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{MediaUpload, StoredMedia};

/// Object storage for client uploads.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Write the upload under a freshly generated key and return its public location.
    ///
    /// Single attempt; a failure leaves nothing behind.
    async fn put(&self, upload: MediaUpload) -> Result<StoredMedia>;
}
