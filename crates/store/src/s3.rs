//! S3 implementation of MediaStore.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::{timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_s3::{
    config::Credentials,
    error::{DisplayErrorContext, SdkError},
    primitives::ByteStream,
    types::ObjectCannedAcl,
    Client,
};
use secrecy::ExposeSecret;

use oneul_core::{
    config::StorageConfig,
    traits::MediaStore,
    types::{MediaUpload, StoredMedia},
    Error, Result,
};

use crate::keys::{content_type_for, public_url, KeyLayout};

/// S3 storage for uploaded media.
pub struct S3MediaStore {
    client: Client,
    bucket: String,
    layout: KeyLayout,
    public_base: String,
    public_read: bool,
}

impl S3MediaStore {
    /// Build a store from configuration.
    ///
    /// Static credentials are used when both halves are configured; otherwise
    /// the default AWS provider chain applies.
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        let bucket = config
            .bucket
            .clone()
            .ok_or_else(|| Error::config("storage.bucket is required for S3"))?;
        let public_base = config
            .public_base
            .clone()
            .ok_or_else(|| Error::config("storage.public_base is required for S3"))?;

        let timeouts = TimeoutConfig::builder()
            .operation_timeout(Duration::from_millis(config.timeout_ms))
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(timeouts);

        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key.expose_secret().clone(),
                secret_key.expose_secret().clone(),
                None,
                None,
                "oneul-config",
            ));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let shared = loader.load().await;
        let mut s3_config = aws_sdk_s3::config::Builder::from(&shared);
        if config.endpoint.is_some() {
            // S3-compatible endpoints (MinIO, LocalStack) want path-style addressing.
            s3_config = s3_config.force_path_style(true);
        }

        let layout = KeyLayout::new(&config.root_prefix, Some(&bucket));

        tracing::info!(
            bucket = %bucket,
            region = ?config.region,
            endpoint = ?config.endpoint,
            "S3 media store configured"
        );

        Ok(Self::new_with_client(
            Client::from_conf(s3_config.build()),
            &bucket,
            layout,
            &public_base,
            config.public_read,
        ))
    }

    /// Create with custom client (for testing/custom config).
    pub fn new_with_client(
        client: Client,
        bucket: &str,
        layout: KeyLayout,
        public_base: &str,
        public_read: bool,
    ) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            layout,
            public_base: public_base.to_string(),
            public_read,
        }
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn put(&self, upload: MediaUpload) -> Result<StoredMedia> {
        if upload.data.is_empty() {
            return Err(Error::invalid_request("upload is empty"));
        }

        let key = self.layout.key_for(&upload);
        let content_type = content_type_for(&upload);
        let size = upload.data.len();

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(upload.data))
            .content_type(content_type);

        if self.public_read {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }

        request.send().await.map_err(upload_error)?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size,
            public_read = self.public_read,
            "Uploaded media to S3"
        );

        Ok(StoredMedia {
            url: public_url(&self.public_base, &key),
            key,
        })
    }
}

fn upload_error<E, R>(err: SdkError<E, R>) -> Error
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err {
        SdkError::TimeoutError(_) => Error::upstream_timeout("S3 upload timed out"),
        other => Error::storage(format!("S3 upload error: {}", DisplayErrorContext(other))),
    }
}
