//! S3-compatible storage backed by `aws-sdk-s3`
//!
//! The SDK client pools its own connections and is cheap to clone, so a
//! single `S3Storage` is shared by every request.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, TryStreamExt};
use miso_config::S3Section;
use miso_core::error::{MisoError, StorageOperation};
use tracing::{debug, warn};

use crate::{ObjectStream, Storage, StorageResult};

/// Bucket-level settings of an [`S3Storage`]
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub presign_expiry: Duration,
    pub request_timeout: Option<Duration>,
}

impl From<&S3Section> for S3Settings {
    fn from(section: &S3Section) -> Self {
        Self {
            bucket: section.bucket.clone(),
            presign_expiry: section.presign_expiry(),
            request_timeout: section.request_timeout(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
    settings: S3Settings,
}

impl S3Storage {
    pub fn new(client: Client, settings: S3Settings) -> Self {
        Self { client, settings }
    }

    /// Build a client from the SDK default provider chain plus `section`
    pub async fn from_config(section: &S3Section) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &section.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(section.force_path_style);
        if let Some(endpoint) = &section.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self::new(Client::from_conf(builder.build()), S3Settings::from(section))
    }

    pub fn bucket(&self) -> &str {
        &self.settings.bucket
    }

    async fn with_timeout<T, F>(&self, key: &str, request: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        match self.settings.request_timeout {
            Some(limit) => tokio::time::timeout(limit, request).await.map_err(|e| {
                warn!(key, timeout_ms = limit.as_millis() as u64, "S3 request timed out");
                MisoError::storage_unavailable(
                    format!("request for '{}' timed out after {:?}", key, limit),
                    e,
                )
            })?,
            None => request.await,
        }
    }
}

/// Map an SDK failure onto the storage error taxonomy
fn classify<E>(operation: StorageOperation, key: &str, err: SdkError<E>) -> MisoError
where
    E: std::error::Error + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    warn!(%operation, key, error = %message, "S3 request failed");
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            MisoError::storage_unavailable(message, err)
        }
        other => MisoError::object_access(operation, key, message, other),
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        self.with_timeout(prefix, async {
            let mut keys = Vec::new();
            let mut pages = self
                .client
                .list_objects_v2()
                .bucket(&self.settings.bucket)
                .prefix(prefix)
                .into_paginator()
                .send();

            while let Some(page) = pages.next().await {
                let page = page.map_err(|e| classify(StorageOperation::List, prefix, e))?;
                keys.extend(
                    page.contents()
                        .iter()
                        .filter_map(|object| object.key().map(str::to_string)),
                );
            }

            debug!(prefix, count = keys.len(), "S3 LIST ok");
            Ok(keys)
        })
        .await
    }

    async fn get_stream(&self, key: &str) -> StorageResult<ObjectStream> {
        let output = self
            .with_timeout(key, async {
                self.client
                    .get_object()
                    .bucket(&self.settings.bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|e| classify(StorageOperation::Read, key, e))
            })
            .await?;

        debug!(key, content_length = ?output.content_length(), "S3 GET stream opened");
        let owned_key = key.to_string();
        let body = futures::stream::unfold(output.body, |mut body| async move {
            body.next().await.map(|chunk| (chunk, body))
        })
        .map_err(move |e| {
            MisoError::object_access(StorageOperation::Read, owned_key.clone(), "body stream interrupted", e)
        });

        Ok(Box::pin(body))
    }

    async fn get_buffer(&self, key: &str) -> StorageResult<Bytes> {
        self.with_timeout(key, async {
            let output = self
                .client
                .get_object()
                .bucket(&self.settings.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| classify(StorageOperation::Read, key, e))?;

            let data = output.body.collect().await.map_err(|e| {
                MisoError::object_access(StorageOperation::Read, key, "failed to read body", e)
            })?;
            Ok(data.into_bytes())
        })
        .await
    }

    async fn put(&self, key: &str, mut data: ObjectStream) -> StorageResult<()> {
        if key.is_empty() {
            return Ok(());
        }

        let mut buffer = BytesMut::new();
        while let Some(chunk) = data.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        let size = buffer.len();

        self.with_timeout(key, async {
            self.client
                .put_object()
                .bucket(&self.settings.bucket)
                .key(key)
                .body(ByteStream::from(buffer.freeze()))
                .send()
                .await
                .map_err(|e| classify(StorageOperation::Write, key, e))
        })
        .await?;

        debug!(key, size, "S3 PUT ok");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        if key.is_empty() {
            return Ok(());
        }

        self.with_timeout(key, async {
            self.client
                .delete_object()
                .bucket(&self.settings.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| classify(StorageOperation::Delete, key, e))
        })
        .await?;

        debug!(key, "S3 DELETE ok");
        Ok(())
    }

    async fn presigned_url(&self, key: &str) -> StorageResult<String> {
        let presigning = PresigningConfig::expires_in(self.settings.presign_expiry).map_err(|e| {
            MisoError::object_access(StorageOperation::Sign, key, "invalid presign expiry", e)
        })?;

        let request = self
            .with_timeout(key, async {
                self.client
                    .get_object()
                    .bucket(&self.settings.bucket)
                    .key(key)
                    .presigned(presigning)
                    .await
                    .map_err(|e| classify(StorageOperation::Sign, key, e))
            })
            .await?;

        Ok(request.uri().to_string())
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}

#[cfg(test)]
mod tests;
