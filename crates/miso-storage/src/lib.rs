//! Object storage capability for the miso registry
//!
//! The registry reads everything it serves from a single bucket. This crate
//! defines the [`Storage`] trait the registry handlers are written against,
//! an S3-backed implementation for production and a closure-driven
//! [`MockStorage`] for tests.

pub mod mock;
pub mod s3;

// Re-export main types
pub use mock::{MockCall, MockStorage};
pub use s3::{S3Settings, S3Storage};

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use miso_core::error::MisoError;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, MisoError>;

/// Sequential read of one object
///
/// The underlying read handle is owned by the stream and released when the
/// stream is dropped, whether or not it was read to the end.
pub type ObjectStream = Pin<Box<dyn Stream<Item = Result<Bytes, MisoError>> + Send>>;

/// Object-store capability shared by all concurrent requests
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Every key starting with `prefix`; no match is an empty list
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Open `key` for streaming
    async fn get_stream(&self, key: &str) -> StorageResult<ObjectStream>;

    /// Read `key` fully into memory
    async fn get_buffer(&self, key: &str) -> StorageResult<Bytes>;

    /// Write `data` to `key`, replacing any existing object
    async fn put(&self, key: &str, data: ObjectStream) -> StorageResult<()>;

    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Time-limited URL granting direct read access to `key`
    async fn presigned_url(&self, key: &str) -> StorageResult<String>;

    /// Backend name used in logs
    fn name(&self) -> &'static str;
}

/// Single-chunk stream over in-memory bytes
pub fn bytes_stream(data: impl Into<Bytes>) -> ObjectStream {
    let data = data.into();
    Box::pin(futures::stream::once(async move { Ok(data) }))
}
