//! Closure-driven storage double for tests
//!
//! Each operation's behaviour is injected as a closure. Operations left
//! unset succeed with an empty value, so a test only configures what it
//! exercises. Every call is recorded for assertions on derived keys.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use miso_core::error::MisoError;
use parking_lot::Mutex;

use crate::{bytes_stream, ObjectStream, Storage, StorageResult};

type ListFn = Box<dyn Fn(&str) -> StorageResult<Vec<String>> + Send + Sync>;
type StreamFn = Box<dyn Fn(&str) -> StorageResult<ObjectStream> + Send + Sync>;
type BufferFn = Box<dyn Fn(&str) -> StorageResult<Bytes> + Send + Sync>;
type PresignFn = Box<dyn Fn(&str) -> StorageResult<String> + Send + Sync>;

/// One recorded storage call and the key or prefix it was given
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    List(String),
    GetStream(String),
    GetBuffer(String),
    Put(String, Bytes),
    Delete(String),
    PresignedUrl(String),
}

/// Storage double whose per-operation behaviour is configurable
#[derive(Default)]
pub struct MockStorage {
    list_fn: Option<ListFn>,
    stream_fn: Option<StreamFn>,
    buffer_fn: Option<BufferFn>,
    presign_fn: Option<PresignFn>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> StorageResult<Vec<String>> + Send + Sync + 'static,
    {
        self.list_fn = Some(Box::new(f));
        self
    }

    pub fn with_stream<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> StorageResult<ObjectStream> + Send + Sync + 'static,
    {
        self.stream_fn = Some(Box::new(f));
        self
    }

    pub fn with_buffer<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> StorageResult<Bytes> + Send + Sync + 'static,
    {
        self.buffer_fn = Some(Box::new(f));
        self
    }

    pub fn with_presigned_url<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> StorageResult<String> + Send + Sync + 'static,
    {
        self.presign_fn = Some(Box::new(f));
        self
    }

    /// Listing that always returns `keys`
    pub fn with_keys<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        self.with_list(move |_| Ok(keys.clone()))
    }

    /// Every object read (streamed or buffered) returns `content`
    pub fn with_object(self, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        let buffered = content.clone();
        self.with_stream(move |_| Ok(bytes_stream(content.clone())))
            .with_buffer(move |_| Ok(buffered.clone()))
    }

    /// Calls received so far, oldest first
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: MockCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.record(MockCall::List(prefix.to_string()));
        match &self.list_fn {
            Some(f) => f(prefix),
            None => Ok(Vec::new()),
        }
    }

    async fn get_stream(&self, key: &str) -> StorageResult<ObjectStream> {
        self.record(MockCall::GetStream(key.to_string()));
        match &self.stream_fn {
            Some(f) => f(key),
            None => Ok(Box::pin(futures::stream::empty::<Result<Bytes, MisoError>>())),
        }
    }

    async fn get_buffer(&self, key: &str) -> StorageResult<Bytes> {
        self.record(MockCall::GetBuffer(key.to_string()));
        match &self.buffer_fn {
            Some(f) => f(key),
            None => Ok(Bytes::new()),
        }
    }

    async fn put(&self, key: &str, mut data: ObjectStream) -> StorageResult<()> {
        let mut written = Vec::new();
        while let Some(chunk) = data.next().await {
            written.extend_from_slice(&chunk?);
        }
        self.record(MockCall::Put(key.to_string(), Bytes::from(written)));
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.record(MockCall::Delete(key.to_string()));
        Ok(())
    }

    async fn presigned_url(&self, key: &str) -> StorageResult<String> {
        self.record(MockCall::PresignedUrl(key.to_string()));
        match &self.presign_fn {
            Some(f) => f(key),
            None => Ok(String::new()),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
