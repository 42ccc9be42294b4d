//! Shared test doubles: a sleeper that records instead of waiting, stores
//! that lag behind or reject every call, and a log capture.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use crate::session::Sleeper;
use crate::storage::{CacheData, CachePrefix, CacheStore, InMemoryCacheStore, StorageError};

/// Records every requested delay and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }

    pub fn total(&self) -> Duration {
        self.delays().into_iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// In-memory store whose first `lagging_reads` reads miss, the way a replica
/// trails its primary. With `fail` set the lagging reads error instead.
pub struct LaggingStore {
    inner: InMemoryCacheStore,
    lagging_reads: u32,
    fail: bool,
    reads: AtomicU32,
}

impl LaggingStore {
    pub fn new(lagging_reads: u32) -> Self {
        Self {
            inner: InMemoryCacheStore::new(),
            lagging_reads,
            fail: false,
            reads: AtomicU32::new(0),
        }
    }

    pub fn failing_reads(lagging_reads: u32) -> Self {
        Self {
            fail: true,
            ..Self::new(lagging_reads)
        }
    }

    pub fn reads(&self) -> u32 {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheStore for LaggingStore {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn put_with_ttl(
        &self,
        prefix: CachePrefix,
        key: &str,
        value: CacheData,
        ttl: usize,
    ) -> Result<(), StorageError> {
        self.inner.put_with_ttl(prefix, key, value, ttl).await
    }

    async fn get(&self, prefix: CachePrefix, key: &str) -> Result<Option<CacheData>, StorageError> {
        let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if read <= self.lagging_reads {
            if self.fail {
                return Err(StorageError::Storage(format!("replica unavailable (read {read})")));
            }
            return Ok(None);
        }
        self.inner.get(prefix, key).await
    }

    async fn remove(&self, prefix: CachePrefix, key: &str) -> Result<(), StorageError> {
        self.inner.remove(prefix, key).await
    }
}

/// Rejects every operation.
pub struct FailingStore;

#[async_trait]
impl CacheStore for FailingStore {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn put_with_ttl(
        &self,
        _prefix: CachePrefix,
        _key: &str,
        _value: CacheData,
        _ttl: usize,
    ) -> Result<(), StorageError> {
        Err(StorageError::Storage("connection refused".to_string()))
    }

    async fn get(
        &self,
        _prefix: CachePrefix,
        _key: &str,
    ) -> Result<Option<CacheData>, StorageError> {
        Err(StorageError::Storage("connection refused".to_string()))
    }

    async fn remove(&self, _prefix: CachePrefix, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Storage("connection refused".to_string()))
    }
}

/// Formatted log output collected while a closure runs.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn capture<R>(f: impl FnOnce() -> R) -> (R, String) {
        let logs = Self::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let result = tracing::subscriber::with_default(subscriber, f);
        let output = String::from_utf8_lossy(&logs.0.lock().unwrap()).into_owned();
        (result, output)
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
