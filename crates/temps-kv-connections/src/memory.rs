//! In-process transport
//!
//! Every transport created by one [`MemoryConnector`] shares the same store, so
//! data written through one handle is visible through another, as with a real
//! server. Faults can be injected to exercise the error paths of handles and
//! the registry without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::error::{KvError, Result};
use crate::transport::{Connector, Transport};

type Store = Arc<Mutex<HashMap<String, (Bytes, Option<Instant>)>>>;

#[derive(Debug, Default)]
struct Faults {
    fail_connect: AtomicBool,
    fail_disconnect: AtomicBool,
    connect_delay_ms: AtomicU64,
    query_delay_ms: AtomicU64,
}

/// Connector for [`MemoryTransport`]s sharing one store
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    store: Store,
    faults: Arc<Faults>,
    created: Arc<AtomicUsize>,
    connects: Arc<AtomicUsize>,
    disconnects: Arc<AtomicUsize>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `connect` calls fail
    pub fn fail_connect(&self, fail: bool) {
        self.faults.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `disconnect` calls fail
    pub fn fail_disconnect(&self, fail: bool) {
        self.faults.fail_disconnect.store(fail, Ordering::SeqCst);
    }

    /// Delay every `connect` by `delay`
    pub fn connect_delay(&self, delay: Duration) {
        self.faults
            .connect_delay_ms
            .store(millis(delay), Ordering::SeqCst);
    }

    /// Delay every `get` and `set` by `delay`
    pub fn query_delay(&self, delay: Duration) {
        self.faults
            .query_delay_ms
            .store(millis(delay), Ordering::SeqCst);
    }

    /// Number of transports created so far
    pub fn transports_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Number of successful `connect` calls so far
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of `disconnect` calls so far, failed ones included
    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl Connector for MemoryConnector {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    fn create_transport(&self, url: &str) -> Result<Box<dyn Transport>> {
        if !url.starts_with("redis://") && !url.starts_with("rediss://") {
            return Err(KvError::connection_failed(format!(
                "Unsupported URL scheme: {}",
                url
            )));
        }

        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryTransport {
            connector: self.clone(),
            open: false,
        }))
    }
}

/// Transport over a [`MemoryConnector`]'s store
pub struct MemoryTransport {
    connector: MemoryConnector,
    open: bool,
}

impl MemoryTransport {
    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(KvError::NotConnected)
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&mut self) -> Result<()> {
        let faults = &self.connector.faults;

        pause(&faults.connect_delay_ms).await;

        if faults.fail_connect.load(Ordering::SeqCst) {
            return Err(KvError::connection_failed("connection refused"));
        }

        self.open = true;
        self.connector.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connector.disconnects.fetch_add(1, Ordering::SeqCst);
        self.open = false;

        if self.connector.faults.fail_disconnect.load(Ordering::SeqCst) {
            return Err(KvError::connection_failed("connection reset"));
        }
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<Bytes>> {
        self.ensure_open()?;
        pause(&self.connector.faults.query_delay_ms).await;
        let mut store = self.connector.store.lock().await;

        let expired = match store.get(key) {
            Some((_, Some(deadline))) => Instant::now() >= *deadline,
            _ => false,
        };
        if expired {
            debug!("Key {} expired", key);
            store.remove(key);
        }

        Ok(store.get(key).map(|(value, _)| value.clone()))
    }

    async fn set(&mut self, key: &str, value: Bytes, ttl_secs: Option<u64>) -> Result<Bytes> {
        self.ensure_open()?;
        pause(&self.connector.faults.query_delay_ms).await;
        let deadline = ttl_secs.map(|secs| Instant::now() + Duration::from_secs(secs));

        self.connector
            .store
            .lock()
            .await
            .insert(key.to_string(), (value, deadline));

        Ok(Bytes::from_static(b"OK"))
    }

    async fn del(&mut self, key: &str) -> Result<u64> {
        self.ensure_open()?;
        let removed = self.connector.store.lock().await.remove(key);
        Ok(u64::from(removed.is_some()))
    }
}

fn millis(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

async fn pause(delay_ms: &AtomicU64) {
    let delay = delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}
