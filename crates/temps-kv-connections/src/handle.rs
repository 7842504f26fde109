//! A single named connection and its command surface

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ConnectionParameters;
use crate::error::{KvError, Result};
use crate::lifecycle::Lifecycle;
use crate::redis_transport::RedisConnector;
use crate::state::LifecycleState;
use crate::transport::{Connector, Transport};

/// Commands accepted by [`ConnectionHandle::query`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Get,
    Set,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Get => write!(f, "GET"),
            Command::Set => write!(f, "SET"),
        }
    }
}

struct HandleInner {
    state: LifecycleState,
    validated: bool,
    transport: Option<Box<dyn Transport>>,
}

/// Owns one connection to the store
///
/// All operations on a handle are serialized, so a `disconnect` racing a
/// `query` either waits for it or makes it fail with [`KvError::NotConnected`].
pub struct ConnectionHandle {
    parameters: ConnectionParameters,
    connector: Arc<dyn Connector>,
    inner: Mutex<HandleInner>,
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("identity", &self.identity())
            .field("backend", &self.connector.backend_type())
            .finish()
    }
}

impl ConnectionHandle {
    pub fn new(parameters: ConnectionParameters, connector: Arc<dyn Connector>) -> Self {
        Self {
            parameters,
            connector,
            inner: Mutex::new(HandleInner {
                state: LifecycleState::Unmounted,
                validated: false,
                transport: None,
            }),
        }
    }

    /// Handle backed by a real Redis connection
    pub fn redis(parameters: ConnectionParameters) -> Self {
        Self::new(parameters, Arc::new(RedisConnector::new()))
    }

    pub fn parameters(&self) -> &ConnectionParameters {
        &self.parameters
    }

    /// Configured host, used as the handle's display name
    pub fn identity(&self) -> &str {
        self.parameters.host.as_deref().unwrap_or_default()
    }

    pub async fn state(&self) -> LifecycleState {
        self.inner.lock().await.state
    }

    pub async fn is_validated(&self) -> bool {
        self.inner.lock().await.validated
    }

    /// Check that every required parameter is present.
    ///
    /// The error lists all missing fields, not just the first.
    pub async fn validate(&self) -> Result<()> {
        let missing = self.parameters.missing_fields();
        if !missing.is_empty() {
            warn!(
                "Invalid parameters for {}: missing {}",
                self.identity(),
                missing.join(", ")
            );
            return Err(KvError::Validation { missing });
        }

        let mut inner = self.inner.lock().await;
        inner.validated = true;
        if inner.state == LifecycleState::Unmounted {
            inner.state.transition(LifecycleState::Validated)?;
        }
        Ok(())
    }

    /// Open the transport.
    ///
    /// A no-op while already connected. Reopens a closed handle.
    pub async fn connect(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if !inner.validated {
            return Err(KvError::NotValidated);
        }
        if inner.state == LifecycleState::Connected {
            debug!("Connection to {} already open", self.identity());
            return Ok(());
        }

        let url = self.parameters.connection_url()?;
        let display_url = self.parameters.redacted_url()?;
        info!("Creating a connection with Redis on {}...", display_url);

        let mut transport = self.connector.create_transport(&url)?;
        with_timeout(
            self.parameters.connect_timeout,
            "connect",
            transport.connect(),
        )
        .await?;

        inner.state.transition(LifecycleState::Connected)?;
        inner.transport = Some(transport);

        info!("Successfully connected to Redis {}", display_url);
        Ok(())
    }

    /// Close the transport if one is open. Never fails.
    pub async fn disconnect(&self) {
        let mut inner = self.inner.lock().await;

        if let Some(mut transport) = inner.transport.take() {
            info!("Disconnecting from Redis {}...", self.identity());
            match transport.disconnect().await {
                Ok(()) => info!("Successfully disconnected from Redis {}", self.identity()),
                Err(e) => warn!("Error while disconnecting from {}: {}", self.identity(), e),
            }
        }

        inner.state = LifecycleState::Closed;
    }

    /// Execute a GET or SET.
    ///
    /// GET yields `None` for a missing key. SET requires `value`, applies
    /// `expiry_secs` as a time-to-live when given and non-zero, and yields the
    /// store's acknowledgement.
    pub async fn query(
        &self,
        command: Command,
        key: &str,
        value: Option<Bytes>,
        expiry_secs: Option<u64>,
    ) -> Result<Option<Bytes>> {
        let mut inner = self.inner.lock().await;
        if inner.state != LifecycleState::Connected {
            return Err(KvError::NotConnected);
        }
        let transport = inner.transport.as_mut().ok_or(KvError::NotConnected)?;

        debug!("{} {} on {}", command, key, self.identity());

        let timeout = self.parameters.query_timeout;
        match command {
            Command::Get => with_timeout(timeout, "query", transport.get(key)).await,
            Command::Set => {
                let value = value.ok_or_else(|| {
                    KvError::invalid_query(format!("SET {} requires a value", key))
                })?;
                // Redis rejects `EX 0`
                let ttl = expiry_secs.filter(|secs| *secs > 0);
                with_timeout(timeout, "query", transport.set(key, value, ttl))
                    .await
                    .map(Some)
            }
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.query(Command::Get, key, None, None).await
    }

    pub async fn set(
        &self,
        key: &str,
        value: impl Into<Bytes>,
        expiry_secs: Option<u64>,
    ) -> Result<Bytes> {
        let ack = self
            .query(Command::Set, key, Some(value.into()), expiry_secs)
            .await?;
        Ok(ack.unwrap_or_default())
    }

    /// Delete a key; true when it existed
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        if inner.state != LifecycleState::Connected {
            return Err(KvError::NotConnected);
        }
        let transport = inner.transport.as_mut().ok_or(KvError::NotConnected)?;

        debug!("DEL {} on {}", key, self.identity());
        let removed =
            with_timeout(self.parameters.query_timeout, "query", transport.del(key)).await?;
        Ok(removed > 0)
    }

    /// GET a JSON-encoded value
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    /// SET a value encoded as JSON
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        expiry_secs: Option<u64>,
    ) -> Result<Bytes> {
        let encoded = serde_json::to_vec(value)?;
        self.set(key, encoded, expiry_secs).await
    }
}

#[async_trait]
impl Lifecycle for ConnectionHandle {
    fn service_name(&self) -> &str {
        self.identity()
    }

    async fn before_mount(&self) -> Result<()> {
        self.validate().await
    }

    async fn on_mount(&self) -> Result<()> {
        self.connect().await
    }

    async fn before_unmount(&self) -> Result<()> {
        self.disconnect().await;
        Ok(())
    }
}

async fn with_timeout<T>(
    limit: Option<Duration>,
    operation: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| KvError::Timeout {
                operation,
                millis: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            })?,
        None => fut.await,
    }
}
