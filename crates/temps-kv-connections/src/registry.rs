//! Registry of named connection handles

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ConnectionParameters;
use crate::error::{KvError, Result};
use crate::handle::ConnectionHandle;
use crate::lifecycle::Lifecycle;
use crate::redis_transport::RedisConnector;
use crate::transport::Connector;

/// Registry of named connection handles
///
/// The entry map is guarded by a single mutex held across the whole
/// check-mount-insert and unmount-remove sequences, so a name is only ever
/// present once its handle is connected and at most one handle exists per name.
pub struct ConnectionRegistry {
    connector: Arc<dyn Connector>,
    entries: Mutex<HashMap<String, Arc<ConnectionHandle>>>,
}

impl ConnectionRegistry {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Registry whose handles connect to Redis
    pub fn redis() -> Self {
        Self::new(Arc::new(RedisConnector::new()))
    }

    /// Create, mount and register a new connection.
    ///
    /// Nothing is registered if validation or connecting fails; the handle's
    /// error is returned as is.
    pub async fn create_connection(
        &self,
        name: &str,
        params: ConnectionParameters,
    ) -> Result<Arc<ConnectionHandle>> {
        let mut entries = self.entries.lock().await;

        if entries.contains_key(name) {
            return Err(KvError::DuplicateName(name.to_string()));
        }

        let handle = self.mount_handle(params).await?;
        entries.insert(name.to_string(), handle.clone());
        info!("New connection '{}' was added to the registry", name);

        Ok(handle)
    }

    /// Get the connection named `name`, creating it from `params` when absent
    pub async fn get_connection(
        &self,
        name: &str,
        params: Option<ConnectionParameters>,
    ) -> Result<Arc<ConnectionHandle>> {
        let mut entries = self.entries.lock().await;

        if let Some(handle) = entries.get(name) {
            return Ok(handle.clone());
        }

        let params = params.ok_or_else(|| KvError::NotFound(name.to_string()))?;

        debug!("Connection '{}' not found, creating it", name);
        let handle = self.mount_handle(params).await?;
        entries.insert(name.to_string(), handle.clone());
        info!("New connection '{}' was added to the registry", name);

        Ok(handle)
    }

    /// Disconnect and remove the connection named `name`, if any
    pub async fn close_connection(&self, name: &str) {
        let mut entries = self.entries.lock().await;

        if let Some(handle) = entries.get(name).cloned() {
            Self::unmount_handle(name, &handle).await;
            entries.remove(name);
            info!("Connection '{}' was removed from the registry", name);
        }
    }

    /// Disconnect and remove every connection
    pub async fn close_all(&self) {
        let mut entries = self.entries.lock().await;
        info!("Disconnecting all Redis connections...");

        let names: Vec<String> = entries.keys().cloned().collect();
        for name in names {
            if let Some(handle) = entries.get(&name).cloned() {
                Self::unmount_handle(&name, &handle).await;
                entries.remove(&name);
            }
        }

        info!("Successfully disconnected from all Redis connections");
    }

    /// Names of the registered connections, sorted
    pub async fn list_names(&self) -> Vec<String> {
        let entries = self.entries.lock().await;
        let mut names: Vec<String> = entries.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.entries.lock().await.contains_key(name)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    async fn mount_handle(&self, params: ConnectionParameters) -> Result<Arc<ConnectionHandle>> {
        let handle = Arc::new(ConnectionHandle::new(params, self.connector.clone()));
        handle.mount().await?;
        Ok(handle)
    }

    async fn unmount_handle(name: &str, handle: &ConnectionHandle) {
        if let Err(e) = handle.unmount().await {
            warn!("Failed to unmount connection '{}': {}", name, e);
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::redis()
    }
}

#[async_trait]
impl Lifecycle for ConnectionRegistry {
    fn service_name(&self) -> &str {
        "redis-registry"
    }

    async fn before_unmount(&self) -> Result<()> {
        self.close_all().await;
        Ok(())
    }
}
