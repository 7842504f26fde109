//! Transport seam between connection handles and the wire client

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// A single connection to a key-value store
///
/// The handle owning a transport serializes all calls to it, so implementations
/// take `&mut self` and need no internal locking.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open the underlying connection
    async fn connect(&mut self) -> Result<()>;

    /// Close the underlying connection
    async fn disconnect(&mut self) -> Result<()>;

    /// Fetch a value; `None` when the key does not exist
    async fn get(&mut self, key: &str) -> Result<Option<Bytes>>;

    /// Store a value, expiring after `ttl_secs` when given.
    /// Returns the store's acknowledgement.
    async fn set(&mut self, key: &str, value: Bytes, ttl_secs: Option<u64>) -> Result<Bytes>;

    /// Delete a key, returning how many keys were removed
    async fn del(&mut self, key: &str) -> Result<u64>;
}

/// Factory trait for building transports from a connection URL
pub trait Connector: Send + Sync {
    /// Get the backend type this connector handles
    fn backend_type(&self) -> &'static str;

    /// Create an unopened transport for `url`
    fn create_transport(&self, url: &str) -> Result<Box<dyn Transport>>;
}
