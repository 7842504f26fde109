//! Redis transport backed by the `redis` crate's connection manager

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use tracing::{debug, error};

use crate::error::{KvError, Result};
use crate::transport::{Connector, Transport};

/// Connector producing [`RedisTransport`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisConnector;

impl RedisConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for RedisConnector {
    fn backend_type(&self) -> &'static str {
        "redis"
    }

    fn create_transport(&self, url: &str) -> Result<Box<dyn Transport>> {
        let client = redis::Client::open(url).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            KvError::connection_failed(format!("Failed to create Redis client: {}", e))
        })?;

        Ok(Box::new(RedisTransport {
            client,
            connection: None,
        }))
    }
}

/// One Redis connection
pub struct RedisTransport {
    client: redis::Client,
    connection: Option<ConnectionManager>,
}

impl RedisTransport {
    fn connection(&mut self) -> Result<&mut ConnectionManager> {
        self.connection.as_mut().ok_or(KvError::NotConnected)
    }
}

#[async_trait]
impl Transport for RedisTransport {
    async fn connect(&mut self) -> Result<()> {
        let connection = ConnectionManager::new(self.client.clone())
            .await
            .map_err(|e| {
                error!("Failed to connect to Redis: {}", e);
                KvError::connection_failed(format!("Failed to connect to Redis: {}", e))
            })?;

        self.connection = Some(connection);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        // The manager closes its socket once the last clone is dropped
        self.connection = None;
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<Bytes>> {
        let conn = self.connection()?;
        debug!("GET {}", key);

        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e: RedisError| KvError::query_failed(format!("GET {}: {}", key, e)))?;

        Ok(value.map(Bytes::from))
    }

    async fn set(&mut self, key: &str, value: Bytes, ttl_secs: Option<u64>) -> Result<Bytes> {
        let conn = self.connection()?;
        debug!("SET {} ({} bytes, ttl {:?})", key, value.len(), ttl_secs);

        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value.to_vec());
        if let Some(ttl) = ttl_secs {
            cmd.arg("EX").arg(ttl);
        }

        let ack: String = cmd
            .query_async(conn)
            .await
            .map_err(|e: RedisError| KvError::query_failed(format!("SET {}: {}", key, e)))?;

        Ok(Bytes::from(ack))
    }

    async fn del(&mut self, key: &str) -> Result<u64> {
        let conn = self.connection()?;
        debug!("DEL {}", key);

        let removed: u64 = conn
            .del(key)
            .await
            .map_err(|e: RedisError| KvError::query_failed(format!("DEL {}: {}", key, e)))?;

        Ok(removed)
    }
}
