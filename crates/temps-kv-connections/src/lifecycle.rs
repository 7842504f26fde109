//! Host-driven mount/unmount protocol
//!
//! A host brings a service up with `before_mount` then `on_mount`, and takes it
//! down with `before_unmount` then `on_unmount`. Both connection handles and
//! the registry implement [`Lifecycle`]; [`ServiceHost`] is a minimal host that
//! mounts services in order and unmounts them in reverse.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{KvError, Result};

#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Name used in logs
    fn service_name(&self) -> &str;

    /// Checks run before mounting; an error aborts the mount
    async fn before_mount(&self) -> Result<()> {
        Ok(())
    }

    async fn on_mount(&self) -> Result<()> {
        Ok(())
    }

    async fn before_unmount(&self) -> Result<()> {
        Ok(())
    }

    async fn on_unmount(&self) -> Result<()> {
        Ok(())
    }

    /// Run `before_mount` then `on_mount`
    async fn mount(&self) -> Result<()> {
        self.before_mount().await?;
        self.on_mount().await
    }

    /// Run `before_unmount` then `on_unmount`
    async fn unmount(&self) -> Result<()> {
        self.before_unmount().await?;
        self.on_unmount().await
    }
}

/// Ordered set of mounted services
#[derive(Default)]
pub struct ServiceHost {
    services: Vec<(String, Arc<dyn Lifecycle>)>,
}

impl ServiceHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `service` and keep it under `name`; nothing is kept if mounting fails
    pub async fn mount_service(&mut self, name: &str, service: Arc<dyn Lifecycle>) -> Result<()> {
        if self.services.iter().any(|(existing, _)| existing == name) {
            return Err(KvError::DuplicateName(name.to_string()));
        }

        info!("Mounting service '{}' ({})", name, service.service_name());
        service.mount().await?;
        self.services.push((name.to_string(), service));
        Ok(())
    }

    /// Unmount every service, last mounted first.
    ///
    /// Failures are logged and do not stop the remaining services from
    /// unmounting.
    pub async fn unmount_services(&mut self) {
        while let Some((name, service)) = self.services.pop() {
            info!("Unmounting service '{}'", name);
            if let Err(e) = service.unmount().await {
                warn!("Failed to unmount service '{}': {}", name, e);
            }
        }
    }

    pub fn service_names(&self) -> Vec<String> {
        self.services.iter().map(|(name, _)| name.clone()).collect()
    }
}
