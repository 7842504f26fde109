//! # temps-kv-connections
//!
//! Named connections to a Redis key-value store, each with its own lifecycle.
//!
//! ## Architecture
//!
//! - **ConnectionParameters**: typed configuration with defaults, built
//!   directly or from a loosely-typed [`ConnectionInput`]
//! - **ConnectionHandle**: owns one transport; validate, connect, disconnect,
//!   and a small get/set command surface
//! - **ConnectionRegistry**: named handles with lazy creation and bulk teardown
//! - **Lifecycle**: the host's mount/unmount hooks, implemented by handles and
//!   the registry
//! - **Transport / Connector**: the seam to the wire client (Redis, or the
//!   in-memory store used in tests)
//!
//! ## Example
//!
//! ```rust,no_run
//! use temps_kv_connections::{ConnectionParameters, ConnectionRegistry};
//!
//! # async fn example() -> temps_kv_connections::Result<()> {
//! let registry = ConnectionRegistry::redis();
//!
//! let cache = registry
//!     .create_connection("cache", ConnectionParameters::new().with_port(6380))
//!     .await?;
//! cache.set("hello", "world!", Some(60)).await?;
//! let value = cache.get("hello").await?;
//!
//! registry.close_all().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod lifecycle;
pub mod memory;
pub mod redis_transport;
pub mod registry;
pub mod state;
pub mod transport;

// Re-export commonly used items
pub use config::{ConnectionInput, ConnectionParameters, EngineKind};
pub use error::{ErrorKind, KvError, Result};
pub use handle::{Command, ConnectionHandle};
pub use lifecycle::{Lifecycle, ServiceHost};
pub use memory::{MemoryConnector, MemoryTransport};
pub use redis_transport::{RedisConnector, RedisTransport};
pub use registry::ConnectionRegistry;
pub use state::LifecycleState;
pub use transport::{Connector, Transport};
