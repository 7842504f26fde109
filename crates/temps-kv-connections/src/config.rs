//! Connection parameter types

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{KvError, Result};

/// Default host when none is given
pub const DEFAULT_HOST: &str = "localhost";
/// Default Redis port
pub const DEFAULT_PORT: u16 = 6379;
/// User placed in the URL when only a password is configured
pub const DEFAULT_USER: &str = "redis";
/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default per-command timeout
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Backend identifier carried by every parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Redis,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineKind::Redis => write!(f, "redis"),
        }
    }
}

/// Raw connection input as supplied by a host (JSON object, config file, ...)
///
/// Every field is optional; defaults are applied when converting into
/// [`ConnectionParameters`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInput {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub ssl: Option<bool>,
    /// Connect timeout in milliseconds (0 disables it)
    pub connect_timeout_ms: Option<u64>,
    /// Per-command timeout in milliseconds (0 disables it)
    pub query_timeout_ms: Option<u64>,
}

/// Typed connection parameters
///
/// The six connection fields are "required but defaultable": constructors fill
/// them with defaults, and [`ConnectionParameters::missing_fields`] reports any
/// that have been cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParameters {
    pub engine_kind: Option<EngineKind>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub use_tls: Option<bool>,
    pub connect_timeout: Option<Duration>,
    pub query_timeout: Option<Duration>,
}

impl Default for ConnectionParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionParameters {
    /// Redis parameters with every field set to its default
    pub fn new() -> Self {
        Self {
            engine_kind: Some(EngineKind::Redis),
            host: Some(DEFAULT_HOST.to_string()),
            port: Some(DEFAULT_PORT),
            user: Some(String::new()),
            password: Some(String::new()),
            use_tls: Some(false),
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            query_timeout: Some(DEFAULT_QUERY_TIMEOUT),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_tls(mut self, use_tls: bool) -> Self {
        self.use_tls = Some(use_tls);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Names of every required field that is not present
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.engine_kind.is_none() {
            missing.push("engine_kind");
        }
        if self.host.is_none() {
            missing.push("host");
        }
        if self.port.is_none() {
            missing.push("port");
        }
        if self.user.is_none() {
            missing.push("user");
        }
        if self.password.is_none() {
            missing.push("password");
        }
        if self.use_tls.is_none() {
            missing.push("use_tls");
        }
        missing
    }

    /// Build the connection URL
    ///
    /// `rediss://` is used iff TLS is enabled. The credentials segment is
    /// emitted when user or password is non-empty; a password without a user
    /// falls back to [`DEFAULT_USER`].
    pub fn connection_url(&self) -> Result<String> {
        self.build_url(false)
    }

    /// Connection URL with the password masked, for logs
    pub fn redacted_url(&self) -> Result<String> {
        self.build_url(true)
    }

    fn build_url(&self, redact: bool) -> Result<String> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(KvError::Validation { missing });
        }

        let user = self.user.as_deref().unwrap_or_default();
        let password = self.password.as_deref().unwrap_or_default();
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        let port = self.port.unwrap_or(DEFAULT_PORT);

        let mut url = String::from(if self.use_tls == Some(true) {
            "rediss://"
        } else {
            "redis://"
        });

        if !user.is_empty() || !password.is_empty() {
            url.push_str(if user.is_empty() { DEFAULT_USER } else { user });
            if !password.is_empty() {
                url.push(':');
                url.push_str(if redact { "****" } else { password });
            }
            url.push('@');
        }

        url.push_str(&format!("{}:{}", host, port));
        Ok(url)
    }
}

impl From<ConnectionInput> for ConnectionParameters {
    fn from(input: ConnectionInput) -> Self {
        let timeout = |ms: Option<u64>, default: Duration| match ms {
            Some(0) => None,
            Some(ms) => Some(Duration::from_millis(ms)),
            None => Some(default),
        };

        Self {
            engine_kind: Some(EngineKind::Redis),
            host: Some(
                input
                    .host
                    .filter(|h| !h.is_empty())
                    .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            ),
            port: Some(input.port.filter(|p| *p != 0).unwrap_or(DEFAULT_PORT)),
            user: Some(input.user.unwrap_or_default()),
            password: Some(input.pass.unwrap_or_default()),
            use_tls: Some(input.ssl.unwrap_or(false)),
            connect_timeout: timeout(input.connect_timeout_ms, DEFAULT_CONNECT_TIMEOUT),
            query_timeout: timeout(input.query_timeout_ms, DEFAULT_QUERY_TIMEOUT),
        }
    }
}
