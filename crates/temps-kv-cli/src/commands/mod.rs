pub mod del;
pub mod get;
pub mod list;
pub mod set;

pub use del::DelCommand;
pub use get::GetCommand;
pub use list::ListCommand;
pub use set::SetCommand;

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use temps_kv_connections::{
    ConnectionHandle, ConnectionInput, ConnectionRegistry, MemoryConnector, ServiceHost,
};
use tracing::debug;

/// Name of the connection built from the `--host/--port/...` flags
pub const DEFAULT_CONNECTION: &str = "default";

/// Where connections come from, shared by every command
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// JSON file mapping connection names to parameters
    /// (`{"cache": {"host": "...", "port": 6379, "user": "...", "pass": "...", "ssl": false}}`)
    #[arg(long, env = "TEMPS_KV_CONNECTIONS")]
    pub connections: Option<PathBuf>,

    /// Redis host for the default connection
    #[arg(long, default_value = "localhost", env = "TEMPS_KV_HOST")]
    pub host: String,

    /// Redis port for the default connection
    #[arg(long, default_value_t = 6379, env = "TEMPS_KV_PORT")]
    pub port: u16,

    /// Redis user for the default connection
    #[arg(long, env = "TEMPS_KV_USER")]
    pub user: Option<String>,

    /// Redis password for the default connection
    #[arg(long, env = "TEMPS_KV_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Use TLS (rediss://) for the default connection
    #[arg(long, env = "TEMPS_KV_TLS")]
    pub tls: bool,

    /// Connect timeout in milliseconds for the default connection (0 disables it)
    #[arg(long, default_value_t = 5000, env = "TEMPS_KV_CONNECT_TIMEOUT_MS")]
    pub connect_timeout_ms: u64,

    /// Connection to run the command against
    #[arg(long, short = 'c', default_value = DEFAULT_CONNECTION)]
    pub connection: String,

    /// Use an in-process store instead of Redis
    #[arg(long)]
    pub dry_run: bool,
}

impl ConnectionArgs {
    /// Connection inputs by name
    pub fn load_inputs(&self) -> anyhow::Result<BTreeMap<String, ConnectionInput>> {
        match &self.connections {
            Some(path) => read_connections_file(path),
            None => Ok(BTreeMap::from([(
                DEFAULT_CONNECTION.to_string(),
                ConnectionInput {
                    host: Some(self.host.clone()),
                    port: Some(self.port),
                    user: self.user.clone(),
                    pass: self.password.clone(),
                    ssl: Some(self.tls),
                    connect_timeout_ms: Some(self.connect_timeout_ms),
                    query_timeout_ms: None,
                },
            )])),
        }
    }

    /// Mount a registry, run `f` with it, and always tear it down afterwards
    pub fn run<F, Fut, T>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let inputs = self.load_inputs()?;
        let registry = Arc::new(if self.dry_run {
            ConnectionRegistry::new(Arc::new(MemoryConnector::new()))
        } else {
            ConnectionRegistry::redis()
        });

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async {
            let mut host = ServiceHost::new();
            host.mount_service("connections", registry.clone()).await?;

            let session = Session {
                registry: registry.clone(),
                inputs,
                selected: self.connection.clone(),
            };
            let outcome = f(session).await;

            host.unmount_services().await;
            outcome
        })
    }
}

/// Registry plus the configured connection inputs
pub struct Session {
    pub registry: Arc<ConnectionRegistry>,
    pub inputs: BTreeMap<String, ConnectionInput>,
    pub selected: String,
}

impl Session {
    /// Handle for `name`, connecting on first use
    pub async fn connection(&self, name: &str) -> anyhow::Result<Arc<ConnectionHandle>> {
        let params = self.inputs.get(name).cloned().map(Into::into);
        debug!("Resolving connection '{}'", name);

        self.registry
            .get_connection(name, params)
            .await
            .with_context(|| format!("Connection '{}' is unavailable", name))
    }

    /// Handle for the connection picked with `--connection`
    pub async fn selected(&self) -> anyhow::Result<Arc<ConnectionHandle>> {
        self.connection(&self.selected).await
    }
}

fn read_connections_file(path: &Path) -> anyhow::Result<BTreeMap<String, ConnectionInput>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read connections file {}", path.display()))?;
    let inputs: BTreeMap<String, ConnectionInput> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid connections file {}", path.display()))?;

    if inputs.is_empty() {
        anyhow::bail!("Connections file {} defines no connections", path.display());
    }
    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        connection: ConnectionArgs,
    }

    fn parse(args: &[&str]) -> ConnectionArgs {
        let mut argv = vec!["temps-kv"];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).connection
    }

    #[test]
    fn test_flags_build_default_connection() {
        let args = parse(&["--host", "10.0.0.7", "--port", "6380", "--password", "pw"]);
        let inputs = args.load_inputs().unwrap();

        let input = &inputs[DEFAULT_CONNECTION];
        assert_eq!(input.host.as_deref(), Some("10.0.0.7"));
        assert_eq!(input.port, Some(6380));
        assert_eq!(input.pass.as_deref(), Some("pw"));
        assert_eq!(input.ssl, Some(false));
    }

    #[test]
    fn test_connections_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"cache": {{"host": "cache.internal"}}, "sessions": {{"port": 6390, "ssl": true}}}}"#
        )
        .unwrap();

        let args = parse(&["--connections", file.path().to_str().unwrap()]);
        let inputs = args.load_inputs().unwrap();

        assert_eq!(inputs.keys().collect::<Vec<_>>(), vec!["cache", "sessions"]);
        assert_eq!(inputs["sessions"].ssl, Some(true));
    }

    #[test]
    fn test_empty_connections_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{}}").unwrap();

        let args = parse(&["--connections", file.path().to_str().unwrap()]);
        assert!(args.load_inputs().is_err());
    }

    #[test]
    fn test_dry_run_session() {
        let args = parse(&["--dry-run"]);
        let value = args
            .run(|session| async move {
                let handle = session.selected().await?;
                handle.set("k", "v", None).await?;
                Ok(handle.get("k").await?)
            })
            .unwrap();
        assert_eq!(value.as_deref(), Some(&b"v"[..]));
    }

    #[test]
    fn test_unknown_connection_is_reported() {
        let args = parse(&["--dry-run", "--connection", "missing"]);
        let result = args.run(|session| async move {
            session.selected().await?;
            Ok(())
        });
        assert!(result.is_err());
    }
}
