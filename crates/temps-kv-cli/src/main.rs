//! temps-kv - inspect and edit keys on named Redis connections
//!
//! Connections come from a JSON file (`--connections`) or from the
//! `--host/--port/...` flags, which describe a single `default` connection.

mod commands;

use clap::{Parser, Subcommand};
use commands::{DelCommand, GetCommand, ListCommand, SetCommand};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", env = "TEMPS_KV_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "TEMPS_KV_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value stored under a key
    Get(GetCommand),
    /// Store a value under a key
    Set(SetCommand),
    /// Delete a key
    Del(DelCommand),
    /// Connect to every configured connection and list them
    List(ListCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // If RUST_LOG is set, use it directly; otherwise use our default filter
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()?
    } else {
        tracing_subscriber::EnvFilter::new(format!(
            "temps_kv_cli={level},\
             temps_kv_connections={level},\
             redis=warn",
            level = cli.log_level
        ))
    };

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        _ => tracing_subscriber::fmt::layer() // "compact" or any other value
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Get(cmd) => cmd.execute(),
        Commands::Set(cmd) => cmd.execute(),
        Commands::Del(cmd) => cmd.execute(),
        Commands::List(cmd) => cmd.execute(),
    }
}
