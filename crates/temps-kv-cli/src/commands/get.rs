use clap::Args;
use colored::Colorize;
use tracing::info;

use super::ConnectionArgs;

#[derive(Args)]
pub struct GetCommand {
    /// Key to read
    pub key: String,

    /// Decode the value as JSON and pretty-print it
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl GetCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        info!("Reading key '{}'", self.key);

        self.connection.run(|session| async move {
            let handle = session.selected().await?;

            if self.json {
                match handle.get_json::<serde_json::Value>(&self.key).await? {
                    Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                    None => println!("{}", "(nil)".dimmed()),
                }
                return Ok(());
            }

            match handle.get(&self.key).await? {
                Some(value) => println!("{}", String::from_utf8_lossy(&value)),
                None => println!("{}", "(nil)".dimmed()),
            }
            Ok(())
        })
    }
}
