use clap::Args;
use tracing::info;

use super::ConnectionArgs;

#[derive(Args)]
pub struct SetCommand {
    /// Key to write
    pub key: String,

    /// Value to store
    pub value: String,

    /// Expire the key after this many seconds
    #[arg(long)]
    pub ttl: Option<u64>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl SetCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        info!("Writing key '{}' (ttl: {:?})", self.key, self.ttl);

        self.connection.run(|session| async move {
            let handle = session.selected().await?;
            let ack = handle
                .set(&self.key, self.value.into_bytes(), self.ttl)
                .await?;
            println!("{}", String::from_utf8_lossy(&ack));
            Ok(())
        })
    }
}
