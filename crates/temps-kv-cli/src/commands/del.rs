use clap::Args;
use tracing::info;

use super::ConnectionArgs;

#[derive(Args)]
pub struct DelCommand {
    /// Key to delete
    pub key: String,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl DelCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        info!("Deleting key '{}'", self.key);

        self.connection.run(|session| async move {
            let handle = session.selected().await?;
            let removed = handle.delete(&self.key).await?;
            println!("(integer) {}", u8::from(removed));
            Ok(())
        })
    }
}
