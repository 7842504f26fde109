use clap::Args;
use colored::Colorize;
use tracing::warn;

use super::ConnectionArgs;

#[derive(Args)]
pub struct ListCommand {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

impl ListCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        self.connection.run(|session| async move {
            let mut failed = Vec::new();
            for name in session.inputs.keys() {
                if let Err(e) = session.connection(name).await {
                    warn!("{:#}", e);
                    failed.push(name.clone());
                }
            }

            for name in session.registry.list_names().await {
                let handle = session.registry.get_connection(&name, None).await?;
                println!(
                    "{} {} {}",
                    "●".bright_green(),
                    name.bold(),
                    format!("({}, {})", handle.identity(), handle.state().await).dimmed()
                );
            }
            for name in failed {
                println!("{} {}", "●".bright_red(), name.bold());
            }
            Ok(())
        })
    }
}
