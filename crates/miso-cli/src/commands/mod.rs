//! Command implementations and dispatch logic.

use camino::Utf8PathBuf;
use miso_config::{ConfigLoader, ConfigSource, MisoConfig};
use tracing::info;

use crate::output::OutputHandler;
use crate::Commands;

pub mod check;
pub mod serve;


/// Shared context for all commands
pub struct CommandContext {
    pub loader: ConfigLoader,
    pub verbose: bool,
    pub output: OutputHandler,
}

impl CommandContext {
    pub fn new(config_dirs: Vec<Utf8PathBuf>, verbose: bool) -> Self {
        Self {
            loader: ConfigLoader::new(config_dirs),
            verbose,
            output: OutputHandler::new(),
        }
    }

    /// Load and validate the configuration from the search directories
    pub async fn load_config(&self) -> anyhow::Result<(MisoConfig, ConfigSource)> {
        Ok(self.loader.load().await?)
    }

    /// Effective log level: `--verbose` forces debug
    pub fn log_level<'a>(&self, config: &'a MisoConfig) -> &'a str {
        if self.verbose {
            "debug"
        } else {
            &config.app.log_level
        }
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> anyhow::Result<()> {
    match command {
        Commands::Serve => serve::execute(ctx).await,
        Commands::Check => {
            info!("Checking configuration");
            check::execute(ctx).await
        }
    }
}
