//! # miso-cli
//!
//! Terraform-compatible module and provider registry served from object storage.
//!
//! This is the entry point of the `miso` binary. It parses the command line,
//! installs the panic hook and dispatches to the command handlers; logging is
//! set up once the configuration that names the log level has been loaded.

use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use miso_config::LogFormat;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::CommandContext;
use output::OutputHandler;

/// Terraform registry backed by an S3-compatible bucket
#[derive(Parser, Debug)]
#[command(name = "miso", version, about = "Terraform registry over object storage")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory containing config.toml, searched before the defaults
    #[arg(long = "config-dir", value_name = "DIR", env = "MISO_CONFIG_DIR", global = true)]
    pub config_dirs: Vec<Utf8PathBuf>,

    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Serve the registry and health endpoints (default)
    Serve,
    /// Load and validate the configuration, then print the effective settings
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_panic_handler();

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            OutputHandler::new().report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create async runtime: {}", e))?;

    let ctx = CommandContext::new(cli.config_dirs, cli.verbose);
    runtime.block_on(commands::dispatch_command(
        cli.command.unwrap_or(Commands::Serve),
        &ctx,
    ))
}

/// Install the global subscriber
///
/// `RUST_LOG` wins when set; otherwise `level` applies to the miso crates.
pub fn setup_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "miso={level},miso_cli={level},miso_core={level},miso_config={level},miso_storage={level},miso_registry={level}",
            level = level
        ))
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    if let Err(e) = installed {
        eprintln!("miso: logging already initialised: {}", e);
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("miso encountered an unexpected error: {}", panic_info);
        eprintln!("miso crashed! This is a bug.");
        eprintln!("Error: {}", panic_info);
    }));
}
