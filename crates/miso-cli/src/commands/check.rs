//! `miso check`: validate the configuration without starting any server

use miso_config::{ConfigSource, MisoConfig};

use super::CommandContext;

pub async fn execute(ctx: &CommandContext) -> anyhow::Result<()> {
    let (config, source) = ctx.load_config().await?;

    ctx.output.success("Configuration is valid");
    for line in summary(&config, &source) {
        ctx.output.info(&line);
    }
    Ok(())
}

/// Human-readable effective settings, one per line
pub fn summary(config: &MisoConfig, source: &ConfigSource) -> Vec<String> {
    let mut lines = match source {
        ConfigSource::File(path) => vec![format!("  source:        {}", path)],
        ConfigSource::FileWithEnvironment(path, vars) => vec![format!(
            "  source:        {} (overridden by {})",
            path,
            vars.join(", ")
        )],
    };

    lines.push(format!("  registry:      {}", config.app.listen_addr()));
    lines.push(format!("  health:        {}", config.health_addr()));
    lines.push(format!("  bucket:        {}", config.s3.bucket));
    if let Some(endpoint) = &config.s3.endpoint {
        lines.push(format!("  endpoint:      {}", endpoint));
    }
    if let Some(region) = &config.s3.region {
        lines.push(format!("  region:        {}", region));
    }
    lines.push(format!("  download mode: {}", config.s3.download_mode));
    lines
}
