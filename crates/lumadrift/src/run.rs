use std::io::Write;

use anyhow::{Context, Result};
use renderer::Renderer;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::paths::AppPaths;
use crate::settings::{apply_cli, load_config, renderer_config};

pub fn run(cli: Cli) -> Result<()> {
    let paths = AppPaths::discover()?;
    tracing::debug!(config_dir = %paths.config_dir().display(), "resolved application paths");

    let mut config = load_config(&cli, &paths)?;
    apply_cli(&mut config, &cli);
    config.validate().context("invalid configuration")?;
    let renderer_config = renderer_config(&config, cli.zen)?;

    if cli.print_config {
        let text = config.to_toml_string()?;
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(text.as_bytes())
            .context("failed to write configuration to stdout")?;
        return Ok(());
    }

    tracing::info!(
        seed = ?renderer_config.seed,
        vsync = renderer_config.vsync,
        zen = renderer_config.start_in_zen,
        "bootstrapping lumadrift"
    );
    Renderer::new(renderer_config).run()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
