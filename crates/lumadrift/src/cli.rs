use std::path::PathBuf;

use clap::Parser;
use driftconfig::PowerSetting;

#[derive(Parser, Debug)]
#[command(
    name = "lumadrift",
    author,
    version,
    about = "Real-time shader visualizer with a live parameter panel"
)]
pub struct Cli {
    /// Fragment shader defining `mainImage` to render instead of the bundled pattern.
    #[arg(long, value_name = "PATH")]
    pub shader: Option<PathBuf>,

    /// Configuration file (defaults to `lumadrift.toml` in the config directory, if present).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Initial window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Seed the pattern RNG for a reproducible sequence of refreshes.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Present without waiting for vertical sync.
    #[arg(long)]
    pub no_vsync: bool,

    /// GPU adapter preference: `low` or `high`.
    #[arg(long, value_name = "low|high", value_parser = parse_power)]
    pub power: Option<PowerSetting>,

    /// Start with the panel and FPS readout hidden.
    #[arg(long)]
    pub zen: bool,

    /// Print the resolved configuration as TOML and exit without opening a window.
    #[arg(long)]
    pub print_config: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".to_string());
    }
    Ok((width, height))
}

pub fn parse_power(value: &str) -> Result<PowerSetting, String> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "low" | "low-power" | "integrated" => Ok(PowerSetting::Low),
        "high" | "high-performance" | "discrete" => Ok(PowerSetting::High),
        "" => Err("power preference must not be empty".to_string()),
        other => Err(format!(
            "unknown power preference '{other}'; expected low or high"
        )),
    }
}
