//! Resolution order: CLI flags, then the config file, then built-in defaults.

use anyhow::{Context, Result};
use driftconfig::{Config, ParamValue, PowerSetting};
use renderer::{
    GpuPowerPreference, ParamError, ParameterSet, RendererConfig, ShaderSource, COLOR_TINT_KEY,
};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::paths::AppPaths;

/// Loads `--config` if given, else the default config file when it exists.
pub fn load_config(cli: &Cli, paths: &AppPaths) -> Result<Config> {
    if let Some(path) = &cli.config {
        let config = Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
        info!(path = %path.display(), "loaded configuration");
        return Ok(config);
    }

    let default_path = paths.config_file();
    if default_path.is_file() {
        let config = Config::load(&default_path)
            .with_context(|| format!("failed to load config {}", default_path.display()))?;
        info!(path = %default_path.display(), "loaded configuration");
        return Ok(config);
    }

    debug!(path = %default_path.display(), "no config file; using defaults");
    Ok(Config::default())
}

pub fn apply_cli(config: &mut Config, cli: &Cli) {
    if let Some(path) = &cli.shader {
        config.render.shader = Some(path.clone());
    }
    if let Some((width, height)) = cli.size {
        config.window.width = width;
        config.window.height = height;
    }
    if let Some(seed) = cli.seed {
        config.render.seed = Some(seed);
    }
    if cli.no_vsync {
        config.render.vsync = false;
    }
    if let Some(power) = cli.power {
        config.render.power = power;
    }
}

/// Builds the parameter set, rejecting unknown names and out-of-domain values.
pub fn resolve_parameters(config: &Config) -> Result<ParameterSet, ParamError> {
    let mut params = ParameterSet::default();
    for (key, value) in &config.parameters {
        match *value {
            ParamValue::Scalar(v) if key == COLOR_TINT_KEY => {
                let v = v as f32;
                params.set_color_tint([v, v, v])?;
            }
            ParamValue::Scalar(v) => params.set_by_key(key, v as f32)?,
            ParamValue::Color([r, g, b]) if key == COLOR_TINT_KEY => {
                params.set_color_tint([r as f32, g as f32, b as f32])?;
            }
            ParamValue::Color(_) => {
                // surface unknown names before the shape mismatch
                if renderer::ParamId::from_key(key).is_none() {
                    return Err(ParamError::Unknown(key.clone()));
                }
                return Err(ParamError::ExpectedScalar(key.clone()));
            }
        }
    }
    Ok(params)
}

pub fn renderer_config(config: &Config, start_in_zen: bool) -> Result<RendererConfig> {
    let parameters = resolve_parameters(config).context("invalid [parameters] entry")?;
    let shader = match &config.render.shader {
        Some(path) => ShaderSource::File(path.clone()),
        None => ShaderSource::Bundled,
    };
    let power = match config.render.power {
        PowerSetting::Low => GpuPowerPreference::Low,
        PowerSetting::High => GpuPowerPreference::High,
    };

    Ok(RendererConfig {
        surface_size: (config.window.width, config.window.height),
        title: config.window.title.clone(),
        shader,
        parameters,
        fps_window: config.clock.fps_window,
        seed: config.render.seed,
        vsync: config.render.vsync,
        power,
        start_in_zen,
    })
}
