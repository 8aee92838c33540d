use std::path::PathBuf;
use std::time::Duration;

use crate::clock::DEFAULT_FPS_WINDOW;
use crate::params::ParameterSet;

/// Where the fragment shader comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShaderSource {
    /// The pattern compiled into the binary.
    #[default]
    Bundled,
    File(PathBuf),
}

/// Adapter power preference requested from wgpu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

/// Immutable configuration passed to the renderer at start-up.
///
/// Mirrors the resolved CLI flags and config file of the binary.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    pub title: String,
    pub shader: ShaderSource,
    /// Starting values for every tunable parameter.
    pub parameters: ParameterSet,
    /// Length of one FPS measurement window.
    pub fps_window: Duration,
    /// Fixed RNG seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub vsync: bool,
    pub power: GpuPowerPreference,
    pub start_in_zen: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            title: "lumadrift".to_string(),
            shader: ShaderSource::Bundled,
            parameters: ParameterSet::default(),
            fps_window: DEFAULT_FPS_WINDOW,
            seed: None,
            vsync: true,
            power: GpuPowerPreference::High,
            start_in_zen: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShaderStageKind::Vertex => f.write_str("vertex"),
            ShaderStageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Failures that prevent rendering from ever starting.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to open window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("failed to create rendering surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to find a suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats for this adapter")]
    NoSurfaceFormat,
    #[error("failed to read shader at {path}: {source}")]
    ReadShader {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} shader failed to compile:\n{message}")]
    ShaderCompile {
        stage: ShaderStageKind,
        message: String,
    },
    #[error("failed to link render pipeline:\n{0}")]
    PipelineLink(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_errors_name_the_stage() {
        let err = SetupError::ShaderCompile {
            stage: ShaderStageKind::Fragment,
            message: "0:12: 'foo' : undeclared identifier".into(),
        };
        let text = err.to_string();
        assert!(text.starts_with("fragment shader failed to compile"));
        assert!(text.contains("undeclared identifier"));
    }

    #[test]
    fn default_config_uses_bundled_shader() {
        let config = RendererConfig::default();
        assert_eq!(config.shader, ShaderSource::Bundled);
        assert_eq!(config.fps_window, Duration::from_millis(500));
        assert!(config.vsync);
    }
}
