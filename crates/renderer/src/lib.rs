//! Renderer crate for lumadrift.
//!
//! Renders a fullscreen animated fragment shader in a desktop window and
//! exposes its tunable parameters through a keyboard-driven panel. The
//! overall flow is:
//!
//! ```text
//!   lumadrift CLI
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ Session ──▶ winit event loop ──▶ RenderLoop::on_frame
//!                        │                                   │
//!                        └─ ControlPanel / Overlay           └─▶ UniformBridge ─▶ GPU UBO
//! ```
//!
//! Everything above the GPU sits behind small traits ([`FrameScheduler`],
//! [`DrawTarget`], [`UniformSink`], [`StatusDisplay`]) so the loop, the clock
//! and the control surface run headless in tests. The wgpu backend and the
//! winit window only exist inside [`Renderer::run`].

mod clock;
mod compile;
mod gpu;
mod panel;
mod params;
mod render_loop;
mod seed;
mod session;
mod types;
mod uniforms;
mod window;

use anyhow::Result;

pub use clock::{
    fps_for_window, ClockState, FpsCounter, FrameClock, FrameTiming, DEFAULT_FPS_WINDOW,
    TIME_CONVERSION,
};
pub use compile::{
    load_fragment_source, prepare_fragment, referenced_uniforms, PreparedShader, BUNDLED_FRAGMENT,
};
pub use panel::{Control, ControlGroup, ControlPanel, Overlay, PanelAction, PanelChange, StatusDisplay};
pub use params::{
    Domain, ParamError, ParamGroup, ParamId, ParamSpec, ParameterSet, COLOR_TINT_KEY, PARAMS,
};
pub use render_loop::{
    DrawFailure, DrawTarget, FrameHandle, FrameOutcome, FrameScheduler, Playback, RenderLoop,
    Viewport, VisualState,
};
pub use seed::{RandomSeed, SeedController};
pub use session::{KeyCode, KeyInput, KeyResponse, Session};
pub use types::{
    GpuPowerPreference, RendererConfig, SetupError, ShaderSource, ShaderStageKind,
};
pub use uniforms::{SlotTable, Uniform, UniformBlock, UniformBridge, UniformSink};

/// Entry point that owns the configuration for one window session.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the window and blocks until it is closed.
    pub fn run(self) -> Result<()> {
        tracing::info!(
            width = self.config.surface_size.0,
            height = self.config.surface_size.1,
            shader = ?self.config.shader,
            "starting lumadrift renderer"
        );
        window::run_window(self.config)
    }
}
