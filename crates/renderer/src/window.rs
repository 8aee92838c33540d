use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, ModifiersState, NamedKey};
use winit::window::{Window, WindowBuilder};

use tracing::{debug, error, info, warn};

use crate::compile::{load_fragment_source, prepare_fragment};
use crate::gpu::GpuState;
use crate::panel::StatusDisplay;
use crate::render_loop::{FrameHandle, FrameScheduler, RenderLoop, Viewport, VisualState};
use crate::seed::SeedController;
use crate::session::{KeyCode, KeyInput, KeyResponse, Session};
use crate::types::{RendererConfig, SetupError};
use crate::uniforms::UniformBridge;

/// Schedules frames by requesting redraws from winit.
///
/// Timestamps are milliseconds since the scheduler was created.
pub(crate) struct RedrawScheduler {
    window: Arc<Window>,
    origin: Instant,
    next_id: u64,
    pending: Option<FrameHandle>,
}

impl RedrawScheduler {
    pub(crate) fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            origin: Instant::now(),
            next_id: 0,
            pending: None,
        }
    }

    pub(crate) fn take_pending(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle::new(self.next_id);
        self.pending = Some(handle);
        self.window.request_redraw();
        handle
    }

    fn cancel(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
        }
    }

    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Shows the FPS readout and the selected panel control in the window title.
pub(crate) struct TitleDisplay {
    window: Arc<Window>,
    base: String,
    indicator: Option<String>,
    selection: Option<String>,
}

impl TitleDisplay {
    pub(crate) fn new(window: Arc<Window>, base: String) -> Self {
        Self {
            window,
            base,
            indicator: None,
            selection: None,
        }
    }

    fn refresh(&self) {
        let title = compose_title(
            &self.base,
            self.indicator.as_deref(),
            self.selection.as_deref(),
        );
        self.window.set_title(&title);
    }
}

impl StatusDisplay for TitleDisplay {
    fn show_indicator(&mut self, text: Option<&str>) {
        let text = text.map(str::to_string);
        if text != self.indicator {
            self.indicator = text;
            self.refresh();
        }
    }

    fn show_panel(&mut self, lines: Option<&[String]>) {
        let selection = lines.and_then(|lines| {
            lines
                .iter()
                .find_map(|line| line.strip_prefix("> ").map(str::to_string))
        });
        if let Some(lines) = lines {
            debug!(panel = %lines.join(" | "), "control panel");
        }
        if selection != self.selection {
            self.selection = selection;
            self.refresh();
        }
    }
}

fn compose_title(base: &str, indicator: Option<&str>, selection: Option<&str>) -> String {
    let mut title = base.to_string();
    for part in [indicator, selection].into_iter().flatten() {
        title.push_str(" — ");
        title.push_str(part);
    }
    title
}

fn key_code(key: &Key) -> Option<KeyCode> {
    match key {
        Key::Named(NamedKey::ArrowUp) => Some(KeyCode::Up),
        Key::Named(NamedKey::ArrowDown) => Some(KeyCode::Down),
        Key::Named(NamedKey::ArrowLeft) => Some(KeyCode::Left),
        Key::Named(NamedKey::ArrowRight) => Some(KeyCode::Right),
        Key::Named(NamedKey::Tab) => Some(KeyCode::Tab),
        Key::Named(NamedKey::Enter) => Some(KeyCode::Enter),
        Key::Named(NamedKey::Escape) => Some(KeyCode::Escape),
        Key::Named(NamedKey::Space) => Some(KeyCode::Char(' ')),
        Key::Character(value) => {
            let mut chars = value.chars();
            let ch = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            Some(KeyCode::Char(ch))
        }
        _ => None,
    }
}

/// Arrow keys auto-repeat so values can be swept; everything else fires once.
fn accepts_repeat(code: KeyCode) -> bool {
    matches!(
        code,
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right
    )
}

type WindowSession = Session<RedrawScheduler, TitleDisplay>;

fn build_session(
    window: &Arc<Window>,
    config: &RendererConfig,
) -> Result<(WindowSession, GpuState), SetupError> {
    let source = load_fragment_source(&config.shader)?;
    let prepared = prepare_fragment(&source);
    let gpu = GpuState::new(
        window.clone(),
        window.inner_size(),
        config.power,
        config.vsync,
        &prepared,
    )?;

    let size = gpu.size();
    let state = VisualState::new(
        config.parameters,
        UniformBridge::new(prepared.slots),
        SeedController::new(config.seed),
        config.fps_window,
        Viewport::new(size.width, size.height),
    );
    let render = RenderLoop::new(RedrawScheduler::new(window.clone()), state);
    let display = TitleDisplay::new(window.clone(), config.title.clone());
    Ok((Session::new(render, display, config.start_in_zen), gpu))
}

/// Opens the window and drives the session until it closes.
pub(crate) fn run_window(config: RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().map_err(SetupError::from)?;
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(PhysicalSize::new(
            config.surface_size.0,
            config.surface_size.1,
        ))
        .build(&event_loop)
        .map_err(SetupError::from)?;
    let window = Arc::new(window);

    let (mut session, mut gpu) = match build_session(&window, &config) {
        Ok(parts) => parts,
        Err(err) => {
            error!("failed to initialise renderer: {err}");
            return Err(err.into());
        }
    };

    info!(
        width = gpu.size().width,
        height = gpu.size().height,
        zen = config.start_in_zen,
        "window ready"
    );
    session.start();

    let mut modifiers = ModifiersState::empty();
    let mut failure = None;
    let run_result = event_loop.run(|event, elwt| {
        elwt.set_control_flow(ControlFlow::Wait);
        let Event::WindowEvent { window_id, event } = event else {
            return;
        };
        if window_id != window.id() {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                elwt.exit();
            }
            WindowEvent::ModifiersChanged(new_modifiers) => {
                modifiers = new_modifiers.state();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                let Some(code) = key_code(&event.logical_key) else {
                    return;
                };
                if event.repeat && !accepts_repeat(code) {
                    return;
                }
                let input = KeyInput {
                    code,
                    shift: modifiers.shift_key(),
                };
                match session.key(input) {
                    KeyResponse::Exit => elwt.exit(),
                    KeyResponse::Handled if !session.render().is_running() => {
                        window.request_redraw();
                    }
                    KeyResponse::Handled | KeyResponse::Ignored => {}
                }
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size);
                session.resize(new_size.width, new_size.height);
                if !session.render().is_running() {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => {
                let pending = session.render_mut().scheduler_mut().take_pending();
                let drawn = match pending {
                    Some(handle) => {
                        let now = session.render().scheduler().now_ms();
                        session.frame(handle, now, &mut gpu).map(|_| ())
                    }
                    None => session.render_mut().redraw(&mut gpu),
                };
                match drawn {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        gpu.resize(gpu.size());
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        error!("surface out of memory; closing window");
                        failure = Some(anyhow!("GPU surface ran out of memory"));
                        elwt.exit();
                    }
                    Err(other) => {
                        warn!(error = ?other, "surface error; retrying next frame");
                    }
                }
            }
            _ => {}
        }
    });

    if let Err(err) = run_result {
        return Err(anyhow!("window event loop error: {err}"));
    }
    match failure {
        Some(err) => Err(err),
        None => {
            info!("window closed");
            Ok(())
        }
    }
}
