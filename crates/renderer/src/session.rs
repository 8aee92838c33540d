//! Input handling on top of the render loop.
//!
//! A `Session` owns the loop, the panel and the overlay and routes key
//! presses, resizes and frame callbacks between them. It knows nothing about
//! winit; the window runtime translates its events into [`KeyInput`].

use tracing::info;

use crate::panel::{ControlPanel, Overlay, PanelAction, StatusDisplay};
use crate::render_loop::{DrawTarget, FrameHandle, FrameOutcome, FrameScheduler, RenderLoop};
use crate::seed::RandomSeed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Tab,
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub code: KeyCode,
    pub shift: bool,
}

impl KeyInput {
    pub fn new(code: KeyCode) -> Self {
        Self { code, shift: false }
    }

    pub fn shifted(code: KeyCode) -> Self {
        Self { code, shift: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResponse {
    Handled,
    Ignored,
    Exit,
}

const COARSE_STEPS: i32 = 10;

pub struct Session<S, D> {
    render: RenderLoop<S>,
    panel: ControlPanel,
    overlay: Overlay,
    display: D,
}

impl<S: FrameScheduler, D: StatusDisplay> Session<S, D> {
    pub fn new(render: RenderLoop<S>, display: D, start_in_zen: bool) -> Self {
        Self {
            render,
            panel: ControlPanel::new(),
            overlay: Overlay::new(start_in_zen),
            display,
        }
    }

    pub fn render(&self) -> &RenderLoop<S> {
        &self.render
    }

    pub fn render_mut(&mut self) -> &mut RenderLoop<S> {
        &mut self.render
    }

    pub fn panel(&self) -> &ControlPanel {
        &self.panel
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn start(&mut self) {
        self.render.start();
        self.sync_indicator();
        self.sync_panel();
    }

    /// Forwards a frame callback to the loop and publishes any new FPS estimate.
    pub fn frame<T: DrawTarget>(
        &mut self,
        handle: FrameHandle,
        raw_ms: f64,
        target: &mut T,
    ) -> Result<FrameOutcome, T::Error> {
        match self.render.on_frame(handle, raw_ms, target) {
            Ok(outcome) => {
                if let FrameOutcome::Rendered(timing) = outcome {
                    self.publish_fps(timing.fps);
                }
                Ok(outcome)
            }
            Err(failure) => {
                self.publish_fps(failure.timing.fps);
                Err(failure.error)
            }
        }
    }

    fn publish_fps(&mut self, fps: Option<u32>) {
        if let Some(fps) = fps {
            self.overlay.set_fps(fps);
            self.sync_indicator();
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.render.resize(width, height);
    }

    pub fn toggle_zen(&mut self) -> bool {
        let zen = self.overlay.toggle_zen();
        info!(zen, "zen mode toggled");
        self.sync_indicator();
        self.sync_panel();
        zen
    }

    pub fn refresh_pattern(&mut self) -> RandomSeed {
        let seed = self.render.state_mut().reset_pattern();
        info!("pattern refreshed");
        seed
    }

    pub fn key(&mut self, input: KeyInput) -> KeyResponse {
        match input.code {
            KeyCode::Escape => return KeyResponse::Exit,
            KeyCode::Char('z' | 'Z') => {
                self.toggle_zen();
            }
            KeyCode::Char('r' | 'R') => {
                self.refresh_pattern();
            }
            KeyCode::Char(' ') => {
                let running = self.render.toggle_playback();
                info!(running, "playback toggled");
            }
            KeyCode::Tab if self.overlay.panel_visible() => {
                self.panel.toggle_expanded();
                self.sync_panel();
            }
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Enter
                if self.panel_active() =>
            {
                self.panel_key(input);
            }
            _ => return KeyResponse::Ignored,
        }
        KeyResponse::Handled
    }

    fn panel_active(&self) -> bool {
        self.overlay.panel_visible() && self.panel.is_expanded()
    }

    fn panel_key(&mut self, input: KeyInput) {
        let steps = if input.shift { COARSE_STEPS } else { 1 };
        match input.code {
            KeyCode::Up => self.panel.select_next(-1),
            KeyCode::Down => self.panel.select_next(1),
            KeyCode::Left => {
                self.panel.adjust(self.render.state_mut(), -steps);
            }
            KeyCode::Right => {
                self.panel.adjust(self.render.state_mut(), steps);
            }
            KeyCode::Enter => match self.panel.activate() {
                Some(PanelAction::RefreshPattern) => {
                    self.refresh_pattern();
                }
                Some(PanelAction::ToggleZen) => {
                    self.toggle_zen();
                    return;
                }
                None => {}
            },
            _ => {}
        }
        self.sync_panel();
    }

    fn sync_indicator(&mut self) {
        if self.overlay.indicator_visible() {
            let text = self.overlay.fps_text();
            self.display.show_indicator(Some(&text));
        } else {
            self.display.show_indicator(None);
        }
    }

    fn sync_panel(&mut self) {
        if self.overlay.panel_visible() {
            let lines = self.panel.lines(self.render.state());
            self.display.show_panel(Some(&lines));
        } else {
            self.display.show_panel(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamId;
    use crate::render_loop::testing::{
        visual_state, FlakyTarget, ManualScheduler, RecordingTarget, SurfaceGone,
    };

    #[derive(Debug, Default)]
    struct RecordingDisplay {
        indicator: Option<String>,
        panel: Option<Vec<String>>,
    }

    impl StatusDisplay for RecordingDisplay {
        fn show_indicator(&mut self, text: Option<&str>) {
            self.indicator = text.map(str::to_string);
        }

        fn show_panel(&mut self, lines: Option<&[String]>) {
            self.panel = lines.map(<[String]>::to_vec);
        }
    }

    fn session(zen: bool) -> Session<ManualScheduler, RecordingDisplay> {
        let render = RenderLoop::new(ManualScheduler::default(), visual_state(800, 600));
        let mut session = Session::new(render, RecordingDisplay::default(), zen);
        session.start();
        session
    }

    fn pump_session(
        session: &mut Session<ManualScheduler, RecordingDisplay>,
        target: &mut RecordingTarget,
        at_ms: f64,
    ) -> FrameOutcome {
        session.render_mut().scheduler_mut().now = at_ms;
        let handle = session
            .render_mut()
            .scheduler_mut()
            .take_pending()
            .expect("a frame should be pending");
        match session.frame(handle, at_ms, target) {
            Ok(outcome) => outcome,
            Err(never) => match never {},
        }
    }

    #[test]
    fn thirty_frames_in_half_a_second_show_sixty_fps() {
        let mut session = session(false);
        let mut target = RecordingTarget::default();
        for frame in 1..=30u32 {
            pump_session(&mut session, &mut target, f64::from(frame) * 500.0 / 30.0);
        }
        assert_eq!(target.draws.len(), 30);
        assert_eq!(session.display().indicator.as_deref(), Some("FPS: 60"));
    }

    #[test]
    fn fps_survives_a_failed_draw_that_closes_the_window() {
        let mut session = session(false);
        let mut target = FlakyTarget {
            fail_on: vec![30],
            ..FlakyTarget::default()
        };
        for frame in 1..=30u32 {
            let at_ms = f64::from(frame) * 500.0 / 30.0;
            session.render_mut().scheduler_mut().now = at_ms;
            let handle = session
                .render_mut()
                .scheduler_mut()
                .take_pending()
                .expect("a frame should be pending");
            let result = session.frame(handle, at_ms, &mut target);
            if frame == 30 {
                assert_eq!(result.unwrap_err(), SurfaceGone);
            } else {
                assert!(result.is_ok());
            }
        }
        assert_eq!(target.draws.len(), 29);
        assert_eq!(session.display().indicator.as_deref(), Some("FPS: 60"));
        assert!(session.render().scheduler().pending.is_some());
    }

    #[test]
    fn zen_twice_restores_visibility() {
        let mut session = session(false);
        assert!(session.display().indicator.is_some());
        assert!(session.display().panel.is_some());

        assert_eq!(session.key(KeyInput::new(KeyCode::Char('z'))), KeyResponse::Handled);
        assert!(session.display().indicator.is_none());
        assert!(session.display().panel.is_none());

        session.key(KeyInput::new(KeyCode::Char('Z')));
        assert!(session.display().indicator.is_some());
        assert!(session.display().panel.is_some());
    }

    #[test]
    fn starting_in_zen_hides_overlay() {
        let session = session(true);
        assert!(session.display().indicator.is_none());
        assert!(session.display().panel.is_none());
    }

    #[test]
    fn panel_keys_require_expanded_panel() {
        let mut session = session(false);
        assert_eq!(session.key(KeyInput::new(KeyCode::Right)), KeyResponse::Ignored);

        session.key(KeyInput::new(KeyCode::Tab));
        session.key(KeyInput::shifted(KeyCode::Right));
        let speed = session.render().state().params().time_scale;
        assert!((speed - 0.9).abs() < 1e-5);
        assert_eq!(session.render().state().uniforms().time_scale, speed);
        assert!(session
            .display()
            .panel
            .as_ref()
            .is_some_and(|lines| lines.contains(&"> Speed: 0.90".to_string())));
    }

    #[test]
    fn enter_on_zen_button_toggles_zen() {
        let mut session = session(false);
        session.key(KeyInput::new(KeyCode::Tab));
        session.key(KeyInput::new(KeyCode::Up));
        session.key(KeyInput::new(KeyCode::Enter));
        assert!(session.overlay().is_zen());
        // panel keys are inert while hidden
        assert_eq!(session.key(KeyInput::new(KeyCode::Enter)), KeyResponse::Ignored);
    }

    #[test]
    fn refresh_changes_seed_and_restarts_time() {
        let mut session = session(false);
        let mut target = RecordingTarget::default();
        pump_session(&mut session, &mut target, 16.0);
        pump_session(&mut session, &mut target, 3_000.0);
        let before = session.render().state().seed();

        session.key(KeyInput::new(KeyCode::Char('r')));
        assert_ne!(session.render().state().seed(), before);
        assert_eq!(
            session.render().state().uniforms().seed,
            session.render().state().seed().values()
        );
        let FrameOutcome::Rendered(timing) = pump_session(&mut session, &mut target, 3_000.0)
        else {
            panic!("frame should render");
        };
        assert_eq!(timing.adjusted_ms, 0.0);
    }

    #[test]
    fn space_pauses_and_resumes() {
        let mut session = session(false);
        session.key(KeyInput::new(KeyCode::Char(' ')));
        assert!(!session.render().is_running());
        session.key(KeyInput::new(KeyCode::Char(' ')));
        assert!(session.render().is_running());
        assert!(session.render().scheduler().pending.is_some());
    }

    #[test]
    fn escape_requests_exit() {
        let mut session = session(false);
        assert_eq!(session.key(KeyInput::new(KeyCode::Escape)), KeyResponse::Exit);
        assert_eq!(session.key(KeyInput::new(KeyCode::Char('q'))), KeyResponse::Ignored);
    }

    #[test]
    fn panel_change_pushes_new_value() {
        let mut session = session(false);
        session.key(KeyInput::new(KeyCode::Tab));
        for _ in 0..4 {
            session.key(KeyInput::new(KeyCode::Down));
        }
        session.key(KeyInput::new(KeyCode::Left));
        let state = session.render().state();
        assert_eq!(state.params().get(ParamId::Saturation), state.uniforms().saturation);
        assert!((state.params().saturation - 0.8).abs() < 1e-5);
    }
}
