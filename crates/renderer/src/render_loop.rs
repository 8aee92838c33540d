//! The self-rescheduling frame loop.
//!
//! `RenderLoop` is an explicit two-state machine. While `Running` it holds
//! at most one pending [`FrameHandle`]; a frame callback only renders when it
//! carries that handle, so anything delivered after `stop()` is dropped.
//!
//! ```text
//!   start() ──▶ reset + push_all ──▶ request_frame ─┐
//!                                                   ▼
//!   on_frame(handle) ─▶ clock.tick ─▶ push_frame_state ─▶ draw ─▶ request_frame
//! ```

use std::time::Duration;

use tracing::{info, trace};

use crate::clock::{FrameClock, FrameTiming};
use crate::params::{ParamId, ParameterSet};
use crate::seed::{RandomSeed, SeedController};
use crate::uniforms::{UniformBlock, UniformBridge};

/// Opaque token for one scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// "Call me before the next repaint" capability of the host environment.
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel(&mut self, handle: FrameHandle);
    /// Current value of the monotonic millisecond clock frames are stamped with.
    fn now_ms(&self) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Issues the fullscreen draw with the current uniforms.
pub trait DrawTarget {
    type Error;

    fn draw(&mut self, uniforms: &UniformBlock, viewport: Viewport) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Stopped,
    Running { pending: Option<FrameHandle> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// The callback was stale or arrived while stopped.
    Ignored,
    Rendered(FrameTiming),
}

/// A draw that failed after the clock had already advanced.
///
/// Carries the frame's timing so an FPS estimate closed by this tick is not lost.
#[derive(Debug)]
pub struct DrawFailure<E> {
    pub timing: FrameTiming,
    pub error: E,
}

/// Everything a frame reads: parameters, clock, seed, and the uniform mirror.
pub struct VisualState {
    params: ParameterSet,
    clock: FrameClock,
    seeds: SeedController,
    bridge: UniformBridge,
    uniforms: UniformBlock,
    viewport: Viewport,
}

impl VisualState {
    pub fn new(
        params: ParameterSet,
        bridge: UniformBridge,
        seeds: SeedController,
        fps_window: Duration,
        viewport: Viewport,
    ) -> Self {
        Self {
            params,
            clock: FrameClock::new(fps_window),
            seeds,
            bridge,
            uniforms: UniformBlock::new(viewport.width, viewport.height),
            viewport,
        }
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub fn uniforms(&self) -> &UniformBlock {
        &self.uniforms
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn seed(&self) -> RandomSeed {
        self.seeds.current()
    }

    /// Stores the value as given and pushes the full parameter set.
    pub fn set_param(&mut self, id: ParamId, value: f32) {
        self.params.set(id, value);
        self.push_parameters();
    }

    pub fn push_parameters(&mut self) {
        self.bridge.push_all(&self.params, &mut self.uniforms);
    }

    pub fn reset_pattern(&mut self) -> RandomSeed {
        self.seeds
            .reset_pattern(&mut self.clock, &self.bridge, &mut self.uniforms)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
    }

    fn advance(&mut self, raw_ms: f64) -> FrameTiming {
        let timing = self.clock.tick(raw_ms);
        self.bridge.push_frame_state(
            timing.seconds,
            self.viewport.width,
            self.viewport.height,
            &mut self.uniforms,
        );
        timing
    }
}

pub struct RenderLoop<S> {
    scheduler: S,
    playback: Playback,
    state: VisualState,
}

impl<S: FrameScheduler> RenderLoop<S> {
    pub fn new(scheduler: S, state: VisualState) -> Self {
        Self {
            scheduler,
            playback: Playback::Stopped,
            state,
        }
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    pub fn is_running(&self) -> bool {
        matches!(self.playback, Playback::Running { .. })
    }

    pub fn state(&self) -> &VisualState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut VisualState {
        &mut self.state
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    /// Starts the frame chain. Calling it while running does nothing.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.state.clock.resume_at(self.scheduler.now_ms());
        self.state.reset_pattern();
        self.state.push_parameters();
        let handle = self.scheduler.request_frame();
        self.playback = Playback::Running {
            pending: Some(handle),
        };
        info!("render loop started");
    }

    /// Stops the frame chain and cancels the pending callback, if any.
    pub fn stop(&mut self) {
        let Playback::Running { pending } = self.playback else {
            return;
        };
        if let Some(handle) = pending {
            self.scheduler.cancel(handle);
        }
        self.playback = Playback::Stopped;
        info!("render loop stopped");
    }

    pub fn toggle_playback(&mut self) -> bool {
        if self.is_running() {
            self.stop();
        } else {
            self.start();
        }
        self.is_running()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.state.resize(width, height);
    }

    /// Runs one tick for `handle` at `raw_ms`, then schedules the next.
    ///
    /// The next frame is requested even if the draw fails, so surface errors
    /// the caller recovers from do not end the loop.
    pub fn on_frame<T: DrawTarget>(
        &mut self,
        handle: FrameHandle,
        raw_ms: f64,
        target: &mut T,
    ) -> Result<FrameOutcome, DrawFailure<T::Error>> {
        match self.playback {
            Playback::Running { pending: Some(expected) } if expected == handle => {}
            _ => {
                trace!(frame = handle.id(), "dropping stale frame callback");
                return Ok(FrameOutcome::Ignored);
            }
        }
        self.playback = Playback::Running { pending: None };

        let timing = self.state.advance(raw_ms);
        let drawn = target.draw(&self.state.uniforms, self.state.viewport);

        if self.is_running() {
            let next = self.scheduler.request_frame();
            self.playback = Playback::Running {
                pending: Some(next),
            };
        }

        match drawn {
            Ok(()) => Ok(FrameOutcome::Rendered(timing)),
            Err(error) => Err(DrawFailure { timing, error }),
        }
    }

    /// Repaints the last frame without advancing time (e.g. on expose while stopped).
    pub fn redraw<T: DrawTarget>(&mut self, target: &mut T) -> Result<(), T::Error> {
        target.draw(&self.state.uniforms, self.state.viewport)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Default)]
    pub struct ManualScheduler {
        pub now: f64,
        pub next_id: u64,
        pub pending: Option<FrameHandle>,
        pub requested: usize,
        pub cancelled: Vec<FrameHandle>,
    }

    impl ManualScheduler {
        pub fn take_pending(&mut self) -> Option<FrameHandle> {
            self.pending.take()
        }
    }

    impl FrameScheduler for ManualScheduler {
        fn request_frame(&mut self) -> FrameHandle {
            self.next_id += 1;
            self.requested += 1;
            let handle = FrameHandle::new(self.next_id);
            self.pending = Some(handle);
            handle
        }

        fn cancel(&mut self, handle: FrameHandle) {
            if self.pending == Some(handle) {
                self.pending = None;
            }
            self.cancelled.push(handle);
        }

        fn now_ms(&self) -> f64 {
            self.now
        }
    }

    #[derive(Debug, Default)]
    pub struct RecordingTarget {
        pub draws: Vec<(UniformBlock, Viewport)>,
    }

    impl DrawTarget for RecordingTarget {
        type Error = std::convert::Infallible;

        fn draw(&mut self, uniforms: &UniformBlock, viewport: Viewport) -> Result<(), Self::Error> {
            self.draws.push((*uniforms, viewport));
            Ok(())
        }
    }

    pub fn visual_state(width: u32, height: u32) -> VisualState {
        VisualState::new(
            ParameterSet::default(),
            UniformBridge::new(crate::uniforms::SlotTable::all()),
            SeedController::new(Some(7)),
            crate::clock::DEFAULT_FPS_WINDOW,
            Viewport::new(width, height),
        )
    }

    /// Delivers the pending callback at `at_ms`, as the host would.
    pub fn pump(
        render: &mut RenderLoop<ManualScheduler>,
        target: &mut RecordingTarget,
        at_ms: f64,
    ) -> FrameOutcome {
        render.scheduler_mut().now = at_ms;
        let handle = render
            .scheduler_mut()
            .take_pending()
            .expect("a frame should be pending");
        match render.on_frame(handle, at_ms, target) {
            Ok(outcome) => outcome,
            Err(failure) => match failure.error {},
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SurfaceGone;

    /// Fails the draws whose 1-based index is listed in `fail_on`.
    #[derive(Debug, Default)]
    pub struct FlakyTarget {
        pub fail_on: Vec<usize>,
        pub attempts: usize,
        pub draws: Vec<(UniformBlock, Viewport)>,
    }

    impl DrawTarget for FlakyTarget {
        type Error = SurfaceGone;

        fn draw(&mut self, uniforms: &UniformBlock, viewport: Viewport) -> Result<(), Self::Error> {
            self.attempts += 1;
            if self.fail_on.contains(&self.attempts) {
                return Err(SurfaceGone);
            }
            self.draws.push((*uniforms, viewport));
            Ok(())
        }
    }
}
