use std::time::Duration;

use tracing::debug;

/// Converts adjusted milliseconds into shader time units. Independent of the
/// user-facing `timeScale` uniform, which the shader applies on top.
pub const TIME_CONVERSION: f64 = 0.0035;

pub const DEFAULT_FPS_WINDOW: Duration = Duration::from_millis(500);

/// Latest observed timestamp and the offset subtracted from it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClockState {
    raw_timestamp: Option<f64>,
    time_offset: f64,
}

impl ClockState {
    pub fn raw_timestamp(&self) -> Option<f64> {
        self.raw_timestamp
    }

    pub fn time_offset(&self) -> f64 {
        self.time_offset
    }

    pub fn observe(&mut self, raw_ms: f64) {
        self.raw_timestamp = Some(raw_ms);
    }

    /// Snaps the offset to the latest timestamp, or zero before the first frame.
    pub fn rebase(&mut self) {
        self.time_offset = self.raw_timestamp.unwrap_or(0.0);
    }

    pub fn adjusted(&self, raw_ms: f64) -> f64 {
        (raw_ms - self.time_offset).max(0.0)
    }
}

pub fn fps_for_window(frames: u32, elapsed_ms: f64) -> u32 {
    (f64::from(frames) * 1000.0 / elapsed_ms).round() as u32
}

/// Frames-per-second estimate over fixed wall-clock windows.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_ms: f64,
    frame_count: u32,
    window_start: Option<f64>,
    current_fps: Option<u32>,
}

impl FpsCounter {
    pub fn new(window: Duration) -> Self {
        Self {
            window_ms: window.as_secs_f64() * 1000.0,
            frame_count: 0,
            window_start: None,
            current_fps: None,
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn window_start(&self) -> Option<f64> {
        self.window_start
    }

    pub fn current_fps(&self) -> Option<u32> {
        self.current_fps
    }

    /// Opens a fresh measurement window at `at_ms` with no frames counted.
    pub fn begin_window(&mut self, at_ms: f64) {
        self.window_start = Some(at_ms);
        self.frame_count = 0;
    }

    /// Counts a frame; returns the new estimate when the window closes.
    ///
    /// A frame arriving with no open window only opens one: frames are the
    /// intervals measured from that reference point.
    pub fn record(&mut self, raw_ms: f64) -> Option<u32> {
        let Some(start) = self.window_start else {
            self.begin_window(raw_ms);
            return None;
        };

        self.frame_count += 1;
        let elapsed = raw_ms - start;
        if elapsed < self.window_ms {
            return None;
        }

        let fps = fps_for_window(self.frame_count, elapsed);
        debug!(fps, frames = self.frame_count, elapsed_ms = elapsed, "render stats");
        self.current_fps = Some(fps);
        self.begin_window(raw_ms);
        Some(fps)
    }
}

/// Timing derived for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTiming {
    pub adjusted_ms: f64,
    pub seconds: f32,
    pub fps: Option<u32>,
}

pub struct FrameClock {
    state: ClockState,
    fps: FpsCounter,
}

impl FrameClock {
    pub fn new(fps_window: Duration) -> Self {
        Self {
            state: ClockState::default(),
            fps: FpsCounter::new(fps_window),
        }
    }

    pub fn state(&self) -> &ClockState {
        &self.state
    }

    pub fn fps(&self) -> &FpsCounter {
        &self.fps
    }

    pub fn tick(&mut self, raw_ms: f64) -> FrameTiming {
        self.state.observe(raw_ms);
        let adjusted_ms = self.state.adjusted(raw_ms);
        let seconds = (adjusted_ms * TIME_CONVERSION) as f32;
        let fps = self.fps.record(raw_ms);
        FrameTiming {
            adjusted_ms,
            seconds,
            fps,
        }
    }

    pub fn reset_offset(&mut self) {
        self.state.rebase();
    }

    /// Records `now_ms` as the latest timestamp and restarts FPS measurement
    /// from it. Used when playback (re)starts so a paused span is neither
    /// animated nor counted.
    pub fn resume_at(&mut self, now_ms: f64) {
        self.state.observe(now_ms);
        self.fps.begin_window(now_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_formula_rounds_to_nearest() {
        assert_eq!(fps_for_window(30, 500.0), 60);
        assert_eq!(fps_for_window(1, 1000.0), 1);
        assert_eq!(fps_for_window(29, 500.0), 58);
        assert_eq!(fps_for_window(59, 1001.0), 59);
    }

    #[test]
    fn first_tick_opens_window_without_estimate() {
        let mut clock = FrameClock::new(DEFAULT_FPS_WINDOW);
        let timing = clock.tick(1_000.0);
        assert_eq!(timing.fps, None);
        assert_eq!(clock.fps().window_start(), Some(1_000.0));
        assert_eq!(clock.fps().frame_count(), 0);
    }

    #[test]
    fn window_closes_after_fixed_duration() {
        let mut clock = FrameClock::new(DEFAULT_FPS_WINDOW);
        clock.tick(0.0);
        let mut reported = Vec::new();
        for frame in 1..=30u32 {
            let t = f64::from(frame) * 500.0 / 30.0;
            if let Some(fps) = clock.tick(t).fps {
                reported.push((frame, fps));
            }
        }
        assert_eq!(reported, vec![(30, 60)]);
        assert_eq!(clock.fps().frame_count(), 0);
        assert_eq!(clock.fps().window_start(), Some(500.0));
        assert_eq!(clock.fps().current_fps(), Some(60));
    }

    #[test]
    fn slow_frames_report_low_rate() {
        let mut counter = FpsCounter::new(DEFAULT_FPS_WINDOW);
        counter.begin_window(0.0);
        assert_eq!(counter.record(1_000.0), Some(1));
    }

    #[test]
    fn seconds_apply_fixed_conversion() {
        let mut clock = FrameClock::new(DEFAULT_FPS_WINDOW);
        let timing = clock.tick(2_000.0);
        assert_eq!(timing.adjusted_ms, 2_000.0);
        assert!((timing.seconds - 7.0).abs() < 1e-6);
    }

    #[test]
    fn rebase_zeroes_adjusted_time() {
        let mut clock = FrameClock::new(DEFAULT_FPS_WINDOW);
        clock.tick(4_321.0);
        clock.reset_offset();
        assert_eq!(clock.state().time_offset(), 4_321.0);
        assert_eq!(clock.tick(4_321.0).adjusted_ms, 0.0);
        assert_eq!(clock.tick(4_337.0).adjusted_ms, 16.0);
    }

    #[test]
    fn stale_timestamps_never_go_negative() {
        let mut clock = FrameClock::new(DEFAULT_FPS_WINDOW);
        clock.tick(100.0);
        clock.reset_offset();
        assert_eq!(clock.tick(90.0).adjusted_ms, 0.0);
    }

    #[test]
    fn resume_restarts_measurement() {
        let mut clock = FrameClock::new(DEFAULT_FPS_WINDOW);
        clock.tick(0.0);
        clock.tick(100.0);
        clock.resume_at(10_000.0);
        assert_eq!(clock.state().raw_timestamp(), Some(10_000.0));
        assert_eq!(clock.fps().frame_count(), 0);
        assert_eq!(clock.tick(10_016.0).fps, None);
    }
}
