use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Time since the clock was created, unclamped.
    pub elapsed: Duration,

    /// Number of ticks before this one.
    pub frame_index: u64,
}

impl FrameTime {
    /// Mean frame rate over the whole run, or `None` before any time passed.
    pub fn average_fps(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| (self.frame_index + 1) as f64 / secs)
    }
}

/// Produces `FrameTime` snapshots for one render loop.
///
/// Delta time is clamped so a debugger pause or a minimized window does not
/// show up as a multi-second frame. The orbit itself advances per frame, not
/// per second, so `dt` only feeds diagnostics.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_max_dt(Duration::from_millis(250))
    }

    pub fn with_max_dt(dt_max: Duration) -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame_index: 0,
            dt_max,
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now.saturating_duration_since(self.last).min(self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start),
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_counts_ticks() {
        let mut clock = FrameClock::new();
        let base = clock.start;
        assert_eq!(clock.tick_at(base).frame_index, 0);
        assert_eq!(clock.tick_at(base).frame_index, 1);
        assert_eq!(clock.frame_index, 2);
    }

    #[test]
    fn long_stall_is_clamped() {
        let mut clock = FrameClock::with_max_dt(Duration::from_millis(100));
        let start = clock.start;
        clock.tick_at(start);
        let ft = clock.tick_at(start + Duration::from_secs(5));
        assert!((ft.dt - 0.1).abs() < 1e-6);
        assert_eq!(ft.elapsed, Duration::from_secs(5));
    }

    #[test]
    fn average_fps_counts_the_current_frame() {
        let mut clock = FrameClock::new();
        let start = clock.start;
        assert_eq!(clock.tick_at(start).average_fps(), None);
        let ft = clock.tick_at(start + Duration::from_secs(1));
        assert_eq!(ft.average_fps(), Some(2.0));
    }
}
