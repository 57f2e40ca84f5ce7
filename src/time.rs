//! Frame pacing and FPS measurement.

use instant::{Duration, Instant};

/// Caps the frame rate by busy-waiting until the next frame is due.
#[derive(Debug, Clone)]
pub struct FramePacer {
    frame_time: Option<Duration>,
    last: Instant,
}

impl FramePacer {
    /// `None` or a zero cap disables pacing.
    pub fn new(fps_cap: Option<u32>) -> Self {
        Self {
            frame_time: fps_cap
                .filter(|fps| *fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / fps as f64)),
            last: Instant::now(),
        }
    }

    pub fn frame_time(&self) -> Option<Duration> {
        self.frame_time
    }

    /// Time left until the next frame may start.
    pub fn remaining(&self) -> Duration {
        match self.frame_time {
            Some(frame_time) => frame_time.saturating_sub(self.last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Spins until the frame time has passed since the previous call and
    /// returns the time since the previous frame.
    pub fn wait(&mut self) -> Duration {
        while !self.remaining().is_zero() {
            std::hint::spin_loop();
        }
        let dt = self.last.elapsed();
        self.last = Instant::now();
        dt
    }
}

/// Counts frames and reports the rate every `interval`.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    interval: Duration,
    frames: u32,
    elapsed: Duration,
    fps: f64,
}

impl FpsCounter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            frames: 0,
            elapsed: Duration::ZERO,
            fps: 0.0,
        }
    }

    /// Records one frame. Returns the new rate once per interval.
    pub fn frame(&mut self, dt: Duration) -> Option<f64> {
        self.frames += 1;
        self.elapsed += dt;
        if self.elapsed < self.interval || self.elapsed.is_zero() {
            return None;
        }
        self.fps = self.frames as f64 / self.elapsed.as_secs_f64();
        self.frames = 0;
        self.elapsed = Duration::ZERO;
        Some(self.fps)
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }
}

pub fn fps_title(title: &str, fps: f64) -> String {
    format!("{title} [FPS: {fps:.1}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn counter_reports_once_per_interval() {
        let mut counter = FpsCounter::new(Duration::from_millis(250));
        for _ in 0..4 {
            assert_eq!(counter.frame(Duration::from_millis(50)), None);
        }
        let fps = counter.frame(Duration::from_millis(50)).unwrap();
        assert_relative_eq!(fps, 20.0, epsilon = 1e-9);
        assert_eq!(counter.frame(Duration::from_millis(50)), None);
    }

    #[test]
    fn uncapped_pacer_never_waits() {
        let pacer = FramePacer::new(None);
        assert_eq!(pacer.remaining(), Duration::ZERO);
        assert!(FramePacer::new(Some(0)).frame_time().is_none());
    }

    #[test]
    fn capped_pacer_waits_for_the_frame_time() {
        let mut pacer = FramePacer::new(Some(200));
        pacer.wait();
        let dt = pacer.wait();
        assert!(dt >= Duration::from_millis(5));
    }

    #[test]
    fn title_shows_fps() {
        assert_eq!(fps_title("lake", 59.94), "lake [FPS: 59.9]");
    }
}
