use std::time::{Duration, Instant};

/// Exponentially smoothed frames-per-second estimate for the overlay.
#[derive(Debug)]
pub struct FpsCounter {
    last_frame: Instant,
    smoothed: f32,
}

impl FpsCounter {
    /// Blend factor toward the newest raw sample.
    const RESPONSIVENESS: f32 = 0.1;

    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            smoothed: 0.0,
        }
    }

    /// Record a frame boundary and return the current smoothed FPS.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        if dt > 0.0 {
            let raw = 1.0 / dt;
            self.smoothed = if self.smoothed == 0.0 {
                raw
            } else {
                (1.0 - Self::RESPONSIVENESS) * self.smoothed + Self::RESPONSIVENESS * raw
            };
        }
        self.smoothed
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Caps the frame rate by sleeping until the next scheduled frame deadline.
///
/// The wait is a plain blocking sleep, not a cancellable operation; close
/// requests are observed at the top of the next iteration.
#[derive(Debug)]
pub struct FrameLimiter {
    frame_budget: Duration,
    next_deadline: Instant,
}

impl FrameLimiter {
    pub fn new(target_fps: u32) -> Self {
        let frame_budget = Duration::from_secs_f64(1.0 / target_fps.max(1) as f64);
        Self {
            frame_budget,
            next_deadline: Instant::now() + frame_budget,
        }
    }

    /// Block until the next frame deadline, then schedule the one after.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if now < self.next_deadline {
            std::thread::sleep(self.next_deadline - now);
            self.next_deadline += self.frame_budget;
        } else {
            // Running behind; don't bank time to burst later.
            self.next_deadline = now + self.frame_budget;
        }
    }
}
