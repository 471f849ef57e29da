use std::time::Instant;

/// Frame timer. `tick()` follows wall time, `step()` advances by an
/// explicit delta for headless or fixed-step hosts.
pub struct Clock {
    last: Instant,
    delta: f32,
    elapsed: f32,
}

impl Clock {
    pub fn new() -> Self {
        Self { last: Instant::now(), delta: 0.0, elapsed: 0.0 }
    }

    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now.duration_since(self.last).as_secs_f32();
        // Accumulate rather than re-derive from `start`, so ticking and
        // stepping the same clock agree on elapsed time.
        self.elapsed += self.delta;
        self.last = now;
    }

    pub fn step(&mut self, delta: f32) {
        self.delta = delta.max(0.0);
        self.elapsed += self.delta;
        self.last = Instant::now();
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_accumulates_elapsed_time() {
        let mut clock = Clock::new();
        clock.step(0.016);
        clock.step(0.016);
        assert!((clock.delta_seconds() - 0.016).abs() < 1e-6);
        assert!((clock.elapsed_seconds() - 0.032).abs() < 1e-6);
    }

    #[test]
    fn tick_after_step_keeps_elapsed_consistent() {
        let mut clock = Clock::new();
        clock.step(1.0);
        clock.tick();
        assert!(clock.elapsed_seconds() >= 1.0, "tick must build on stepped time, got {}", clock.elapsed_seconds());
    }

    #[test]
    fn negative_step_is_clamped() {
        let mut clock = Clock::new();
        clock.step(-1.0);
        assert_eq!(clock.delta_seconds(), 0.0);
        assert_eq!(clock.elapsed_seconds(), 0.0);
    }
}
