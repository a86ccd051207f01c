/// Independent animation clock.
///
/// Every animated overlay instance owns one so instances can run at their own
/// speed and phase. Clocks only move when advanced by the render loop.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AnimationClock {
    elapsed_s: f64,
    speed: f64,
    paused: bool,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::with_speed(1.0)
    }

    pub fn with_speed(speed: f64) -> Self {
        Self {
            elapsed_s: 0.0,
            speed,
            paused: false,
        }
    }

    /// Starts the clock at `offset_s`, for staggering clones of one animation.
    pub fn with_offset(mut self, offset_s: f64) -> Self {
        self.elapsed_s = offset_s.max(0.0);
        self
    }

    pub fn advance(&mut self, dt_s: f64) {
        if self.paused || !dt_s.is_finite() {
            return;
        }
        self.elapsed_s += dt_s.max(0.0) * self.speed;
    }

    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    /// Elapsed time wrapped into `[0, period_s)`. A non-positive period yields 0.
    pub fn looped(&self, period_s: f64) -> f64 {
        if !(period_s > 0.0) {
            return 0.0;
        }
        self.elapsed_s.rem_euclid(period_s)
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new()
    }
}
