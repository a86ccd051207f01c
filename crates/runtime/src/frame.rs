use foundation::time::Time;

/// Frame metadata handed to every per-frame update.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Delta time applied this frame (seconds, already clamped).
    pub dt_s: f64,
    /// Engine time at the end of the frame (seconds).
    pub time: Time,
}

/// Turns display-refresh callbacks into [`Frame`]s.
///
/// Deltas are clamped to `[0, max_dt_s]` so a stalled tab or a debugger pause
/// does not fling every animation forward in one step.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameClock {
    next_index: u64,
    time: Time,
    max_dt_s: f64,
}

impl FrameClock {
    pub const DEFAULT_MAX_DT_S: f64 = 0.1;

    pub fn new(max_dt_s: f64) -> Self {
        Self {
            next_index: 0,
            time: Time::ZERO,
            max_dt_s: max_dt_s.max(0.0),
        }
    }

    pub fn tick(&mut self, raw_dt_s: f64) -> Frame {
        let dt_s = if raw_dt_s.is_finite() {
            raw_dt_s.clamp(0.0, self.max_dt_s)
        } else {
            0.0
        };
        self.time = self.time.advanced(dt_s);
        let frame = Frame {
            index: self.next_index,
            dt_s,
            time: self.time,
        };
        self.next_index += 1;
        frame
    }

    pub fn set_max_dt_s(&mut self, max_dt_s: f64) {
        self.max_dt_s = max_dt_s.max(0.0);
    }

    pub fn frames_elapsed(&self) -> u64 {
        self.next_index
    }

    pub fn time(&self) -> Time {
        self.time
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_DT_S)
    }
}

#[cfg(test)]
mod tests {
    use super::FrameClock;
    use foundation::time::Time;

    #[test]
    fn ticks_advance_index_and_time() {
        let mut clock = FrameClock::default();
        let f0 = clock.tick(0.016);
        let f1 = clock.tick(0.016);
        assert_eq!(f0.index, 0);
        assert_eq!(f1.index, 1);
        assert_eq!(f1.time, Time(0.032));
        assert_eq!(clock.frames_elapsed(), 2);
    }

    #[test]
    fn large_and_invalid_deltas_are_clamped() {
        let mut clock = FrameClock::new(0.05);
        assert_eq!(clock.tick(3.0).dt_s, 0.05);
        assert_eq!(clock.tick(-1.0).dt_s, 0.0);
        assert_eq!(clock.tick(f64::NAN).dt_s, 0.0);
        assert_eq!(clock.time(), Time(0.05));

        clock.set_max_dt_s(1.0);
        assert_eq!(clock.tick(0.5).dt_s, 0.5);
        assert_eq!(clock.frames_elapsed(), 4);
    }
}
