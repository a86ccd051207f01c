#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

pub trait Layer {
    fn id(&self) -> LayerId;

    fn name(&self) -> &'static str;
}

/// Per-frame advancement for overlays that carry their own clocks.
pub trait Animated {
    fn advance(&mut self, dt_s: f64);
}
