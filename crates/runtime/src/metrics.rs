use std::collections::BTreeMap;

/// Well-known counter names used by the map view.
pub mod names {
    pub const FRAMES: &str = "frames";
    pub const RAY_CASTS: &str = "picking.ray_casts";
    pub const PICK_HITS: &str = "picking.hits";
    pub const RECOLOR_PASSES: &str = "symbology.recolor_passes";
    pub const REGIONS_BUILT: &str = "geometry.regions_built";
    pub const FEATURES_SKIPPED: &str = "geometry.features_skipped";
    pub const DRAW_COMMANDS: &str = "render.draw_commands";
    pub const FRAME_DT_MS: &str = "frame.dt_ms";
}

/// Running summary of a sampled value.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Summary {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    pub fn record(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Engine counters, gauges and sample summaries.
///
/// Backed by sorted maps so snapshots come out in a stable order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Metrics {
    counters: BTreeMap<String, u64>,
    gauges: BTreeMap<String, f64>,
    summaries: BTreeMap<String, Summary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub counters: Vec<(String, u64)>,
    pub gauges: Vec<(String, f64)>,
    pub summaries: Vec<(String, Summary)>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn incr(&mut self, name: &str) {
        self.add(name, 1);
    }

    pub fn add(&mut self, name: &str, by: u64) {
        *self.counters.entry(name.to_string()).or_insert(0) += by;
    }

    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges.get(name).copied()
    }

    pub fn set_gauge(&mut self, name: &str, value: f64) {
        self.gauges.insert(name.to_string(), value);
    }

    pub fn sample(&mut self, name: &str, value: f64) {
        self.summaries
            .entry(name.to_string())
            .or_default()
            .record(value);
    }

    pub fn summary(&self, name: &str) -> Option<Summary> {
        self.summaries.get(name).copied()
    }

    pub fn reset(&mut self) {
        self.counters.clear();
        self.gauges.clear();
        self.summaries.clear();
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self.counters.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            gauges: self.gauges.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            summaries: self.summaries.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Metrics, Summary, names};

    #[test]
    fn counters_accumulate_from_zero() {
        let mut m = Metrics::new();
        assert_eq!(m.counter(names::RAY_CASTS), 0);
        m.incr(names::RAY_CASTS);
        m.add(names::RAY_CASTS, 2);
        assert_eq!(m.counter(names::RAY_CASTS), 3);
    }

    #[test]
    fn summary_ignores_non_finite_samples() {
        let mut s = Summary::default();
        s.record(4.0);
        s.record(f64::NAN);
        s.record(2.0);
        assert_eq!(s.count, 2);
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.mean(), Some(3.0));
    }

    #[test]
    fn snapshot_is_sorted_by_name() {
        let mut m = Metrics::new();
        m.incr("b");
        m.incr("a");
        m.set_gauge("z", 1.0);
        m.set_gauge("m", 2.0);
        let snap = m.snapshot();
        assert_eq!(
            snap.counters,
            vec![("a".to_string(), 1), ("b".to_string(), 1)]
        );
        assert_eq!(snap.gauges[0].0, "m");
    }
}
