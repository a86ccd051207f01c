/// Closed value range of the regions that have data for the current period.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// Spans at or below this are treated as a single value.
pub const DEGENERATE_SPAN: f64 = 1e-12;

impl ValueRange {
    /// Range over the finite values. `None` when there are none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let (min, max) = Statistics::min_max(values)?;
        Some(Self { min, max })
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_degenerate(&self) -> bool {
        self.span().abs() <= DEGENERATE_SPAN
    }

    /// Position of `v` in the range, clamped to `[0, 1]`. A degenerate range maps to 0.5.
    pub fn normalize(&self, v: f64) -> f64 {
        if self.is_degenerate() {
            return 0.5;
        }
        ((v - self.min) / self.span()).clamp(0.0, 1.0)
    }
}

pub struct Statistics;

impl Statistics {
    /// Mean of the finite values.
    pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
        let (sum, n) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
        (n > 0).then(|| sum / n as f64)
    }

    /// Min and max of the finite values.
    pub fn min_max(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{Statistics, ValueRange};
    use proptest::prelude::*;

    #[test]
    fn min_max_skips_non_finite() {
        assert_eq!(
            Statistics::min_max([3.0, f64::NAN, -1.0, f64::INFINITY]),
            Some((-1.0, 3.0))
        );
        assert_eq!(Statistics::min_max([f64::NAN]), None);
        assert_eq!(Statistics::mean([1.0, 2.0, f64::NAN, 3.0]), Some(2.0));
    }

    #[test]
    fn degenerate_range_normalizes_to_middle() {
        let r = ValueRange::from_values([5.0, 5.0]).expect("range");
        assert!(r.is_degenerate());
        assert_eq!(r.normalize(5.0), 0.5);
    }

    #[test]
    fn normalize_endpoints() {
        let r = ValueRange::from_values([100.0, 300.0]).expect("range");
        assert_eq!(r.normalize(100.0), 0.0);
        assert_eq!(r.normalize(300.0), 1.0);
        assert_eq!(r.normalize(200.0), 0.5);
        assert_eq!(r.normalize(1000.0), 1.0);
    }

    proptest! {
        #[test]
        fn normalize_is_monotonic(
            mut vals in proptest::collection::vec(-1.0e6f64..1.0e6, 2..20),
        ) {
            let r = ValueRange::from_values(vals.iter().copied()).expect("range");
            vals.sort_by(f64::total_cmp);
            let ts: Vec<f64> = vals.iter().map(|v| r.normalize(*v)).collect();
            prop_assert!(ts.windows(2).all(|w| w[0] <= w[1]));
            prop_assert!(ts.iter().all(|t| (0.0..=1.0).contains(t)));
        }
    }
}
