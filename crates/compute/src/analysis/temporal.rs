//! Period selection and metric lookup.

use std::str::FromStr;

use formats::time_series::{MetricSeries, YearSeries};
use serde::{Deserialize, Serialize};

/// The time selection driving the choropleth.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// Yearly average.
    Year(i32),
    /// One month, `1..=12`.
    Month { year: i32, month: u8 },
}

impl Period {
    pub fn year(&self) -> i32 {
        match *self {
            Period::Year(y) | Period::Month { year: y, .. } => y,
        }
    }

    pub fn month(year: i32, month: u8) -> Option<Self> {
        (1..=12).contains(&month).then_some(Period::Month { year, month })
    }

    /// The value this period selects from one year of data.
    pub fn select(&self, ys: &YearSeries) -> Option<f64> {
        match *self {
            Period::Year(_) => ys.yearly(),
            Period::Month { month, .. } => ys.month(month),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Year(y) => write!(f, "{y}"),
            Period::Month { year, month } => write!(f, "{year}-{month:02}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePeriodError {
    pub input: String,
}

impl std::fmt::Display for ParsePeriodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid period {:?} (expected YYYY or YYYY-MM)", self.input)
    }
}

impl std::error::Error for ParsePeriodError {}

impl FromStr for Period {
    type Err = ParsePeriodError;

    /// `2020` or `2020-03`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParsePeriodError {
            input: s.to_string(),
        };
        let s = s.trim();
        match s.split_once('-') {
            None => s.parse().map(Period::Year).map_err(|_| err()),
            Some((y, m)) => {
                let year = y.parse().map_err(|_| err())?;
                let month = m.parse().map_err(|_| err())?;
                Period::month(year, month).ok_or_else(err)
            }
        }
    }
}

pub struct TemporalAnalysis;

impl TemporalAnalysis {
    /// Metric for `adcode` at `period`; `None` when the series has no data.
    pub fn value(series: &MetricSeries, adcode: i64, period: Period) -> Option<f64> {
        let v = period.select(series.year(adcode, period.year())?)?;
        v.is_finite().then_some(v)
    }

    /// Values for each adcode in order.
    pub fn values(
        series: &MetricSeries,
        adcodes: impl IntoIterator<Item = i64>,
        period: Period,
    ) -> Vec<(i64, Option<f64>)> {
        adcodes
            .into_iter()
            .map(|a| (a, Self::value(series, a, period)))
            .collect()
    }
}
