//! Per-region metric time series: `adcode → year → month → value`.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::geojson::integer;

/// One year of a region's metric. `None` means no data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct YearSeries {
    pub average: Option<f64>,
    /// Index 0 is January.
    pub months: [Option<f64>; 12],
}

impl YearSeries {
    /// Value for `month` in `1..=12`.
    pub fn month(&self, month: u8) -> Option<f64> {
        let idx = usize::from(month).checked_sub(1)?;
        self.months.get(idx).copied().flatten()
    }

    /// The stored average, falling back to the mean of defined months.
    pub fn yearly(&self) -> Option<f64> {
        if self.average.is_some() {
            return self.average;
        }
        let defined: Vec<f64> = self.months.iter().flatten().copied().collect();
        (!defined.is_empty()).then(|| defined.iter().sum::<f64>() / defined.len() as f64)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionSeries {
    pub years: BTreeMap<i32, YearSeries>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedEntry {
    pub index: usize,
    pub reason: String,
}

/// Metric series for every region, as supplied by the analytics side.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricSeries {
    pub regions: BTreeMap<i64, RegionSeries>,
    pub skipped: Vec<SkippedEntry>,
}

#[derive(Debug)]
pub enum SeriesError {
    Json { reason: String },
    NotAnArray,
}

impl std::fmt::Display for SeriesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesError::Json { reason } => write!(f, "JSON parse error: {reason}"),
            SeriesError::NotAnArray => write!(f, "expected an array of region series"),
        }
    }
}

impl std::error::Error for SeriesError {}

impl MetricSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(payload: &str) -> Result<Self, SeriesError> {
        let value: Value = serde_json::from_str(payload).map_err(|e| SeriesError::Json {
            reason: e.to_string(),
        })?;
        Self::from_json_value(&value)
    }

    /// Parses `[{ adcode, data: { "<year>": { average?, "<month>": number|null } } }]`.
    ///
    /// Entries without a usable adcode or data object are skipped and listed.
    /// Unknown keys and non-numeric values are ignored. Repeated adcodes merge,
    /// later years overwriting earlier ones.
    pub fn from_json_value(value: &Value) -> Result<Self, SeriesError> {
        let entries = value.as_array().ok_or(SeriesError::NotAnArray)?;
        let mut out = MetricSeries::default();
        for (index, entry) in entries.iter().enumerate() {
            match parse_entry(entry) {
                Ok((adcode, series)) => out
                    .regions
                    .entry(adcode)
                    .or_default()
                    .years
                    .extend(series.years),
                Err(reason) => out.skipped.push(SkippedEntry { index, reason }),
            }
        }
        Ok(out)
    }

    pub fn region(&self, adcode: i64) -> Option<&RegionSeries> {
        self.regions.get(&adcode)
    }

    pub fn year(&self, adcode: i64, year: i32) -> Option<&YearSeries> {
        self.regions.get(&adcode)?.years.get(&year)
    }

    pub fn set_year(&mut self, adcode: i64, year: i32, series: YearSeries) {
        self.regions
            .entry(adcode)
            .or_default()
            .years
            .insert(year, series);
    }

    /// Every year present for at least one region, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self
            .regions
            .values()
            .flat_map(|r| r.years.keys().copied())
            .collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

fn parse_entry(entry: &Value) -> Result<(i64, RegionSeries), String> {
    let obj = entry.as_object().ok_or("entry must be an object")?;
    let adcode = obj
        .get("adcode")
        .and_then(integer)
        .ok_or("missing or non-numeric adcode")?;
    let data = obj
        .get("data")
        .and_then(Value::as_object)
        .ok_or("missing data object")?;

    let mut series = RegionSeries::default();
    for (year_key, year_val) in data {
        let (Ok(year), Some(fields)) = (year_key.trim().parse::<i32>(), year_val.as_object()) else {
            continue;
        };
        let mut ys = YearSeries::default();
        for (key, v) in fields {
            if key == "average" {
                ys.average = number(v);
            } else if let Ok(month @ 1..=12) = key.trim().parse::<u8>() {
                ys.months[usize::from(month) - 1] = number(v);
            }
        }
        series.years.insert(year, ys);
    }
    Ok((adcode, series))
}

/// Finite number from a JSON number or numeric string; anything else is no data.
fn number(v: &Value) -> Option<f64> {
    let f = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

#[cfg(test)]
mod tests {
    use super::{MetricSeries, YearSeries};
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"[
        {"adcode": 1, "data": {"2020": {"average": 100, "1": 90, "02": 110, "13": 5, "note": "x"}}},
        {"adcode": "2", "data": {"2020": {"average": null, "3": 200, "4": 400}, "2021": {"average": 300}}},
        {"adcode": "abc", "data": {}},
        {"adcode": 3}
    ]"#;

    #[test]
    fn parses_years_and_months() {
        let s = MetricSeries::from_json_str(SAMPLE).expect("parse");
        let a = s.year(1, 2020).expect("year");
        assert_eq!(a.average, Some(100.0));
        assert_eq!(a.month(1), Some(90.0));
        assert_eq!(a.month(2), Some(110.0));
        assert_eq!(a.month(12), None);
        assert_eq!(a.month(0), None);
        assert_eq!(s.years(), vec![2020, 2021]);
    }

    #[test]
    fn yearly_falls_back_to_month_mean() {
        let s = MetricSeries::from_json_str(SAMPLE).expect("parse");
        assert_eq!(s.year(2, 2020).and_then(YearSeries::yearly), Some(300.0));
        assert_eq!(YearSeries::default().yearly(), None);
    }

    #[test]
    fn bad_entries_are_skipped() {
        let s = MetricSeries::from_json_str(SAMPLE).expect("parse");
        let skipped: Vec<usize> = s.skipped.iter().map(|e| e.index).collect();
        assert_eq!(skipped, vec![2, 3]);
        assert!(MetricSeries::from_json_str("{}").is_err());
    }
}
