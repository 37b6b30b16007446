use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    EquitySector,
    Commodity,
    Benchmark,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::EquitySector => "EQUITY_SECTOR",
            AssetClass::Commodity => "COMMODITY",
            AssetClass::Benchmark => "BENCHMARK",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EQUITY_SECTOR" => Ok(AssetClass::EquitySector),
            "COMMODITY" => Ok(AssetClass::Commodity),
            "BENCHMARK" => Ok(AssetClass::Benchmark),
            other => anyhow::bail!("unknown asset_class: {other}"),
        }
    }
}

/// Static reference data for one tradeable series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub series_id: String,
    pub name: String,
    pub asset_class: AssetClass,
    pub region: String,
    /// Vendor symbol used by the external price fetcher (e.g. `xlk.us`).
    pub vendor_symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub series_id: String,
    pub date: NaiveDate,
    pub close: f64,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub volume: Option<i64>,
}

/// One instrument's close series, ordered by date ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub instrument: Instrument,
    pub closes: Vec<(NaiveDate, f64)>,
}

impl PriceSeries {
    pub fn new(instrument: Instrument, mut closes: Vec<(NaiveDate, f64)>) -> Self {
        closes.sort_by_key(|(d, _)| *d);
        closes.dedup_by_key(|(d, _)| *d);
        Self { instrument, closes }
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.closes.last().map(|(d, _)| *d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_class_round_trips_through_db_text() {
        for class in [
            AssetClass::EquitySector,
            AssetClass::Commodity,
            AssetClass::Benchmark,
        ] {
            assert_eq!(class.as_str().parse::<AssetClass>().unwrap(), class);
        }
        assert!("ETF".parse::<AssetClass>().is_err());
    }

    #[test]
    fn price_series_sorts_and_drops_duplicate_dates() {
        let inst = Instrument {
            series_id: "US_XLK".to_string(),
            name: "Technology (XLK)".to_string(),
            asset_class: AssetClass::EquitySector,
            region: "US".to_string(),
            vendor_symbol: None,
        };
        let d = |day| NaiveDate::from_ymd_opt(2026, 1, day).unwrap();
        let s = PriceSeries::new(inst, vec![(d(3), 3.0), (d(1), 1.0), (d(3), 3.5), (d(2), 2.0)]);
        let dates: Vec<_> = s.closes.iter().map(|(d, _)| *d).collect();
        assert_eq!(dates, vec![d(1), d(2), d(3)]);
        assert_eq!(s.last_date(), Some(d(3)));
    }
}
