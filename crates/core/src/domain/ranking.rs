use crate::domain::instrument::Instrument;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lookback length in trading sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

impl Horizon {
    pub const ALL: [Horizon; 5] = [
        Horizon::OneWeek,
        Horizon::OneMonth,
        Horizon::ThreeMonths,
        Horizon::SixMonths,
        Horizon::OneYear,
    ];

    pub fn sessions(self) -> usize {
        match self {
            Horizon::OneWeek => 5,
            Horizon::OneMonth => 21,
            Horizon::ThreeMonths => 63,
            Horizon::SixMonths => 126,
            Horizon::OneYear => 252,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Horizon::OneWeek => "1w",
            Horizon::OneMonth => "1m",
            Horizon::ThreeMonths => "3m",
            Horizon::SixMonths => "6m",
            Horizon::OneYear => "1y",
        }
    }
}

/// One value per horizon. The 1-year slot is `None` when the joined history is too short for it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HorizonReturns {
    #[serde(rename = "1w")]
    pub one_week: f64,
    #[serde(rename = "1m")]
    pub one_month: f64,
    #[serde(rename = "3m")]
    pub three_months: f64,
    #[serde(rename = "6m")]
    pub six_months: f64,
    #[serde(rename = "1y")]
    pub one_year: Option<f64>,
}

impl HorizonReturns {
    pub fn get(&self, h: Horizon) -> Option<f64> {
        match h {
            Horizon::OneWeek => Some(self.one_week),
            Horizon::OneMonth => Some(self.one_month),
            Horizon::ThreeMonths => Some(self.three_months),
            Horizon::SixMonths => Some(self.six_months),
            Horizon::OneYear => self.one_year,
        }
    }
}

/// Latest complete metrics row for one instrument against the benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub instrument: Instrument,
    pub as_of: NaiveDate,
    pub returns: HorizonReturns,
    pub benchmark_returns: HorizonReturns,
    pub relative_strength: HorizonReturns,
    pub trend_flag: u8,
    pub vol_1m: f64,
    pub mdd_6m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Regime {
    Up,
    Side,
    Down,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::Up => "UP",
            Regime::Side => "SIDE",
            Regime::Down => "DOWN",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Regime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UP" => Ok(Regime::Up),
            "SIDE" => Ok(Regime::Side),
            "DOWN" => Ok(Regime::Down),
            other => anyhow::bail!("unknown regime: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredInstrument {
    pub snapshot: MetricsSnapshot,
    pub base_score: f64,
    pub regime: Regime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    FinalScore,
    BaseScore,
    AiScore,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::FinalScore => "final_score",
            SortKey::BaseScore => "base_score",
            SortKey::AiScore => "ai_score",
        }
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "final_score" => Ok(SortKey::FinalScore),
            "base_score" => Ok(SortKey::BaseScore),
            "ai_score" => Ok(SortKey::AiScore),
            other => anyhow::bail!("unknown sort key: {other} (expected final_score|base_score|ai_score)"),
        }
    }
}

/// Hand-off row for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    pub rank: usize,
    #[serde(flatten)]
    pub instrument: Instrument,
    pub as_of: NaiveDate,
    pub returns: HorizonReturns,
    pub relative_strength: HorizonReturns,
    pub trend_flag: u8,
    pub vol_1m: f64,
    pub mdd_6m: f64,
    pub regime: Regime,
    pub base_score: f64,
    pub ai_score: f64,
    pub n_articles: i32,
    pub ai_score_date: Option<NaiveDate>,
    pub final_score: f64,
}
