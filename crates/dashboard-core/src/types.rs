use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle, ordered ascending by time.
///
/// Consecutive-pair computations (true range, stochastic windows) use
/// positional adjacency: a calendar gap in the series silently treats the
/// next available candle as "previous".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Typical price (H+L+C)/3, the per-bar input to VWAP.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// Candle timeframe for the external candle supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    Minute1,
    Minute5,
    Minute15,
    Minute30,
    Hour1,
    Hour4,
    Day1,
    Week1,
    Month1,
}

impl Timeframe {
    pub fn to_minutes(&self) -> i64 {
        match self {
            Timeframe::Minute1 => 1,
            Timeframe::Minute5 => 5,
            Timeframe::Minute15 => 15,
            Timeframe::Minute30 => 30,
            Timeframe::Hour1 => 60,
            Timeframe::Hour4 => 240,
            Timeframe::Day1 => 1440,
            Timeframe::Week1 => 10080,
            Timeframe::Month1 => 43200,
        }
    }
}

/// Trading scenario detected by the signal classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scenario {
    TrendBreakout,
    PullbackContinuation,
    Reversal,
    None,
}

impl Scenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::TrendBreakout => "TrendBreakout",
            Scenario::PullbackContinuation => "PullbackContinuation",
            Scenario::Reversal => "Reversal",
            Scenario::None => "None",
        }
    }
}

/// Trade direction attached to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
    Neutral,
}

/// One evaluation of the signal classifier.
///
/// Immutable snapshot: recomputed fresh on every request from the candle
/// window plus the day's pivot levels, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub scenario: Scenario,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
    pub risk_reward: f64,
    pub position_size: u32,
    /// 0.0 to 1.0
    pub confidence: f64,
    pub reason: String,
}

impl Signal {
    /// Neutral signal used when no scenario matched or no data exists.
    pub fn neutral(
        timestamp: DateTime<Utc>,
        symbol: &str,
        close: f64,
        reason: &str,
    ) -> Self {
        Self {
            timestamp,
            symbol: symbol.to_string(),
            scenario: Scenario::None,
            direction: Direction::Neutral,
            entry_price: close,
            stop_price: close,
            target_price: close,
            risk_reward: 0.0,
            position_size: 0,
            confidence: 0.0,
            reason: reason.to_string(),
        }
    }
}
