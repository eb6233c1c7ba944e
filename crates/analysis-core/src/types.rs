use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AnalysisError;

/// OHLCV candle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Candle {
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    fn has_finite_values(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Validated, chronologically ordered candle series.
///
/// The only way to build one is [`OhlcSeries::new`], so every series handed to the
/// detectors has at least two candles, strictly increasing timestamps, finite
/// prices and `high >= low` on every bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OhlcSeries {
    candles: Vec<Candle>,
}

impl OhlcSeries {
    pub const MIN_LEN: usize = 2;

    pub fn new(candles: Vec<Candle>) -> Result<Self, AnalysisError> {
        if candles.is_empty() {
            return Err(AnalysisError::InvalidInput("series is empty".to_string()));
        }
        if candles.len() < Self::MIN_LEN {
            return Err(AnalysisError::InvalidInput(format!(
                "series needs at least {} candles, got {}",
                Self::MIN_LEN,
                candles.len()
            )));
        }

        for (i, candle) in candles.iter().enumerate() {
            if !candle.has_finite_values() {
                return Err(AnalysisError::InvalidInput(format!(
                    "candle {} at {} has a non-finite value",
                    i, candle.time
                )));
            }
            if candle.high < candle.low {
                return Err(AnalysisError::InvalidInput(format!(
                    "candle {} at {} has high {} below low {}",
                    i, candle.time, candle.high, candle.low
                )));
            }
        }

        if let Some(pos) = candles.windows(2).position(|w| w[1].time <= w[0].time) {
            return Err(AnalysisError::InvalidInput(format!(
                "timestamps not strictly increasing at index {} ({} after {})",
                pos + 1,
                candles[pos + 1].time,
                candles[pos].time
            )));
        }

        Ok(Self { candles })
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Always false for a constructed series
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> &Candle {
        // Non-empty by construction
        &self.candles[self.candles.len() - 1]
    }

    /// Close of the most recent candle
    pub fn current_price(&self) -> f64 {
        self.last().close
    }
}

impl TryFrom<Vec<Candle>> for OhlcSeries {
    type Error = AnalysisError;

    fn try_from(candles: Vec<Candle>) -> Result<Self, Self::Error> {
        Self::new(candles)
    }
}

/// Support or resistance level built from a cluster of swing points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Mean price of the cluster members
    pub price: f64,
    /// Number of swing points in the cluster
    pub strength: usize,
    /// Time of the first member
    pub time: DateTime<Utc>,
}

/// Polarity of an ICT structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bias {
    Bullish,
    Bearish,
}

impl Bias {
    pub fn label(&self) -> &'static str {
        match self {
            Bias::Bullish => "Bullish",
            Bias::Bearish => "Bearish",
        }
    }
}

/// Order block anchored at the last opposite-polarity candle before a reversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBlock {
    #[serde(rename = "type")]
    pub kind: Bias,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub index: usize,
    pub time: DateTime<Utc>,
}

/// Price range skipped between candle i-2 and candle i
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairValueGap {
    #[serde(rename = "type")]
    pub kind: Bias,
    pub high: f64,
    pub low: f64,
    pub index: usize,
    pub time: DateTime<Utc>,
}

/// Trade action of a generated signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Wait,
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SignalAction::Buy => "BUY",
            SignalAction::Sell => "SELL",
            SignalAction::Wait => "WAIT",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

/// Latest indicator values; `None` while an indicator is still warming up
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub ema_20: Option<f64>,
    pub ema_50: Option<f64>,
    pub atr: Option<f64>,
}

/// Directional signal fused from indicators, levels and ICT structures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub signal: SignalAction,
    pub direction: Direction,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub rr_ratio: f64,
    /// 50 to 95
    pub confidence: u8,
    pub bullish_score: f64,
    pub bearish_score: f64,
    /// One note per triggered rule, in evaluation order
    pub analysis_details: Vec<String>,
    pub technical_indicators: IndicatorSnapshot,
    pub support_levels: Vec<Level>,
    pub resistance_levels: Vec<Level>,
    pub order_blocks: Vec<OrderBlock>,
    pub fvg_gaps: Vec<FairValueGap>,
}

/// Timeframe for analysis
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
        }
    }

    /// Interval code used by market data providers
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Minute1 => "1m",
            Timeframe::Minute5 => "5m",
            Timeframe::Minute15 => "15m",
            Timeframe::Minute30 => "30m",
            Timeframe::Hour1 => "1h",
            Timeframe::Hour4 => "4h",
            Timeframe::Day1 => "1d",
            Timeframe::Week1 => "1wk",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1m" => Ok(Timeframe::Minute1),
            "5m" => Ok(Timeframe::Minute5),
            "15m" => Ok(Timeframe::Minute15),
            "30m" => Ok(Timeframe::Minute30),
            "1h" | "60m" => Ok(Timeframe::Hour1),
            "4h" => Ok(Timeframe::Hour4),
            "1d" => Ok(Timeframe::Day1),
            "1wk" | "1w" => Ok(Timeframe::Week1),
            other => Err(AnalysisError::InvalidInput(format!("unknown timeframe '{other}'"))),
        }
    }
}
