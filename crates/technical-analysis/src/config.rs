use serde::{Deserialize, Serialize};

use crate::indicators::IndicatorParams;

/// Tunables for one engine instance. Defaults reproduce the standard setup:
/// RSI 14, MACD 12/26/9, Bollinger 20/2, EMA 20/50, ATR 14, pivot lookback 20.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub indicators: IndicatorParams,
    /// Bars on each side of a swing point
    pub pivot_lookback: usize,
    /// Cluster distance as a fraction of current price
    pub cluster_threshold_pct: f64,
    /// Max distance from a level, as a fraction of price, to count as "near"
    pub proximity_pct: f64,
    pub max_levels: usize,
    pub max_order_blocks: usize,
    pub max_fair_value_gaps: usize,
    pub stop_atr_multiplier: f64,
    pub target_atr_multiplier: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            indicators: IndicatorParams::default(),
            pivot_lookback: 20,
            cluster_threshold_pct: 0.002,
            proximity_pct: 0.002,
            max_levels: 3,
            max_order_blocks: 3,
            max_fair_value_gaps: 2,
            stop_atr_multiplier: 1.5,
            target_atr_multiplier: 3.0,
        }
    }
}
