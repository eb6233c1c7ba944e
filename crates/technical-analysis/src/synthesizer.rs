use analysis_core::{
    Bias, Direction, FairValueGap, IndicatorSnapshot, Level, OrderBlock, Signal, SignalAction,
};

use crate::config::AnalyzerConfig;
use crate::indicators::IndicatorSet;

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// Reward:risk reported for BUY/SELL. Fixed; it is not derived from the ATR
/// multipliers and goes stale if those are tuned independently.
pub const RISK_REWARD_RATIO: f64 = 2.0;

const BASE_CONFIDENCE: f64 = 60.0;
const CONFIDENCE_PER_POINT: f64 = 5.0;
const MAX_CONFIDENCE: f64 = 95.0;
const WAIT_CONFIDENCE: u8 = 50;

/// Latest value of every indicator a rule reads
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatestIndicators {
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_diff: Option<f64>,
    pub ema_20: Option<f64>,
    pub ema_50: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub atr: Option<f64>,
}

impl LatestIndicators {
    pub fn from_set(set: &IndicatorSet) -> Self {
        Self {
            rsi: IndicatorSet::latest(&set.rsi),
            macd: IndicatorSet::latest(&set.macd),
            macd_diff: IndicatorSet::latest(&set.macd_diff),
            ema_20: IndicatorSet::latest(&set.ema_20),
            ema_50: IndicatorSet::latest(&set.ema_50),
            bb_upper: IndicatorSet::latest(&set.bb_upper),
            bb_lower: IndicatorSet::latest(&set.bb_lower),
            atr: IndicatorSet::latest(&set.atr),
        }
    }

    pub fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: self.rsi,
            macd: self.macd,
            ema_20: self.ema_20,
            ema_50: self.ema_50,
            atr: self.atr,
        }
    }
}

/// Everything the synthesizer consumes
#[derive(Debug, Clone, PartialEq)]
pub struct SignalInputs {
    pub current_price: f64,
    pub indicators: LatestIndicators,
    pub support: Vec<Level>,
    pub resistance: Vec<Level>,
    /// Oldest first
    pub order_blocks: Vec<OrderBlock>,
    /// Oldest first
    pub fair_value_gaps: Vec<FairValueGap>,
}

/// One triggered rule
#[derive(Debug, Clone, PartialEq)]
pub struct SignalFactor {
    pub note: String,
    pub weight: f64,
    pub bullish: bool,
}

impl SignalFactor {
    fn bullish(note: impl Into<String>, weight: f64) -> Self {
        Self { note: note.into(), weight, bullish: true }
    }

    fn bearish(note: impl Into<String>, weight: f64) -> Self {
        Self { note: note.into(), weight, bullish: false }
    }
}

/// Evaluate the scoring rules in their fixed order. Rules whose indicator is
/// still undefined are skipped.
pub fn score_factors(inputs: &SignalInputs, config: &AnalyzerConfig) -> Vec<SignalFactor> {
    let price = inputs.current_price;
    let ind = &inputs.indicators;
    let mut factors = Vec::new();

    // RSI extremes
    if let Some(rsi) = ind.rsi {
        if rsi < RSI_OVERSOLD {
            factors.push(SignalFactor::bullish(format!("RSI Oversold ({rsi:.2})"), 2.0));
        } else if rsi > RSI_OVERBOUGHT {
            factors.push(SignalFactor::bearish(format!("RSI Overbought ({rsi:.2})"), 2.0));
        }
    }

    // MACD histogram sign
    if let Some(hist) = ind.macd_diff {
        if hist > 0.0 {
            factors.push(SignalFactor::bullish("MACD Bullish (histogram above zero)", 1.5));
        } else {
            factors.push(SignalFactor::bearish("MACD Bearish (histogram at or below zero)", 1.5));
        }
    }

    // EMA trend
    if let (Some(fast), Some(slow)) = (ind.ema_20, ind.ema_50) {
        if fast > slow {
            factors.push(SignalFactor::bullish("EMA 20 above EMA 50", 1.0));
        } else {
            factors.push(SignalFactor::bearish("EMA 20 below EMA 50", 1.0));
        }
    }

    // Bollinger Bands
    if ind.bb_lower.is_some_and(|lower| price < lower) {
        factors.push(SignalFactor::bullish("Price below lower Bollinger Band", 1.5));
    } else if ind.bb_upper.is_some_and(|upper| price > upper) {
        factors.push(SignalFactor::bearish("Price above upper Bollinger Band", 1.5));
    }

    // Support / resistance proximity, checked against the strongest level
    if let Some(level) = near_level(&inputs.support, price, config.proximity_pct) {
        factors.push(SignalFactor::bullish(
            format!("Price near Support ({:.5}, {} touches)", level.price, level.strength),
            1.0,
        ));
    }
    if let Some(level) = near_level(&inputs.resistance, price, config.proximity_pct) {
        factors.push(SignalFactor::bearish(
            format!("Price near Resistance ({:.5}, {} touches)", level.price, level.strength),
            1.0,
        ));
    }

    // ICT structures: only the most recent of each counts
    if let Some(block) = inputs.order_blocks.last() {
        match block.kind {
            Bias::Bullish => factors.push(SignalFactor::bullish(
                format!("Bullish Order Block at {:.5}", block.low),
                1.0,
            )),
            Bias::Bearish => factors.push(SignalFactor::bearish(
                format!("Bearish Order Block at {:.5}", block.high),
                1.0,
            )),
        }
    }
    if let Some(gap) = inputs.fair_value_gaps.last() {
        let note = format!("{} FVG ({:.5} - {:.5})", gap.kind.label(), gap.low, gap.high);
        match gap.kind {
            Bias::Bullish => factors.push(SignalFactor::bullish(note, 0.5)),
            Bias::Bearish => factors.push(SignalFactor::bearish(note, 0.5)),
        }
    }

    factors
}

/// Strongest level (levels arrive strongest first) when it lies within
/// `proximity_pct` of `price`
fn near_level(levels: &[Level], price: f64, proximity_pct: f64) -> Option<&Level> {
    if price == 0.0 {
        return None;
    }
    levels
        .first()
        .filter(|level| (price - level.price).abs() / price < proximity_pct)
}

/// Fuse the inputs into a single signal
pub fn synthesize(inputs: SignalInputs, config: &AnalyzerConfig) -> Signal {
    let factors = score_factors(&inputs, config);

    let mut bullish_score = 0.0;
    let mut bearish_score = 0.0;
    for factor in &factors {
        if factor.bullish {
            bullish_score += factor.weight;
        } else {
            bearish_score += factor.weight;
        }
    }

    let (action, direction) = if bullish_score > bearish_score {
        (SignalAction::Buy, Direction::Bullish)
    } else if bearish_score > bullish_score {
        (SignalAction::Sell, Direction::Bearish)
    } else {
        (SignalAction::Wait, Direction::Neutral)
    };

    let confidence = match action {
        SignalAction::Wait => WAIT_CONFIDENCE,
        _ => {
            let edge = (bullish_score - bearish_score).abs();
            (BASE_CONFIDENCE + CONFIDENCE_PER_POINT * edge).min(MAX_CONFIDENCE) as u8
        }
    };

    let entry = inputs.current_price;
    let (stop_loss, take_profit) = match (action, inputs.indicators.atr) {
        (SignalAction::Buy, Some(atr)) => (
            entry - atr * config.stop_atr_multiplier,
            entry + atr * config.target_atr_multiplier,
        ),
        (SignalAction::Sell, Some(atr)) => (
            entry + atr * config.stop_atr_multiplier,
            entry - atr * config.target_atr_multiplier,
        ),
        _ => (entry, entry),
    };

    let rr_ratio = match action {
        SignalAction::Wait => 0.0,
        _ => RISK_REWARD_RATIO,
    };

    Signal {
        signal: action,
        direction,
        entry,
        stop_loss,
        take_profit,
        rr_ratio,
        confidence,
        bullish_score,
        bearish_score,
        analysis_details: factors.into_iter().map(|f| f.note).collect(),
        technical_indicators: inputs.indicators.snapshot(),
        support_levels: inputs.support,
        resistance_levels: inputs.resistance,
        order_blocks: inputs.order_blocks,
        fvg_gaps: inputs.fair_value_gaps,
    }
}
