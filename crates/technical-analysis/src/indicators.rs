use analysis_core::{Candle, IndicatorSnapshot};
use serde::{Deserialize, Serialize};

// Every indicator returns a vector aligned to its input. `None` marks indices
// that fall inside the warm-up window; no value at index i looks past i.

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; data.len()];
    if period == 0 || data.len() < period {
        return result;
    }

    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result[i] = Some(sum / period as f64);
    }
    result
}

/// Exponential Moving Average, α = 2/(period + 1).
///
/// The recursion starts from the first value and runs over every input; values
/// before index `period - 1` are masked as warm-up.
pub fn ema(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let alpha = 2.0 / (period as f64 + 1.0);
    masked_ewm(data, alpha, period)
}

/// `y[0] = x[0]`, `y[i] = α·x[i] + (1 - α)·y[i-1]`, with outputs hidden until
/// `min_periods` values have been seen
fn masked_ewm(data: &[f64], alpha: f64, min_periods: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; data.len()];
    if min_periods == 0 || data.len() < min_periods {
        return result;
    }

    let mut prev = data[0];
    for (i, &value) in data.iter().enumerate() {
        if i > 0 {
            prev = alpha * value + (1.0 - alpha) * prev;
        }
        if i + 1 >= min_periods {
            result[i] = Some(prev);
        }
    }

    result
}

/// EMA over the defined tail of an already warmed-up series
fn ema_of_defined(data: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; data.len()];
    let Some(start) = data.iter().position(Option::is_some) else {
        return result;
    };
    let Some(tail) = data[start..].iter().copied().collect::<Option<Vec<f64>>>() else {
        return result;
    };

    for (offset, value) in ema(&tail, period).into_iter().enumerate() {
        result[start + offset] = value;
    }
    result
}

/// Relative Strength Index with Wilder smoothing (α = 1/period).
///
/// Average gain and loss start from the first close-to-close change. The
/// first value is reported once `period` changes exist, at index `period`.
pub fn rsi(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; data.len()];
    if period == 0 || data.len() < period + 1 {
        return result;
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = data
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let alpha = 1.0 / period as f64;
    let avg_gain = masked_ewm(&gains, alpha, period);
    let avg_loss = masked_ewm(&losses, alpha, period);

    // change j sits between data[j] and data[j + 1]
    for (j, (gain, loss)) in avg_gain.iter().zip(&avg_loss).enumerate() {
        if let (Some(gain), Some(loss)) = (gain, loss) {
            result[j + 1] = Some(rsi_value(*gain, *loss));
        }
    }

    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    let total = avg_gain + avg_loss;
    if total == 0.0 {
        // Flat market
        50.0
    } else {
        100.0 * avg_gain / total
    }
}

/// MACD (Moving Average Convergence Divergence)
pub struct MacdResult {
    pub macd_line: Vec<Option<f64>>,
    pub signal_line: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn macd(data: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> MacdResult {
    let empty = vec![None; data.len()];
    if fast_period == 0 || slow_period == 0 || signal_period == 0 || slow_period < fast_period {
        return MacdResult {
            macd_line: empty.clone(),
            signal_line: empty.clone(),
            histogram: empty,
        };
    }

    let ema_fast = ema(data, fast_period);
    let ema_slow = ema(data, slow_period);

    let macd_line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(fast, slow)| Some((*fast)? - (*slow)?))
        .collect();

    let signal_line = ema_of_defined(&macd_line, signal_period);

    let histogram = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(line, signal)| Some((*line)? - (*signal)?))
        .collect();

    MacdResult {
        macd_line,
        signal_line,
        histogram,
    }
}

/// Bollinger Bands
pub struct BollingerBands {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

pub fn bollinger_bands(data: &[f64], period: usize, std_dev: f64) -> BollingerBands {
    let middle = sma(data, period);
    let mut upper = vec![None; data.len()];
    let mut lower = vec![None; data.len()];

    for (i, mean) in middle.iter().enumerate() {
        let Some(mean) = *mean else { continue };
        let slice = &data[i + 1 - period..=i];
        // Population variance
        let variance: f64 = slice.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let std = variance.sqrt();

        upper[i] = Some(mean + std_dev * std);
        lower[i] = Some(mean - std_dev * std);
    }

    BollingerBands {
        upper,
        middle,
        lower,
    }
}

/// True range per candle. The first candle has no previous close, so it uses high - low.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    candles
        .iter()
        .enumerate()
        .map(|(i, candle)| {
            let high_low = candle.high - candle.low;
            if i == 0 {
                return high_low;
            }
            let prev_close = candles[i - 1].close;
            let high_close = (candle.high - prev_close).abs();
            let low_close = (candle.low - prev_close).abs();
            high_low.max(high_close).max(low_close)
        })
        .collect()
}

/// Average True Range (Wilder smoothing, seeded with the mean of the first window)
pub fn atr(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; candles.len()];
    if period == 0 || candles.len() < period {
        return result;
    }

    let true_ranges = true_range(candles);
    let mut atr = true_ranges[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = Some(atr);

    for i in period..true_ranges.len() {
        atr = (atr * (period - 1) as f64 + true_ranges[i]) / period as f64;
        result[i] = Some(atr);
    }

    result
}

/// Indicator windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_period: usize,
    pub bb_std_dev: f64,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub atr_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            bb_period: 20,
            bb_std_dev: 2.0,
            ema_fast: 20,
            ema_slow: 50,
            atr_period: 14,
        }
    }
}

/// All indicators for one series, index-aligned with the candles
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSet {
    pub rsi: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub macd_diff: Vec<Option<f64>>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_middle: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
    pub ema_20: Vec<Option<f64>>,
    pub ema_50: Vec<Option<f64>>,
    pub atr: Vec<Option<f64>>,
}

impl IndicatorSet {
    pub fn compute(candles: &[Candle], params: &IndicatorParams) -> Self {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

        let macd_result = macd(&closes, params.macd_fast, params.macd_slow, params.macd_signal);
        let bb = bollinger_bands(&closes, params.bb_period, params.bb_std_dev);

        Self {
            rsi: rsi(&closes, params.rsi_period),
            macd: macd_result.macd_line,
            macd_signal: macd_result.signal_line,
            macd_diff: macd_result.histogram,
            bb_upper: bb.upper,
            bb_middle: bb.middle,
            bb_lower: bb.lower,
            ema_20: ema(&closes, params.ema_fast),
            ema_50: ema(&closes, params.ema_slow),
            atr: atr(candles, params.atr_period),
        }
    }

    pub fn len(&self) -> usize {
        self.rsi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rsi.is_empty()
    }

    /// Value at the last index, `None` if still warming up
    pub fn latest(values: &[Option<f64>]) -> Option<f64> {
        values.last().copied().flatten()
    }

    pub fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: Self::latest(&self.rsi),
            macd: Self::latest(&self.macd),
            ema_20: Self::latest(&self.ema_20),
            ema_50: Self::latest(&self.ema_50),
            atr: Self::latest(&self.atr),
        }
    }
}
