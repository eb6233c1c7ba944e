use analysis_core::{AnalysisError, Candle, OhlcSeries, Signal};
use tracing::{debug, warn};

use crate::config::AnalyzerConfig;
use crate::ict::detect_ict_patterns;
use crate::indicators::IndicatorSet;
use crate::levels::support_resistance;
use crate::synthesizer::{synthesize, LatestIndicators, SignalInputs};

/// Stateless signal engine. Holds only its configuration, so one instance can
/// serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct SignalEngine {
    config: AnalyzerConfig,
}

impl SignalEngine {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Validate `candles` and generate a signal.
    ///
    /// Fails only with [`AnalysisError::InvalidInput`]. Short series are not an
    /// error: indicators that have not warmed up are left out of the score.
    pub fn analyze(&self, candles: &[Candle]) -> Result<Signal, AnalysisError> {
        let series = OhlcSeries::new(candles.to_vec()).map_err(|e| {
            warn!("Rejected candle series: {e}");
            e
        })?;
        Ok(self.analyze_series(&series))
    }

    /// Generate a signal from an already validated series
    pub fn analyze_series(&self, series: &OhlcSeries) -> Signal {
        let config = &self.config;
        let candles = series.candles();
        let current_price = series.current_price();

        let indicators = IndicatorSet::compute(candles, &config.indicators);
        let levels = support_resistance(
            candles,
            config.pivot_lookback,
            current_price,
            config.cluster_threshold_pct,
            config.max_levels,
        );
        let patterns = detect_ict_patterns(candles, config.max_order_blocks, config.max_fair_value_gaps);

        let signal = synthesize(
            SignalInputs {
                current_price,
                indicators: LatestIndicators::from_set(&indicators),
                support: levels.support,
                resistance: levels.resistance,
                order_blocks: patterns.order_blocks,
                fair_value_gaps: patterns.fair_value_gaps,
            },
            config,
        );

        debug!(
            candles = candles.len(),
            signal = %signal.signal,
            confidence = signal.confidence,
            bullish = signal.bullish_score,
            bearish = signal.bearish_score,
            "Generated signal"
        );

        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{Direction, SignalAction};
    use chrono::{Duration, TimeZone, Utc};

    fn series(len: usize) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 2, 5, 0, 0, 0).unwrap();
        (0..len)
            .map(|i| {
                let x = i as f64;
                let open = 1.0850 + 0.0030 * (x * 0.35).sin() + 0.0001 * (x * 1.7).cos();
                let close = open + 0.0008 * (x * 0.9).sin();
                Candle {
                    time: start + Duration::hours(i as i64),
                    open,
                    high: open.max(close) + 0.0004,
                    low: open.min(close) - 0.0004,
                    close,
                    volume: 100.0 + x,
                }
            })
            .collect()
    }

    #[test]
    fn test_analyze_full_series_is_bounded_and_deterministic() {
        let engine = SignalEngine::default();
        let candles = series(100);

        let first = engine.analyze(&candles).unwrap();
        let second = engine.analyze(&candles).unwrap();

        assert_eq!(first, second);
        assert!((50..=95).contains(&first.confidence));
        assert!(first.support_levels.len() <= 3);
        assert!(first.resistance_levels.len() <= 3);
        assert!(first.order_blocks.len() <= 3);
        assert!(first.fvg_gaps.len() <= 2);
        assert_eq!(first.entry, candles[99].close);

        let snapshot = &first.technical_indicators;
        assert!(snapshot.rsi.is_some());
        assert!(snapshot.macd.is_some());
        assert!(snapshot.ema_20.is_some());
        assert!(snapshot.ema_50.is_some());
        assert!(snapshot.atr.is_some());
        // MACD and EMA rules always fire once warmed up
        assert!(first.analysis_details.len() >= 2);
    }

    #[test]
    fn test_analyze_sixty_candles() {
        let signal = SignalEngine::default().analyze(&series(60)).unwrap();

        assert!(matches!(
            signal.signal,
            SignalAction::Buy | SignalAction::Sell | SignalAction::Wait
        ));
        assert!((50..=95).contains(&signal.confidence));
    }

    #[test]
    fn test_levels_sorted_by_strength() {
        let signal = SignalEngine::default().analyze(&series(100)).unwrap();

        for levels in [&signal.support_levels, &signal.resistance_levels] {
            assert!(levels.windows(2).all(|w| w[0].strength >= w[1].strength));
        }
    }

    #[test]
    fn test_two_candles_wait() {
        let signal = SignalEngine::default().analyze(&series(2)).unwrap();

        assert_eq!(signal.signal, SignalAction::Wait);
        assert_eq!(signal.direction, Direction::Neutral);
        assert_eq!(signal.confidence, 50);
        assert_eq!(signal.rr_ratio, 0.0);
        assert!(signal.support_levels.is_empty());
        assert!(signal.resistance_levels.is_empty());
        assert!(signal.order_blocks.is_empty());
        assert!(signal.fvg_gaps.is_empty());
        assert!(signal.analysis_details.is_empty());
    }

    #[test]
    fn test_non_increasing_timestamps_rejected() {
        let mut candles = series(30);
        candles[10].time = candles[9].time;

        let result = SignalEngine::default().analyze(&candles);
        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_and_single_rejected() {
        let engine = SignalEngine::default();
        assert!(matches!(engine.analyze(&[]), Err(AnalysisError::InvalidInput(_))));
        assert!(matches!(engine.analyze(&series(1)), Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_shorter_lookback_finds_levels() {
        let config = AnalyzerConfig {
            pivot_lookback: 3,
            ..AnalyzerConfig::default()
        };
        let signal = SignalEngine::new(config).analyze(&series(100)).unwrap();

        assert!(!signal.support_levels.is_empty());
        assert!(!signal.resistance_levels.is_empty());
    }

    #[test]
    fn test_signal_serializes_wire_fields() {
        let signal = SignalEngine::default().analyze(&series(80)).unwrap();
        let value = serde_json::to_value(&signal).unwrap();

        for field in [
            "signal", "direction", "entry", "stop_loss", "take_profit", "rr_ratio",
            "confidence", "analysis_details", "technical_indicators", "support_levels",
            "resistance_levels", "order_blocks", "fvg_gaps",
        ] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
        assert!(value["technical_indicators"].get("ema_50").is_some());
    }
}
