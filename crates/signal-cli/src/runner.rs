use analysis_core::{MarketDataProvider, Signal};
use anyhow::{Context, Result};
use technical_analysis::SignalEngine;

use crate::config::RunnerConfig;
use crate::providers::{FallbackProvider, JsonFileProvider, MockDataProvider};

pub fn build_provider(config: &RunnerConfig) -> Box<dyn MarketDataProvider> {
    let mock = MockDataProvider::new(config.max_bars, config.mock_seed);
    match &config.candles_file {
        Some(path) => Box::new(FallbackProvider::new(
            JsonFileProvider::new(path.clone(), config.max_bars),
            mock,
        )),
        None => Box::new(mock),
    }
}

/// Fetch one series and run it through the engine
pub async fn run_once(
    engine: &SignalEngine,
    provider: &dyn MarketDataProvider,
    config: &RunnerConfig,
) -> Result<Signal> {
    let candles = provider
        .fetch_series(config.pair, config.timeframe)
        .await
        .with_context(|| format!("Failed to fetch {} {}", config.pair.id, config.timeframe))?;

    let signal = engine
        .analyze(&candles)
        .with_context(|| format!("Failed to analyze {}", config.pair.id))?;

    tracing::info!(
        pair = config.pair.id,
        timeframe = %config.timeframe,
        signal = %signal.signal,
        confidence = signal.confidence,
        entry = signal.entry,
        "Signal generated"
    );

    Ok(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> RunnerConfig {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        RunnerConfig::from_lookup(|key: &str| map.get(key).map(|v| v.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_run_once_with_synthetic_data() {
        let config = config(&[("MOCK_SEED", "11"), ("SIGNAL_PAIR", "XAUUSD")]);
        let engine = SignalEngine::new(config.analyzer_config());
        let provider = build_provider(&config);

        let first = run_once(&engine, provider.as_ref(), &config).await.unwrap();
        let second = run_once(&engine, provider.as_ref(), &config).await.unwrap();

        assert!((50..=95).contains(&first.confidence));
        // Same seed, same prices
        assert_eq!(first.signal, second.signal);
        assert_eq!(first.entry, second.entry);
    }

    #[tokio::test]
    async fn test_run_once_falls_back_when_file_missing() {
        let config = config(&[("CANDLES_FILE", "/nonexistent/candles.json"), ("MAX_BARS", "60")]);
        let engine = SignalEngine::new(config.analyzer_config());
        let provider = build_provider(&config);

        let signal = run_once(&engine, provider.as_ref(), &config).await.unwrap();
        assert!(signal.technical_indicators.ema_50.is_some());
    }
}
