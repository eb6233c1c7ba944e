use analysis_core::{find_pair, PairConfig, Timeframe};
use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use technical_analysis::AnalyzerConfig;

/// Upper bound on `MAX_BARS`
pub const MAX_BARS_LIMIT: usize = 10_000;

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub pair: &'static PairConfig,
    pub timeframe: Timeframe,
    /// JSON candle file; the synthetic provider is used when unset
    pub candles_file: Option<PathBuf>,
    pub max_bars: usize,
    /// 0 = analyze once and exit
    pub refresh_interval_seconds: u64,
    pub pivot_lookback: usize,
    pub mock_seed: Option<u64>,
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let pair_id = get("SIGNAL_PAIR", "EURUSD");
        let pair = find_pair(&pair_id).ok_or_else(|| anyhow!("Unknown SIGNAL_PAIR '{pair_id}'"))?;

        let config = Self {
            pair,
            timeframe: get("SIGNAL_TIMEFRAME", "1h")
                .parse()
                .context("Invalid SIGNAL_TIMEFRAME")?,
            candles_file: lookup("CANDLES_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            max_bars: get("MAX_BARS", "100")
                .parse()
                .context("Invalid MAX_BARS")?,
            refresh_interval_seconds: get("REFRESH_INTERVAL_SECONDS", "0")
                .parse()
                .context("Invalid REFRESH_INTERVAL_SECONDS")?,
            pivot_lookback: get("PIVOT_LOOKBACK", "20")
                .parse()
                .context("Invalid PIVOT_LOOKBACK")?,
            mock_seed: lookup("MOCK_SEED")
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.parse::<u64>())
                .transpose()
                .context("Invalid MOCK_SEED")?,
        };

        if !(2..=MAX_BARS_LIMIT).contains(&config.max_bars) {
            return Err(anyhow!(
                "MAX_BARS must be between 2 and {MAX_BARS_LIMIT}, got {}",
                config.max_bars
            ));
        }

        Ok(config)
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            pivot_lookback: self.pivot_lookback,
            ..AnalyzerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RunnerConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.pair.id, "EURUSD");
        assert_eq!(config.timeframe, Timeframe::Hour1);
        assert!(config.candles_file.is_none());
        assert_eq!(config.max_bars, 100);
        assert_eq!(config.refresh_interval_seconds, 0);
        assert_eq!(config.analyzer_config(), AnalyzerConfig::default());
        assert!(config.mock_seed.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = RunnerConfig::from_lookup(lookup(&[
            ("SIGNAL_PAIR", "usdjpy"),
            ("SIGNAL_TIMEFRAME", "15m"),
            ("CANDLES_FILE", "/tmp/candles.json"),
            ("REFRESH_INTERVAL_SECONDS", "30"),
            ("PIVOT_LOOKBACK", "10"),
            ("MOCK_SEED", "7"),
        ]))
        .unwrap();

        assert_eq!(config.pair.id, "USDJPY");
        assert_eq!(config.timeframe, Timeframe::Minute15);
        assert_eq!(config.candles_file, Some(PathBuf::from("/tmp/candles.json")));
        assert_eq!(config.refresh_interval_seconds, 30);
        assert_eq!(config.analyzer_config().pivot_lookback, 10);
        assert_eq!(config.mock_seed, Some(7));
    }

    #[test]
    fn test_invalid_values() {
        assert!(RunnerConfig::from_lookup(lookup(&[("SIGNAL_PAIR", "BTCUSD")])).is_err());
        assert!(RunnerConfig::from_lookup(lookup(&[("SIGNAL_TIMEFRAME", "2h")])).is_err());
        assert!(RunnerConfig::from_lookup(lookup(&[("MAX_BARS", "1")])).is_err());
        assert!(RunnerConfig::from_lookup(lookup(&[("MAX_BARS", "10001")])).is_err());
        assert!(RunnerConfig::from_lookup(lookup(&[("MAX_BARS", "18446744073709551615")])).is_err());
        assert_eq!(
            RunnerConfig::from_lookup(lookup(&[("MAX_BARS", "10000")])).unwrap().max_bars,
            MAX_BARS_LIMIT
        );
        assert!(RunnerConfig::from_lookup(lookup(&[("MOCK_SEED", "abc")])).is_err());
    }
}
