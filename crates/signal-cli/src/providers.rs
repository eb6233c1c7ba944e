use analysis_core::{AnalysisError, Candle, MarketDataProvider, PairConfig, Timeframe};
use async_trait::async_trait;
use chrono::{DateTime, Duration, DurationRound, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Sort ascending by time, drop repeated timestamps and keep the newest `max_bars`
pub fn normalize_series(mut candles: Vec<Candle>, max_bars: usize) -> Vec<Candle> {
    candles.sort_by_key(|c| c.time);
    candles.dedup_by_key(|c| c.time);
    let excess = candles.len().saturating_sub(max_bars);
    candles.drain(..excess);
    candles
}

/// Reads a JSON array of candles from disk
pub struct JsonFileProvider {
    path: PathBuf,
    max_bars: usize,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>, max_bars: usize) -> Self {
        Self {
            path: path.into(),
            max_bars,
        }
    }
}

#[async_trait]
impl MarketDataProvider for JsonFileProvider {
    async fn fetch_series(
        &self,
        pair: &PairConfig,
        timeframe: Timeframe,
    ) -> Result<Vec<Candle>, AnalysisError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AnalysisError::DataUnavailable(format!("failed to read {}: {e}", self.path.display()))
        })?;

        let candles: Vec<Candle> = serde_json::from_str(&raw).map_err(|e| {
            AnalysisError::DataUnavailable(format!("failed to parse {}: {e}", self.path.display()))
        })?;

        let candles = normalize_series(candles, self.max_bars);
        if candles.is_empty() {
            return Err(AnalysisError::DataUnavailable(format!(
                "{} contains no candles",
                self.path.display()
            )));
        }

        debug!(pair = pair.id, %timeframe, bars = candles.len(), "Loaded candles from file");
        Ok(candles)
    }
}

/// Random-walk series around the pair's reference price
pub struct MockDataProvider {
    bars: usize,
    seed: Option<u64>,
}

impl MockDataProvider {
    pub fn new(bars: usize, seed: Option<u64>) -> Self {
        Self { bars, seed }
    }

    /// Build `bars` candles, the last one starting at `end`
    pub fn generate(
        &self,
        pair: &PairConfig,
        timeframe: Timeframe,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, AnalysisError> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let step = Duration::minutes(timeframe.to_minutes());
        let bars_back = self.bars.saturating_sub(1);
        let mut time = i32::try_from(bars_back)
            .ok()
            .and_then(|n| step.checked_mul(n))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| {
                AnalysisError::InvalidInput(format!(
                    "cannot start {} {timeframe} candles before {end}",
                    self.bars
                ))
            })?;

        let volatility = pair.base_price * 0.002;
        let mut price = pair.base_price;
        let mut candles = Vec::with_capacity(self.bars);

        for _ in 0..self.bars {
            let open = price + (rng.gen::<f64>() - 0.5) * volatility;
            let close = open + (rng.gen::<f64>() - 0.5) * volatility;
            let high = open.max(close) + rng.gen::<f64>() * volatility * 0.5;
            let low = open.min(close) - rng.gen::<f64>() * volatility * 0.5;
            let volume = (rng.gen::<f64>() * 1000.0).floor() + 100.0;

            candles.push(Candle {
                time,
                open,
                high,
                low,
                close,
                volume,
            });

            price = close;
            time += step;
        }

        Ok(candles)
    }
}

#[async_trait]
impl MarketDataProvider for MockDataProvider {
    async fn fetch_series(
        &self,
        pair: &PairConfig,
        timeframe: Timeframe,
    ) -> Result<Vec<Candle>, AnalysisError> {
        let step = Duration::minutes(timeframe.to_minutes());
        let end = Utc::now().duration_trunc(step).unwrap_or_else(|_| Utc::now());
        self.generate(pair, timeframe, end)
    }
}

/// Uses the primary provider and falls back to synthetic data when it fails
pub struct FallbackProvider<P> {
    primary: P,
    fallback: MockDataProvider,
}

impl<P: MarketDataProvider> FallbackProvider<P> {
    pub fn new(primary: P, fallback: MockDataProvider) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for FallbackProvider<P> {
    async fn fetch_series(
        &self,
        pair: &PairConfig,
        timeframe: Timeframe,
    ) -> Result<Vec<Candle>, AnalysisError> {
        match self.primary.fetch_series(pair, timeframe).await {
            Ok(candles) => Ok(candles),
            Err(e) => {
                warn!(pair = pair.id, "Primary data source failed ({e}), using synthetic data");
                self.fallback.fetch_series(pair, timeframe).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{find_pair, OhlcSeries};
    use chrono::TimeZone;

    fn eurusd() -> &'static PairConfig {
        find_pair("EURUSD").unwrap()
    }

    fn candle(hour: i64, close: f64) -> Candle {
        Candle {
            time: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap() + Duration::hours(hour),
            open: close,
            high: close + 0.001,
            low: close - 0.001,
            close,
            volume: 1.0,
        }
    }

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("signal-cli-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_normalize_series() {
        let candles = vec![candle(3, 1.3), candle(1, 1.1), candle(2, 1.2), candle(1, 1.1), candle(0, 1.0)];
        let normalized = normalize_series(candles, 3);

        let closes: Vec<f64> = normalized.iter().map(|c| c.close).collect();
        assert_eq!(closes, vec![1.1, 1.2, 1.3]);
    }

    #[test]
    fn test_mock_series_is_valid_and_reproducible() {
        let provider = MockDataProvider::new(100, Some(42));
        let end = Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap();

        let first = provider.generate(eurusd(), Timeframe::Hour1, end).unwrap();
        let second = provider.generate(eurusd(), Timeframe::Hour1, end).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 100);
        assert_eq!(first.last().unwrap().time, end);
        assert_eq!(first[1].time - first[0].time, Duration::hours(1));
        assert!(first.iter().all(|c| c.high >= c.open.max(c.close) && c.low <= c.open.min(c.close)));
        assert!(first.iter().all(|c| (100.0..1100.0).contains(&c.volume)));
        assert!(OhlcSeries::new(first).is_ok());
    }

    #[test]
    fn test_mock_series_out_of_time_range() {
        let end = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();

        // More bars than an i32 offset can express
        let too_many = MockDataProvider::new(usize::MAX, Some(3));
        assert!(matches!(
            too_many.generate(eurusd(), Timeframe::Minute1, end),
            Err(AnalysisError::InvalidInput(_))
        ));

        // Weekly bars reaching back past the earliest representable date
        let too_early = MockDataProvider::new(20_000_000, Some(3));
        assert!(matches!(
            too_early.generate(eurusd(), Timeframe::Week1, end),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_json_file_provider() {
        let candles = vec![candle(2, 1.2), candle(0, 1.0), candle(1, 1.1)];
        let path = temp_file("ok.json", &serde_json::to_string(&candles).unwrap());

        let loaded = JsonFileProvider::new(&path, 100)
            .fetch_series(eurusd(), Timeframe::Hour1)
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.len(), 3);
        assert!(loaded.windows(2).all(|w| w[0].time < w[1].time));
    }

    #[tokio::test]
    async fn test_json_file_provider_errors() {
        let missing = JsonFileProvider::new("/nonexistent/candles.json", 100)
            .fetch_series(eurusd(), Timeframe::Hour1)
            .await;
        assert!(matches!(missing, Err(AnalysisError::DataUnavailable(_))));

        let path = temp_file("bad.json", "not json");
        let bad = JsonFileProvider::new(&path, 100)
            .fetch_series(eurusd(), Timeframe::Hour1)
            .await;
        std::fs::remove_file(&path).ok();
        assert!(matches!(bad, Err(AnalysisError::DataUnavailable(_))));
    }

    #[tokio::test]
    async fn test_fallback_provider_uses_mock_on_failure() {
        let provider = FallbackProvider::new(
            JsonFileProvider::new("/nonexistent/candles.json", 100),
            MockDataProvider::new(50, Some(1)),
        );

        let candles = provider.fetch_series(eurusd(), Timeframe::Hour4).await.unwrap();
        assert_eq!(candles.len(), 50);
    }
}
