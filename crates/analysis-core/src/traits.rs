use async_trait::async_trait;
use crate::{AnalysisError, Candle, PairConfig, Timeframe};

/// Source of candle series for the signal engine.
///
/// Implementations return a chronologically ordered, deduplicated series and are
/// responsible for any retry or synthetic fallback policy.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_series(
        &self,
        pair: &PairConfig,
        timeframe: Timeframe,
    ) -> Result<Vec<Candle>, AnalysisError>;
}
