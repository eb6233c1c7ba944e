use serde::Serialize;

/// Tradable instrument and the data it needs outside the engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairConfig {
    pub id: &'static str,
    /// Upstream ticker symbol
    pub symbol: &'static str,
    pub name: &'static str,
    pub pip: f64,
    /// Reference price used to seed synthetic series
    pub base_price: f64,
}

pub const PAIRS: &[PairConfig] = &[
    PairConfig { id: "EURUSD", symbol: "EURUSD=X", name: "EUR/USD", pip: 0.0001, base_price: 1.0850 },
    PairConfig { id: "GBPUSD", symbol: "GBPUSD=X", name: "GBP/USD", pip: 0.0001, base_price: 1.2650 },
    PairConfig { id: "USDJPY", symbol: "USDJPY=X", name: "USD/JPY", pip: 0.01, base_price: 149.50 },
    PairConfig { id: "USDCHF", symbol: "USDCHF=X", name: "USD/CHF", pip: 0.0001, base_price: 0.8850 },
    PairConfig { id: "AUDUSD", symbol: "AUDUSD=X", name: "AUD/USD", pip: 0.0001, base_price: 0.6500 },
    PairConfig { id: "NZDUSD", symbol: "NZDUSD=X", name: "NZD/USD", pip: 0.0001, base_price: 0.6050 },
    PairConfig { id: "USDCAD", symbol: "USDCAD=X", name: "USD/CAD", pip: 0.0001, base_price: 1.3650 },
    PairConfig { id: "XAUUSD", symbol: "GC=F", name: "Gold", pip: 0.01, base_price: 2030.00 },
];

/// Case-insensitive lookup by pair id (e.g. "eurusd")
pub fn find_pair(id: &str) -> Option<&'static PairConfig> {
    PAIRS.iter().find(|p| p.id.eq_ignore_ascii_case(id.trim()))
}
