use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Malformed series; the only error the engine itself returns
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Raised by market data providers when a series cannot be acquired
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),
}
