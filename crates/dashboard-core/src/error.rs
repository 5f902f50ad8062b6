use thiserror::Error;

/// Errors crossing a component boundary. Insufficient indicator history
/// is never an error; the engines fall back to neutral sentinels.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Candle supply came back empty or unreachable. Produced by
    /// `CandleSource` implementations.
    #[error("No data: {0}")]
    NoData(String),
}
