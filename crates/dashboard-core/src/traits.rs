use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Candle, EngineError, Timeframe};

/// External candle supply.
///
/// Fetching may be asynchronous and rate-limited; the analytics engines
/// themselves perform no I/O. An empty result is valid and must be
/// treated as "insufficient data" downstream, not as a fault.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Candle>, EngineError>;
}
