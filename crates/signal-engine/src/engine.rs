use chrono::{Days, NaiveDate, Utc};
use dashboard_core::{Candle, CandleSource, EngineError, RiskConfig, Signal, Timeframe};
use dashmap::DashMap;
use level_engine::{compute_levels, PivotLevels};
use pricing_engine::{compute_metrics, translate_trade_levels, OptionQuote, OptionTradeLevels};
use tracing::{info, warn};

use crate::classify::classify;

/// Signal generator bound to a candle source.
///
/// Daily pivot levels are memoized per symbol and session date so that
/// repeated intraday requests reuse the same level set.
pub struct SignalEngine<S: CandleSource> {
    source: S,
    levels_cache: DashMap<(String, NaiveDate), PivotLevels>,
}

impl<S: CandleSource> SignalEngine<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            levels_cache: DashMap::new(),
        }
    }

    /// Fetches candles for the symbol, derives the session's pivot levels
    /// from the previous day's range and classifies the latest window.
    pub async fn generate(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        config: &RiskConfig,
    ) -> Result<Signal, EngineError> {
        let candles = self
            .source
            .fetch_candles(symbol, timeframe, None, None)
            .await?;

        let Some(latest) = candles.last() else {
            warn!(symbol, "no candles returned for signal generation");
            return Ok(Signal::neutral(Utc::now(), symbol, 0.0, "No data available"));
        };

        let session = latest.time.date_naive();
        let levels = self.daily_levels(symbol, session, &candles);
        let signal = classify(symbol, &candles, &levels, config);

        info!(
            symbol,
            scenario = signal.scenario.as_str(),
            direction = ?signal.direction,
            confidence = signal.confidence,
            "generated signal"
        );

        Ok(signal)
    }

    /// Translates a stock signal into option entry/stop/target premiums
    /// for the given contract, calibrating IV from the market premium
    /// when one is supplied.
    pub fn option_trade_levels(
        &self,
        signal: &Signal,
        quote: &OptionQuote,
        today: NaiveDate,
        market_price: Option<f64>,
    ) -> Result<OptionTradeLevels, EngineError> {
        let metrics = compute_metrics(quote, today, market_price)?;
        Ok(translate_trade_levels(
            &metrics,
            signal.stop_price,
            signal.target_price,
        ))
    }

    fn daily_levels(&self, symbol: &str, session: NaiveDate, candles: &[Candle]) -> PivotLevels {
        if let Some(cached) = self.levels_cache.get(&(symbol.to_string(), session)) {
            return cached.clone();
        }
        let (high, low, close) = previous_day_hlc(candles, session);
        let levels = compute_levels(high, low, close, None);
        self.levels_cache
            .insert((symbol.to_string(), session), levels.clone());
        levels
    }
}

/// Aggregates the previous session's high, low and close from the candle
/// window. Falls back to the latest bar when no prior-day candles exist.
fn previous_day_hlc(candles: &[Candle], session: NaiveDate) -> (f64, f64, f64) {
    let prev_day = session.checked_sub_days(Days::new(1));

    if let Some(prev) = prev_day {
        let mut high = f64::NEG_INFINITY;
        let mut low = f64::INFINITY;
        let mut close = None;
        for c in candles {
            if c.time.date_naive() == prev {
                high = high.max(c.high);
                low = low.min(c.low);
                close = Some(c.close);
            }
        }
        if let Some(close) = close {
            return (high, low, close);
        }
    }

    // Intraday-only window: seed the levels from the latest bar.
    let latest = candles.last().map(|c| (c.high, c.low, c.close));
    latest.unwrap_or((0.0, 0.0, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};

    struct FixedSource {
        candles: Vec<Candle>,
    }

    #[async_trait]
    impl CandleSource for FixedSource {
        async fn fetch_candles(
            &self,
            _symbol: &str,
            _timeframe: Timeframe,
            _start: Option<DateTime<Utc>>,
            _end: Option<DateTime<Utc>>,
        ) -> Result<Vec<Candle>, EngineError> {
            Ok(self.candles.clone())
        }
    }

    fn candle(day: u32, hour: u32, o: f64, h: f64, l: f64, c: f64, v: f64) -> Candle {
        Candle {
            time: Utc.with_ymd_and_hms(2025, 4, day, hour, 0, 0).unwrap(),
            open: o,
            high: h,
            low: l,
            close: c,
            volume: v,
        }
    }

    #[tokio::test]
    async fn empty_source_yields_neutral_signal() {
        let engine = SignalEngine::new(FixedSource { candles: vec![] });
        let signal = engine
            .generate("NIFTY", Timeframe::Minute5, &RiskConfig::default())
            .await
            .unwrap();
        assert_eq!(signal.scenario, dashboard_core::Scenario::None);
        assert_eq!(signal.reason, "No data available");
        assert_eq!(signal.entry_price, 0.0);
    }

    #[tokio::test]
    async fn flat_window_yields_no_scenario() {
        let candles: Vec<Candle> = (0..20)
            .map(|i| candle(15, i, 100.0, 101.0, 99.0, 100.0, 1000.0))
            .collect();
        let engine = SignalEngine::new(FixedSource { candles });
        let signal = engine
            .generate("NIFTY", Timeframe::Minute5, &RiskConfig::default())
            .await
            .unwrap();
        assert_eq!(signal.scenario, dashboard_core::Scenario::None);
        assert_eq!(signal.reason, "No valid trading scenario detected");
    }

    #[test]
    fn previous_day_hlc_aggregates_prior_session() {
        let candles = vec![
            candle(14, 9, 100.0, 110.0, 95.0, 105.0, 1000.0),
            candle(14, 10, 105.0, 112.0, 104.0, 108.0, 1000.0),
            candle(15, 9, 108.0, 109.0, 107.0, 108.5, 1000.0),
        ];
        let session = NaiveDate::from_ymd_opt(2025, 4, 15).unwrap();
        let (h, l, c) = previous_day_hlc(&candles, session);
        assert_eq!(h, 112.0);
        assert_eq!(l, 95.0);
        assert_eq!(c, 108.0);
    }

    #[test]
    fn previous_day_hlc_falls_back_to_latest_bar() {
        let candles = vec![candle(15, 9, 100.0, 102.0, 99.0, 101.0, 1000.0)];
        let session = NaiveDate::from_ymd_opt(2025, 4, 15).unwrap();
        let (h, l, c) = previous_day_hlc(&candles, session);
        assert_eq!((h, l, c), (102.0, 99.0, 101.0));
    }

    #[tokio::test]
    async fn daily_levels_are_cached_per_session() {
        let candles = vec![
            candle(14, 9, 100.0, 110.0, 95.0, 105.0, 1000.0),
            candle(15, 9, 105.0, 106.0, 104.0, 105.5, 1000.0),
        ];
        let engine = SignalEngine::new(FixedSource { candles });
        let config = RiskConfig::default();
        engine.generate("NIFTY", Timeframe::Minute5, &config).await.unwrap();
        assert_eq!(engine.levels_cache.len(), 1);
        engine.generate("NIFTY", Timeframe::Minute5, &config).await.unwrap();
        assert_eq!(engine.levels_cache.len(), 1);
    }
}
