use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dashboard_core::Candle;
use serde::{Deserialize, Serialize};

/// One entry of a time-aligned indicator series.
///
/// `value` is `None` where insufficient history exists (e.g. ATR before
/// 14 true ranges have formed).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    pub value: Option<f64>,
}

/// Historical series for all supported indicators.
///
/// Invariant: every series has exactly one point per input candle, so
/// chart overlays stay aligned with the candles by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    /// EMA series keyed by period.
    pub ema: BTreeMap<u32, Vec<SeriesPoint>>,
    pub vwap: Vec<SeriesPoint>,
    pub atr: Vec<SeriesPoint>,
    pub rsi: Vec<SeriesPoint>,
    pub stoch_k: Vec<SeriesPoint>,
    pub stoch_d: Vec<SeriesPoint>,
    pub volume_ma: Vec<SeriesPoint>,
}

pub const DEFAULT_EMA_PERIODS: [u32; 4] = [9, 21, 50, 200];

const ATR_PERIOD: usize = 14;
const RSI_PERIOD: usize = 14;
const STOCH_PERIOD: usize = 14;
const VOLUME_MA_PERIOD: usize = 20;

/// Computes aligned series for every indicator with the default EMA
/// periods (9/21/50/200).
pub fn compute_series(candles: &[Candle]) -> IndicatorSeries {
    compute_series_with_periods(candles, &DEFAULT_EMA_PERIODS)
}

/// Computes aligned series for every indicator.
pub fn compute_series_with_periods(candles: &[Candle], ema_periods: &[u32]) -> IndicatorSeries {
    let n = candles.len();
    let times: Vec<DateTime<Utc>> = candles.iter().map(|c| c.time).collect();
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();

    // EMA: first-close seed keeps the series fully populated from bar 0.
    let mut ema_map = BTreeMap::new();
    for &p in ema_periods {
        let values = crate::indicators::ema(&closes, p as usize);
        let points = times
            .iter()
            .zip(values)
            .map(|(&time, v)| SeriesPoint { time, value: Some(v) })
            .collect();
        ema_map.insert(p, points);
    }

    // VWAP: cumulative over the supplied window, 0.0 on zero volume.
    let mut vwap_series = Vec::with_capacity(n);
    let mut cumulative_pv = 0.0;
    let mut cumulative_volume = 0.0;
    for c in candles {
        cumulative_pv += c.typical_price() * c.volume;
        cumulative_volume += c.volume;
        let value = if cumulative_volume != 0.0 {
            cumulative_pv / cumulative_volume
        } else {
            0.0
        };
        vwap_series.push(SeriesPoint { time: c.time, value: Some(value) });
    }

    // ATR: SMA of the trailing 14 true ranges, absent before 15 candles.
    let mut atr_series = Vec::with_capacity(n);
    let mut trs: Vec<f64> = Vec::new();
    for i in 0..n {
        if i == 0 {
            atr_series.push(SeriesPoint { time: times[i], value: None });
            continue;
        }
        let high_low = candles[i].high - candles[i].low;
        let high_close = (candles[i].high - candles[i - 1].close).abs();
        let low_close = (candles[i].low - candles[i - 1].close).abs();
        trs.push(high_low.max(high_close).max(low_close));

        let value = if trs.len() < ATR_PERIOD {
            None
        } else {
            Some(trs[trs.len() - ATR_PERIOD..].iter().sum::<f64>() / ATR_PERIOD as f64)
        };
        atr_series.push(SeriesPoint { time: times[i], value });
    }

    // RSI: SMA of trailing gains/losses, absent before 15 candles.
    let mut rsi_series = Vec::with_capacity(n);
    let mut gains: Vec<f64> = Vec::new();
    let mut losses: Vec<f64> = Vec::new();
    for i in 0..n {
        if i == 0 {
            rsi_series.push(SeriesPoint { time: times[i], value: None });
            continue;
        }
        let change = closes[i] - closes[i - 1];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));

        let value = if gains.len() < RSI_PERIOD {
            None
        } else {
            let avg_gain =
                gains[gains.len() - RSI_PERIOD..].iter().sum::<f64>() / RSI_PERIOD as f64;
            let avg_loss =
                losses[losses.len() - RSI_PERIOD..].iter().sum::<f64>() / RSI_PERIOD as f64;
            if avg_loss == 0.0 {
                Some(100.0)
            } else {
                let rs = avg_gain / avg_loss;
                Some(100.0 - (100.0 / (1.0 + rs)))
            }
        };
        rsi_series.push(SeriesPoint { time: times[i], value });
    }

    // Stochastic: %K over the trailing window, %D the trailing-3 SMA of
    // %K (absent until three %K values exist).
    let mut stoch_k_series = Vec::with_capacity(n);
    let mut stoch_d_series = Vec::with_capacity(n);
    let mut k_values: Vec<f64> = Vec::new();
    for i in 0..n {
        if i < STOCH_PERIOD - 1 {
            stoch_k_series.push(SeriesPoint { time: times[i], value: None });
            stoch_d_series.push(SeriesPoint { time: times[i], value: None });
            continue;
        }
        let window = &candles[i + 1 - STOCH_PERIOD..=i];
        let highest = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
        let lowest = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
        let k = if highest == lowest {
            50.0
        } else {
            (closes[i] - lowest) / (highest - lowest) * 100.0
        };
        k_values.push(k);

        let d = if k_values.len() < 3 {
            None
        } else {
            Some(k_values[k_values.len() - 3..].iter().sum::<f64>() / 3.0)
        };
        stoch_k_series.push(SeriesPoint { time: times[i], value: Some(k) });
        stoch_d_series.push(SeriesPoint { time: times[i], value: d });
    }

    // Volume MA: SMA of the trailing 20 volumes.
    let mut volume_ma_series = Vec::with_capacity(n);
    for i in 0..n {
        let value = if i < VOLUME_MA_PERIOD - 1 {
            None
        } else {
            let window = &candles[i + 1 - VOLUME_MA_PERIOD..=i];
            Some(window.iter().map(|c| c.volume).sum::<f64>() / VOLUME_MA_PERIOD as f64)
        };
        volume_ma_series.push(SeriesPoint { time: times[i], value });
    }

    IndicatorSeries {
        ema: ema_map,
        vwap: vwap_series,
        atr: atr_series,
        rsi: rsi_series,
        stoch_k: stoch_k_series,
        stoch_d: stoch_d_series,
        volume_ma: volume_ma_series,
    }
}
