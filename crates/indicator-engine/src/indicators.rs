use dashboard_core::Candle;
use serde::{Deserialize, Serialize};

/// Exponential Moving Average over a value series.
///
/// Seeds with the first value (no SMA warm-up), so the output has one
/// entry per input from bar 0. The chart frontend relies on this seeding
/// for parity, so do not switch to the textbook SMA-seeded variant.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.is_empty() {
        return vec![];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut result = Vec::with_capacity(values.len());
    result.push(values[0]);

    for i in 1..values.len() {
        let prev = result[i - 1];
        result.push(values[i] * k + prev * (1.0 - k));
    }

    result
}

/// Latest EMA value, 0.0 when the series is empty.
pub fn ema_last(values: &[f64], period: usize) -> f64 {
    ema(values, period).last().copied().unwrap_or(0.0)
}

/// Volume Weighted Average Price over the supplied window.
///
/// Cumulative from the first candle; callers must pass a session-scoped
/// window because there is no internal session reset. Zero total volume
/// yields 0.0.
pub fn vwap(candles: &[Candle]) -> f64 {
    let mut cumulative_pv = 0.0;
    let mut cumulative_volume = 0.0;

    for c in candles {
        cumulative_pv += c.typical_price() * c.volume;
        cumulative_volume += c.volume;
    }

    if cumulative_volume != 0.0 {
        cumulative_pv / cumulative_volume
    } else {
        0.0
    }
}

fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    candles
        .windows(2)
        .map(|w| {
            let high_low = w[1].high - w[1].low;
            let high_close = (w[1].high - w[0].close).abs();
            let low_close = (w[1].low - w[0].close).abs();
            high_low.max(high_close).max(low_close)
        })
        .collect()
}

/// Average True Range: plain SMA of the last `period` true ranges.
///
/// Returns 0.0 until `period + 1` candles exist.
pub fn atr(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < period + 1 {
        return 0.0;
    }

    let trs = true_ranges(candles);
    let recent = &trs[trs.len() - period..];
    recent.iter().sum::<f64>() / period as f64
}

/// Relative Strength Index over the last `period` close deltas.
///
/// Plain SMA of gains/losses (not Wilder smoothing). Returns the neutral
/// 50.0 with fewer than `period + 1` candles, 100.0 when the average
/// loss is exactly zero.
pub fn rsi(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < period + 1 {
        return 50.0;
    }

    let mut gains = Vec::with_capacity(candles.len() - 1);
    let mut losses = Vec::with_capacity(candles.len() - 1);
    for w in candles.windows(2) {
        let change = w[1].close - w[0].close;
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let avg_gain = gains[gains.len() - period..].iter().sum::<f64>() / period as f64;
    let avg_loss = losses[losses.len() - period..].iter().sum::<f64>() / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// %K over the trailing window ending at `end` (exclusive window right
/// edge is `end`, the close of candle `end - 1`). 50.0 on a degenerate
/// range.
fn stoch_k_at(candles: &[Candle], period: usize, end: usize) -> f64 {
    let window = &candles[end - period..end];
    let highest = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let lowest = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let close = window[window.len() - 1].close;

    if highest == lowest {
        50.0
    } else {
        (close - lowest) / (highest - lowest) * 100.0
    }
}

/// Stochastic Oscillator (%K, %D) over the trailing `period` candles.
///
/// %D is the mean of the %K values of the last up-to-3 trailing windows;
/// with fewer than 3 windows available it averages what exists, so at
/// exactly `period` candles %D equals %K. Returns (50.0, 50.0) with
/// insufficient history.
pub fn stochastic(candles: &[Candle], period: usize) -> (f64, f64) {
    if period == 0 || candles.len() < period {
        return (50.0, 50.0);
    }

    let n = candles.len();
    let k = stoch_k_at(candles, period, n);

    let windows = (n - period + 1).min(3);
    let ks: Vec<f64> = (0..windows)
        .map(|i| stoch_k_at(candles, period, n - i))
        .collect();
    let d = ks.iter().sum::<f64>() / ks.len() as f64;

    (k, d)
}

/// Simple moving average of volume over the last up-to-`period` candles,
/// 0.0 when the window is empty.
pub fn volume_ma(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.is_empty() {
        return 0.0;
    }

    let start = candles.len().saturating_sub(period);
    let vols = &candles[start..];
    vols.iter().map(|c| c.volume).sum::<f64>() / vols.len() as f64
}

/// Latest value of every supported indicator.
///
/// Fixed-shape record replacing the source's dict-based indicator bag.
/// Every field degrades to its neutral sentinel on short history; the
/// signal classifier treats those sentinels as "no signal", never as a
/// fault.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub ema9: f64,
    pub ema21: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub vwap: f64,
    pub atr: f64,
    pub rsi: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub volume_ma: f64,
}

/// Computes the latest value of all supported indicators.
pub fn compute_snapshot(candles: &[Candle]) -> IndicatorSnapshot {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let (stoch_k, stoch_d) = stochastic(candles, 14);

    IndicatorSnapshot {
        ema9: ema_last(&closes, 9),
        ema21: ema_last(&closes, 21),
        ema50: ema_last(&closes, 50),
        ema200: ema_last(&closes, 200),
        vwap: vwap(candles),
        atr: atr(candles, 14),
        rsi: rsi(candles, 14),
        stoch_k,
        stoch_d,
        volume_ma: volume_ma(candles, 20),
    }
}
