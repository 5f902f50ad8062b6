use chrono::Utc;
use dashboard_core::{Candle, Direction, RiskConfig, Scenario, Signal};
use indicator_engine::{compute_snapshot, IndicatorSnapshot};
use level_engine::PivotLevels;

/// Volume must exceed this multiple of its moving average to confirm a
/// breakout.
const BREAKOUT_VOLUME_RATIO: f64 = 1.2;
/// Bars scanned backwards for a retest of the broken level.
const RETEST_LOOKBACK: usize = 5;
/// Level-proximity tolerance as a fraction of ATR.
const ATR_TOLERANCE_FACTOR: f64 = 0.2;
/// Rejection-wick fraction of the bar range required for a reversal.
const WICK_THRESHOLD: f64 = 0.6;
/// Reversals use a fixed risk multiple, independent of the configured
/// risk-reward ratio used by the other scenarios.
const REVERSAL_RISK_MULTIPLE: f64 = 1.5;
const RSI_LONG: f64 = 60.0;
const RSI_SHORT: f64 = 40.0;

struct ScenarioMatch {
    scenario: Scenario,
    direction: Direction,
    entry: f64,
    stop: f64,
    target: f64,
    confidence: f64,
    reason: &'static str,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Confidence blend: 40% volume expansion, 30% EMA alignment, 30%
/// momentum distance from the RSI midpoint, rounded to 2 decimals.
fn confidence(volume_ratio: f64, ema_aligned: bool, momentum: f64) -> f64 {
    let vol_score = (volume_ratio / 2.0).min(1.0);
    let ema_score = if ema_aligned { 1.0 } else { 0.0 };
    let mom_score = momentum.clamp(0.0, 1.0);
    round2(0.4 * vol_score + 0.3 * ema_score + 0.3 * mom_score)
}

fn within(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Classifies the current candle window into one of the four trading
/// scenarios, first match wins.
///
/// Never fails: an empty window or insufficient indicator history simply
/// fails every guard and falls through to the `None` scenario.
pub fn classify(
    symbol: &str,
    candles: &[Candle],
    levels: &PivotLevels,
    config: &RiskConfig,
) -> Signal {
    let Some(latest) = candles.last() else {
        return Signal::neutral(Utc::now(), symbol, 0.0, "No data available");
    };

    let snapshot = compute_snapshot(candles);
    let tolerance = ATR_TOLERANCE_FACTOR * snapshot.atr;

    let matched = trend_breakout(candles, &snapshot, levels, tolerance)
        .or_else(|| pullback_continuation(candles, &snapshot, levels, tolerance))
        .or_else(|| reversal(candles, &snapshot, levels, tolerance));

    let Some(m) = matched else {
        return Signal::neutral(
            latest.time,
            symbol,
            round2(latest.close),
            "No valid trading scenario detected",
        );
    };

    // Target projection uses the configured multiple except for
    // reversals, which keep their fixed 1.5x risk multiple.
    let risk = (m.entry - m.stop).abs();
    let target = match (m.scenario, m.direction) {
        (Scenario::Reversal, _) => m.target,
        (_, Direction::Long) => m.entry + config.risk_reward_ratio * risk,
        (_, Direction::Short) => m.entry - config.risk_reward_ratio * risk,
        _ => m.target,
    };

    let position_size = if risk > 0.0 {
        (config.risk_per_trade / risk).floor() as u32
    } else {
        0
    };

    Signal {
        timestamp: latest.time,
        symbol: symbol.to_string(),
        scenario: m.scenario,
        direction: m.direction,
        entry_price: round2(m.entry),
        stop_price: round2(m.stop),
        target_price: round2(target),
        risk_reward: round2(config.risk_reward_ratio),
        position_size,
        confidence: m.confidence,
        reason: m.reason.to_string(),
    }
}

/// Scenario 1: close beyond the CPR with expanding volume, aligned EMAs,
/// momentum confirmation and a recent retest of the broken level.
fn trend_breakout(
    candles: &[Candle],
    snapshot: &IndicatorSnapshot,
    levels: &PivotLevels,
    tolerance: f64,
) -> Option<ScenarioMatch> {
    let latest = candles.last()?;
    let close = latest.close;
    let volume = latest.volume;
    let volume_ok = volume > BREAKOUT_VOLUME_RATIO * snapshot.volume_ma;
    let recent = &candles[candles.len().saturating_sub(RETEST_LOOKBACK)..];

    if close > levels.tc && volume_ok && snapshot.ema9 > snapshot.ema21 && snapshot.rsi > RSI_LONG
    {
        let retested = recent.iter().any(|c| within(c.low, levels.tc, tolerance));
        if retested {
            return Some(ScenarioMatch {
                scenario: Scenario::TrendBreakout,
                direction: Direction::Long,
                entry: close,
                stop: levels.bc,
                target: close,
                confidence: confidence(
                    volume / snapshot.volume_ma,
                    true,
                    (snapshot.rsi - 50.0) / 50.0,
                ),
                reason: "Price closed above TC with high volume; EMAs aligned bullish; retest confirmed",
            });
        }
    }

    if close < levels.bc && volume_ok && snapshot.ema9 < snapshot.ema21 && snapshot.rsi < RSI_SHORT
    {
        let retested = recent.iter().any(|c| within(c.high, levels.bc, tolerance));
        if retested {
            return Some(ScenarioMatch {
                scenario: Scenario::TrendBreakout,
                direction: Direction::Short,
                entry: close,
                stop: levels.tc,
                target: close,
                confidence: confidence(
                    volume / snapshot.volume_ma,
                    true,
                    (50.0 - snapshot.rsi) / 50.0,
                ),
                reason: "Price closed below BC with high volume; EMAs aligned bearish; retest confirmed",
            });
        }
    }

    None
}

/// Scenario 2: trend intact, price pulled back onto the pivot or the
/// first resistance/support, and the latest bar resumes the trend on
/// rising volume.
fn pullback_continuation(
    candles: &[Candle],
    snapshot: &IndicatorSnapshot,
    levels: &PivotLevels,
    tolerance: f64,
) -> Option<ScenarioMatch> {
    let latest = candles.last()?;
    let close = latest.close;
    let prev_volume = if candles.len() >= 2 {
        candles[candles.len() - 2].volume
    } else {
        latest.volume
    };
    let rising_volume = latest.volume > prev_volume;

    if snapshot.ema9 > snapshot.ema21
        && snapshot.rsi > RSI_LONG
        && (within(close, levels.pivot, tolerance) || within(close, levels.r1, tolerance))
        && latest.is_bullish()
        && rising_volume
    {
        return Some(ScenarioMatch {
            scenario: Scenario::PullbackContinuation,
            direction: Direction::Long,
            entry: close,
            stop: levels.bc,
            target: close,
            confidence: confidence(
                latest.volume / snapshot.volume_ma,
                true,
                (snapshot.rsi - 50.0) / 50.0,
            ),
            reason: "Uptrend with pullback to pivot/R1; bullish candle with rising volume",
        });
    }

    if snapshot.ema9 < snapshot.ema21
        && snapshot.rsi < RSI_SHORT
        && (within(close, levels.pivot, tolerance) || within(close, levels.s1, tolerance))
        && latest.close < latest.open
        && rising_volume
    {
        return Some(ScenarioMatch {
            scenario: Scenario::PullbackContinuation,
            direction: Direction::Short,
            entry: close,
            stop: levels.tc,
            target: close,
            confidence: confidence(
                latest.volume / snapshot.volume_ma,
                true,
                (50.0 - snapshot.rsi) / 50.0,
            ),
            reason: "Downtrend with pullback to pivot/S1; bearish candle with rising volume",
        });
    }

    None
}

/// Scenario 3: exhaustion at S1/R1 with a rejection wick, fading volume
/// and elevated ATR. Target is a fixed 1.5x risk multiple.
fn reversal(
    candles: &[Candle],
    snapshot: &IndicatorSnapshot,
    levels: &PivotLevels,
    tolerance: f64,
) -> Option<ScenarioMatch> {
    if snapshot.atr <= 0.0 {
        return None;
    }
    let latest = candles.last()?;
    let close = latest.close;
    let range = (latest.high - latest.low).max(1e-6);
    let close_off_low = (close - latest.low) / range;
    let close_off_high = (latest.high - close) / range;

    let volume_decline = latest.volume < snapshot.volume_ma;
    let window = &candles[candles.len().saturating_sub(14)..];
    let avg_range = window.iter().map(|c| (c.high - c.low).abs()).sum::<f64>() / 14.0;
    let elevated_atr = snapshot.atr > 0.8 * avg_range;

    if within(close, levels.s1, tolerance)
        && close_off_low > WICK_THRESHOLD
        && volume_decline
        && elevated_atr
        && snapshot.rsi > RSI_LONG
    {
        let risk = close - latest.low;
        return Some(ScenarioMatch {
            scenario: Scenario::Reversal,
            direction: Direction::Long,
            entry: close,
            stop: latest.low,
            target: close + REVERSAL_RISK_MULTIPLE * risk,
            confidence: confidence(
                latest.volume / snapshot.volume_ma,
                snapshot.ema9 > snapshot.ema21,
                (snapshot.rsi - 50.0) / 50.0,
            ),
            reason: "Exhaustion at support; long wick; declining volume; high ATR",
        });
    }

    if within(close, levels.r1, tolerance)
        && close_off_high > WICK_THRESHOLD
        && volume_decline
        && elevated_atr
        && snapshot.rsi < RSI_SHORT
    {
        let risk = latest.high - close;
        return Some(ScenarioMatch {
            scenario: Scenario::Reversal,
            direction: Direction::Short,
            entry: close,
            stop: latest.high,
            target: close - REVERSAL_RISK_MULTIPLE * risk,
            confidence: confidence(
                latest.volume / snapshot.volume_ma,
                snapshot.ema9 < snapshot.ema21,
                (50.0 - snapshot.rsi) / 50.0,
            ),
            reason: "Exhaustion at resistance; long wick; declining volume; high ATR",
        });
    }

    None
}
