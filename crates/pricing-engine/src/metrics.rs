use chrono::NaiveDate;
use dashboard_core::EngineError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bs::{greeks, intrinsic_value, Greeks, OptionType};
use crate::iv::implied_volatility;

/// Moneyness band (in percentage points) treated as at-the-money.
pub const ATM_BAND_PERCENT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MoneynessStatus {
    Itm,
    Atm,
    Otm,
}

/// Inputs to a single option valuation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub underlying_price: f64,
    pub strike: f64,
    pub expiry: NaiveDate,
    pub option_type: OptionType,
    /// Annualised risk-free rate, decimal (0.065 = 6.5%).
    pub risk_free_rate: f64,
    /// Annualised continuous dividend yield, decimal.
    pub dividend_yield: f64,
    /// Volatility used directly when no market price is supplied for
    /// calibration, and as the Newton starting guess otherwise.
    pub volatility: f64,
}

impl OptionQuote {
    /// Time to expiry in years from `today`, floored at zero.
    pub fn time_to_expiry(&self, today: NaiveDate) -> f64 {
        let days = (self.expiry - today).num_days().max(0);
        days as f64 / 365.0
    }
}

/// Full valuation output: theoretical price, Greeks, value decomposition
/// and moneyness classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionMetrics {
    pub quote: OptionQuote,
    /// Calibrated (or passed-through) volatility.
    pub implied_volatility: f64,
    pub theoretical_price: f64,
    pub greeks: Greeks,
    pub intrinsic_value: f64,
    pub time_value: f64,
    pub moneyness_percent: f64,
    pub status: MoneynessStatus,
}

/// Moneyness as (S - K) / K * 100. Fails fast on a non-positive strike.
pub fn moneyness_percent(underlying_price: f64, strike: f64) -> Result<f64, EngineError> {
    if strike <= 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "strike must be positive, got {strike}"
        )));
    }
    Ok((underlying_price - strike) / strike * 100.0)
}

/// ITM/ATM/OTM against a +-0.5-point band around zero moneyness. The
/// sign convention inverts for puts: negative moneyness is in the money.
pub fn classify_moneyness(moneyness: f64, option_type: OptionType) -> MoneynessStatus {
    let signed = match option_type {
        OptionType::Call => moneyness,
        OptionType::Put => -moneyness,
    };
    if signed > ATM_BAND_PERCENT {
        MoneynessStatus::Itm
    } else if signed < -ATM_BAND_PERCENT {
        MoneynessStatus::Otm
    } else {
        MoneynessStatus::Atm
    }
}

/// Values one option as of `today`.
///
/// With a market price the volatility is calibrated by Newton-Raphson
/// from the quote's volatility as the starting guess; without one the
/// quote's volatility is used as-is.
pub fn compute_metrics(
    quote: &OptionQuote,
    today: NaiveDate,
    market_price: Option<f64>,
) -> Result<OptionMetrics, EngineError> {
    if quote.underlying_price <= 0.0 {
        return Err(EngineError::InvalidInput(format!(
            "underlying price must be positive, got {}",
            quote.underlying_price
        )));
    }
    let moneyness = moneyness_percent(quote.underlying_price, quote.strike)?;

    let t = quote.time_to_expiry(today);
    let sigma = match market_price {
        Some(mp) => implied_volatility(
            mp,
            quote.underlying_price,
            quote.strike,
            t,
            quote.risk_free_rate,
            quote.dividend_yield,
            quote.option_type,
            quote.volatility,
        ),
        None => quote.volatility.max(1e-4),
    };

    let (greeks, price) = greeks(
        quote.underlying_price,
        quote.strike,
        t,
        quote.risk_free_rate,
        quote.dividend_yield,
        sigma,
        quote.option_type,
    );

    let intrinsic = intrinsic_value(quote.underlying_price, quote.strike, quote.option_type);
    let time_value = (price - intrinsic).max(0.0);

    Ok(OptionMetrics {
        quote: *quote,
        implied_volatility: sigma,
        theoretical_price: price,
        greeks,
        intrinsic_value: intrinsic,
        time_value,
        moneyness_percent: moneyness,
        status: classify_moneyness(moneyness, quote.option_type),
    })
}

/// Values a whole option chain in parallel.
pub fn chain_metrics(
    quotes: &[OptionQuote],
    today: NaiveDate,
) -> Result<Vec<OptionMetrics>, EngineError> {
    quotes
        .par_iter()
        .map(|q| compute_metrics(q, today, None))
        .collect()
}

/// Entry/stop/target translated from underlying levels to option prices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionTradeLevels {
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
}

/// Translates underlying stop/target levels into option prices via
/// delta (gamma is ignored). The stop is floored at 0.01 and the target
/// is kept strictly above the stop.
pub fn translate_trade_levels(
    metrics: &OptionMetrics,
    stop_underlying: f64,
    target_underlying: f64,
) -> OptionTradeLevels {
    let s = metrics.quote.underlying_price;
    let price = metrics.theoretical_price;
    let delta = metrics.greeks.delta.abs();

    let stop = (price - (s - stop_underlying).abs() * delta).max(0.01);
    let target = (price + (target_underlying - s).abs() * delta).max(stop + 0.01);

    OptionTradeLevels { entry: price, stop, target }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn quote(option_type: OptionType, strike: f64) -> OptionQuote {
        OptionQuote {
            underlying_price: 24000.0,
            strike,
            expiry: NaiveDate::from_ymd_opt(2025, 4, 17).unwrap(),
            option_type,
            risk_free_rate: 0.065,
            dividend_yield: 0.0,
            volatility: 0.18,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()
    }

    #[test]
    fn test_moneyness_sign_convention() {
        // Spot 2% above strike: ITM call, OTM put.
        let m = moneyness_percent(102.0, 100.0).unwrap();
        assert_relative_eq!(m, 2.0);
        assert_eq!(classify_moneyness(m, OptionType::Call), MoneynessStatus::Itm);
        assert_eq!(classify_moneyness(m, OptionType::Put), MoneynessStatus::Otm);

        let m = moneyness_percent(98.0, 100.0).unwrap();
        assert_eq!(classify_moneyness(m, OptionType::Call), MoneynessStatus::Otm);
        assert_eq!(classify_moneyness(m, OptionType::Put), MoneynessStatus::Itm);
    }

    #[test]
    fn test_atm_band_is_inclusive_of_small_moneyness() {
        for m in [-0.5, -0.2, 0.0, 0.3, 0.5] {
            assert_eq!(classify_moneyness(m, OptionType::Call), MoneynessStatus::Atm);
            assert_eq!(classify_moneyness(m, OptionType::Put), MoneynessStatus::Atm);
        }
    }

    #[test]
    fn test_non_positive_strike_rejected() {
        assert!(moneyness_percent(100.0, 0.0).is_err());
        assert!(compute_metrics(&quote(OptionType::Call, -50.0), today(), None).is_err());
    }

    #[test]
    fn test_non_positive_underlying_rejected() {
        let mut q = quote(OptionType::Call, 24000.0);
        q.underlying_price = 0.0;
        assert!(compute_metrics(&q, today(), None).is_err());
    }

    #[test]
    fn test_time_value_decomposition() {
        let m = compute_metrics(&quote(OptionType::Call, 23500.0), today(), None).unwrap();
        assert_relative_eq!(m.intrinsic_value, 500.0);
        assert_relative_eq!(
            m.time_value,
            (m.theoretical_price - m.intrinsic_value).max(0.0)
        );
        assert!(m.time_value >= 0.0);
        assert_eq!(m.status, MoneynessStatus::Itm);
    }

    #[test]
    fn test_metrics_uses_guess_without_market_price() {
        let m = compute_metrics(&quote(OptionType::Call, 24000.0), today(), None).unwrap();
        assert_relative_eq!(m.implied_volatility, 0.18);
    }

    #[test]
    fn test_metrics_calibrates_with_market_price() {
        // Generate a market price at 25% vol and recover it.
        let q = quote(OptionType::Call, 24000.0);
        let t = q.time_to_expiry(today());
        let market = crate::bs::black_scholes_price(
            q.underlying_price,
            q.strike,
            t,
            q.risk_free_rate,
            q.dividend_yield,
            0.25,
            q.option_type,
        );
        let m = compute_metrics(&q, today(), Some(market)).unwrap();
        assert!((m.implied_volatility - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_expired_quote_prices_at_intrinsic() {
        let mut q = quote(OptionType::Put, 24500.0);
        q.expiry = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let m = compute_metrics(&q, today(), None).unwrap();
        assert_relative_eq!(m.theoretical_price, 500.0);
        assert_relative_eq!(m.time_value, 0.0);
    }

    #[test]
    fn test_chain_metrics_preserves_order() {
        let quotes = vec![
            quote(OptionType::Call, 23800.0),
            quote(OptionType::Call, 24000.0),
            quote(OptionType::Put, 24200.0),
        ];
        let metrics = chain_metrics(&quotes, today()).unwrap();
        assert_eq!(metrics.len(), 3);
        for (q, m) in quotes.iter().zip(&metrics) {
            assert_relative_eq!(q.strike, m.quote.strike);
        }
    }

    #[test]
    fn test_trade_level_translation() {
        let m = compute_metrics(&quote(OptionType::Call, 24000.0), today(), None).unwrap();
        let levels = translate_trade_levels(&m, 23850.0, 24300.0);

        assert_relative_eq!(levels.entry, m.theoretical_price);
        assert!(levels.stop < levels.entry);
        assert!(levels.target > levels.entry);
        assert!(levels.stop >= 0.01);
        assert_relative_eq!(
            levels.target - levels.entry,
            300.0 * m.greeks.delta.abs(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_trade_levels_floor_the_stop() {
        // A cheap OTM option with a distant stop cannot go negative.
        let mut q = quote(OptionType::Call, 26000.0);
        q.volatility = 0.08;
        let m = compute_metrics(&q, today(), None).unwrap();
        let levels = translate_trade_levels(&m, 20000.0, 24100.0);
        assert!(levels.stop >= 0.01);
        assert!(levels.target > levels.stop);
    }
}
