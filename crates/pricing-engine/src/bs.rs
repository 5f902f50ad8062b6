use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;

/// Standard normal distribution for CDF evaluation.
fn std_normal() -> Normal {
    Normal::new(0.0, 1.0).unwrap()
}

fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

fn norm_cdf(x: f64) -> f64 {
    std_normal().cdf(x)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn as_char(&self) -> char {
        match self {
            OptionType::Call => 'C',
            OptionType::Put => 'P',
        }
    }
}

/// First-order sensitivities of the option price.
///
/// Theta is per year; vega and rho are per 1.0 change in volatility and
/// rate respectively (callers divide by 100 for per-point reporting).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
}

fn d1_d2(s: f64, k: f64, t: f64, r: f64, q: f64, sigma: f64) -> (f64, f64) {
    let sqrt_t = t.sqrt();
    let d1 = ((s / k).ln() + (r - q + 0.5 * sigma * sigma) * t) / (sigma * sqrt_t);
    (d1, d1 - sigma * sqrt_t)
}

pub fn intrinsic_value(s: f64, k: f64, option_type: OptionType) -> f64 {
    match option_type {
        OptionType::Call => (s - k).max(0.0),
        OptionType::Put => (k - s).max(0.0),
    }
}

/// Black-Scholes-Merton price of a European option with continuous
/// dividend yield `q`. An expired or zero-volatility option prices at
/// intrinsic value.
pub fn black_scholes_price(
    s: f64,
    k: f64,
    t: f64,
    r: f64,
    q: f64,
    sigma: f64,
    option_type: OptionType,
) -> f64 {
    if t <= 0.0 || sigma <= 0.0 {
        return intrinsic_value(s, k, option_type);
    }

    let (d1, d2) = d1_d2(s, k, t, r, q, sigma);
    match option_type {
        OptionType::Call => {
            s * (-q * t).exp() * norm_cdf(d1) - k * (-r * t).exp() * norm_cdf(d2)
        }
        OptionType::Put => {
            k * (-r * t).exp() * norm_cdf(-d2) - s * (-q * t).exp() * norm_cdf(-d1)
        }
    }
}

/// Computes price and Greeks in one pass.
///
/// Degenerate inputs (T <= 0 or sigma <= 0) return intrinsic value with
/// delta +-1 keyed off call moneyness and zero for the remaining Greeks.
pub fn greeks(
    s: f64,
    k: f64,
    t: f64,
    r: f64,
    q: f64,
    sigma: f64,
    option_type: OptionType,
) -> (Greeks, f64) {
    if t <= 0.0 || sigma <= 0.0 {
        let price = intrinsic_value(s, k, option_type);
        let delta = if option_type == OptionType::Call && s > k {
            1.0
        } else {
            -1.0
        };
        return (Greeks { delta, ..Greeks::default() }, price);
    }

    let (d1, d2) = d1_d2(s, k, t, r, q, sigma);
    let sqrt_t = t.sqrt();
    let pdf = norm_pdf(d1);
    let disc_q = (-q * t).exp();
    let disc_r = (-r * t).exp();

    let (delta, theta, rho) = match option_type {
        OptionType::Call => {
            let delta = disc_q * norm_cdf(d1);
            let theta = -(s * pdf * sigma * disc_q) / (2.0 * sqrt_t)
                - r * k * disc_r * norm_cdf(d2)
                + q * s * disc_q * norm_cdf(d1);
            let rho = k * t * disc_r * norm_cdf(d2);
            (delta, theta, rho)
        }
        OptionType::Put => {
            let delta = -disc_q * norm_cdf(-d1);
            let theta = -(s * pdf * sigma * disc_q) / (2.0 * sqrt_t)
                + r * k * disc_r * norm_cdf(-d2)
                - q * s * disc_q * norm_cdf(-d1);
            let rho = -k * t * disc_r * norm_cdf(-d2);
            (delta, theta, rho)
        }
    };

    let gamma = disc_q * pdf / (s * sigma * sqrt_t);
    let vega = s * disc_q * pdf * sqrt_t;
    let price = black_scholes_price(s, k, t, r, q, sigma, option_type);

    (Greeks { delta, gamma, theta, vega, rho }, price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_put_call_parity() {
        let (s, k, t, r, q, sigma) = (100.0, 105.0, 0.75, 0.05, 0.01, 0.3);
        let call = black_scholes_price(s, k, t, r, q, sigma, OptionType::Call);
        let put = black_scholes_price(s, k, t, r, q, sigma, OptionType::Put);
        let forward = s * (-q * t).exp() - k * (-r * t).exp();
        assert_relative_eq!(call - put, forward, epsilon = 1e-9);
    }

    #[test]
    fn test_expired_option_prices_at_intrinsic() {
        assert_relative_eq!(
            black_scholes_price(110.0, 100.0, 0.0, 0.05, 0.0, 0.2, OptionType::Call),
            10.0
        );
        assert_relative_eq!(
            black_scholes_price(110.0, 100.0, 0.0, 0.05, 0.0, 0.2, OptionType::Put),
            0.0
        );
        assert_relative_eq!(
            black_scholes_price(90.0, 100.0, 0.5, 0.05, 0.0, 0.0, OptionType::Put),
            10.0
        );
    }

    #[test]
    fn test_degenerate_greeks() {
        let (g, price) = greeks(110.0, 100.0, 0.0, 0.05, 0.0, 0.2, OptionType::Call);
        assert_relative_eq!(price, 10.0);
        assert_eq!(g.delta, 1.0);
        assert_eq!(g.gamma, 0.0);
        assert_eq!(g.theta, 0.0);
        assert_eq!(g.vega, 0.0);
        assert_eq!(g.rho, 0.0);

        let (g, _) = greeks(90.0, 100.0, 0.0, 0.05, 0.0, 0.2, OptionType::Call);
        assert_eq!(g.delta, -1.0);
    }

    #[test]
    fn test_greeks_sanity() {
        let (call, _) = greeks(100.0, 100.0, 0.5, 0.05, 0.01, 0.2, OptionType::Call);
        let (put, _) = greeks(100.0, 100.0, 0.5, 0.05, 0.01, 0.2, OptionType::Put);

        assert!(call.delta > 0.0 && call.delta < 1.0);
        assert!(put.delta < 0.0 && put.delta > -1.0);
        // Delta parity under continuous dividends.
        assert_relative_eq!(
            call.delta - put.delta,
            (-0.01f64 * 0.5).exp(),
            epsilon = 1e-9
        );
        // Gamma and vega are shared between call and put.
        assert_relative_eq!(call.gamma, put.gamma, epsilon = 1e-12);
        assert_relative_eq!(call.vega, put.vega, epsilon = 1e-12);
        assert!(call.gamma > 0.0);
        assert!(call.vega > 0.0);
        // ATM theta is negative for both sides at these rates.
        assert!(call.theta < 0.0);
        assert!(put.theta < 0.0);
        assert!(call.rho > 0.0);
        assert!(put.rho < 0.0);
    }

    #[test]
    fn test_deep_itm_call_tracks_forward() {
        let (g, price) = greeks(200.0, 100.0, 0.25, 0.05, 0.0, 0.2, OptionType::Call);
        assert!(g.delta > 0.99);
        assert!(price > 99.0);
    }
}
