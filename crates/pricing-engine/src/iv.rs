use crate::bs::{greeks, OptionType};

pub const DEFAULT_IV_GUESS: f64 = 0.25;

const MIN_SIGMA: f64 = 1e-4;
const MAX_SIGMA: f64 = 5.0;
const PRICE_TOLERANCE: f64 = 1e-4;
const MAX_ITERATIONS: usize = 100;

/// Newton-Raphson implied volatility.
///
/// Best-effort local solver: iterates `sigma -= (price - market) / vega`
/// with sigma clamped to [1e-4, 5.0] each step, stopping once the price
/// error drops below 1e-4, after 100 iterations, or when vega underflows
/// to zero (early exit with the last estimate). Convergence is not
/// guaranteed for pathological inputs; callers get the best estimate
/// found, never an error.
pub fn implied_volatility(
    market_price: f64,
    s: f64,
    k: f64,
    t: f64,
    r: f64,
    q: f64,
    option_type: OptionType,
    initial_guess: f64,
) -> f64 {
    let mut sigma = initial_guess.max(MIN_SIGMA);

    for _ in 0..MAX_ITERATIONS {
        let (g, price) = greeks(s, k, t, r, q, sigma, option_type);
        let diff = price - market_price;
        if diff.abs() < PRICE_TOLERANCE {
            return sigma.max(MIN_SIGMA);
        }
        if g.vega == 0.0 {
            break;
        }
        sigma = (sigma - diff / g.vega).clamp(MIN_SIGMA, MAX_SIGMA);
    }

    sigma.max(MIN_SIGMA)
}
