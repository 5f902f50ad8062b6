//! European option pricing: Black-Scholes-Merton closed form, Greeks,
//! Newton-Raphson implied-volatility calibration and moneyness
//! classification.

pub mod bs;
pub mod iv;
pub mod metrics;
pub mod symbol;

pub use bs::*;
pub use iv::*;
pub use metrics::*;
pub use symbol::*;
