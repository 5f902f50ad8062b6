//! Rule-based trading-signal classifier.
//!
//! `classify` is the pure decision procedure: one evaluation per call
//! over a fresh candle window plus the day's pivot levels, no state
//! carried between calls. `SignalEngine` wraps it with candle fetching
//! and a per-day pivot-level memo for request-driven callers.

pub mod classify;
pub mod engine;


pub use classify::*;
pub use engine::*;
