use serde::{Deserialize, Serialize};

/// Per-call risk configuration.
///
/// The source cached user settings globally; here the caller passes an
/// explicit value object on every evaluation so the engines stay pure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Capital at risk per trade, in account currency.
    pub risk_per_trade: f64,
    /// Target multiple of risk used to project the target price.
    pub risk_reward_ratio: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            risk_per_trade: 1000.0,
            risk_reward_ratio: 2.0,
        }
    }
}
