//! Floor-trader pivot levels and the Central Pivot Range (CPR).
//!
//! Pure arithmetic over a single reference bar's (high, low, close).
//! Selecting which historical bar constitutes "previous day/week/month"
//! is the caller's concern.

use serde::{Deserialize, Serialize};

pub const DEFAULT_NARROW_THRESHOLD: f64 = 0.6;
pub const DEFAULT_WIDE_THRESHOLD: f64 = 1.4;

/// CPR width classification relative to a reference width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CprType {
    Narrow,
    Normal,
    Wide,
}

/// Daily pivot levels plus the Central Pivot Range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotLevels {
    pub pivot: f64,
    /// Bottom central pivot, (H+L)/2.
    pub bc: f64,
    /// Top central pivot, 2*pivot - bc.
    pub tc: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub cpr_type: CprType,
}

impl PivotLevels {
    /// CPR width, tc - bc.
    pub fn cpr_width(&self) -> f64 {
        self.tc - self.bc
    }
}

/// Computes pivot levels from the reference bar with default CPR
/// classification thresholds (narrow <= 0.6x, wide >= 1.4x the previous
/// width; `None` reference width classifies as normal).
pub fn compute_levels(
    prev_high: f64,
    prev_low: f64,
    prev_close: f64,
    prev_cpr_width: Option<f64>,
) -> PivotLevels {
    compute_levels_with_thresholds(
        prev_high,
        prev_low,
        prev_close,
        prev_cpr_width,
        DEFAULT_NARROW_THRESHOLD,
        DEFAULT_WIDE_THRESHOLD,
    )
}

/// Computes pivot levels with explicit classification thresholds.
pub fn compute_levels_with_thresholds(
    prev_high: f64,
    prev_low: f64,
    prev_close: f64,
    prev_cpr_width: Option<f64>,
    narrow_threshold: f64,
    wide_threshold: f64,
) -> PivotLevels {
    let pivot = (prev_high + prev_low + prev_close) / 3.0;
    let bc = (prev_high + prev_low) / 2.0;
    let tc = pivot + (pivot - bc);

    let range = prev_high - prev_low;
    let r1 = 2.0 * pivot - prev_low;
    let s1 = 2.0 * pivot - prev_high;
    let r2 = pivot + range;
    let s2 = pivot - range;
    let r3 = r2 + range;
    let s3 = s2 - range;

    let width = tc - bc;
    let cpr_type = classify_cpr(width, prev_cpr_width, narrow_threshold, wide_threshold);

    PivotLevels {
        pivot,
        bc,
        tc,
        s1,
        s2,
        s3,
        r1,
        r2,
        r3,
        cpr_type,
    }
}

fn classify_cpr(
    width: f64,
    prev_width: Option<f64>,
    narrow_threshold: f64,
    wide_threshold: f64,
) -> CprType {
    let Some(prev_width) = prev_width else {
        return CprType::Normal;
    };
    if prev_width == 0.0 {
        return CprType::Normal;
    }

    let ratio = width / prev_width;
    if ratio <= narrow_threshold {
        CprType::Narrow
    } else if ratio >= wide_threshold {
        CprType::Wide
    } else {
        CprType::Normal
    }
}
