use chrono::NaiveDate;
use dashboard_core::EngineError;
use serde::{Deserialize, Serialize};

use crate::bs::OptionType;

/// Components of an option ticker such as `NIFTY250417C24000`:
/// underlying, YYMMDD expiry, C/P flag and strike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedOptionSymbol {
    pub underlying: String,
    pub expiry: NaiveDate,
    pub option_type: OptionType,
    pub strike: f64,
}

/// Parses an option ticker in `UNDERLYING` + `YYMMDD` + `C`/`P` +
/// strike form, failing fast with a descriptive error on malformed
/// encodings.
pub fn parse_option_symbol(symbol: &str) -> Result<ParsedOptionSymbol, EngineError> {
    let invalid = |msg: &str| EngineError::InvalidInput(format!("option symbol {symbol:?}: {msg}"));

    let digit_start = symbol
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| invalid("missing expiry digits"))?;
    let (underlying, rest) = symbol.split_at(digit_start);
    if underlying.is_empty() {
        return Err(invalid("missing underlying prefix"));
    }

    if rest.len() < 8 {
        return Err(invalid("too short for YYMMDD expiry, type and strike"));
    }
    let (date_str, rest) = rest.split_at(6);
    if !date_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expiry must be six digits (YYMMDD)"));
    }

    let year = 2000 + date_str[0..2].parse::<i32>().unwrap_or(0);
    let month: u32 = date_str[2..4].parse().unwrap_or(0);
    let day: u32 = date_str[4..6].parse().unwrap_or(0);
    let expiry = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| invalid("expiry is not a valid calendar date"))?;

    let mut chars = rest.chars();
    let option_type = match chars.next() {
        Some('C') | Some('c') => OptionType::Call,
        Some('P') | Some('p') => OptionType::Put,
        _ => return Err(invalid("option type must be C or P")),
    };

    let strike_str = chars.as_str();
    let strike: f64 = strike_str
        .parse()
        .map_err(|_| invalid("strike is not a number"))?;
    if !strike.is_finite() || strike <= 0.0 {
        return Err(invalid("strike must be positive"));
    }

    Ok(ParsedOptionSymbol {
        underlying: underlying.to_uppercase(),
        expiry,
        option_type,
        strike,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call_symbol() {
        let parsed = parse_option_symbol("NIFTY250417C24000").unwrap();
        assert_eq!(parsed.underlying, "NIFTY");
        assert_eq!(parsed.expiry, NaiveDate::from_ymd_opt(2025, 4, 17).unwrap());
        assert_eq!(parsed.option_type, OptionType::Call);
        assert_eq!(parsed.strike, 24000.0);
    }

    #[test]
    fn test_parse_put_with_long_underlying() {
        let parsed = parse_option_symbol("BANKNIFTY250424P51500").unwrap();
        assert_eq!(parsed.underlying, "BANKNIFTY");
        assert_eq!(parsed.option_type, OptionType::Put);
        assert_eq!(parsed.strike, 51500.0);
    }

    #[test]
    fn test_parse_rejects_malformed_symbols() {
        for bad in [
            "",
            "NIFTY",
            "250417C24000",
            "NIFTY2504C24000",
            "NIFTY251347C24000",
            "NIFTY250417X24000",
            "NIFTY250417C",
            "NIFTY250417Cabc",
            "NIFTY250417C-100",
        ] {
            assert!(
                parse_option_symbol(bad).is_err(),
                "expected {bad:?} to be rejected"
            );
        }
    }
}
