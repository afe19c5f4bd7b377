//! Display formatting for on-chain amounts and timestamps.

use chrono::{Local, TimeZone};
use num_bigint::BigUint;
use num_traits::Zero;

use crate::{
    constants::{NATIVE_DECIMALS, NATIVE_DISPLAY_DIGITS, TOKEN_DISPLAY_DIGITS},
    error::{ExplorerError, Result},
};

// Base-unit amounts arrive as plain decimal strings of any magnitude.
fn parse_base_units(raw: &str) -> Result<BigUint> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ExplorerError::InvalidAmount(format!(
            "'{}' is not an unsigned integer",
            raw
        )));
    }
    BigUint::parse_bytes(trimmed.as_bytes(), 10).ok_or_else(|| {
        ExplorerError::InvalidAmount(format!("'{}' is not an unsigned integer", raw))
    })
}

/// Divides `raw` by `10^decimals` and renders exactly `digits` fractional
/// digits, rounding half up.
pub fn format_fixed(raw: &str, decimals: u8, digits: usize) -> Result<String> {
    let value = parse_base_units(raw)?;
    let divisor = num_traits::pow(BigUint::from(10u8), decimals as usize);
    let display = num_traits::pow(BigUint::from(10u8), digits);

    let half = &divisor / 2u8;
    let rounded = (value * &display + half) / &divisor;
    let whole = &rounded / &display;
    let fraction = &rounded % &display;

    if digits == 0 {
        return Ok(whole.to_string());
    }
    Ok(format!("{}.{:0>width$}", whole, fraction.to_string(), width = digits))
}

/// Native balance in whole coins with 8 fractional digits.
pub fn format_native(wei: &str) -> Result<String> {
    format_fixed(wei, NATIVE_DECIMALS, NATIVE_DISPLAY_DIGITS)
}

/// Token balance scaled by its decimals with 6 fractional digits.
pub fn format_token(raw: &str, decimals: u8) -> Result<String> {
    format_fixed(raw, decimals, TOKEN_DISPLAY_DIGITS)
}

/// Transaction value for list display; a zero transfer renders as `0`.
pub fn format_tx_value(wei: &str) -> Result<String> {
    if parse_base_units(wei)?.is_zero() {
        return Ok("0".to_string());
    }
    format_native(wei)
}

/// Second-precision timestamps (10 digits or fewer) are promoted to milliseconds.
pub fn normalize_timestamp_millis(ts: u64) -> u64 {
    if ts.to_string().len() <= 10 {
        ts * 1000
    } else {
        ts
    }
}

/// `YYYY-MM-DD HH:MM:SS` in the local timezone.
pub fn format_timestamp(ts: u64) -> String {
    format_timestamp_in(ts, &Local)
}

pub fn format_timestamp_in<Tz: TimeZone>(ts: u64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let millis = normalize_timestamp_millis(ts);
    i64::try_from(millis)
        .ok()
        .and_then(|ms| tz.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| {
            tracing::warn!("timestamp {} is out of range", ts);
            ts.to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn native_uses_eight_digits() {
        assert_eq!(format_native("1000000000000000000").unwrap(), "1.00000000");
        assert_eq!(format_native("1234567890123456789").unwrap(), "1.23456789");
        assert_eq!(format_native("0").unwrap(), "0.00000000");
        // Pembulatan setengah ke atas
        assert_eq!(format_native("5000000000").unwrap(), "0.00000001");
        assert_eq!(format_native("4999999999").unwrap(), "0.00000000");
    }

    #[test]
    fn token_uses_six_digits() {
        assert_eq!(format_token("1234567", 6).unwrap(), "1.234567");
        assert_eq!(format_token("42", 0).unwrap(), "42.000000");
        assert_eq!(format_token("1", 18).unwrap(), "0.000000");
        assert_eq!(format_token("500000000000", 18).unwrap(), "0.000001");
        assert_eq!(format_token("1999999999999999999", 18).unwrap(), "2.000000");
        assert_eq!(format_token("0009990", 3).unwrap(), "9.990000");
    }

    #[test]
    fn token_handles_extreme_magnitudes() {
        let max_u256 =
            "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(format_token(max_u256, 255).unwrap(), "0.000000");
        let huge = format!("{}000", max_u256);
        assert_eq!(format_token(&huge, 3).unwrap(), format!("{}.000000", max_u256));
    }

    #[test]
    fn rounding_carries_past_u128() {
        let raw = format!("{}5", "9".repeat(45));
        let expected = format!("1{}.000000", "0".repeat(39));
        assert_eq!(format_token(&raw, 7).unwrap(), expected);
        assert_eq!(format_fixed("15", 1, 0).unwrap(), "2");
    }

    #[test]
    fn token_round_trips_within_tolerance() {
        let cases: [(u64, u8); 6] = [
            (0, 0),
            (123_456_789, 3),
            (987_654_321_012, 9),
            (1, 6),
            (4_503_599_627_370_495, 12),
            (777, 2),
        ];
        for (raw, decimals) in cases {
            let text = format_token(&raw.to_string(), decimals).unwrap();
            let parsed: f64 = text.parse().unwrap();
            let exact = raw as f64 / 10f64.powi(decimals as i32);
            assert!(
                (parsed - exact).abs() <= 1e-6,
                "{} with {} decimals rendered as {}",
                raw,
                decimals,
                text
            );
        }
    }

    #[test]
    fn rejects_non_integer_amounts() {
        for raw in ["", "-1", "1.5", "0x10", "abc"] {
            assert!(matches!(
                format_token(raw, 6),
                Err(ExplorerError::InvalidAmount(_))
            ));
        }
    }

    #[test]
    fn tx_value_zero_is_plain() {
        assert_eq!(format_tx_value("0").unwrap(), "0");
        assert_eq!(format_tx_value("000").unwrap(), "0");
        assert_eq!(format_tx_value("1000000000000000000").unwrap(), "1.00000000");
    }

    #[test]
    fn seconds_and_millis_render_identically() {
        assert_eq!(format_timestamp(1_700_000_000), format_timestamp(1_700_000_000_000));
        assert_eq!(normalize_timestamp_millis(9_999_999_999), 9_999_999_999_000);
        assert_eq!(normalize_timestamp_millis(10_000_000_000), 10_000_000_000);
    }

    #[test]
    fn timestamp_is_zero_padded() {
        assert_eq!(format_timestamp_in(1_700_000_000, &Utc), "2023-11-14 22:13:20");
        assert_eq!(format_timestamp_in(0, &Utc), "1970-01-01 00:00:00");
        let plus_eight = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(
            format_timestamp_in(1_704_067_200_000, &plus_eight),
            "2024-01-01 08:00:00"
        );
    }
}
