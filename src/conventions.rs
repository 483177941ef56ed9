//! Market conventions: forwards, moneyness, and calendar time to expiry.
//!
//! Expiries are ISO `YYYY-MM-DD` dates. An expiry settles at 21:00 UTC on
//! that date (the US equity close, ignoring daylight-saving drift) and year
//! fractions use a 365-day year.

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::AnalyticsError;

const MS_PER_DAY: f64 = 86_400_000.0;
const MS_PER_YEAR: f64 = MS_PER_DAY * 365.0;
const MARKET_CLOSE_UTC_HOUR: u32 = 21;
/// Floor applied to time to expiry, one minute.
const MIN_EXPIRY_MS: i64 = 60_000;

/// Convert a strike to log-moneyness against spot: x = ln(K / S).
pub fn log_moneyness(strike: f64, spot: f64) -> f64 {
    (strike / spot).ln()
}

/// Convert a strike to simple moneyness: m = K / S.
pub fn moneyness(strike: f64, spot: f64) -> f64 {
    strike / spot
}

/// Compute forward price from spot: F = S · exp((r − q) · T).
pub fn forward_price(spot: f64, rate: f64, dividend_yield: f64, expiry: f64) -> f64 {
    spot * ((rate - dividend_yield) * expiry).exp()
}

/// Parse a strict `YYYY-MM-DD` date (zero-padded, real calendar day).
///
/// # Errors
/// Returns [`AnalyticsError::InvalidInput`] for anything else.
pub fn parse_expiry(value: &str) -> crate::error::Result<NaiveDate> {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shape_ok {
        return Err(AnalyticsError::invalid(format!(
            "expiry must be in YYYY-MM-DD format, got {value:?}"
        )));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        AnalyticsError::invalid(format!("expiry is not a calendar date: {value:?}"))
    })
}

/// Settlement instant of an expiry date.
pub fn expiry_instant(expiry: NaiveDate) -> Option<DateTime<Utc>> {
    expiry
        .and_hms_opt(MARKET_CLOSE_UTC_HOUR, 0, 0)
        .map(|dt| dt.and_utc())
}

/// Time to expiry in years, measured from `now` to the settlement instant.
///
/// Returns `None` when the expiry is more than one minute in the past;
/// otherwise the result is floored at one minute.
pub fn time_to_expiry_years(expiry: NaiveDate, now: DateTime<Utc>) -> Option<f64> {
    let settle = expiry_instant(expiry)?;
    let diff_ms = (settle - now).num_milliseconds();
    if diff_ms < -MIN_EXPIRY_MS {
        return None;
    }
    Some(diff_ms.max(MIN_EXPIRY_MS) as f64 / MS_PER_YEAR)
}

/// Whole calendar days to expiry, rounded and floored at zero.
pub fn days_to_expiry(expiry: NaiveDate, now: DateTime<Utc>) -> Option<u32> {
    let settle = expiry_instant(expiry)?;
    let days = ((settle - now).num_milliseconds() as f64 / MS_PER_DAY).round();
    Some(days.max(0.0) as u32)
}

/// Trim and upper-case a ticker symbol.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn forward_with_dividend_yield() {
        assert_abs_diff_eq!(
            forward_price(100.0, 0.05, 0.02, 1.0),
            100.0 * 0.03_f64.exp(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn log_moneyness_atm_is_zero() {
        assert_eq!(log_moneyness(100.0, 100.0), 0.0);
        assert!(log_moneyness(110.0, 100.0) > 0.0);
        assert_abs_diff_eq!(moneyness(110.0, 100.0), 1.1, epsilon = 1e-12);
    }

    #[test]
    fn parse_expiry_is_strict() {
        assert!(parse_expiry("2026-03-20").is_ok());
        assert!(parse_expiry("2026-3-20").is_err());
        assert!(parse_expiry("2026-02-30").is_err());
        assert!(parse_expiry("20260320").is_err());
        assert!(parse_expiry("2026-03-2x").is_err());
    }

    #[test]
    fn time_to_expiry_counts_to_market_close() {
        let expiry = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        // 12:00 on Jan 1 to 21:00 on Jan 2 is 33 hours.
        let t = time_to_expiry_years(expiry, noon(2026, 1, 1)).unwrap();
        assert_abs_diff_eq!(t, 33.0 / 24.0 / 365.0, epsilon = 1e-12);
        assert_eq!(days_to_expiry(expiry, noon(2026, 1, 1)), Some(1));
    }

    #[test]
    fn expired_date_is_rejected_and_same_day_is_floored() {
        let expiry = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let after_close = Utc.with_ymd_and_hms(2026, 1, 1, 21, 5, 0).unwrap();
        assert_eq!(time_to_expiry_years(expiry, after_close), None);

        let at_close = Utc.with_ymd_and_hms(2026, 1, 1, 21, 0, 30).unwrap();
        let t = time_to_expiry_years(expiry, at_close).unwrap();
        assert_abs_diff_eq!(t, 60_000.0 / MS_PER_YEAR, epsilon = 1e-15);
        assert_eq!(days_to_expiry(expiry, at_close), Some(0));
    }

    #[test]
    fn symbol_is_normalized() {
        assert_eq!(normalize_symbol("  spy "), "SPY");
    }
}
