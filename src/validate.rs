//! Input validation helpers.
//!
//! Standardizes validation across the crate using `!is_finite()` to reject
//! NaN, +Inf, and -Inf uniformly.

use crate::error::AnalyticsError;

/// Validate that a value is strictly positive and finite (rejects NaN, Inf, zero, negatives).
pub(crate) fn validate_positive(value: f64, name: &str) -> crate::error::Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AnalyticsError::invalid(format!(
            "{name} must be positive and finite, got {value}"
        )));
    }
    Ok(value)
}

/// Validate that a value is non-negative and finite (rejects NaN, Inf, negatives).
pub(crate) fn validate_non_negative(value: f64, name: &str) -> crate::error::Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(AnalyticsError::invalid(format!(
            "{name} must be non-negative and finite, got {value}"
        )));
    }
    Ok(value)
}

/// Validate that a value is finite (rejects NaN and Inf; allows zero and negatives).
pub(crate) fn validate_finite(value: f64, name: &str) -> crate::error::Result<f64> {
    if !value.is_finite() {
        return Err(AnalyticsError::invalid(format!(
            "{name} must be finite, got {value}"
        )));
    }
    Ok(value)
}

/// Validate that a finite value lies in the closed interval `[min, max]`.
pub(crate) fn validate_range(
    value: f64,
    min: f64,
    max: f64,
    name: &str,
) -> crate::error::Result<f64> {
    if !value.is_finite() || value < min || value > max {
        return Err(AnalyticsError::invalid(format!(
            "{name} must be in [{min}, {max}], got {value}"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_rejects_zero_nan_inf() {
        assert!(validate_positive(0.0, "x").is_err());
        assert!(validate_positive(f64::NAN, "x").is_err());
        assert!(validate_positive(f64::INFINITY, "x").is_err());
        assert_eq!(validate_positive(1.5, "x").unwrap(), 1.5);
    }

    #[test]
    fn non_negative_accepts_zero() {
        assert_eq!(validate_non_negative(0.0, "horizon").unwrap(), 0.0);
        assert!(validate_non_negative(-1e-9, "horizon").is_err());
    }

    #[test]
    fn finite_allows_negative_rates() {
        assert_eq!(validate_finite(-0.01, "rate").unwrap(), -0.01);
        assert!(validate_finite(f64::NEG_INFINITY, "rate").is_err());
    }

    #[test]
    fn range_is_inclusive() {
        assert!(validate_range(7.0, 7.0, 365.0, "maxDays").is_ok());
        assert!(validate_range(365.0, 7.0, 365.0, "maxDays").is_ok());
        let err = validate_range(6.9, 7.0, 365.0, "maxDays").unwrap_err();
        assert!(err.message().contains("maxDays"));
    }
}
