//! Core domain types shared by every component.
//!
//! # Newtype Strategy
//!
//! **Outputs use newtypes** where a bare `f64` is easy to misread: [`Vol`]
//! wraps a solved implied volatility so it cannot be confused with a price.
//!
//! **Inputs use plain records.** [`OptionParams`] carries the contract and
//! market state every pricing call needs; the driving quantity (volatility or
//! market price) is a separate [`QuoteDriver`] so exactly one of them can be
//! present for a given computation.
//!
//! # Why no `Eq` or `Ord`?
//! These types wrap `f64`, which does not implement `Eq` or `Ord` because `NaN`
//! breaks total ordering. We derive `PartialEq` and `PartialOrd` only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Implied volatility `σ`, measured as annualized standard deviation.
///
/// A vol of 0.20 represents 20% annualized volatility.
///
/// # Examples
/// ```
/// use optanalytics::types::Vol;
/// let vol = Vol(0.20);
/// assert_eq!(vol.0, 0.20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Vol(pub f64);

/// Option type: call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// Right to buy at strike price.
    Call,
    /// Right to sell at strike price.
    Put,
}

impl OptionType {
    /// Undiscounted exercise value `max(S − K, 0)` or `max(K − S, 0)`.
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        match self {
            Self::Call => (spot - strike).max(0.0),
            Self::Put => (strike - spot).max(0.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OptionType {
    type Err = AnalyticsError;

    /// Case-insensitive `"call"` / `"put"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(Self::Call),
            "put" => Ok(Self::Put),
            other => Err(AnalyticsError::invalid(format!(
                "type must be call or put, got {other:?}"
            ))),
        }
    }
}

/// Contract and market state for one European option.
///
/// The Pricing Core does not validate these fields; callers guarantee
/// `spot > 0`, `strike > 0` and `expiry > 0` before pricing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionParams {
    pub option_type: OptionType,
    pub spot: f64,
    pub strike: f64,
    /// Continuously compounded risk-free rate `r`.
    pub rate: f64,
    /// Continuous dividend yield `q`.
    pub dividend_yield: f64,
    /// Time to expiry `T` in years.
    pub expiry: f64,
}

impl OptionParams {
    pub fn new(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        rate: f64,
        dividend_yield: f64,
        expiry: f64,
    ) -> Self {
        Self {
            option_type,
            spot,
            strike,
            rate,
            dividend_yield,
            expiry,
        }
    }

    /// Copy with a different spot.
    pub fn with_spot(self, spot: f64) -> Self {
        Self { spot, ..self }
    }

    /// Copy with a different time to expiry.
    pub fn with_expiry(self, expiry: f64) -> Self {
        Self { expiry, ..self }
    }

    /// Forward price `S·e^((r−q)T)`.
    pub fn forward(&self) -> f64 {
        crate::conventions::forward_price(self.spot, self.rate, self.dividend_yield, self.expiry)
    }
}

/// The quantity that drives a computation; the other one is solved for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuoteDriver {
    /// Price directly from this volatility.
    Volatility(f64),
    /// Invert this market price into a volatility.
    Price(f64),
}

/// An option quote driven by either a volatility or a market price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionQuoteInput {
    pub params: OptionParams,
    pub driver: QuoteDriver,
}

/// First-order sensitivities in the same premium units as the price.
///
/// Vega is per 1.00 of volatility and theta is annualized; divide by 100 and
/// 365 respectively for per-point and per-day figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
    pub rho: f64,
}

impl Greeks {
    /// `true` when every sensitivity is a finite real.
    pub fn is_finite(&self) -> bool {
        [self.delta, self.gamma, self.vega, self.theta, self.rho]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Which feed supplied the spot price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotSource {
    #[default]
    Primary,
    Alternate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_type_parses_case_insensitively() {
        assert_eq!("CALL".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!(" put ".parse::<OptionType>().unwrap(), OptionType::Put);
        assert!(matches!(
            "straddle".parse::<OptionType>(),
            Err(AnalyticsError::InvalidInput { .. })
        ));
    }

    #[test]
    fn intrinsic_value_by_side() {
        assert_eq!(OptionType::Call.intrinsic(110.0, 100.0), 10.0);
        assert_eq!(OptionType::Call.intrinsic(90.0, 100.0), 0.0);
        assert_eq!(OptionType::Put.intrinsic(90.0, 100.0), 10.0);
        assert_eq!(OptionType::Put.intrinsic(110.0, 100.0), 0.0);
    }

    #[test]
    fn option_type_serializes_lowercase() {
        let json = serde_json::to_string(&OptionType::Put).unwrap();
        assert_eq!(json, "\"put\"");
    }

    #[test]
    fn params_forward_includes_dividend_yield() {
        let p = OptionParams::new(OptionType::Call, 100.0, 100.0, 0.05, 0.02, 1.0);
        assert!((p.forward() - 100.0 * 0.03_f64.exp()).abs() < 1e-12);
    }

    #[test]
    fn greeks_finiteness() {
        let g = Greeks {
            delta: 0.5,
            gamma: 0.02,
            vega: 39.0,
            theta: -4.0,
            rho: 45.0,
        };
        assert!(g.is_finite());
        assert!(!Greeks { gamma: f64::NAN, ..g }.is_finite());
    }
}
