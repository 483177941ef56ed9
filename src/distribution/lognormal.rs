//! Lognormal terminal-price law under the risk-neutral measure.
//!
//! `ln(S_T) ~ N(μ, s²)` with `μ = ln S + (r − q − σ²/2)·T` and `s = σ√T`,
//! so that `E[S_T] = F = S·e^((r−q)T)`.

use statrs::distribution::{Continuous, ContinuousCDF, LogNormal};

use crate::error::{AnalyticsError, Result};

/// Terminal-price distribution for one expiry and one volatility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminalLogNormal {
    location: f64,
    scale: f64,
    law: LogNormal,
}

impl TerminalLogNormal {
    /// Distribution of `S_T` given today's spot, carry and volatility.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::InvalidInput`] when the implied location or
    /// scale is not a valid lognormal parameter (non-finite or `s ≤ 0`).
    pub fn new(spot: f64, rate: f64, dividend_yield: f64, expiry: f64, sigma: f64) -> Result<Self> {
        let scale = sigma * expiry.sqrt();
        let location = spot.ln() + (rate - dividend_yield - 0.5 * sigma * sigma) * expiry;
        let law = LogNormal::new(location, scale).map_err(|e| {
            AnalyticsError::invalid(format!(
                "lognormal parameters are invalid (location {location}, scale {scale}): {e}"
            ))
        })?;
        Ok(Self {
            location,
            scale,
            law,
        })
    }

    /// Mean of `ln(S_T)`.
    pub fn location(&self) -> f64 {
        self.location
    }

    /// Standard deviation of `ln(S_T)`, i.e. `σ√T`.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        self.law.pdf(x)
    }

    pub fn cdf(&self, x: f64) -> f64 {
        if x <= 0.0 {
            return 0.0;
        }
        self.law.cdf(x).clamp(0.0, 1.0)
    }
}
