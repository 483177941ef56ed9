//! Pricing Core: closed-form European option price and Greeks.
//!
//! - [`price`]: BSM premium
//! - [`greeks`]: delta, gamma, vega, theta, rho
//! - [`probability_itm`]: risk-neutral probability of expiring in the money
//!
//! Everything here is a pure function of an [`OptionParams`](crate::types::OptionParams)
//! and a volatility. The core never fails and never clamps.

pub mod black_scholes;

pub use black_scholes::{
    d1_d2, greeks, norm_cdf, norm_pdf, price, price_bounds, probability_itm,
};

use crate::implied::ImpliedVolSolver;
use crate::types::{Greeks, OptionQuoteInput, QuoteDriver, Vol};

/// Price, Greeks and ITM probability of one quote, with the volatility used.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub vol: Vol,
    pub price: f64,
    pub greeks: Greeks,
    pub probability_itm: f64,
}

impl OptionQuoteInput {
    /// Value this quote along whichever path its driver selects.
    ///
    /// A [`QuoteDriver::Volatility`] is priced directly; a
    /// [`QuoteDriver::Price`] is first inverted with `solver`. Returns `None`
    /// when the volatility is not positive, the price has no implied vol, or
    /// any output is non-finite.
    pub fn evaluate(&self, solver: &ImpliedVolSolver) -> Option<Valuation> {
        let vol = match self.driver {
            QuoteDriver::Volatility(v) if v.is_finite() && v > 0.0 => Vol(v),
            QuoteDriver::Volatility(_) => return None,
            QuoteDriver::Price(target) => solver.solve(&self.params, target)?,
        };
        let premium = price(&self.params, vol.0);
        let sensitivities = greeks(&self.params, vol.0);
        let prob = probability_itm(&self.params, vol.0);
        if !premium.is_finite() || !sensitivities.is_finite() || !prob.is_finite() {
            return None;
        }
        Some(Valuation {
            vol,
            price: premium,
            greeks: sensitivities,
            probability_itm: prob,
        })
    }
}
