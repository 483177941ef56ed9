//! Base premium and volatility for a scenario grid.

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::error::{AnalyticsError, Result};
use crate::implied::ImpliedVolSolver;
use crate::pricing::price;
use crate::quote::{ContractQuote, PriceSource};
use crate::types::{OptionParams, OptionQuoteInput, QuoteDriver};
use crate::validate::{validate_finite, validate_non_negative, validate_positive};

/// The unshocked state every scenario cell is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioBase {
    pub params: OptionParams,
    pub base_premium: f64,
    pub base_sigma: f64,
    /// Days rolled forward before repricing.
    pub horizon_days: f64,
    /// Source the premium actually came from.
    pub premium_source: PriceSource,
}

/// A resolved base plus the advisories produced while resolving it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBase {
    pub base: ScenarioBase,
    pub warnings: Vec<String>,
}

impl ScenarioBase {
    /// Base from explicit values.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::InvalidInput`] unless spot, strike, expiry,
    /// premium and sigma are positive and `horizon_days` is non-negative.
    pub fn new(
        params: OptionParams,
        base_premium: f64,
        base_sigma: f64,
        horizon_days: f64,
    ) -> Result<Self> {
        validate_positive(params.spot, "spot")?;
        validate_positive(params.strike, "strike")?;
        validate_positive(params.expiry, "timeToExpiryYears")?;
        validate_finite(params.rate, "r")?;
        validate_finite(params.dividend_yield, "q")?;
        validate_positive(base_premium, "basePremium")?;
        validate_positive(base_sigma, "baseSigma")?;
        validate_non_negative(horizon_days, "horizonDays")?;
        Ok(Self {
            params,
            base_premium,
            base_sigma,
            horizon_days,
            premium_source: PriceSource::Model,
        })
    }

    /// Base from a quote input: a volatility is priced, a price is inverted.
    ///
    /// # Errors
    /// [`AnalyticsError::NoSolution`] when a price driver has no implied vol,
    /// [`AnalyticsError::Unavailable`] when the priced premium is not
    /// positive, plus the validation errors of [`ScenarioBase::new`].
    pub fn from_quote_input(
        input: &OptionQuoteInput,
        horizon_days: f64,
        solver: &ImpliedVolSolver,
    ) -> Result<Self> {
        let params = input.params;
        let (premium, sigma, source) = match input.driver {
            QuoteDriver::Volatility(sigma) => {
                validate_positive(sigma, "volatility")?;
                (price(&params, sigma), sigma, PriceSource::Model)
            }
            QuoteDriver::Price(target) => {
                let vol = solver.solve(&params, target).ok_or_else(|| {
                    AnalyticsError::no_solution(format!(
                        "no implied volatility reproduces price {target}"
                    ))
                })?;
                // An externally supplied price is treated as a market mid.
                (target, vol.0, PriceSource::Mid)
            }
        };
        if !(premium.is_finite() && premium > 0.0) {
            return Err(AnalyticsError::unavailable(
                "model premium is not a positive number",
            ));
        }
        Ok(Self {
            premium_source: source,
            ..Self::new(params, premium, sigma, horizon_days)?
        })
    }

    /// Resolve premium and sigma from a contract quote.
    ///
    /// Market sources walk [`PriceSource::fallback_chain`], then solve the
    /// implied vol from that premium, falling back to the vendor IV and
    /// finally `config.default_sigma`. [`PriceSource::Model`] prices the
    /// vendor IV (or the default) and re-solves it so the base vol is
    /// consistent with the solver.
    ///
    /// # Errors
    /// [`AnalyticsError::Unavailable`] when no source yields a positive
    /// premium, plus the validation errors of [`ScenarioBase::new`].
    pub fn resolve(
        params: OptionParams,
        quote: &ContractQuote,
        source: PriceSource,
        horizon_days: f64,
        solver: &ImpliedVolSolver,
        config: &ScenarioConfig,
    ) -> Result<ResolvedBase> {
        let default_pct = config.default_sigma * 100.0;
        let mut warnings = Vec::new();

        let (premium, sigma, used) = if source == PriceSource::Model {
            let seed = match quote.usable_vendor_iv() {
                Some(iv) => iv,
                None => {
                    warnings.push(format!(
                        "Vendor implied volatility unavailable. Using {default_pct:.0}% default."
                    ));
                    config.default_sigma
                }
            };
            let premium = price(&params, seed);
            if !(premium.is_finite() && premium > 0.0) {
                return Err(AnalyticsError::unavailable(
                    "unable to compute model premium",
                ));
            }
            let sigma = solver.solve(&params, premium).map_or(seed, |v| v.0);
            (premium, sigma, PriceSource::Model)
        } else {
            let resolved = quote.resolve_with_fallback(source).ok_or_else(|| {
                AnalyticsError::unavailable(format!(
                    "selected price source \"{source}\" is unavailable"
                ))
            })?;
            warnings.extend(resolved.fallback_warning());
            let sigma = match solver.solve(&params, resolved.premium) {
                Some(vol) => vol.0,
                None => match quote.usable_vendor_iv() {
                    Some(iv) => {
                        warnings.push(
                            "Unable to solve implied volatility. Using vendor IV instead."
                                .to_string(),
                        );
                        iv
                    }
                    None => {
                        warnings.push(format!(
                            "Unable to solve implied volatility. Using {default_pct:.0}% default."
                        ));
                        config.default_sigma
                    }
                },
            };
            (resolved.premium, sigma, resolved.used)
        };

        let base = Self {
            premium_source: used,
            ..Self::new(params, premium, sigma, horizon_days)?
        };
        Ok(ResolvedBase { base, warnings })
    }

    /// Time to expiry left after the horizon, floored at `config.time_epsilon`.
    pub fn effective_expiry(&self, config: &ScenarioConfig) -> f64 {
        (self.params.expiry - self.horizon_days / 365.0).max(config.time_epsilon)
    }
}
