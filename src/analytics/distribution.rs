//! Risk-neutral distribution analytics for one expiry.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{MarketData, load_chain, required_symbol};
use crate::chain::AtmSigmaSource;
use crate::config::EngineConfig;
use crate::conventions::parse_expiry;
use crate::distribution::{DistributionGrid, DistributionInput, DistributionStats};
use crate::error::Result;
use crate::implied::ImpliedVolSolver;
use crate::types::SpotSource;
use crate::validate::validate_finite;

pub const LOCATION: &str = "rnd";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRequest {
    pub symbol: String,
    pub expiry: String,
    pub r: f64,
    pub q: f64,
}

impl DistributionRequest {
    pub fn new(symbol: impl Into<String>, expiry: impl Into<String>, r: f64, q: f64) -> Self {
        Self {
            symbol: symbol.into(),
            expiry: expiry.into(),
            r,
            q,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionResponse {
    pub symbol: String,
    pub expiry: NaiveDate,
    pub spot: f64,
    pub spot_source: SpotSource,
    pub forward: f64,
    pub sigma: f64,
    pub sigma_source: AtmSigmaSource,
    pub atm_strike: f64,
    #[serde(rename = "tYears")]
    pub time_to_expiry_years: f64,
    pub grid: DistributionGrid,
    pub stats: DistributionStats,
    pub warnings: Vec<String>,
}

/// Lognormal terminal-price distribution at the chain's ATM volatility.
///
/// Spot comes from the market's quote feed when it is a positive number and
/// from the chain otherwise.
///
/// # Errors
/// - [`AnalyticsError::InvalidInput`](crate::AnalyticsError::InvalidInput)
///   for a malformed request
/// - [`AnalyticsError::NotFound`](crate::AnalyticsError::NotFound) when no
///   chain exists for the expiry
/// - [`AnalyticsError::Unavailable`](crate::AnalyticsError::Unavailable) when
///   neither spot is usable or the expiry has passed
pub fn risk_neutral_distribution<M: MarketData + ?Sized>(
    request: &DistributionRequest,
    market: &M,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<DistributionResponse> {
    let symbol = required_symbol(&request.symbol)?;
    let expiry = parse_expiry(request.expiry.trim())?;
    let r = validate_finite(request.r, "r")?;
    let q = validate_finite(request.q, "q")?;

    let ctx = load_chain(market, &symbol, expiry, now)?;
    let mut warnings = Vec::new();
    let (spot, spot_source) = match market.spot(&symbol).filter(|s| s.is_finite() && *s > 0.0) {
        Some(spot) => (spot, SpotSource::Primary),
        None => {
            let spot = ctx.spot()?;
            warnings.push("Spot helper returned invalid value; using chain spot instead".to_string());
            (spot, ctx.chain.spot_source)
        }
    };

    let solver = ImpliedVolSolver::new(config.solver);
    let default_sigma = config.distribution.default_sigma;
    let atm = ctx
        .chain
        .atm_sigma(spot, r, q, ctx.expiry_years, &solver, default_sigma);
    if atm.source == AtmSigmaSource::Default {
        warnings.push(format!(
            "ATM implied volatility unavailable; falling back to default {default_sigma}"
        ));
    }

    let input = DistributionInput::new(spot, r, q, ctx.expiry_years, atm.sigma)
        .with_spot_source(spot_source);
    let rnd = input.build(&config.distribution)?;
    warnings.extend(input.warnings(&config.warnings));

    Ok(DistributionResponse {
        symbol,
        expiry,
        spot,
        spot_source,
        forward: rnd.forward,
        sigma: rnd.sigma,
        sigma_source: atm.source,
        atm_strike: atm.atm_strike,
        time_to_expiry_years: rnd.expiry,
        grid: rnd.grid,
        stats: rnd.stats,
        warnings,
    })
}
