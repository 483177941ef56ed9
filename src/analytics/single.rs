//! Single-option analytics: implied vol, model price, Greeks and diagnostics
//! for one listed contract.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{ContractSpec, MarketData, load_chain};
use crate::config::EngineConfig;
use crate::error::{AnalyticsError, Result};
use crate::implied::ImpliedVolSolver;
use crate::quote::{ContractQuote, PriceSource};
use crate::types::{Greeks, OptionQuoteInput, OptionType, QuoteDriver, SpotSource};

pub const LOCATION: &str = "single";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleOptionRequest {
    #[serde(flatten)]
    pub contract: ContractSpec,
    /// One of mid, bid, ask or last. Defaults to mid.
    #[serde(default)]
    pub price_source: PriceSource,
}

impl SingleOptionRequest {
    pub fn new(contract: ContractSpec) -> Self {
        Self {
            contract,
            price_source: PriceSource::Mid,
        }
    }

    pub fn with_price_source(self, price_source: PriceSource) -> Self {
        Self {
            price_source,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotBlock {
    pub spot: f64,
    pub forward: f64,
    #[serde(rename = "tYears")]
    pub time_to_expiry_years: f64,
    pub dte: u32,
    pub source: SpotSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketBlock {
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last: Option<f64>,
    pub mid: Option<f64>,
    pub premium: f64,
    pub price_source: PriceSource,
    pub spread_abs: Option<f64>,
    pub spread_pct: Option<f64>,
    pub volume: Option<f64>,
    pub open_interest: Option<f64>,
    #[serde(rename = "vendorIV")]
    pub vendor_iv: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelBlock {
    pub iv_used: f64,
    pub bsm_price: f64,
    pub greeks: Greeks,
    #[serde(rename = "probITM")]
    pub prob_itm: f64,
    /// Underlying level at expiry where the premium is recovered.
    pub breakeven: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleOptionResponse {
    pub symbol: String,
    pub expiry: NaiveDate,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub strike: f64,
    pub spot: SpotBlock,
    pub market: MarketBlock,
    #[serde(flatten)]
    pub model: ModelBlock,
    pub warnings: Vec<String>,
}

/// Value one contract at its selected market premium.
///
/// The premium is taken strictly from the requested source, with no
/// fallback.
///
/// # Errors
/// - [`AnalyticsError::InvalidInput`] for a malformed request or a `model`
///   price source
/// - [`AnalyticsError::NotFound`] when the chain or contract is missing
/// - [`AnalyticsError::Unavailable`] when spot, expiry or the premium is unusable
/// - [`AnalyticsError::NoSolution`] when no implied vol reproduces the premium
pub fn single_option<M: MarketData + ?Sized>(
    request: &SingleOptionRequest,
    market: &M,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<SingleOptionResponse> {
    let target = &request.contract;
    let (symbol, expiry) = target.validate()?;
    let source = request.price_source;
    if source == PriceSource::Model {
        return Err(AnalyticsError::invalid(
            "priceSource must be mid, bid, ask, or last",
        ));
    }

    let ctx = load_chain(market, &symbol, expiry, now)?;
    let contract = ctx.chain.find_contract(target.option_type, target.strike)?;
    let spot = ctx.spot()?;
    let quote = &contract.quote;
    let premium = quote
        .resolve_strict(source)
        .ok_or_else(|| {
            AnalyticsError::unavailable(format!(
                "Selected price source \"{source}\" is unavailable"
            ))
        })?
        .premium;

    let params = ctx.params(target.option_type, spot, target.strike, target.r, target.q);
    let solver = ImpliedVolSolver::new(config.solver);
    let iv = solver
        .solve_detailed(&params, premium)
        .map_err(|failure| {
            AnalyticsError::no_solution(format!(
                "Unable to solve implied volatility: {}",
                failure.describe()
            ))
        })?
        .vol;
    let valuation = OptionQuoteInput {
        params,
        driver: QuoteDriver::Volatility(iv.0),
    }
    .evaluate(&solver)
    .ok_or_else(|| AnalyticsError::unavailable("Model outputs are not finite"))?;

    let breakeven = match target.option_type {
        OptionType::Call => target.strike + premium,
        OptionType::Put => target.strike - premium,
    };

    let mut warnings = quote_warnings(quote, config);
    if ctx.chain.spot_source == SpotSource::Alternate {
        warnings.push("Spot price sourced from alternate data.".to_string());
    }
    warnings.extend(config.warnings.vol_warning(iv.0));

    #[cfg(feature = "logging")]
    tracing::debug!(
        symbol = %symbol,
        strike = target.strike,
        premium,
        iv = iv.0,
        n_warnings = warnings.len(),
        "single option valued"
    );

    let spread = quote.spread();
    Ok(SingleOptionResponse {
        symbol,
        expiry,
        option_type: target.option_type,
        strike: target.strike,
        spot: SpotBlock {
            spot,
            forward: params.forward(),
            time_to_expiry_years: ctx.expiry_years,
            dte: ctx.dte,
            source: ctx.chain.spot_source,
        },
        market: MarketBlock {
            bid: quote.bid,
            ask: quote.ask,
            last: quote.last,
            mid: quote.mid(),
            premium,
            price_source: source,
            spread_abs: spread.map(|s| s.absolute),
            spread_pct: spread.map(|s| s.pct).filter(|p| p.is_finite()),
            volume: quote.volume,
            open_interest: quote.open_interest,
            vendor_iv: quote.vendor_iv,
        },
        model: ModelBlock {
            iv_used: iv.0,
            bsm_price: valuation.price,
            greeks: valuation.greeks,
            prob_itm: valuation.probability_itm,
            breakeven,
        },
        warnings,
    })
}

/// Liquidity and data-quality advisories for a quote.
fn quote_warnings(quote: &ContractQuote, config: &EngineConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    if let Some(spread) = quote.spread()
        && spread.pct.is_finite()
        && spread.pct > config.warnings.wide_spread_pct
    {
        warnings.push(format!("Wide bid/ask spread: {:.1}%", spread.pct));
    }
    let missing = |v: Option<f64>| !v.is_some_and(|x| x.is_finite() && x > 0.0);
    if missing(quote.open_interest) {
        warnings.push("Open interest unavailable or zero.".to_string());
    }
    if missing(quote.volume) {
        warnings.push("Volume unavailable or zero.".to_string());
    }
    if quote.usable_vendor_iv().is_none() {
        warnings.push("Vendor implied volatility unavailable.".to_string());
    }
    warnings
}
