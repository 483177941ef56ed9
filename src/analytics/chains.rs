//! Chain tables: per-strike call/put analytics for one or more expiries.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{MarketData, load_chain, required_symbol};
use crate::chain::{ChainIvSource, ChainRow};
use crate::config::EngineConfig;
use crate::conventions::parse_expiry;
use crate::error::{AnalyticsError, Result};
use crate::implied::ImpliedVolSolver;
use crate::quote::PriceSource;
use crate::types::SpotSource;
use crate::validate::validate_finite;

pub const LOCATION: &str = "chain";

fn default_rate() -> f64 {
    0.05
}

fn default_dividend_yield() -> f64 {
    0.005
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTableRequest {
    pub symbol: String,
    /// `YYYY-MM-DD` dates. Duplicates are dropped, order is kept.
    pub expiries: Vec<String>,
    #[serde(default)]
    pub iv_source: ChainIvSource,
    /// Mid or last. Defaults to mid.
    #[serde(default)]
    pub premium_source: PriceSource,
    #[serde(default = "default_rate")]
    pub r: f64,
    #[serde(default = "default_dividend_yield")]
    pub q: f64,
}

impl ChainTableRequest {
    pub fn new(symbol: impl Into<String>, expiries: Vec<String>) -> Self {
        Self {
            symbol: symbol.into(),
            expiries,
            iv_source: ChainIvSource::Mid,
            premium_source: PriceSource::Mid,
            r: default_rate(),
            q: default_dividend_yield(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryChain {
    pub expiry: NaiveDate,
    pub spot: f64,
    pub spot_source: SpotSource,
    #[serde(rename = "tYears")]
    pub time_to_expiry_years: f64,
    pub rows: Vec<ChainRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTableResponse {
    pub symbol: String,
    pub iv_source: ChainIvSource,
    pub premium_source: PriceSource,
    pub r: f64,
    pub q: f64,
    pub chains: Vec<ExpiryChain>,
}

/// Analyze every contract of each requested expiry.
///
/// # Errors
/// - [`AnalyticsError::InvalidInput`] for a missing symbol, no expiries, a
///   malformed date, or a premium source other than mid or last
/// - [`AnalyticsError::NotFound`] when any requested chain is missing
/// - [`AnalyticsError::Unavailable`] when a chain has no usable spot or has expired
pub fn chain_table<M: MarketData + ?Sized>(
    request: &ChainTableRequest,
    market: &M,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<ChainTableResponse> {
    let symbol = required_symbol(&request.symbol)?;
    if !matches!(request.premium_source, PriceSource::Mid | PriceSource::Last) {
        return Err(AnalyticsError::invalid("premiumSource must be mid or last"));
    }
    let r = validate_finite(request.r, "r")?;
    let q = validate_finite(request.q, "q")?;

    let mut expiries: Vec<NaiveDate> = Vec::new();
    for raw in request.expiries.iter().map(|e| e.trim()).filter(|e| !e.is_empty()) {
        let expiry = parse_expiry(raw)?;
        if !expiries.contains(&expiry) {
            expiries.push(expiry);
        }
    }
    if expiries.is_empty() {
        return Err(AnalyticsError::invalid("expiry or expiries is required"));
    }

    let solver = ImpliedVolSolver::new(config.solver);
    let chains = expiries
        .into_iter()
        .map(|expiry| {
            let ctx = load_chain(market, &symbol, expiry, now)?;
            let spot = ctx.spot()?;
            let rows = ctx.chain.analyze(
                r,
                q,
                ctx.expiry_years,
                request.premium_source,
                request.iv_source,
                &solver,
            )?;
            Ok(ExpiryChain {
                expiry,
                spot,
                spot_source: ctx.chain.spot_source,
                time_to_expiry_years: ctx.expiry_years,
                rows,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ChainTableResponse {
        symbol,
        iv_source: request.iv_source,
        premium_source: request.premium_source,
        r,
        q,
        chains,
    })
}
