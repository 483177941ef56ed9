//! Request-level analytics.
//!
//! Each entry point validates a request, looks the contract or chain up in
//! already-fetched market data, runs the numeric core and attaches advisory
//! warnings. Failures are [`AnalyticsError`]s; turn one into a transport
//! payload with [`AnalyticsError::to_body`] and the module's `LOCATION`.
//!
//! | entry point | location |
//! |---|---|
//! | [`single_option`] | `"single"` |
//! | [`scenario_analysis`] | `"scenario"` |
//! | [`risk_neutral_distribution`] | `"rnd"` |
//! | [`volatility_surface`] | `"surface"` |
//! | [`chain_table`] | `"chain"` |

pub mod chains;
pub mod distribution;
pub mod scenario;
pub mod single;
pub mod surface;

pub use chains::{ChainTableRequest, ChainTableResponse, ExpiryChain, chain_table};
pub use distribution::{DistributionRequest, DistributionResponse, risk_neutral_distribution};
pub use scenario::{ScenarioBaseBlock, ScenarioRequest, ScenarioResponse, scenario_analysis};
pub use single::{SingleOptionRequest, SingleOptionResponse, single_option};
pub use surface::{
    SurfaceQuote, SurfaceSnapshot, VolSurfaceRequest, VolSurfaceResponse, volatility_surface,
};

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::chain::OptionChain;
use crate::conventions::{days_to_expiry, normalize_symbol, parse_expiry, time_to_expiry_years};
use crate::error::{AnalyticsError, Result};
use crate::types::{OptionParams, OptionType};
use crate::validate::{validate_finite, validate_positive};

/// Source of option chains and spot quotes.
///
/// Symbols passed in are already normalized (trimmed, upper-case).
pub trait MarketData {
    /// Every chain held for `symbol`.
    fn chains(&self, symbol: &str) -> Vec<&OptionChain>;

    /// The chain for one expiry.
    fn chain(&self, symbol: &str, expiry: NaiveDate) -> Option<&OptionChain> {
        self.chains(symbol).into_iter().find(|c| c.expiry == expiry)
    }

    /// Spot from a dedicated quote feed, when one exists.
    fn spot(&self, _symbol: &str) -> Option<f64> {
        None
    }
}

impl MarketData for OptionChain {
    fn chains(&self, symbol: &str) -> Vec<&OptionChain> {
        if normalize_symbol(&self.symbol) == symbol {
            vec![self]
        } else {
            Vec::new()
        }
    }
}

/// In-memory market data: a set of chains plus optional feed spots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSnapshot {
    pub chains: Vec<OptionChain>,
    pub spots: BTreeMap<String, f64>,
}

impl MarketSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chain(mut self, chain: OptionChain) -> Self {
        self.chains.push(chain);
        self
    }

    pub fn with_spot(mut self, symbol: &str, spot: f64) -> Self {
        self.spots.insert(normalize_symbol(symbol), spot);
        self
    }
}

impl MarketData for MarketSnapshot {
    fn chains(&self, symbol: &str) -> Vec<&OptionChain> {
        self.chains
            .iter()
            .filter(|c| normalize_symbol(&c.symbol) == symbol)
            .collect()
    }

    fn spot(&self, symbol: &str) -> Option<f64> {
        self.spots.get(symbol).copied()
    }
}

/// Identifies one listed contract and the rates to value it with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSpec {
    pub symbol: String,
    /// `YYYY-MM-DD`.
    pub expiry: String,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub strike: f64,
    pub r: f64,
    pub q: f64,
}

impl ContractSpec {
    pub fn new(
        symbol: impl Into<String>,
        expiry: impl Into<String>,
        option_type: OptionType,
        strike: f64,
        r: f64,
        q: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            expiry: expiry.into(),
            option_type,
            strike,
            r,
            q,
        }
    }

    pub(crate) fn validate(&self) -> Result<(String, NaiveDate)> {
        let symbol = required_symbol(&self.symbol)?;
        let expiry = parse_expiry(self.expiry.trim())?;
        validate_positive(self.strike, "strike")?;
        validate_finite(self.r, "r")?;
        validate_finite(self.q, "q")?;
        Ok((symbol, expiry))
    }
}

pub(crate) fn required_symbol(symbol: &str) -> Result<String> {
    let normalized = normalize_symbol(symbol);
    if normalized.is_empty() {
        return Err(AnalyticsError::invalid("symbol is required"));
    }
    Ok(normalized)
}

/// A located chain and its calendar terms.
pub(crate) struct ChainContext<'a> {
    pub chain: &'a OptionChain,
    pub expiry_years: f64,
    pub dte: u32,
}

impl ChainContext<'_> {
    /// The chain's own spot, when usable.
    pub fn spot(&self) -> Result<f64> {
        let spot = self.chain.spot;
        if spot.is_finite() && spot > 0.0 {
            Ok(spot)
        } else {
            Err(AnalyticsError::unavailable(format!(
                "Unable to resolve spot price for {}",
                self.chain.expiry
            )))
        }
    }

    pub fn params(&self, option_type: OptionType, spot: f64, strike: f64, r: f64, q: f64) -> OptionParams {
        OptionParams::new(option_type, spot, strike, r, q, self.expiry_years)
    }
}

pub(crate) fn load_chain<'a, M: MarketData + ?Sized>(
    market: &'a M,
    symbol: &str,
    expiry: NaiveDate,
    now: DateTime<Utc>,
) -> Result<ChainContext<'a>> {
    let chain = market.chain(symbol, expiry).ok_or_else(|| {
        AnalyticsError::not_found(format!("No option chain for {symbol} expiring {expiry}"))
    })?;
    let expiry_years = time_to_expiry_years(expiry, now)
        .filter(|t| *t > 0.0)
        .ok_or_else(|| {
            AnalyticsError::unavailable(format!(
                "Expiry {expiry} is too close or invalid for pricing"
            ))
        })?;
    let dte = days_to_expiry(expiry, now)
        .unwrap_or_else(|| (expiry_years * 365.0).round().max(0.0) as u32);

    #[cfg(feature = "logging")]
    tracing::debug!(symbol, %expiry, expiry_years, dte, "chain resolved");

    Ok(ChainContext {
        chain,
        expiry_years,
        dte,
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn snapshot_matches_normalized_symbols() {
        let market = MarketSnapshot::new().with_chain(chain()).with_spot(" spy ", 101.0);
        assert_eq!(market.chains("SPY").len(), 1);
        assert!(market.chains("QQQ").is_empty());
        assert_eq!(market.spot("SPY"), Some(101.0));
        let expiry = parse_expiry(EXPIRY).unwrap();
        assert!(market.chain("SPY", expiry).is_some());
    }

    #[test]
    fn single_chain_is_its_own_market() {
        let c = chain();
        assert_eq!(c.chains("SPY").len(), 1);
        assert_eq!(c.spot("SPY"), None);
    }

    #[test]
    fn load_chain_reports_terms() {
        let c = chain();
        let ctx = load_chain(&c, "SPY", parse_expiry(EXPIRY).unwrap(), now()).unwrap();
        assert_eq!(ctx.dte, 30);
        assert!((ctx.expiry_years - expiry_years()).abs() < 1e-12);
        assert_eq!(ctx.spot().unwrap(), 100.0);
    }

    #[test]
    fn load_chain_errors() {
        let c = chain();
        let other = parse_expiry("2026-04-17").unwrap();
        assert_eq!(load_chain(&c, "SPY", other, now()).err().unwrap().status_code(), 404);

        let expired = OptionChain {
            expiry: parse_expiry("2026-01-16").unwrap(),
            ..chain()
        };
        let err = load_chain(&expired, "SPY", expired.expiry, now()).err().unwrap();
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn contract_spec_validation() {
        let ok = ContractSpec::new("spy", EXPIRY, OptionType::Call, 100.0, 0.02, 0.0);
        assert_eq!(ok.validate().unwrap().0, "SPY");
        for bad in [
            ContractSpec::new("  ", EXPIRY, OptionType::Call, 100.0, 0.02, 0.0),
            ContractSpec::new("SPY", "2026-3-20", OptionType::Call, 100.0, 0.02, 0.0),
            ContractSpec::new("SPY", EXPIRY, OptionType::Call, 0.0, 0.02, 0.0),
            ContractSpec::new("SPY", EXPIRY, OptionType::Call, 100.0, f64::NAN, 0.0),
        ] {
            assert_eq!(bad.validate().unwrap_err().status_code(), 400);
        }
    }

    #[test]
    fn contract_spec_reads_type_field() {
        let spec: ContractSpec = serde_json::from_str(
            r#"{"symbol":"SPY","expiry":"2026-03-20","type":"put","strike":95,"r":0.02,"q":0}"#,
        )
        .unwrap();
        assert_eq!(spec.option_type, OptionType::Put);
    }
}
