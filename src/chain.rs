//! Option chains: contract lookup, ATM volatility and per-contract analytics.
//!
//! A chain is the already-fetched snapshot of every contract for one symbol
//! and expiry. Nothing here fetches or caches market data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::implied::ImpliedVolSolver;
use crate::pricing::{greeks, price};
use crate::quote::{ContractQuote, PriceSource};
use crate::types::{OptionParams, OptionType, SpotSource};

/// Strikes closer than this are the same contract.
const STRIKE_MATCH_TOLERANCE: f64 = 1e-6;
/// Strike distances within this of the minimum are all ATM.
const ATM_DISTANCE_TOLERANCE: f64 = 1e-8;

/// One listed contract and its quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionContract {
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub strike: f64,
    #[serde(flatten)]
    pub quote: ContractQuote,
}

/// Every contract for one symbol and expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionChain {
    pub symbol: String,
    pub expiry: NaiveDate,
    /// Spot reported alongside the chain.
    pub spot: f64,
    #[serde(default)]
    pub spot_source: SpotSource,
    pub contracts: Vec<OptionContract>,
}

/// Where an ATM volatility came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtmSigmaSource {
    Vendor,
    Solved,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtmSigma {
    pub sigma: f64,
    /// Strike of the first ATM contract, or spot when the chain is empty.
    pub atm_strike: f64,
    pub source: AtmSigmaSource,
}

/// Which implied vol drives the per-contract delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainIvSource {
    /// Solved from the contract's own premium.
    #[default]
    Mid,
    Vendor,
}

/// Model diagnostics for one contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAnalytics {
    pub mid: Option<f64>,
    pub premium_used: Option<f64>,
    pub iv_mid: Option<f64>,
    pub iv_vendor: Option<f64>,
    /// The vol selected by [`ChainIvSource`].
    pub iv: Option<f64>,
    pub delta: Option<f64>,
    pub model_price_from_iv_mid: Option<f64>,
    pub model_price_from_iv_vendor: Option<f64>,
    /// Model price minus premium used.
    pub pricing_error_mid: Option<f64>,
    pub pricing_error_vendor: Option<f64>,
    pub volume: Option<f64>,
    pub open_interest: Option<f64>,
}

/// Call and put analytics sharing a strike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChainRow {
    pub strike: f64,
    pub call: Option<ContractAnalytics>,
    pub put: Option<ContractAnalytics>,
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

impl OptionChain {
    /// The contract with this side and strike.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::NotFound`] when no contract matches.
    pub fn find_contract(&self, option_type: OptionType, strike: f64) -> Result<&OptionContract> {
        self.contracts
            .iter()
            .find(|c| {
                c.option_type == option_type
                    && (c.strike - strike).abs() < STRIKE_MATCH_TOLERANCE
            })
            .ok_or_else(|| {
                AnalyticsError::not_found(format!(
                    "No {option_type} contract found at {strike} for {}",
                    self.expiry
                ))
            })
    }

    /// Every contract whose strike is nearest to `spot`, calls and puts alike.
    pub fn atm_contracts(&self, spot: f64) -> Vec<&OptionContract> {
        let mut best = f64::INFINITY;
        let mut matches = Vec::new();
        for contract in &self.contracts {
            let distance = (contract.strike - spot).abs();
            if !distance.is_finite() {
                continue;
            }
            if distance < best - ATM_DISTANCE_TOLERANCE {
                best = distance;
                matches.clear();
                matches.push(contract);
            } else if (distance - best).abs() <= ATM_DISTANCE_TOLERANCE {
                matches.push(contract);
            }
        }
        matches
    }

    /// Volatility for a single-vol model at this expiry.
    ///
    /// Takes the first ATM contract with a usable vendor IV; otherwise solves
    /// the IV of each ATM contract from its two-sided mid or last price;
    /// otherwise returns `default_sigma`.
    pub fn atm_sigma(
        &self,
        spot: f64,
        rate: f64,
        dividend_yield: f64,
        expiry: f64,
        solver: &ImpliedVolSolver,
        default_sigma: f64,
    ) -> AtmSigma {
        let atm = self.atm_contracts(spot);
        let atm_strike = atm.first().map_or(spot, |c| c.strike);

        if let Some(iv) = atm.iter().find_map(|c| c.quote.usable_vendor_iv()) {
            return AtmSigma {
                sigma: iv,
                atm_strike,
                source: AtmSigmaSource::Vendor,
            };
        }

        let solved = atm.iter().find_map(|c| {
            let premium = c
                .quote
                .two_sided_mid()
                .or_else(|| c.quote.last.filter(|l| l.is_finite() && *l > 0.0))?;
            let params = OptionParams::new(
                c.option_type,
                spot,
                c.strike,
                rate,
                dividend_yield,
                expiry,
            );
            solver.solve(&params, premium).map(|v| v.0)
        });

        match solved {
            Some(sigma) => AtmSigma {
                sigma,
                atm_strike,
                source: AtmSigmaSource::Solved,
            },
            None => AtmSigma {
                sigma: default_sigma,
                atm_strike,
                source: AtmSigmaSource::Default,
            },
        }
    }

    /// Per-contract premiums, implied vols, deltas and pricing errors,
    /// grouped by strike in ascending order.
    ///
    /// `premium_source` is [`PriceSource::Mid`] (two-sided mid, else last) or
    /// [`PriceSource::Last`].
    ///
    /// # Errors
    /// Returns [`AnalyticsError::InvalidInput`] for any other premium source.
    pub fn analyze(
        &self,
        rate: f64,
        dividend_yield: f64,
        expiry: f64,
        premium_source: PriceSource,
        iv_source: ChainIvSource,
        solver: &ImpliedVolSolver,
    ) -> Result<Vec<ChainRow>> {
        if !matches!(premium_source, PriceSource::Mid | PriceSource::Last) {
            return Err(AnalyticsError::invalid(format!(
                "premiumSource must be mid or last, got {premium_source}"
            )));
        }

        let pricing = ContractPricing {
            spot: self.spot,
            rate,
            dividend_yield,
            expiry,
            premium_source,
            iv_source,
            solver,
        };
        let mut rows: Vec<ChainRow> = Vec::new();
        for contract in &self.contracts {
            let analytics = pricing.analytics(contract);
            let index = match rows
                .iter()
                .position(|r| r.strike == contract.strike)
            {
                Some(i) => i,
                None => {
                    rows.push(ChainRow {
                        strike: contract.strike,
                        call: None,
                        put: None,
                    });
                    rows.len() - 1
                }
            };
            match contract.option_type {
                OptionType::Call => rows[index].call = Some(analytics),
                OptionType::Put => rows[index].put = Some(analytics),
            }
        }
        rows.sort_by(|a, b| a.strike.total_cmp(&b.strike));
        Ok(rows)
    }
}

/// Market state and source choices shared by every contract of one chain pass.
struct ContractPricing<'a> {
    spot: f64,
    rate: f64,
    dividend_yield: f64,
    expiry: f64,
    premium_source: PriceSource,
    iv_source: ChainIvSource,
    solver: &'a ImpliedVolSolver,
}

impl ContractPricing<'_> {
    fn analytics(&self, contract: &OptionContract) -> ContractAnalytics {
        let quote = &contract.quote;
        let params = OptionParams::new(
            contract.option_type,
            self.spot,
            contract.strike,
            self.rate,
            self.dividend_yield,
            self.expiry,
        );
        let last = quote.last.filter(|l| l.is_finite() && *l > 0.0);
        let premium_used = match self.premium_source {
            PriceSource::Mid => quote.two_sided_mid().or(last),
            _ => last,
        };

        let iv_mid = premium_used.and_then(|p| self.solver.solve(&params, p).map(|v| v.0));
        let iv_vendor = finite(quote.vendor_iv);
        let iv = match self.iv_source {
            ChainIvSource::Mid => iv_mid,
            ChainIvSource::Vendor => iv_vendor,
        }
        .filter(|v| *v > 0.0);
        let delta = iv.map(|v| greeks(&params, v).delta).filter(|d| d.is_finite());

        let model_price = |vol: Option<f64>| {
            premium_used?;
            finite(vol.filter(|v| *v > 0.0).map(|v| price(&params, v)))
        };
        let model_price_from_iv_mid = model_price(iv_mid);
        let model_price_from_iv_vendor = model_price(iv_vendor);
        let error = |model: Option<f64>| Some(model? - premium_used?);

        ContractAnalytics {
            mid: quote.two_sided_mid(),
            premium_used,
            iv_mid,
            iv_vendor,
            iv,
            delta,
            model_price_from_iv_mid,
            model_price_from_iv_vendor,
            pricing_error_mid: error(model_price_from_iv_mid),
            pricing_error_vendor: error(model_price_from_iv_vendor),
            volume: finite(quote.volume),
            open_interest: finite(quote.open_interest),
        }
    }
}
