//! Scenario analytics: spot × vol repricing grid for one listed contract.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{ContractSpec, MarketData, load_chain};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::implied::ImpliedVolSolver;
use crate::quote::PriceSource;
use crate::scenario::{ScenarioAxes, ScenarioAxis, ScenarioBase, ScenarioGrid, ScenarioStats};
use crate::types::{OptionType, SpotSource};
use crate::validate::validate_non_negative;

pub const LOCATION: &str = "scenario";

/// Axis bounds are fractional shocks: `spotMinPct = -0.2` is a 20% drop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioRequest {
    #[serde(flatten)]
    pub contract: ContractSpec,
    #[serde(default)]
    pub price_source: PriceSource,
    #[serde(default)]
    pub horizon_days: f64,
    pub spot_min_pct: f64,
    pub spot_max_pct: f64,
    pub spot_step_pct: f64,
    pub iv_min_pct: f64,
    pub iv_max_pct: f64,
    pub iv_step_pct: f64,
}

impl ScenarioRequest {
    /// Request with ±20% spot in 5% steps and ±50% vol in 10% steps.
    pub fn new(contract: ContractSpec) -> Self {
        Self {
            contract,
            price_source: PriceSource::Mid,
            horizon_days: 0.0,
            spot_min_pct: -0.2,
            spot_max_pct: 0.2,
            spot_step_pct: 0.05,
            iv_min_pct: -0.5,
            iv_max_pct: 0.5,
            iv_step_pct: 0.1,
        }
    }

    pub fn with_price_source(self, price_source: PriceSource) -> Self {
        Self {
            price_source,
            ..self
        }
    }

    pub fn with_horizon_days(self, horizon_days: f64) -> Self {
        Self {
            horizon_days,
            ..self
        }
    }

    pub fn with_spot_axis(self, min: f64, max: f64, step: f64) -> Self {
        Self {
            spot_min_pct: min,
            spot_max_pct: max,
            spot_step_pct: step,
            ..self
        }
    }

    pub fn with_iv_axis(self, min: f64, max: f64, step: f64) -> Self {
        Self {
            iv_min_pct: min,
            iv_max_pct: max,
            iv_step_pct: step,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioBaseBlock {
    pub symbol: String,
    pub expiry: NaiveDate,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub strike: f64,
    pub spot: f64,
    pub forward: f64,
    pub base_premium: f64,
    pub base_sigma: f64,
    /// Source the premium actually came from after any fallback.
    pub premium_source: PriceSource,
    pub dte: u32,
    pub horizon_days: f64,
    pub t_eff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResponse {
    pub base: ScenarioBaseBlock,
    pub axes: ScenarioAxes,
    pub grids: ScenarioGrid,
    pub stats: ScenarioStats,
    pub warnings: Vec<String>,
}

/// Reprice one contract over a grid of spot moves and vol shifts.
///
/// Market price sources fall back to mid and then last. The `model` source
/// prices the vendor IV, or a 30% default, instead of a market premium.
///
/// # Errors
/// - [`AnalyticsError::InvalidInput`](crate::AnalyticsError::InvalidInput)
///   for a malformed request or axis
/// - [`AnalyticsError::NotFound`](crate::AnalyticsError::NotFound) when the
///   chain or contract is missing
/// - [`AnalyticsError::Unavailable`](crate::AnalyticsError::Unavailable) when
///   spot, expiry or every premium source is unusable
pub fn scenario_analysis<M: MarketData + ?Sized>(
    request: &ScenarioRequest,
    market: &M,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<ScenarioResponse> {
    let target = &request.contract;
    let (symbol, expiry) = target.validate()?;
    let horizon_days = validate_non_negative(request.horizon_days, "horizonDays")?;
    let spot_moves = ScenarioAxis::spot_moves(
        request.spot_min_pct,
        request.spot_max_pct,
        request.spot_step_pct,
        &config.scenario,
    )?;
    let iv_shifts = ScenarioAxis::generate(
        "iv",
        request.iv_min_pct,
        request.iv_max_pct,
        request.iv_step_pct,
        &config.scenario,
    )?;

    let ctx = load_chain(market, &symbol, expiry, now)?;
    let contract = ctx.chain.find_contract(target.option_type, target.strike)?;
    let spot = ctx.spot()?;
    let params = ctx.params(target.option_type, spot, target.strike, target.r, target.q);

    let solver = ImpliedVolSolver::new(config.solver);
    let resolved = ScenarioBase::resolve(
        params,
        &contract.quote,
        request.price_source,
        horizon_days,
        &solver,
        &config.scenario,
    )?;
    let base = resolved.base;

    let mut warnings = resolved.warnings;
    if horizon_days > f64::from(ctx.dte) {
        warnings.push(format!(
            "Horizon exceeds DTE ({} days). Clamped to minimum time.",
            ctx.dte
        ));
    }
    if ctx.chain.spot_source == SpotSource::Alternate {
        warnings.push("Spot price sourced from alternate data.".to_string());
    }
    warnings.extend(config.warnings.vol_warning(base.base_sigma));

    let report = base.build_grid(spot_moves, iv_shifts, &config.scenario);

    Ok(ScenarioResponse {
        base: ScenarioBaseBlock {
            symbol,
            expiry,
            option_type: target.option_type,
            strike: target.strike,
            spot,
            forward: params.forward(),
            base_premium: base.base_premium,
            base_sigma: base.base_sigma,
            premium_source: base.premium_source,
            dte: ctx.dte,
            horizon_days,
            t_eff: report.t_eff,
        },
        axes: report.axes,
        grids: report.grids,
        stats: report.stats,
        warnings,
    })
}
