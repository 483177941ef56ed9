//! Integration tests for the optanalytics pipeline.
//!
//! Exercises the path from an option chain through premium resolution,
//! implied vol, pricing, scenario grids, the risk-neutral distribution and
//! surface construction, using only the public API.

use std::sync::Arc;
use std::thread;

use approx::assert_abs_diff_eq;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use optanalytics::analytics::{
    ContractSpec, DistributionRequest, MarketSnapshot, ScenarioRequest, SingleOptionRequest,
    SurfaceQuote, SurfaceSnapshot, VolSurfaceRequest, risk_neutral_distribution,
    scenario_analysis, single_option, volatility_surface,
};
use optanalytics::chain::OptionContract;
use optanalytics::pricing::{greeks, price, probability_itm};
use optanalytics::scenario::{ScenarioAxis, ScenarioBase};
use optanalytics::types::SpotSource;
use optanalytics::{
    AnalyticsError, ContractQuote, EngineConfig, ImpliedVolSolver, OptionChain, OptionParams,
    OptionType, PriceSource, SurfaceBuilder, SurfacePoint,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const RATE: f64 = 0.03;
const DIV: f64 = 0.01;

/// 2026-05-06 21:00 UTC, 44 days before the 2026-06-19 settlement.
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 6, 21, 0, 0).unwrap()
}

fn expiry_years() -> f64 {
    44.0 / 365.0
}

/// Skewed smile: higher vols for low strikes.
fn smile_vol(strike: f64, spot: f64) -> f64 {
    let x = (strike / spot).ln();
    0.22 - 0.15 * x + 0.8 * x * x
}

/// A full chain of calls and puts from 80 to 120 quoted around model prices.
fn spy_chain(spot: f64) -> OptionChain {
    let mut contracts = Vec::new();
    for i in 0..=16 {
        let strike = 80.0 + 2.5 * i as f64;
        let vol = smile_vol(strike, spot);
        for side in [OptionType::Call, OptionType::Put] {
            let p = OptionParams::new(side, spot, strike, RATE, DIV, expiry_years());
            let mid = price(&p, vol);
            contracts.push(OptionContract {
                option_type: side,
                strike,
                quote: ContractQuote {
                    bid: Some(mid - 0.02),
                    ask: Some(mid + 0.02),
                    last: Some(mid),
                    vendor_iv: Some(vol),
                    volume: Some(500.0),
                    open_interest: Some(4000.0),
                },
            });
        }
    }
    OptionChain {
        symbol: "SPY".into(),
        expiry: NaiveDate::from_ymd_opt(2026, 6, 19).unwrap(),
        spot,
        spot_source: SpotSource::Primary,
        contracts,
    }
}

fn spec(option_type: OptionType, strike: f64) -> ContractSpec {
    ContractSpec::new("SPY", "2026-06-19", option_type, strike, RATE, DIV)
}

// ---------------------------------------------------------------------------
// Pricing core and solver
// ---------------------------------------------------------------------------

#[test]
fn atm_one_year_reference_values() {
    let p = OptionParams::new(OptionType::Call, 100.0, 100.0, 0.01, 0.0, 1.0);
    assert_abs_diff_eq!(price(&p, 0.2), 8.433_318_690, epsilon = 1e-6);
    assert_abs_diff_eq!(greeks(&p, 0.2).delta, 0.559_617_692, epsilon = 1e-6);
    let vol = ImpliedVolSolver::default().solve(&p, price(&p, 0.2)).unwrap();
    assert_abs_diff_eq!(vol.0, 0.2, epsilon = 1e-4);
}

#[test]
fn put_call_parity_with_dividends() {
    let call = OptionParams::new(OptionType::Call, 105.0, 95.0, 0.04, 0.02, 0.75);
    let put = OptionParams {
        option_type: OptionType::Put,
        ..call
    };
    let lhs = price(&call, 0.3) - price(&put, 0.3);
    let rhs = 105.0 * (-0.02_f64 * 0.75).exp() - 95.0 * (-0.04_f64 * 0.75).exp();
    assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-10);
    assert_abs_diff_eq!(
        probability_itm(&call, 0.3) + probability_itm(&put, 0.3),
        1.0,
        epsilon = 1e-12
    );
}

#[test]
fn forced_non_convergence_returns_none() {
    let cfg = EngineConfig {
        solver: optanalytics::config::SolverConfig {
            max_iterations: 2,
            ..Default::default()
        },
        ..Default::default()
    };
    let p = OptionParams::new(OptionType::Call, 100.0, 100.0, 0.01, 0.0, 1.0);
    let solver = ImpliedVolSolver::new(cfg.solver);
    assert!(solver.solve(&p, price(&p, 0.2)).is_none());
}

// ---------------------------------------------------------------------------
// Request-level analytics
// ---------------------------------------------------------------------------

#[test]
fn single_option_recovers_smile_vol() {
    let chain = spy_chain(100.0);
    for (side, strike) in [(OptionType::Put, 90.0), (OptionType::Call, 110.0)] {
        let req = SingleOptionRequest::new(spec(side, strike));
        let resp = single_option(&req, &chain, now(), &EngineConfig::default()).unwrap();
        assert_abs_diff_eq!(resp.model.iv_used, smile_vol(strike, 100.0), epsilon = 1e-4);
        assert!(resp.model.greeks.is_finite());
        assert_eq!(resp.spot.dte, 44);
    }
}

#[test]
fn error_bodies_carry_location_and_status() {
    let chain = spy_chain(100.0);
    let req = SingleOptionRequest::new(spec(OptionType::Call, 111.0));
    let err = single_option(&req, &chain, now(), &EngineConfig::default()).unwrap_err();
    assert!(matches!(err, AnalyticsError::NotFound { .. }));
    let body = err.to_body(optanalytics::analytics::single::LOCATION);
    assert_eq!(body.status, 404);
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["where"], "single");
    assert!(json["error"].as_str().unwrap().contains("111"));
}

#[test]
fn scenario_put_gains_when_spot_falls() {
    let chain = spy_chain(100.0);
    let req = ScenarioRequest::new(spec(OptionType::Put, 95.0))
        .with_horizon_days(7.0)
        .with_spot_axis(-0.1, 0.1, 0.05)
        .with_iv_axis(-0.2, 0.2, 0.2);
    let resp = scenario_analysis(&req, &chain, now(), &EngineConfig::default()).unwrap();
    assert_eq!(resp.grids.price.len(), 3);
    assert_eq!(resp.grids.price[0].len(), 5);
    assert_eq!(resp.stats.pnl_best.spot_move, -0.1);
    assert_eq!(resp.stats.pnl_best.iv_shift, 0.2);
    assert_abs_diff_eq!(resp.base.t_eff, (44.0 - 7.0) / 365.0, epsilon = 1e-9);
    for (prices, pnls) in resp.grids.price.iter().zip(&resp.grids.pnl) {
        for (p, l) in prices.iter().zip(pnls) {
            assert_eq!(*l, *p - resp.base.base_premium);
        }
    }
}

#[test]
fn distribution_centers_on_forward() {
    let market = MarketSnapshot::new()
        .with_chain(spy_chain(100.0))
        .with_spot("SPY", 100.0);
    let req = DistributionRequest::new("SPY", "2026-06-19", RATE, DIV);
    let resp = risk_neutral_distribution(&req, &market, now(), &EngineConfig::default()).unwrap();
    assert_abs_diff_eq!(resp.sigma, 0.22, epsilon = 1e-12);
    assert_abs_diff_eq!(
        resp.forward,
        100.0 * ((RATE - DIV) * expiry_years()).exp(),
        epsilon = 1e-9
    );
    let cdf = &resp.grid.cdf;
    assert!(cdf.windows(2).all(|w| w[1] >= w[0]));
    assert!(cdf[0] < 1e-5 && cdf[cdf.len() - 1] > 1.0 - 1e-5);
    assert!(resp.stats.expected_move_lower < 100.0 && resp.stats.expected_move_upper > 100.0);
}

#[test]
fn surface_from_marked_vols() {
    let spot = 100.0;
    let quotes: Vec<SurfaceQuote> = [9_i64, 30, 58, 93]
        .iter()
        .flat_map(|&days| {
            (0..=16).map(move |i| {
                let strike = 80.0 + 2.5 * i as f64;
                SurfaceQuote {
                    strike,
                    expires_at: now() + Duration::days(days),
                    mark_iv: 100.0 * smile_vol(strike, spot),
                }
            })
        })
        .collect();
    let snapshot = SurfaceSnapshot {
        spot: Some(spot),
        realized_vol: Some(0.17),
        quotes,
    };
    let req = VolSurfaceRequest {
        x_min: -0.3,
        x_max: 0.3,
        x_steps: 25,
        expiries: 5,
        ..VolSurfaceRequest::new("SPY")
    };
    let resp = volatility_surface(&req, &snapshot, now(), &EngineConfig::default()).unwrap();
    assert_eq!(resp.grid.y, vec![9.0, 30.0, 58.0, 93.0]);
    assert!(resp.grid.is_complete());
    assert_eq!(resp.target_days, Some(30.0));
    assert_abs_diff_eq!(resp.skew.unwrap(), -0.15, epsilon = 1e-9);
    assert_abs_diff_eq!(resp.kurtosis_proxy.unwrap(), 0.8, epsilon = 1e-9);
    assert!(resp.grid_stats.z_min.unwrap() >= 0.05);
}

// ---------------------------------------------------------------------------
// Component composition
// ---------------------------------------------------------------------------

#[test]
fn single_point_surface_is_fully_filled() {
    let report = SurfaceBuilder::new()
        .add_point(SurfacePoint::from_strike(105.0, 100.0, 30.0, 0.25))
        .build()
        .unwrap();
    assert_eq!(report.grid.z.len(), 1);
    assert!(report.grid.z[0].iter().all(|&v| (v - 0.25).abs() < 1e-12));
}

#[test]
fn empty_surface_is_not_an_error() {
    let report = SurfaceBuilder::new().build().unwrap();
    assert!(report.grid.z.is_empty());
    assert!(report.skew.is_none());
    assert!(report.kurtosis_proxy.is_none());
    assert_eq!(report.points_count, 0);
}

#[test]
fn scenario_base_from_chain_quote() {
    let chain = spy_chain(100.0);
    let contract = chain.find_contract(OptionType::Call, 100.0).unwrap();
    let params = OptionParams::new(OptionType::Call, 100.0, 100.0, RATE, DIV, expiry_years());
    let cfg = EngineConfig::default();
    let resolved = ScenarioBase::resolve(
        params,
        &contract.quote,
        PriceSource::Ask,
        0.0,
        &ImpliedVolSolver::default(),
        &cfg.scenario,
    )
    .unwrap();
    assert_eq!(resolved.base.premium_source, PriceSource::Ask);
    assert!(resolved.base.base_sigma > smile_vol(100.0, 100.0));

    let axis = ScenarioAxis::generate("spot", 0.0, 0.0, 0.01, &cfg.scenario).unwrap();
    let report = resolved
        .base
        .build_grid(axis.clone(), axis, &cfg.scenario);
    assert_abs_diff_eq!(report.grids.pnl[0][0], 0.0, epsilon = 1e-5);
}

#[test]
fn requests_run_concurrently_on_shared_market() {
    let market = Arc::new(
        MarketSnapshot::new()
            .with_chain(spy_chain(100.0))
            .with_spot("SPY", 100.0),
    );
    let config = Arc::new(EngineConfig::default());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let market = Arc::clone(&market);
            let config = Arc::clone(&config);
            thread::spawn(move || {
                let strike = 90.0 + 5.0 * i as f64;
                let req = ScenarioRequest::new(spec(OptionType::Call, strike));
                scenario_analysis(&req, market.as_ref(), now(), &config)
                    .map(|resp| resp.stats.pnl_max)
            })
        })
        .collect();
    for handle in handles {
        let pnl_max = handle.join().unwrap().unwrap();
        assert!(pnl_max > 0.0);
    }
}

#[test]
fn chain_json_round_trip_through_market() {
    let json = serde_json::to_string(&MarketSnapshot::new().with_chain(spy_chain(100.0))).unwrap();
    let market: MarketSnapshot = serde_json::from_str(&json).unwrap();
    let req = SingleOptionRequest::new(spec(OptionType::Call, 100.0));
    let resp = single_option(&req, &market, now(), &EngineConfig::default()).unwrap();
    assert_abs_diff_eq!(resp.model.iv_used, 0.22, epsilon = 1e-4);
}
