//! Closed-form Black-Scholes-Merton pricing with a continuous dividend yield.
//!
//! ```text
//! d1 = (ln(S/K) + (r − q + σ²/2)·T) / (σ√T)
//! d2 = d1 − σ√T
//! C  = S·e^(−qT)·N(d1) − K·e^(−rT)·N(d2)
//! P  = K·e^(−rT)·N(−d2) − S·e^(−qT)·N(−d1)
//! ```
//!
//! None of these functions guard their inputs. `T ≤ 0`, `σ ≤ 0` or
//! non-positive spot/strike produce `NaN`/`±Inf`, which the caller is
//! responsible for rejecting.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use statrs::function::erf::erfc;

use crate::types::{Greeks, OptionParams, OptionType};

/// Standard normal cumulative distribution function Φ(x).
#[inline]
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}

/// Standard normal probability density function φ(x).
#[inline]
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Intermediate terms shared by price, Greeks and ITM probability.
struct Terms {
    d1: f64,
    d2: f64,
    sqrt_t: f64,
    df_q: f64,
    df_r: f64,
}

#[inline]
fn terms(p: &OptionParams, vol: f64) -> Terms {
    let sqrt_t = p.expiry.sqrt();
    let sig_sqrt_t = vol * sqrt_t;
    let d1 = ((p.spot / p.strike).ln()
        + (p.rate - p.dividend_yield + 0.5 * vol * vol) * p.expiry)
        / sig_sqrt_t;
    Terms {
        d1,
        d2: d1 - sig_sqrt_t,
        sqrt_t,
        df_q: (-p.dividend_yield * p.expiry).exp(),
        df_r: (-p.rate * p.expiry).exp(),
    }
}

/// The `(d1, d2)` pair for the given parameters and volatility.
pub fn d1_d2(p: &OptionParams, vol: f64) -> (f64, f64) {
    let t = terms(p, vol);
    (t.d1, t.d2)
}

/// European option premium per unit of underlying.
///
/// # Examples
/// ```
/// use optanalytics::pricing::price;
/// use optanalytics::types::{OptionParams, OptionType};
///
/// let p = OptionParams::new(OptionType::Call, 100.0, 100.0, 0.01, 0.0, 1.0);
/// let c = price(&p, 0.2);
/// assert!((c - 8.4333).abs() < 1e-4);
/// ```
pub fn price(p: &OptionParams, vol: f64) -> f64 {
    let t = terms(p, vol);
    let spot_leg = p.spot * t.df_q;
    let strike_leg = p.strike * t.df_r;
    match p.option_type {
        OptionType::Call => spot_leg * norm_cdf(t.d1) - strike_leg * norm_cdf(t.d2),
        OptionType::Put => strike_leg * norm_cdf(-t.d2) - spot_leg * norm_cdf(-t.d1),
    }
}

/// Closed-form first-order Greeks.
///
/// Vega is per 1.00 of volatility, theta is `−∂V/∂T` per year, rho is
/// `∂V/∂r` per 1.00 of rate.
pub fn greeks(p: &OptionParams, vol: f64) -> Greeks {
    let t = terms(p, vol);
    let pdf = norm_pdf(t.d1);
    let spot_leg = p.spot * t.df_q;
    let strike_leg = p.strike * t.df_r;

    let gamma = t.df_q * pdf / (p.spot * vol * t.sqrt_t);
    let vega = spot_leg * pdf * t.sqrt_t;
    let theta_base = -(spot_leg * pdf * vol) / (2.0 * t.sqrt_t);

    match p.option_type {
        OptionType::Call => Greeks {
            delta: t.df_q * norm_cdf(t.d1),
            gamma,
            vega,
            theta: theta_base - p.rate * strike_leg * norm_cdf(t.d2)
                + p.dividend_yield * spot_leg * norm_cdf(t.d1),
            rho: strike_leg * p.expiry * norm_cdf(t.d2),
        },
        OptionType::Put => Greeks {
            delta: t.df_q * (norm_cdf(t.d1) - 1.0),
            gamma,
            vega,
            theta: theta_base + p.rate * strike_leg * norm_cdf(-t.d2)
                - p.dividend_yield * spot_leg * norm_cdf(-t.d1),
            rho: -strike_leg * p.expiry * norm_cdf(-t.d2),
        },
    }
}

/// Risk-neutral probability of finishing in the money: `N(d2)` for a call,
/// `N(−d2)` for a put.
pub fn probability_itm(p: &OptionParams, vol: f64) -> f64 {
    let (_, d2) = d1_d2(p, vol);
    match p.option_type {
        OptionType::Call => norm_cdf(d2),
        OptionType::Put => norm_cdf(-d2),
    }
}

/// No-arbitrage price bounds `(lower, upper)` for a European option.
///
/// Call: `[max(0, S·e^(−qT) − K·e^(−rT)), S·e^(−qT)]`;
/// put: `[max(0, K·e^(−rT) − S·e^(−qT)), K·e^(−rT)]`.
pub fn price_bounds(p: &OptionParams) -> (f64, f64) {
    let spot_leg = p.spot * (-p.dividend_yield * p.expiry).exp();
    let strike_leg = p.strike * (-p.rate * p.expiry).exp();
    match p.option_type {
        OptionType::Call => ((spot_leg - strike_leg).max(0.0), spot_leg),
        OptionType::Put => ((strike_leg - spot_leg).max(0.0), strike_leg),
    }
}
