//! Implied volatility by bisection on the BSM price.
//!
//! Bisection needs no vega, so it behaves the same for deep ITM/OTM
//! contracts where vega vanishes and Newton steps blow up. Given a target
//! inside the price range of the bracket it always converges; the
//! iteration cap bounds CPU time per call.

use serde::{Deserialize, Serialize};

use crate::config::SolverConfig;
use crate::pricing::{price, price_bounds};
use crate::types::{OptionParams, Vol};

/// Bisection implied-volatility solver.
///
/// # Examples
/// ```
/// use optanalytics::implied::ImpliedVolSolver;
/// use optanalytics::pricing::price;
/// use optanalytics::types::{OptionParams, OptionType};
///
/// let p = OptionParams::new(OptionType::Call, 100.0, 100.0, 0.01, 0.0, 1.0);
/// let market = price(&p, 0.2);
/// let vol = ImpliedVolSolver::default().solve(&p, market).unwrap();
/// assert!((vol.0 - 0.2).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolSolver {
    config: SolverConfig,
}

/// A converged solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub vol: Vol,
    /// Pricing evaluations spent inside the bisection loop.
    pub iterations: usize,
}

/// Why a price has no implied volatility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveFailure {
    /// Non-finite price or non-positive spot, strike or expiry.
    InvalidInput,
    /// Price at or below the discounted intrinsic value, the European
    /// no-arbitrage lower bound.
    BelowIntrinsic,
    /// Price outside the range achievable at the bracket endpoints.
    OutsideBracket,
    /// The pricing function returned a non-finite value.
    NonFinite,
    /// The iteration budget ran out before either tolerance was met.
    NotConverged,
}

impl SolveFailure {
    pub fn describe(self) -> &'static str {
        match self {
            Self::InvalidInput => "inputs are not valid for pricing",
            Self::BelowIntrinsic => "price is at or below discounted intrinsic value",
            Self::OutsideBracket => "price is outside the achievable volatility bracket",
            Self::NonFinite => "model price is not finite",
            Self::NotConverged => "solver did not converge within its iteration budget",
        }
    }
}

impl ImpliedVolSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Volatility reproducing `target_price`, or `None` when no solution exists.
    pub fn solve(&self, params: &OptionParams, target_price: f64) -> Option<Vol> {
        self.solve_detailed(params, target_price)
            .ok()
            .map(|s| s.vol)
    }

    /// Like [`solve`](Self::solve) but reports why a solve failed.
    pub fn solve_detailed(
        &self,
        params: &OptionParams,
        target_price: f64,
    ) -> Result<Solution, SolveFailure> {
        let cfg = &self.config;
        let usable = |v: f64| v.is_finite() && v > 0.0;
        if !usable(params.spot)
            || !usable(params.strike)
            || !usable(params.expiry)
            || !target_price.is_finite()
        {
            return Err(SolveFailure::InvalidInput);
        }

        // European lower bound: max(0, S·e^(−qT) − K·e^(−rT)) for calls, mirrored for puts.
        let (floor, _) = price_bounds(params);
        if target_price <= floor + cfg.intrinsic_tolerance {
            return Err(SolveFailure::BelowIntrinsic);
        }

        let mut low = cfg.vol_lower;
        let mut high = cfg.vol_upper;
        let low_price = price(params, low);
        let high_price = price(params, high);
        if !low_price.is_finite() || !high_price.is_finite() {
            return Err(SolveFailure::NonFinite);
        }
        if target_price < low_price - cfg.price_tolerance
            || target_price > high_price + cfg.price_tolerance
        {
            return Err(SolveFailure::OutsideBracket);
        }

        for iteration in 0..cfg.max_iterations {
            let mid = 0.5 * (low + high);
            let theoretical = price(params, mid);
            if !theoretical.is_finite() {
                return Err(SolveFailure::NonFinite);
            }

            let diff = theoretical - target_price;
            if diff.abs() < cfg.price_tolerance || (high - low).abs() < cfg.vol_tolerance {
                return Ok(Solution {
                    vol: Vol(mid),
                    iterations: iteration + 1,
                });
            }

            if theoretical > target_price {
                high = mid;
            } else {
                low = mid;
            }
        }

        #[cfg(feature = "logging")]
        tracing::debug!(
            max_iterations = cfg.max_iterations,
            strike = params.strike,
            target_price,
            "implied vol bisection exhausted its iteration budget"
        );

        Err(SolveFailure::NotConverged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OptionType;
    use approx::assert_abs_diff_eq;

    fn params(side: OptionType, strike: f64, expiry: f64) -> OptionParams {
        OptionParams::new(side, 100.0, strike, 0.02, 0.0, expiry)
    }

    #[test]
    fn recovers_atm_one_year_vol() {
        let p = OptionParams::new(OptionType::Call, 100.0, 100.0, 0.01, 0.0, 1.0);
        let market = price(&p, 0.2);
        let vol = ImpliedVolSolver::default().solve(&p, market).unwrap();
        assert_abs_diff_eq!(vol.0, 0.2, epsilon = 1e-4);
    }

    #[test]
    fn recovers_short_dated_otm_call() {
        let p = params(OptionType::Call, 105.0, 45.0 / 365.0);
        let market = price(&p, 0.25);
        let vol = ImpliedVolSolver::default().solve(&p, market).unwrap();
        assert_abs_diff_eq!(vol.0, 0.25, epsilon = 1e-4);
    }

    #[test]
    fn recovers_high_vol_put() {
        let p = params(OptionType::Put, 90.0, 0.5);
        let market = price(&p, 1.8);
        let vol = ImpliedVolSolver::default().solve(&p, market).unwrap();
        assert_abs_diff_eq!(vol.0, 1.8, epsilon = 1e-4);
    }

    #[test]
    fn price_below_discounted_intrinsic_has_no_solution() {
        // Call floor: 100 − 90·e^(−0.01) ≈ 10.8955.
        let p = params(OptionType::Call, 90.0, 0.5);
        let solver = ImpliedVolSolver::default();
        assert_eq!(
            solver.solve_detailed(&p, 10.8),
            Err(SolveFailure::BelowIntrinsic)
        );
        assert_eq!(solver.solve(&p, 10.8), None);
    }

    #[test]
    fn recovers_deep_itm_put_priced_below_intrinsic() {
        // Worth ≈ 25.30, under the undiscounted intrinsic of 30.
        let p = OptionParams::new(OptionType::Put, 100.0, 130.0, 0.05, 0.0, 1.0);
        let market = price(&p, 0.2);
        assert!(market < p.option_type.intrinsic(p.spot, p.strike));
        let vol = ImpliedVolSolver::default().solve(&p, market).unwrap();
        assert_abs_diff_eq!(vol.0, 0.2, epsilon = 1e-4);
    }

    #[test]
    fn recovers_deep_itm_call_with_dividend_yield() {
        let p = OptionParams::new(OptionType::Call, 100.0, 70.0, 0.01, 0.06, 2.0);
        let market = price(&p, 0.3);
        assert!(market < p.option_type.intrinsic(p.spot, p.strike));
        let vol = ImpliedVolSolver::default().solve(&p, market).unwrap();
        assert_abs_diff_eq!(vol.0, 0.3, epsilon = 1e-4);
    }

    #[test]
    fn price_above_max_vol_price_has_no_solution() {
        let p = params(OptionType::Call, 100.0, 0.5);
        // A call can never be worth more than the discounted spot.
        assert_eq!(
            ImpliedVolSolver::default().solve_detailed(&p, 100.5),
            Err(SolveFailure::OutsideBracket)
        );
    }

    #[test]
    fn zero_expiry_and_nan_price_are_invalid() {
        let solver = ImpliedVolSolver::default();
        assert_eq!(
            solver.solve_detailed(&params(OptionType::Call, 100.0, 0.0), 5.0),
            Err(SolveFailure::InvalidInput)
        );
        assert_eq!(
            solver.solve_detailed(&params(OptionType::Call, 100.0, 1.0), f64::NAN),
            Err(SolveFailure::InvalidInput)
        );
    }

    #[test]
    fn tiny_iteration_budget_forces_non_convergence() {
        let solver = ImpliedVolSolver::new(SolverConfig {
            max_iterations: 3,
            price_tolerance: 1e-12,
            vol_tolerance: 1e-12,
            ..SolverConfig::default()
        });
        let p = params(OptionType::Call, 100.0, 1.0);
        let market = price(&p, 0.2);
        assert_eq!(
            solver.solve_detailed(&p, market),
            Err(SolveFailure::NotConverged)
        );
    }

    #[test]
    fn iteration_count_stays_under_cap() {
        let solver = ImpliedVolSolver::default();
        let p = params(OptionType::Put, 110.0, 2.0);
        let market = price(&p, 0.4);
        let solution = solver.solve_detailed(&p, market).unwrap();
        assert!(solution.iterations <= solver.config().max_iterations);
        assert!(solution.iterations > 1);
    }

    #[test]
    fn failure_descriptions_are_distinct() {
        let all = [
            SolveFailure::InvalidInput,
            SolveFailure::BelowIntrinsic,
            SolveFailure::OutsideBracket,
            SolveFailure::NonFinite,
            SolveFailure::NotConverged,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a.describe(), b.describe());
            }
        }
    }
}
