//! Scenario Grid Generator.
//!
//! Reprices one contract over the Cartesian product of a volatility-shift
//! axis (rows) and a spot-move axis (columns):
//!
//! ```text
//! S'  = S·(1 + spotMove)
//! σ'  = max(σ_base·(1 + ivShift), ε_σ)
//! T'  = max(T − horizonDays/365, ε_T)
//! pnl = price(S', σ', T') − basePremium
//! ```
//!
//! A non-finite repriced premium is recorded as zero, so neither matrix ever
//! contains `NaN`.

pub mod axis;
pub mod base;

pub use axis::ScenarioAxis;
pub use base::{ResolvedBase, ScenarioBase};

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::pricing::price;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// The two shock axes of a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioAxes {
    pub spot_moves: ScenarioAxis,
    pub iv_shifts: ScenarioAxis,
}

/// Repriced premiums and P&L, both indexed `[ivShiftRow][spotMoveCol]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioGrid {
    pub price: Vec<Vec<f64>>,
    pub pnl: Vec<Vec<f64>>,
}

/// A grid cell and its P&L.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PnlPoint {
    pub spot_move: f64,
    pub iv_shift: f64,
    pub pnl: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStats {
    pub pnl_min: f64,
    pub pnl_max: f64,
    /// First cell, in row-major order, reaching `pnl_max`.
    pub pnl_best: PnlPoint,
    /// First cell, in row-major order, reaching `pnl_min`.
    pub pnl_worst: PnlPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub axes: ScenarioAxes,
    pub grids: ScenarioGrid,
    pub stats: ScenarioStats,
    /// Effective time to expiry used for every cell.
    pub t_eff: f64,
}

impl ScenarioBase {
    /// Reprice every `(ivShift, spotMove)` pair.
    ///
    /// Axes are non-empty by construction, so this cannot fail.
    ///
    /// # Examples
    /// ```
    /// use optanalytics::config::ScenarioConfig;
    /// use optanalytics::scenario::{ScenarioAxis, ScenarioBase};
    /// use optanalytics::types::{OptionParams, OptionType};
    ///
    /// let cfg = ScenarioConfig::default();
    /// let params = OptionParams::new(OptionType::Call, 100.0, 100.0, 0.01, 0.0, 0.5);
    /// let base = ScenarioBase::new(params, 6.0, 0.25, 0.0)?;
    /// let spot = ScenarioAxis::generate("spot", -0.1, 0.1, 0.05, &cfg)?;
    /// let iv = ScenarioAxis::generate("iv", -0.2, 0.2, 0.2, &cfg)?;
    /// let report = base.build_grid(spot, iv, &cfg);
    /// assert_eq!(report.grids.price.len(), 3);
    /// assert_eq!(report.grids.price[0].len(), 5);
    /// # Ok::<(), optanalytics::AnalyticsError>(())
    /// ```
    pub fn build_grid(
        &self,
        spot_moves: ScenarioAxis,
        iv_shifts: ScenarioAxis,
        config: &ScenarioConfig,
    ) -> ScenarioReport {
        #[cfg(feature = "logging")]
        tracing::debug!(
            rows = iv_shifts.len(),
            cols = spot_moves.len(),
            base_premium = self.base_premium,
            base_sigma = self.base_sigma,
            "scenario grid build started"
        );

        let t_eff = self.effective_expiry(config);
        let shocked = self.params.with_expiry(t_eff);
        let spot = self.params.spot;

        let row_for = |iv_shift: &f64| -> Vec<f64> {
            let sigma = (self.base_sigma * (1.0 + iv_shift)).max(config.sigma_epsilon);
            spot_moves
                .values()
                .iter()
                .map(|move_pct| {
                    let moved = (spot * (1.0 + move_pct)).max(config.spot_epsilon);
                    let value = price(&shocked.with_spot(moved), sigma);
                    if value.is_finite() { value } else { 0.0 }
                })
                .collect()
        };

        #[cfg(feature = "parallel")]
        let price_grid: Vec<Vec<f64>> = iv_shifts.values().par_iter().map(row_for).collect();
        #[cfg(not(feature = "parallel"))]
        let price_grid: Vec<Vec<f64>> = iv_shifts.values().iter().map(row_for).collect();

        let pnl_grid: Vec<Vec<f64>> = price_grid
            .iter()
            .map(|row| row.iter().map(|p| p - self.base_premium).collect())
            .collect();

        let stats = Self::stats(&pnl_grid, &spot_moves, &iv_shifts);

        #[cfg(feature = "logging")]
        tracing::debug!(
            pnl_min = stats.pnl_min,
            pnl_max = stats.pnl_max,
            t_eff,
            "scenario grid build complete"
        );

        ScenarioReport {
            axes: ScenarioAxes {
                spot_moves,
                iv_shifts,
            },
            grids: ScenarioGrid {
                price: price_grid,
                pnl: pnl_grid,
            },
            stats,
            t_eff,
        }
    }

    fn stats(pnl: &[Vec<f64>], spot_moves: &ScenarioAxis, iv_shifts: &ScenarioAxis) -> ScenarioStats {
        let mut best = PnlPoint {
            spot_move: 0.0,
            iv_shift: 0.0,
            pnl: f64::NEG_INFINITY,
        };
        let mut worst = PnlPoint {
            pnl: f64::INFINITY,
            ..best
        };
        for (row, &iv_shift) in pnl.iter().zip(iv_shifts.values()) {
            for (&value, &spot_move) in row.iter().zip(spot_moves.values()) {
                if value > best.pnl {
                    best = PnlPoint {
                        spot_move,
                        iv_shift,
                        pnl: value,
                    };
                }
                if value < worst.pnl {
                    worst = PnlPoint {
                        spot_move,
                        iv_shift,
                        pnl: value,
                    };
                }
            }
        }
        ScenarioStats {
            pnl_min: worst.pnl,
            pnl_max: best.pnl,
            pnl_best: best,
            pnl_worst: worst,
        }
    }
}
