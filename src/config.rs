//! Numeric configuration for every component.
//!
//! Iteration caps, brackets, tolerances and grid sizes live here rather than
//! in module constants so tests can force edge behavior (non-convergence,
//! tiny grids) deterministically. All records deserialize with
//! `#[serde(default)]`, so a partial JSON override is enough:
//!
//! ```
//! use optanalytics::config::EngineConfig;
//!
//! let cfg: EngineConfig =
//!     serde_json::from_str(r#"{ "solver": { "maxIterations": 20 } }"#).unwrap();
//! assert_eq!(cfg.solver.max_iterations, 20);
//! assert_eq!(cfg.distribution.grid_size, 260);
//! ```

use serde::{Deserialize, Serialize};

/// Top-level configuration passed into the request-level analytics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub solver: SolverConfig,
    pub distribution: DistributionConfig,
    pub surface: SurfaceConfig,
    pub scenario: ScenarioConfig,
    pub warnings: WarningThresholds,
}

/// Bisection implied-volatility solver settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolverConfig {
    /// Lower end of the volatility bracket. Default `1e-6`.
    pub vol_lower: f64,
    /// Upper end of the volatility bracket. Default `5.0`.
    pub vol_upper: f64,
    /// Hard iteration cap. Default `100`.
    pub max_iterations: usize,
    /// Absolute price error accepted as converged. Default `1e-6`.
    pub price_tolerance: f64,
    /// Bracket width accepted as converged. Default `1e-6`.
    pub vol_tolerance: f64,
    /// Prices within this distance of the discounted intrinsic value have no solution. Default `1e-6`.
    pub intrinsic_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            vol_lower: 1e-6,
            vol_upper: 5.0,
            max_iterations: 100,
            price_tolerance: 1e-6,
            vol_tolerance: 1e-6,
            intrinsic_tolerance: 1e-6,
        }
    }
}

/// Risk-neutral distribution grid settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DistributionConfig {
    /// Number of terminal-price grid points. Default `260`.
    pub grid_size: usize,
    /// Half-width of the grid in standard deviations of `ln(S_T)`. Default `5.0`.
    pub std_devs: f64,
    /// Volatility used when no ATM vol can be resolved. Default `0.25`.
    pub default_sigma: f64,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            grid_size: 260,
            std_devs: 5.0,
            default_sigma: 0.25,
        }
    }
}

/// Volatility surface binning and smile-fit settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurfaceConfig {
    /// Observations are clamped to `[vol_floor, vol_cap]` before bucketing.
    pub vol_floor: f64,
    pub vol_cap: f64,
    /// Per-expiry winsorization percentiles, `None` to disable. Default `(0.05, 0.95)`.
    pub winsorize: Option<(f64, f64)>,
    /// Days to expiry of the smile-fit target. Default `30`.
    pub target_days: f64,
    /// Minimum observations for the quadratic smile fit. Default `3`.
    pub fit_min_points: usize,
    /// Normal-equation determinants below this are treated as singular. Default `1e-10`.
    pub determinant_epsilon: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            vol_floor: 0.05,
            vol_cap: 2.5,
            winsorize: Some((0.05, 0.95)),
            target_days: 30.0,
            fit_min_points: 3,
            determinant_epsilon: 1e-10,
        }
    }
}

/// Scenario grid settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScenarioConfig {
    /// Floor for the effective time to expiry after the horizon. Default `1e-6`.
    pub time_epsilon: f64,
    /// Floor for shocked volatility. Default `1e-6`.
    pub sigma_epsilon: f64,
    /// Floor for the shocked spot. Default `1e-6`.
    pub spot_epsilon: f64,
    /// Volatility used when neither a solved nor a vendor vol exists. Default `0.30`.
    pub default_sigma: f64,
    /// Maximum number of points on one axis. Default `400`.
    pub max_axis_points: usize,
    /// Axis values are rounded to this many decimals. Default `6`.
    pub axis_decimals: i32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            time_epsilon: 1e-6,
            sigma_epsilon: 1e-6,
            spot_epsilon: 1e-6,
            default_sigma: 0.30,
            max_axis_points: 400,
            axis_decimals: 6,
        }
    }
}

/// Thresholds for advisory warnings. Warnings never fail a request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WarningThresholds {
    /// Vols below this are flagged. Default `0.05`.
    pub low_vol: f64,
    /// Vols above this are flagged. Default `3.0`.
    pub high_vol: f64,
    /// Bid/ask spreads wider than this percentage of mid are flagged. Default `10`.
    pub wide_spread_pct: f64,
}

impl Default for WarningThresholds {
    fn default() -> Self {
        Self {
            low_vol: 0.05,
            high_vol: 3.0,
            wide_spread_pct: 10.0,
        }
    }
}

impl WarningThresholds {
    /// Advisory message for a volatility outside the sane band, if any.
    pub fn vol_warning(&self, sigma: f64) -> Option<String> {
        if sigma > self.high_vol {
            Some(format!(
                "Implied volatility exceeds {:.0}%.",
                self.high_vol * 100.0
            ))
        } else if sigma < self.low_vol {
            Some(format!(
                "Implied volatility below {:.0}%.",
                self.low_vol * 100.0
            ))
        } else {
            None
        }
    }
}
