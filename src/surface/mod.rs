//! Volatility Surface Constructor.
//!
//! Turns a sparse, noisy set of per-contract implied vols into a complete
//! log-moneyness × maturity grid:
//!
//! 1. filter to the requested log-moneyness window and maximum maturity
//! 2. keep the nearest `max_expiries` distinct expiries
//! 3. clamp and winsorize each expiry's vols, then take the median per bucket
//! 4. fill empty buckets from the nearest neighbor (zeros for an empty row)
//! 5. smooth each row with a 3-point moving average
//! 6. fit a quadratic smile to the expiry nearest 30 days for skew and curvature
//!
//! Construction never fails because of missing data. Only malformed
//! parameters (an empty or inverted x-range, zero steps) are errors.
//!
//! ```
//! use optanalytics::surface::{SurfaceBuilder, SurfacePoint};
//!
//! let report = SurfaceBuilder::new()
//!     .x_range(-0.5, 0.5)
//!     .x_steps(11)
//!     .add_point(SurfacePoint::new(0.0, 30.0, 0.2))
//!     .build()?;
//! assert_eq!(report.grid.z.len(), 1);
//! assert!(report.grid.z[0].iter().all(|&v| (v - 0.2).abs() < 1e-12));
//! assert!(report.skew.is_none());
//! # Ok::<(), optanalytics::AnalyticsError>(())
//! ```

pub mod builder;
pub(crate) mod interp;
pub(crate) mod stats;

pub use builder::SurfaceBuilder;

use serde::{Deserialize, Serialize};

use crate::smile::QuadraticSmile;

/// One implied-vol observation derived from one tradable contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfacePoint {
    /// `ln(K / S)`.
    pub log_moneyness: f64,
    pub days_to_expiry: f64,
    pub implied_vol: f64,
}

impl SurfacePoint {
    pub fn new(log_moneyness: f64, days_to_expiry: f64, implied_vol: f64) -> Self {
        Self {
            log_moneyness,
            days_to_expiry,
            implied_vol,
        }
    }

    /// Observation from a strike, spot and vol.
    pub fn from_strike(strike: f64, spot: f64, days_to_expiry: f64, implied_vol: f64) -> Self {
        Self::new(
            crate::conventions::log_moneyness(strike, spot),
            days_to_expiry,
            implied_vol,
        )
    }

    pub(crate) fn is_usable(&self) -> bool {
        self.log_moneyness.is_finite()
            && self.days_to_expiry.is_finite()
            && self.days_to_expiry > 0.0
            && self.implied_vol.is_finite()
            && self.implied_vol > 0.0
    }
}

/// Rectangular grid: `z[row][col]` is the vol at `y[row]` days and `x[col]` log-moneyness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<Vec<f64>>,
}

impl SurfaceGrid {
    /// `true` when every row spans the full x-axis with finite values.
    pub fn is_complete(&self) -> bool {
        self.z.len() == self.y.len()
            && self
                .z
                .iter()
                .all(|row| row.len() == self.x.len() && row.iter().all(|v| v.is_finite()))
    }
}

/// Distribution of the filled grid values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridStats {
    pub z_min: Option<f64>,
    pub z_max: Option<f64>,
    pub z_p5: Option<f64>,
    pub z_p95: Option<f64>,
}

impl GridStats {
    pub(crate) fn of(z: &[Vec<f64>]) -> Self {
        let flat: Vec<f64> = z.iter().flatten().copied().collect();
        if flat.is_empty() {
            return Self::default();
        }
        Self {
            z_min: flat.iter().copied().reduce(f64::min),
            z_max: flat.iter().copied().reduce(f64::max),
            z_p5: stats::percentile(&flat, 0.05),
            z_p95: stats::percentile(&flat, 0.95),
        }
    }
}

/// Output of a surface build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceReport {
    pub grid: SurfaceGrid,
    /// Linear smile coefficient at the target expiry.
    pub skew: Option<f64>,
    /// Quadratic smile coefficient at the target expiry.
    pub kurtosis_proxy: Option<f64>,
    /// Observations left after filtering.
    pub points_count: usize,
    pub realized_vol: Option<f64>,
    pub target_days: Option<f64>,
    pub smile: Option<QuadraticSmile>,
    pub stats: GridStats,
}

/// Realized vol as a decimal. Values above 1 are taken to be percentages.
pub fn normalize_realized_vol(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    Some(if value > 1.0 { value / 100.0 } else { value })
}
