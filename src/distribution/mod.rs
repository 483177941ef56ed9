//! Risk-Neutral Distribution Builder.
//!
//! Builds the terminal-price density and CDF implied by a single volatility,
//! assuming `S_T` is lognormal with drift `r − q`. The grid runs over
//! `μ ± std_devs·σ√T` with `μ = ln S + (r − q − σ²/2)T`, evenly spaced in
//! log price, so both tails are cut at the same probability.
//!
//! `μ` is the mean of `ln S_T`, which sits `σ²T/2` below `ln F`. For small
//! `σ²T` the axis is effectively centred on the forward. For large `σ²T`,
//! centring on `ln F` would cut the left tail at `Φ(−std_devs + σ√T/2)`.
//!
//! # Modeling limitation
//! One scalar volatility (typically ATM) drives the whole distribution. The
//! fitted smile from [`surface`](crate::surface) is deliberately not used, so
//! skew and fat tails in the chain do not show up here.
//!
//! ```
//! use optanalytics::config::DistributionConfig;
//! use optanalytics::distribution::DistributionInput;
//!
//! let input = DistributionInput::new(100.0, 0.02, 0.0, 0.5, 0.25);
//! let rnd = input.build(&DistributionConfig::default())?;
//! assert_eq!(rnd.grid.x.len(), 260);
//! assert!((rnd.stats.probability_above_spot + rnd.stats.probability_below_spot - 1.0).abs() < 1e-12);
//! # Ok::<(), optanalytics::AnalyticsError>(())
//! ```

pub mod lognormal;

pub use lognormal::TerminalLogNormal;

use serde::{Deserialize, Serialize};

use crate::config::{DistributionConfig, WarningThresholds};
use crate::conventions::forward_price;
use crate::error::{AnalyticsError, Result};
use crate::types::SpotSource;
use crate::validate::{validate_finite, validate_positive};

/// Market state and volatility for one distribution build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionInput {
    pub spot: f64,
    #[serde(default)]
    pub spot_source: SpotSource,
    pub rate: f64,
    pub dividend_yield: f64,
    /// Time to expiry in years.
    pub expiry: f64,
    pub sigma: f64,
}

/// Terminal-price axis with density and cumulative probability at each point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionGrid {
    pub x: Vec<f64>,
    pub pdf: Vec<f64>,
    pub cdf: Vec<f64>,
}

impl DistributionGrid {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Trapezoidal integral of the density over the grid.
    pub fn total_mass(&self) -> f64 {
        self.x
            .windows(2)
            .zip(self.pdf.windows(2))
            .map(|(x, p)| 0.5 * (p[0] + p[1]) * (x[1] - x[0]))
            .sum()
    }
}

/// Summary statistics of the distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionStats {
    /// One-standard-deviation dollar move, `F·σ√T`.
    pub expected_move: f64,
    pub expected_move_upper: f64,
    /// Floored at zero.
    pub expected_move_lower: f64,
    pub probability_above_spot: f64,
    pub probability_below_spot: f64,
}

/// A built risk-neutral distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskNeutralDistribution {
    pub spot: f64,
    pub forward: f64,
    pub sigma: f64,
    pub expiry: f64,
    pub grid: DistributionGrid,
    pub stats: DistributionStats,
}

impl DistributionInput {
    pub fn new(spot: f64, rate: f64, dividend_yield: f64, expiry: f64, sigma: f64) -> Self {
        Self {
            spot,
            spot_source: SpotSource::Primary,
            rate,
            dividend_yield,
            expiry,
            sigma,
        }
    }

    pub fn with_spot_source(self, spot_source: SpotSource) -> Self {
        Self {
            spot_source,
            ..self
        }
    }

    /// Build the grid and statistics.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::InvalidInput`] if `sigma`, `expiry` or
    /// `spot` is not positive, a rate is not finite, or the configured grid
    /// has fewer than two points.
    pub fn build(&self, config: &DistributionConfig) -> Result<RiskNeutralDistribution> {
        let spot = validate_positive(self.spot, "spot")?;
        let expiry = validate_positive(self.expiry, "timeToExpiryYears")?;
        let sigma = validate_positive(self.sigma, "sigma")?;
        let rate = validate_finite(self.rate, "r")?;
        let q = validate_finite(self.dividend_yield, "q")?;
        let std_devs = validate_positive(config.std_devs, "std_devs")?;
        if config.grid_size < 2 {
            return Err(AnalyticsError::invalid(format!(
                "grid_size must be at least 2, got {}",
                config.grid_size
            )));
        }

        #[cfg(feature = "logging")]
        tracing::debug!(
            spot,
            sigma,
            expiry,
            grid_size = config.grid_size,
            "distribution build started"
        );

        let law = TerminalLogNormal::new(spot, rate, q, expiry, sigma)?;
        let forward = forward_price(spot, rate, q, expiry);
        let half_width = std_devs * law.scale();
        let log_lo = law.location() - half_width;
        let step = 2.0 * half_width / (config.grid_size - 1) as f64;

        let x: Vec<f64> = (0..config.grid_size)
            .map(|i| (log_lo + step * i as f64).exp())
            .collect();
        let pdf: Vec<f64> = x
            .iter()
            .map(|&v| finite_or_zero(law.pdf(v)))
            .collect();
        let cdf: Vec<f64> = x
            .iter()
            .map(|&v| finite_or_zero(law.cdf(v)))
            .collect();

        let below = law.cdf(spot);
        let expected_move = forward * law.scale();
        let stats = DistributionStats {
            expected_move,
            expected_move_upper: spot + expected_move,
            expected_move_lower: (spot - expected_move).max(0.0),
            probability_above_spot: (1.0 - below).clamp(0.0, 1.0),
            probability_below_spot: below,
        };

        #[cfg(feature = "logging")]
        tracing::debug!(forward, expected_move, "distribution build complete");

        Ok(RiskNeutralDistribution {
            spot,
            forward,
            sigma,
            expiry,
            grid: DistributionGrid { x, pdf, cdf },
            stats,
        })
    }

    /// Advisory warnings for this input: volatility band and spot feed.
    pub fn warnings(&self, thresholds: &WarningThresholds) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(w) = thresholds.vol_warning(self.sigma) {
            warnings.push(w);
        }
        if self.spot_source == SpotSource::Alternate {
            warnings.push("Spot price sourced from alternate data.".to_string());
        }
        warnings
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}
