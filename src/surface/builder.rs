//! Builder API for volatility surface construction.

use crate::config::SurfaceConfig;
use crate::error::{AnalyticsError, Result};
use crate::smile::QuadraticSmile;
use crate::surface::interp::{nearest_fill, smooth3};
use crate::surface::stats::{median, percentile};
use crate::surface::{GridStats, SurfaceGrid, SurfacePoint, SurfaceReport, normalize_realized_vol};
use crate::validate::validate_finite;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Builder for a binned, filled and smoothed volatility surface.
///
/// Defaults: x-range `[-0.8, 0.8]`, 60 steps, 25 expiries, 180 days.
///
/// # Examples
///
/// ```
/// use optanalytics::surface::{SurfaceBuilder, SurfacePoint};
///
/// let points: Vec<SurfacePoint> = [7.0, 30.0, 90.0]
///     .iter()
///     .flat_map(|&days| {
///         [-0.2, -0.1, 0.0, 0.1, 0.2]
///             .into_iter()
///             .map(move |x| SurfacePoint::new(x, days, 0.2 + 0.3 * x * x - 0.1 * x))
///     })
///     .collect();
///
/// let report = SurfaceBuilder::new()
///     .x_range(-0.3, 0.3)
///     .x_steps(13)
///     .max_expiries(2)
///     .add_points(points)
///     .realized_vol(Some(18.0))
///     .build()?;
///
/// assert_eq!(report.grid.y, vec![7.0, 30.0]);
/// assert!(report.grid.is_complete());
/// assert!(report.skew.unwrap() < 0.0);
/// assert_eq!(report.realized_vol, Some(0.18));
/// # Ok::<(), optanalytics::AnalyticsError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SurfaceBuilder {
    x_min: f64,
    x_max: f64,
    x_steps: usize,
    max_expiries: usize,
    max_days: f64,
    config: SurfaceConfig,
    points: Vec<SurfacePoint>,
    realized_vol: Option<f64>,
}

impl SurfaceBuilder {
    pub fn new() -> Self {
        Self {
            x_min: -0.8,
            x_max: 0.8,
            x_steps: 60,
            max_expiries: 25,
            max_days: 180.0,
            config: SurfaceConfig::default(),
            points: Vec::new(),
            realized_vol: None,
        }
    }

    /// Log-moneyness window of the grid.
    pub fn x_range(mut self, x_min: f64, x_max: f64) -> Self {
        self.x_min = x_min;
        self.x_max = x_max;
        self
    }

    /// Number of evenly spaced x-axis buckets, endpoints included.
    pub fn x_steps(mut self, steps: usize) -> Self {
        self.x_steps = steps;
        self
    }

    /// Keep at most this many distinct expiries, nearest first.
    pub fn max_expiries(mut self, n: usize) -> Self {
        self.max_expiries = n;
        self
    }

    /// Drop observations further out than this many days.
    pub fn max_days(mut self, days: f64) -> Self {
        self.max_days = days;
        self
    }

    pub fn config(mut self, config: SurfaceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn add_point(mut self, point: SurfacePoint) -> Self {
        self.points.push(point);
        self
    }

    pub fn add_points(mut self, points: impl IntoIterator<Item = SurfacePoint>) -> Self {
        self.points.extend(points);
        self
    }

    /// Realized vol to pass through, as a decimal or a percentage.
    pub fn realized_vol(mut self, value: Option<f64>) -> Self {
        self.realized_vol = value;
        self
    }

    fn validate(&self) -> Result<()> {
        validate_finite(self.x_min, "xMin")?;
        validate_finite(self.x_max, "xMax")?;
        if self.x_min >= self.x_max {
            return Err(AnalyticsError::invalid(format!(
                "xMin must be less than xMax, got [{}, {}]",
                self.x_min, self.x_max
            )));
        }
        if self.x_steps == 0 {
            return Err(AnalyticsError::invalid("xSteps must be at least 1"));
        }
        if self.max_expiries == 0 {
            return Err(AnalyticsError::invalid("expiries must be at least 1"));
        }
        if !(self.max_days.is_finite() && self.max_days > 0.0) {
            return Err(AnalyticsError::invalid(format!(
                "maxDays must be positive and finite, got {}",
                self.max_days
            )));
        }
        let cfg = &self.config;
        if !(cfg.vol_floor.is_finite() && cfg.vol_cap.is_finite() && cfg.vol_floor <= cfg.vol_cap)
        {
            return Err(AnalyticsError::invalid(format!(
                "vol clamp [{}, {}] is not a valid interval",
                cfg.vol_floor, cfg.vol_cap
            )));
        }
        if let Some((lo, hi)) = cfg.winsorize
            && !(0.0 <= lo && lo <= hi && hi <= 1.0)
        {
            return Err(AnalyticsError::invalid(format!(
                "winsorize percentiles ({lo}, {hi}) must satisfy 0 <= lo <= hi <= 1"
            )));
        }
        Ok(())
    }

    fn x_axis(&self) -> Vec<f64> {
        if self.x_steps == 1 {
            return vec![self.x_min];
        }
        let step = (self.x_max - self.x_min) / (self.x_steps - 1) as f64;
        (0..self.x_steps)
            .map(|i| self.x_min + step * i as f64)
            .collect()
    }

    /// Clamped, winsorized, median-bucketed, filled and smoothed row for one expiry.
    fn build_row(&self, observations: &[&SurfacePoint], x_axis: &[f64]) -> Vec<f64> {
        let cfg = &self.config;
        let step = if x_axis.len() > 1 {
            x_axis[1] - x_axis[0]
        } else {
            1.0
        };

        let clamped: Vec<f64> = observations
            .iter()
            .map(|p| p.implied_vol.clamp(cfg.vol_floor, cfg.vol_cap))
            .collect();
        let bounds = cfg
            .winsorize
            .and_then(|(lo, hi)| Some((percentile(&clamped, lo)?, percentile(&clamped, hi)?)));

        let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); x_axis.len()];
        for (point, &vol) in observations.iter().zip(&clamped) {
            let vol = match bounds {
                Some((lo, hi)) => vol.clamp(lo, hi),
                None => vol,
            };
            let index = ((point.log_moneyness - self.x_min) / step).round();
            if index < 0.0 || index >= x_axis.len() as f64 {
                continue;
            }
            buckets[index as usize].push(vol);
        }

        let row: Vec<Option<f64>> = buckets.iter().map(|bucket| median(bucket)).collect();
        smooth3(&nearest_fill(&row))
    }

    /// Build the surface grid and smile diagnostics.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::InvalidInput`] for a non-finite or inverted
    /// x-range, zero steps or expiries, a non-positive `max_days`, or an
    /// inconsistent [`SurfaceConfig`]. Sparse or empty input is not an error.
    pub fn build(self) -> Result<SurfaceReport> {
        self.validate()?;

        #[cfg(feature = "logging")]
        tracing::debug!(
            n_points = self.points.len(),
            x_steps = self.x_steps,
            max_expiries = self.max_expiries,
            "surface build started"
        );

        let filtered: Vec<&SurfacePoint> = self
            .points
            .iter()
            .filter(|p| {
                p.is_usable()
                    && p.log_moneyness >= self.x_min
                    && p.log_moneyness <= self.x_max
                    && p.days_to_expiry <= self.max_days
            })
            .collect();

        let mut expiries: Vec<f64> = filtered.iter().map(|p| p.days_to_expiry).collect();
        expiries.sort_by(f64::total_cmp);
        expiries.dedup();
        expiries.truncate(self.max_expiries);

        let x_axis = self.x_axis();
        let row_for = |days: &f64| {
            let observations: Vec<&SurfacePoint> = filtered
                .iter()
                .copied()
                .filter(|p| p.days_to_expiry == *days)
                .collect();
            self.build_row(&observations, &x_axis)
        };

        #[cfg(feature = "parallel")]
        let z: Vec<Vec<f64>> = expiries.par_iter().map(row_for).collect();
        #[cfg(not(feature = "parallel"))]
        let z: Vec<Vec<f64>> = expiries.iter().map(row_for).collect();

        let target_days = self.target_expiry(&expiries);
        let smile = target_days.and_then(|days| {
            let raw: Vec<(f64, f64)> = filtered
                .iter()
                .filter(|p| p.days_to_expiry == days)
                .map(|p| (p.log_moneyness, p.implied_vol))
                .collect();
            QuadraticSmile::fit(
                &raw,
                self.config.fit_min_points,
                self.config.determinant_epsilon,
            )
        });

        let stats = GridStats::of(&z);

        #[cfg(feature = "logging")]
        tracing::debug!(
            n_expiries = expiries.len(),
            points_count = filtered.len(),
            has_smile = smile.is_some(),
            "surface build complete"
        );

        Ok(SurfaceReport {
            grid: SurfaceGrid {
                x: x_axis,
                y: expiries,
                z,
            },
            skew: smile.map(|s| s.skew()),
            kurtosis_proxy: smile.map(|s| s.curvature()),
            points_count: filtered.len(),
            realized_vol: self.realized_vol.and_then(normalize_realized_vol),
            target_days,
            smile,
            stats,
        })
    }

    /// Expiry nearest the configured target; the earlier one wins a tie.
    fn target_expiry(&self, expiries: &[f64]) -> Option<f64> {
        let target = self.config.target_days;
        expiries.iter().copied().fold(None, |best, days| match best {
            Some(b) if (days - target).abs() >= (b - target).abs() => Some(b),
            _ => Some(days),
        })
    }
}

impl Default for SurfaceBuilder {
    fn default() -> Self {
        Self::new()
    }
}
