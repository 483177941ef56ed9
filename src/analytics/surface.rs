//! Volatility surface analytics from a snapshot of marked implied vols.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::required_symbol;
use crate::config::EngineConfig;
use crate::error::{AnalyticsError, Result};
use crate::surface::{GridStats, SurfaceBuilder, SurfaceGrid, SurfacePoint};
use crate::validate::validate_range;

pub const LOCATION: &str = "surface";

const MS_PER_DAY: f64 = 86_400_000.0;

/// Grid parameters. Out-of-range values are rejected, not clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VolSurfaceRequest {
    pub symbol: String,
    /// In `[7, 365]`. Default 180.
    pub max_days: f64,
    /// Number of expiries kept, in `[5, 60]`. Default 25.
    pub expiries: usize,
    /// In `[-2, -0.1]`. Default -0.8.
    pub x_min: f64,
    /// In `[0.1, 2]`. Default 0.8.
    pub x_max: f64,
    /// In `[10, 120]`. Default 60.
    pub x_steps: usize,
}

impl Default for VolSurfaceRequest {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            max_days: 180.0,
            expiries: 25,
            x_min: -0.8,
            x_max: 0.8,
            x_steps: 60,
        }
    }
}

impl VolSurfaceRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<String> {
        let symbol = required_symbol(&self.symbol)?;
        validate_range(self.max_days, 7.0, 365.0, "maxDays")?;
        validate_range(self.expiries as f64, 5.0, 60.0, "expiries")?;
        validate_range(self.x_min, -2.0, -0.1, "xMin")?;
        validate_range(self.x_max, 0.1, 2.0, "xMax")?;
        validate_range(self.x_steps as f64, 10.0, 120.0, "xSteps")?;
        if self.x_min >= self.x_max {
            return Err(AnalyticsError::invalid("xMin must be less than xMax."));
        }
        Ok(symbol)
    }
}

/// One marked option: strike, settlement instant and vol in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceQuote {
    pub strike: f64,
    pub expires_at: DateTime<Utc>,
    /// Implied vol in percent, e.g. `55.0` for 55%.
    pub mark_iv: f64,
}

/// Everything a surface build reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurfaceSnapshot {
    pub spot: Option<f64>,
    /// Latest realized vol, as a decimal or in percent.
    pub realized_vol: Option<f64>,
    pub quotes: Vec<SurfaceQuote>,
}

impl SurfaceSnapshot {
    /// Observations live at `now` and settling within `max_days`.
    ///
    /// Days to expiry are rounded to two decimals so quotes sharing a
    /// settlement instant share a row. Nothing is produced without a usable
    /// spot.
    pub fn points(&self, now: DateTime<Utc>, max_days: f64) -> Vec<SurfacePoint> {
        let Some(spot) = self.spot.filter(|s| s.is_finite() && *s > 0.0) else {
            return Vec::new();
        };
        self.quotes
            .iter()
            .filter(|q| q.mark_iv.is_finite() && q.mark_iv > 0.0)
            .filter(|q| q.strike.is_finite() && q.strike > 0.0)
            .filter_map(|q| {
                let days = (q.expires_at - now).num_milliseconds() as f64 / MS_PER_DAY;
                if days <= 0.0 || days > max_days {
                    return None;
                }
                let days = (days * 100.0).round() / 100.0;
                Some(SurfacePoint::from_strike(q.strike, spot, days, q.mark_iv / 100.0))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolSurfaceResponse {
    pub symbol: String,
    pub snapshot_ts: DateTime<Utc>,
    pub spot: Option<f64>,
    pub realized_vol: Option<f64>,
    pub skew: Option<f64>,
    pub kurtosis_proxy: Option<f64>,
    pub grid: SurfaceGrid,
    pub points_count: usize,
    /// Days to expiry of the row the smile was fitted on.
    pub target_days: Option<f64>,
    pub grid_stats: GridStats,
}

/// Build a complete log-moneyness × days grid from a vol snapshot.
///
/// Missing data never fails the request: without spot or quotes the grid
/// has no rows and skew is `None`.
///
/// # Errors
/// Returns [`AnalyticsError::InvalidInput`] when a grid parameter is out of
/// range or `xMin >= xMax`.
pub fn volatility_surface(
    request: &VolSurfaceRequest,
    snapshot: &SurfaceSnapshot,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Result<VolSurfaceResponse> {
    let symbol = request.validate()?;
    let points = snapshot.points(now, request.max_days);

    let report = SurfaceBuilder::new()
        .x_range(request.x_min, request.x_max)
        .x_steps(request.x_steps)
        .max_expiries(request.expiries)
        .max_days(request.max_days)
        .config(config.surface)
        .add_points(points)
        .realized_vol(snapshot.realized_vol)
        .build()?;

    Ok(VolSurfaceResponse {
        symbol,
        snapshot_ts: now,
        spot: snapshot.spot.filter(|s| s.is_finite()),
        realized_vol: report.realized_vol,
        skew: report.skew,
        kurtosis_proxy: report.kurtosis_proxy,
        grid: report.grid,
        points_count: report.points_count,
        target_days: report.target_days,
        grid_stats: report.stats,
    })
}
