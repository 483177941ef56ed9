//! Shock axes for scenario grids.
//!
//! Axis values are fractional shocks: `0.1` is +10%, `-0.25` is −25%.

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::error::{AnalyticsError, Result};

/// Strictly ascending sequence of finite shocks.
///
/// Deserialization re-checks the invariant, so an axis read from JSON is as
/// trustworthy as one produced by [`ScenarioAxis::generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ScenarioAxis {
    values: Vec<f64>,
}

impl TryFrom<Vec<f64>> for ScenarioAxis {
    type Error = AnalyticsError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::from_values(values)
    }
}

impl From<ScenarioAxis> for Vec<f64> {
    fn from(axis: ScenarioAxis) -> Self {
        axis.values
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    // Adding 0.0 turns −0.0 into 0.0.
    (value * scale).round() / scale + 0.0
}

impl ScenarioAxis {
    /// Walk from `min` to `max` (inclusive, with a 1e-12 allowance) in `step`
    /// increments, rounding each value to `config.axis_decimals` decimals and
    /// stopping after `config.max_axis_points` values.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::InvalidInput`] naming the axis when a bound
    /// is not finite, `step ≤ 0`, or `min > max`.
    ///
    /// # Examples
    /// ```
    /// use optanalytics::config::ScenarioConfig;
    /// use optanalytics::scenario::ScenarioAxis;
    ///
    /// let axis = ScenarioAxis::generate("spot", -0.1, 0.1, 0.05, &ScenarioConfig::default())?;
    /// assert_eq!(axis.values(), &[-0.1, -0.05, 0.0, 0.05, 0.1]);
    /// # Ok::<(), optanalytics::AnalyticsError>(())
    /// ```
    pub fn generate(
        name: &str,
        min: f64,
        max: f64,
        step: f64,
        config: &ScenarioConfig,
    ) -> Result<Self> {
        if !(min.is_finite() && max.is_finite() && step.is_finite()) {
            return Err(AnalyticsError::invalid(format!(
                "{name} axis bounds must be finite numbers"
            )));
        }
        if step <= 0.0 {
            return Err(AnalyticsError::invalid(format!(
                "{name} axis step must be positive, got {step}"
            )));
        }
        if min > max {
            return Err(AnalyticsError::invalid(format!(
                "{name} axis min ({min}) exceeds max ({max})"
            )));
        }

        let mut values: Vec<f64> = Vec::new();
        let mut current = min;
        let mut iterations = 0;
        while current <= max + 1e-12 && iterations < config.max_axis_points {
            let value = round_to(current, config.axis_decimals);
            if values.last().is_none_or(|&last| value > last) {
                values.push(value);
            }
            current += step;
            iterations += 1;
        }
        Self::from_values(values)
    }

    /// A spot-move axis: [`generate`](Self::generate) named `"spot"`, with
    /// every move above −100% so shocked spots stay positive.
    ///
    /// # Errors
    /// As for `generate`, plus [`AnalyticsError::InvalidInput`] when
    /// `min ≤ -1`.
    pub fn spot_moves(min: f64, max: f64, step: f64, config: &ScenarioConfig) -> Result<Self> {
        if min <= -1.0 {
            return Err(AnalyticsError::invalid(format!(
                "spot axis moves must stay above -100%, got {min}"
            )));
        }
        Self::generate("spot", min, max, step, config)
    }

    /// Wrap explicit values after checking they are finite and strictly ascending.
    ///
    /// # Errors
    /// Returns [`AnalyticsError::InvalidInput`] for an empty, non-finite or
    /// unordered sequence.
    pub fn from_values(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(AnalyticsError::invalid("scenario axis is empty"));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AnalyticsError::invalid("scenario axis values must be finite"));
        }
        if values.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AnalyticsError::invalid(
                "scenario axis values must be strictly ascending",
            ));
        }
        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
