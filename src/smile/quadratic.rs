//! Quadratic least-squares smile: `σ(x) = a + b·x + c·x²` in log-moneyness.
//!
//! The 3×3 normal equations are solved in closed form with Cramer's rule.
//! No iteration and no linear-algebra dependency: the system is always 3×3
//! and symmetric, and a near-zero determinant is reported as "no fit".

use serde::{Deserialize, Serialize};

/// Fitted smile coefficients.
///
/// # Examples
/// ```
/// use optanalytics::smile::QuadraticSmile;
///
/// let pts: Vec<(f64, f64)> = [-0.2, -0.1, 0.0, 0.1, 0.2]
///     .iter()
///     .map(|&x| (x, 0.2 - 0.1 * x + 0.5 * x * x))
///     .collect();
/// let smile = QuadraticSmile::fit(&pts, 3, 1e-10).unwrap();
/// assert!((smile.skew() + 0.1).abs() < 1e-9);
/// assert!((smile.curvature() - 0.5).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadraticSmile {
    /// Level at `x = 0`.
    pub a: f64,
    /// Linear coefficient.
    pub b: f64,
    /// Quadratic coefficient.
    pub c: f64,
}

type Matrix3 = [[f64; 3]; 3];

fn det3(m: &Matrix3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn with_column(m: &Matrix3, col: usize, rhs: &[f64; 3]) -> Matrix3 {
    let mut out = *m;
    for (row, value) in out.iter_mut().zip(rhs) {
        row[col] = *value;
    }
    out
}

impl QuadraticSmile {
    /// Unweighted least-squares fit to `(log_moneyness, implied_vol)` pairs.
    ///
    /// Returns `None` with fewer than `min_points` observations, when the
    /// normal-equation determinant is non-finite or below `det_epsilon` in
    /// magnitude (e.g. all observations share one `x`), or when a
    /// coefficient comes out non-finite.
    pub fn fit(points: &[(f64, f64)], min_points: usize, det_epsilon: f64) -> Option<Self> {
        if points.len() < min_points.max(3) {
            return None;
        }

        // Power sums Σxᵏ for k = 0..=4 and Σxᵏz for k = 0..=2.
        let mut sx = [0.0_f64; 5];
        let mut sxz = [0.0_f64; 3];
        for &(x, z) in points {
            let mut xk = 1.0;
            for (k, s) in sx.iter_mut().enumerate() {
                *s += xk;
                if k < 3 {
                    sxz[k] += xk * z;
                }
                xk *= x;
            }
        }

        let normal: Matrix3 = [
            [sx[0], sx[1], sx[2]],
            [sx[1], sx[2], sx[3]],
            [sx[2], sx[3], sx[4]],
        ];
        let det = det3(&normal);
        if !det.is_finite() || det.abs() < det_epsilon {
            return None;
        }

        let a = det3(&with_column(&normal, 0, &sxz)) / det;
        let b = det3(&with_column(&normal, 1, &sxz)) / det;
        let c = det3(&with_column(&normal, 2, &sxz)) / det;
        if !(a.is_finite() && b.is_finite() && c.is_finite()) {
            return None;
        }
        Some(Self { a, b, c })
    }

    /// Fitted vol at log-moneyness `x`.
    pub fn vol_at(&self, x: f64) -> f64 {
        self.a + self.b * x + self.c * x * x
    }

    /// Linear coefficient, reported as skew.
    pub fn skew(&self) -> f64 {
        self.b
    }

    /// Quadratic coefficient, reported as a kurtosis/curvature proxy.
    pub fn curvature(&self) -> f64 {
        self.c
    }
}
