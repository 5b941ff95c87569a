//! Ordinary-least-squares simple linear regression.
//!
//! Fits `y = intercept + slope * x` and reports how well the line explains
//! the data.

use serde::Serialize;

use crate::error::{ReportError, Result};

/// Spread below which a sum of squares is treated as zero.
const EPSILON: f64 = 1e-10;

/// A fitted straight line and its goodness-of-fit statistics.
///
/// # Example
///
/// ```
/// use report_core::regression::LinearFit;
///
/// let points = [(9.0, 10.0), (10.0, 20.0), (11.0, 30.0)];
/// let fit = LinearFit::fit(&points).unwrap();
/// assert!((fit.slope - 10.0).abs() < 1e-9);
/// assert!((fit.predict(12.0) - 40.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination. `1.0` when `y` has no variance.
    pub r_squared: f64,
    /// Pearson correlation of `x` and `y`. `0.0` when `y` has no variance.
    pub correlation: f64,
    pub n_observations: usize,
    /// Smallest `x` in the fitted data.
    pub x_min: f64,
    /// Largest `x` in the fitted data.
    pub x_max: f64,
}

impl LinearFit {
    /// Fit a line through `(x, y)` points.
    ///
    /// Fails with [`ReportError::InsufficientData`] when fewer than two
    /// distinct `x` values are present.
    pub fn fit(points: &[(f64, f64)]) -> Result<Self> {
        let distinct = distinct_x(points);
        if distinct < 2 {
            return Err(ReportError::InsufficientData {
                required: 2,
                actual: distinct,
            });
        }

        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
        for (x, y) in points {
            let dx = x - mean_x;
            let dy = y - mean_y;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;

        let ss_res: f64 = points
            .iter()
            .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
            .sum();
        let (r_squared, correlation) = if syy > EPSILON {
            (1.0 - ss_res / syy, sxy / (sxx * syy).sqrt())
        } else {
            (1.0, 0.0)
        };

        let x_min = points.iter().map(|(x, _)| *x).fold(f64::INFINITY, f64::min);
        let x_max = points
            .iter()
            .map(|(x, _)| *x)
            .fold(f64::NEG_INFINITY, f64::max);

        Ok(Self {
            slope,
            intercept,
            r_squared,
            correlation,
            n_observations: points.len(),
            x_min,
            x_max,
        })
    }

    /// Evaluate the line at `x`.
    ///
    /// Values outside `[x_min, x_max]` are extrapolations; see
    /// [`LinearFit::in_domain`].
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Whether `x` lies within the range the line was fitted on.
    pub fn in_domain(&self, x: f64) -> bool {
        (self.x_min..=self.x_max).contains(&x)
    }

    /// `y - predict(x)` for each point.
    pub fn residuals(&self, points: &[(f64, f64)]) -> Vec<f64> {
        points.iter().map(|(x, y)| y - self.predict(*x)).collect()
    }
}

fn distinct_x(points: &[(f64, f64)]) -> usize {
    let mut xs: Vec<f64> = points.iter().map(|(x, _)| *x).collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup_by(|a, b| (*a - *b).abs() < EPSILON);
    xs.len()
}
