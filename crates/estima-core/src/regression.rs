//! Polynomial least-squares regression in the monomial basis.
//!
//! Coefficients are ordered highest power first, so a degree-`d` fit yields
//! `[c_0, ..., c_d]` with `p(x) = c_0 x^d + c_1 x^(d-1) + ... + c_d`.

use std::fmt;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EstimaError, EstimaResult};

/// Singular values below this (after column scaling) are treated as zero.
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Upper bound on SVD sweeps; a handful of columns converges in far fewer.
const SVD_MAX_ITERATIONS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Production (x) against hours worked (y) for the machine example.
pub fn default_samples() -> Vec<Sample> {
    [(1.0, 5.0), (2.0, 7.5), (3.0, 10.0), (4.0, 11.0), (5.0, 12.0)]
        .into_iter()
        .map(|(x, y)| Sample::new(x, y))
        .collect()
}

// ---------------------------------------------------------------------------
// Degree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Degree {
    Linear,
    Quadratic,
    Cubic,
}

impl Degree {
    pub fn as_usize(self) -> usize {
        match self {
            Self::Linear => 1,
            Self::Quadratic => 2,
            Self::Cubic => 3,
        }
    }

    pub fn from_usize(degree: usize) -> EstimaResult<Self> {
        match degree {
            1 => Ok(Self::Linear),
            2 => Ok(Self::Quadratic),
            3 => Ok(Self::Cubic),
            other => Err(EstimaError::Validation(format!(
                "unsupported polynomial degree {other} (expected 1, 2 or 3)"
            ))),
        }
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Quadratic => write!(f, "quadratic"),
            Self::Cubic => write!(f, "cubic"),
        }
    }
}

impl std::str::FromStr for Degree {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linear" | "1" => Ok(Self::Linear),
            "quadratic" | "2" => Ok(Self::Quadratic),
            "cubic" | "3" => Ok(Self::Cubic),
            _ => Err(format!("invalid regression model: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RegressionRequest {
    pub samples: Vec<Sample>,
    pub degree: Degree,
}

impl RegressionRequest {
    pub fn new(samples: Vec<Sample>, degree: Degree) -> EstimaResult<Self> {
        validate_samples(&samples)?;
        Ok(Self { samples, degree })
    }

    pub fn xs(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.y).collect()
    }

    pub fn fit(&self) -> EstimaResult<RegressionResult> {
        let coefficients = fit_polynomial(&self.samples, self.degree.as_usize())?;
        Ok(RegressionResult { coefficients })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub coefficients: Vec<f64>,
}

impl RegressionResult {
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Horner evaluation of the fitted polynomial.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients.iter().fold(0.0, |acc, c| acc * x + c)
    }

    /// `y_i - p(x_i)` for each sample, in input order.
    pub fn residuals(&self, samples: &[Sample]) -> Vec<f64> {
        samples.iter().map(|s| s.y - self.evaluate(s.x)).collect()
    }

    pub fn sum_squared_residuals(&self, samples: &[Sample]) -> f64 {
        self.residuals(samples).iter().map(|r| r * r).sum()
    }
}

// ---------------------------------------------------------------------------
// Fitting
// ---------------------------------------------------------------------------

fn validate_samples(samples: &[Sample]) -> EstimaResult<()> {
    if samples.is_empty() {
        return Err(EstimaError::Validation(
            "the data table is empty; enter at least one (x, y) pair".into(),
        ));
    }
    if let Some(i) = samples
        .iter()
        .position(|s| !s.x.is_finite() || !s.y.is_finite())
    {
        return Err(EstimaError::Validation(format!(
            "row {} contains a missing or non-numeric value",
            i + 1
        )));
    }
    Ok(())
}

fn distinct_x_count(samples: &[Sample]) -> usize {
    let mut xs: Vec<f64> = samples.iter().map(|s| s.x).collect();
    xs.sort_by(|a, b| a.total_cmp(b));
    xs.dedup();
    xs.len()
}

/// Least-squares fit of a degree-`degree` polynomial, highest power first.
///
/// Fails closed when there are fewer distinct x-values than coefficients
/// rather than returning a rank-deficient solution.
pub fn fit_polynomial(samples: &[Sample], degree: usize) -> EstimaResult<Vec<f64>> {
    validate_samples(samples)?;
    if degree == 0 {
        return Err(EstimaError::Validation("degree must be at least 1".into()));
    }

    let n_coef = degree + 1;
    let distinct = distinct_x_count(samples);
    if distinct < n_coef {
        return Err(EstimaError::Validation(format!(
            "a degree-{degree} fit needs at least {n_coef} distinct x values, got {distinct}"
        )));
    }

    let n = samples.len();
    let mut vander = DMatrix::from_fn(n, n_coef, |i, j| {
        samples[i].x.powi((degree - j) as i32)
    });
    if vander.iter().any(|v| !v.is_finite()) {
        return Err(EstimaError::Validation(format!(
            "x values are too large in magnitude for a degree-{degree} fit"
        )));
    }
    let rhs = DVector::from_iterator(n, samples.iter().map(|s| s.y));

    // Scale columns to unit norm to keep the high powers well conditioned.
    let mut scales = Vec::with_capacity(n_coef);
    for j in 0..n_coef {
        let norm = vander.column(j).norm();
        if !norm.is_finite() {
            return Err(EstimaError::Validation(format!(
                "x values are too large in magnitude for a degree-{degree} fit"
            )));
        }
        scales.push(if norm == 0.0 { 1.0 } else { norm });
    }
    for (j, scale) in scales.iter().enumerate() {
        vander.column_mut(j).unscale_mut(*scale);
    }

    let svd = vander
        .try_svd(true, true, f64::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or_else(|| {
            EstimaError::Validation("least-squares solve did not converge".into())
        })?;
    let scaled = svd
        .solve(&rhs, SINGULAR_TOLERANCE)
        .map_err(|e| EstimaError::Validation(format!("least-squares solve failed: {e}")))?;

    let coefficients: Vec<f64> = scaled
        .iter()
        .zip(&scales)
        .map(|(c, scale)| c / scale)
        .collect();
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(EstimaError::Validation(
            "the fit produced non-finite coefficients".into(),
        ));
    }

    debug!(degree, samples = n, ?coefficients, "fitted polynomial");
    Ok(coefficients)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sse_linear(samples: &[Sample], m: f64, b: f64) -> f64 {
        samples
            .iter()
            .map(|s| {
                let r = s.y - (m * s.x + b);
                r * r
            })
            .sum()
    }

    #[test]
    fn test_linear_fit_known_values() {
        let coef = fit_polynomial(&default_samples(), 1).unwrap();
        assert_eq!(coef.len(), 2);
        // Closed form: m = 1.75, b = 3.85
        assert!((coef[0] - 1.75).abs() < 1e-9, "m = {}", coef[0]);
        assert!((coef[1] - 3.85).abs() < 1e-9, "b = {}", coef[1]);
    }

    #[test]
    fn test_linear_fit_beats_grid_search() {
        let samples = default_samples();
        let coef = fit_polynomial(&samples, 1).unwrap();
        let best = sse_linear(&samples, coef[0], coef[1]);

        let mut grid_best = f64::INFINITY;
        for i in 0..=400 {
            let m = i as f64 * 0.01;
            for j in 0..=800 {
                let b = j as f64 * 0.01;
                grid_best = grid_best.min(sse_linear(&samples, m, b));
            }
        }
        assert!(best <= grid_best + 1e-9, "fit {best} vs grid {grid_best}");
        // And the grid gets close, so the fit is not trivially far off either.
        assert!(grid_best - best < 1e-2);
    }

    #[test]
    fn test_coefficient_lengths() {
        let samples = default_samples();
        for (degree, len) in [(Degree::Linear, 2), (Degree::Quadratic, 3), (Degree::Cubic, 4)] {
            let req = RegressionRequest::new(samples.clone(), degree).unwrap();
            let fit = req.fit().unwrap();
            assert_eq!(fit.coefficients.len(), len);
            assert_eq!(fit.degree(), degree.as_usize());
        }
    }

    #[test]
    fn test_quadratic_not_interpolating() {
        let samples = default_samples();
        let fit = RegressionRequest::new(samples.clone(), Degree::Quadratic)
            .unwrap()
            .fit()
            .unwrap();
        assert!(fit.sum_squared_residuals(&samples) > 1e-6);
    }

    #[test]
    fn test_degree_four_interpolates_five_points() {
        let samples = default_samples();
        let fit = RegressionResult {
            coefficients: fit_polynomial(&samples, 4).unwrap(),
        };
        for r in fit.residuals(&samples) {
            assert!(r.abs() < 1e-8, "residual {r}");
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let samples = default_samples();
        let a = fit_polynomial(&samples, 3).unwrap();
        let b = fit_polynomial(&samples, 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_exact_line_recovered() {
        let samples: Vec<Sample> = (0..6)
            .map(|i| Sample::new(i as f64, 2.0 + 3.0 * i as f64))
            .collect();
        let coef = fit_polynomial(&samples, 1).unwrap();
        assert!((coef[0] - 3.0).abs() < 1e-10);
        assert!((coef[1] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_empty_samples_rejected() {
        assert!(matches!(
            RegressionRequest::new(Vec::new(), Degree::Linear),
            Err(EstimaError::Validation(_))
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        let samples = vec![Sample::new(1.0, 2.0), Sample::new(f64::NAN, 3.0)];
        let err = RegressionRequest::new(samples, Degree::Linear).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_underdetermined_fit_rejected() {
        // Three points but only two distinct x values.
        let samples = vec![
            Sample::new(1.0, 1.0),
            Sample::new(1.0, 2.0),
            Sample::new(2.0, 3.0),
        ];
        assert!(fit_polynomial(&samples, 1).is_ok());
        assert!(matches!(
            fit_polynomial(&samples, 2),
            Err(EstimaError::Validation(_))
        ));
    }

    #[test]
    fn test_overflowing_powers_rejected() {
        // x^3 overflows to infinity even though every x is finite.
        let samples: Vec<Sample> = (1..=4)
            .map(|i| Sample::new(i as f64 * 1e103, 1.0))
            .collect();
        let err = fit_polynomial(&samples, 3).unwrap_err();
        assert!(matches!(err, EstimaError::Validation(_)));
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn test_overflowing_column_norm_rejected() {
        // Entries are finite but their sum of squares is not.
        let samples: Vec<Sample> = (1..=3)
            .map(|i| Sample::new(i as f64 * 1e160, i as f64))
            .collect();
        assert!(matches!(
            fit_polynomial(&samples, 1),
            Err(EstimaError::Validation(_))
        ));
    }

    #[test]
    fn test_large_but_safe_x_still_fits() {
        let samples: Vec<Sample> = (1..=5)
            .map(|i| Sample::new(i as f64 * 1e6, 2.0 * i as f64 + 1.0))
            .collect();
        let coef = fit_polynomial(&samples, 1).unwrap();
        assert!((coef[0] - 2e-6).abs() < 1e-12);
        assert!((coef[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_degree_parsing() {
        assert_eq!("linear".parse::<Degree>().unwrap(), Degree::Linear);
        assert_eq!("2".parse::<Degree>().unwrap(), Degree::Quadratic);
        assert_eq!("Cubic".parse::<Degree>().unwrap(), Degree::Cubic);
        assert!("quartic".parse::<Degree>().is_err());
        assert!(Degree::from_usize(4).is_err());
        assert_eq!(Degree::from_usize(3).unwrap(), Degree::Cubic);
    }

    #[test]
    fn test_evaluate_horner() {
        let fit = RegressionResult {
            coefficients: vec![2.0, -1.0, 0.5],
        };
        assert_eq!(fit.evaluate(2.0), 2.0 * 4.0 - 2.0 + 0.5);
    }
}
