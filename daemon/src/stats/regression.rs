//! Ordinary least-squares backends
//!
//! [`ClosedForm`] is always compiled. With the `nalgebra` feature,
//! [`SvdLeastSquares`] becomes the [`DefaultLeastSquares`] used by the
//! aggregator.

use crate::error::StatsError;

/// Fits `y = slope * x + intercept` to paired series.
///
/// Implementations may assume `xs.len() == ys.len() >= 2`; the caller
/// ([`super::linear_regression`]) checks it.
pub trait LeastSquares {
    fn fit(xs: &[f64], ys: &[f64]) -> Result<(f64, f64), StatsError>;
}

/// Means of both series and the series shifted onto them.
///
/// Fitting on centred data keeps large offsets (timestamps, byte counters)
/// from cancelling out the significant digits of the fit.
fn centre(xs: &[f64], ys: &[f64]) -> (f64, f64, Vec<f64>, Vec<f64>) {
    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;
    let dx = xs.iter().map(|x| x - x_mean).collect();
    let dy = ys.iter().map(|y| y - y_mean).collect();
    (x_mean, y_mean, dx, dy)
}

/// Direct computation from the sums of x, y, xy and x², taken around the
/// means.
pub struct ClosedForm;

impl LeastSquares for ClosedForm {
    fn fit(xs: &[f64], ys: &[f64]) -> Result<(f64, f64), StatsError> {
        let (x_mean, y_mean, dx, dy) = centre(xs, ys);
        // the centred sums of x and y vanish
        let sum_xx: f64 = dx.iter().map(|x| x * x).sum();
        let sum_xy: f64 = dx.iter().zip(&dy).map(|(x, y)| x * y).sum();

        let slope = sum_xy / sum_xx;
        Ok((slope, y_mean - slope * x_mean))
    }
}

/// Solves the overdetermined system `[x 1] · [slope intercept]ᵀ = y`, on
/// centred data, through a singular value decomposition.
#[cfg(feature = "nalgebra")]
pub struct SvdLeastSquares;

#[cfg(feature = "nalgebra")]
impl LeastSquares for SvdLeastSquares {
    fn fit(xs: &[f64], ys: &[f64]) -> Result<(f64, f64), StatsError> {
        use nalgebra::{DMatrix, DVector};

        let (x_mean, y_mean, dx, dy) = centre(xs, ys);
        let design = DMatrix::from_fn(dx.len(), 2, |row, col| if col == 0 { dx[row] } else { 1.0 });
        let observed = DVector::from_column_slice(&dy);
        let solution = design
            .svd(true, true)
            .solve(&observed, f64::EPSILON)
            .map_err(|e| StatsError::Solver(e.to_string()))?;
        let slope = solution[0];
        Ok((slope, y_mean + solution[1] - slope * x_mean))
    }
}

#[cfg(feature = "nalgebra")]
pub type DefaultLeastSquares = SvdLeastSquares;

#[cfg(not(feature = "nalgebra"))]
pub type DefaultLeastSquares = ClosedForm;
