//! Least-squares solver and slope regression.
//!
//! The spectral pipeline repeatedly solves small linear problems: a
//! first-order fit of attenuation against detector distance at every
//! `(time, wavelength)` cell. The parameter dimension is tiny (two columns),
//! so we solve with SVD, which stays robust when the design matrix is tall.
//! (Nalgebra's `QR::solve` is intended for square systems and will panic for
//! non-square matrices.)

use nalgebra::{DMatrix, DVector};

use crate::error::NirsError;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if the strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Slope of the least-squares line `y = m*x + c`.
pub fn regression_slope(xs: &[f64], ys: &[f64]) -> Result<f64, NirsError> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return Err(NirsError::Input {
            message: format!(
                "Slope regression needs matching inputs of at least 2 samples, got {} x and {} y.",
                xs.len(),
                ys.len()
            ),
        });
    }

    let n = xs.len();
    let mut design = DMatrix::<f64>::zeros(n, 2);
    for (i, &x) in xs.iter().enumerate() {
        design[(i, 0)] = x;
        design[(i, 1)] = 1.0;
    }
    let rhs = DVector::from_row_slice(ys);

    let beta = solve_least_squares(&design, &rhs).ok_or_else(|| NirsError::Input {
        message: "Slope regression design matrix is too ill-conditioned to solve.".to_string(),
    })?;
    Ok(beta[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn regression_slope_recovers_line() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys: Vec<f64> = xs.iter().map(|x| 2.5 * x - 0.75).collect();
        let m = regression_slope(&xs, &ys).unwrap();
        assert!((m - 2.5).abs() < 1e-10);
    }

    #[test]
    fn regression_slope_rejects_short_input() {
        assert!(regression_slope(&[1.0], &[2.0]).is_err());
        assert!(regression_slope(&[1.0, 2.0], &[2.0]).is_err());
    }
}
