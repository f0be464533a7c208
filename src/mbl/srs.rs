//! Spatially resolved spectroscopy.
//!
//! With attenuation slopes measured across several detector distances, the
//! scaled absorption `k * mu_a` follows directly from diffusion theory and
//! yields absolute StO2 without a nonlinear fit:
//!
//! ```text
//! k_mua = [ln10 * slope - 2*ln(d_max/d_min)/(d_max - d_min)]
//!         / (3 * (1 - h*lambda))
//! ```
//!
//! where `h` captures the wavelength dependence of scattering.

use nalgebra::{DMatrix, DVector};

use crate::error::NirsError;

/// Wavelength dependence of reduced scattering, per nm.
pub const SCATTER_WAVELENGTH_DEPENDENCE: f64 = 6.3e-4;

/// Scaled absorption spectrum `k * mu_a` from the attenuation slope.
pub fn k_mua(
    slope: &[f64],
    wavelengths: &[f64],
    min_distance: f64,
    max_distance: f64,
) -> Result<Vec<f64>, NirsError> {
    if slope.len() != wavelengths.len() {
        return Err(NirsError::Input {
            message: format!(
                "Slope ({}) and wavelength ({}) arrays disagree in length.",
                slope.len(),
                wavelengths.len()
            ),
        });
    }

    let ln10 = std::f64::consts::LN_10;
    let geometry = 2.0 * (max_distance / min_distance).ln() / (max_distance - min_distance);

    Ok(slope
        .iter()
        .zip(wavelengths.iter())
        .map(|(&m, &wl)| {
            (ln10 * m - geometry) / (3.0 * (1.0 - SCATTER_WAVELENGTH_DEPENDENCE * wl))
        })
        .collect())
}

/// SRS outputs: per-species scaled concentrations and StO2.
#[derive(Debug, Clone, PartialEq)]
pub struct SrsResult {
    /// Scaled concentrations, ordered like the extinction columns
    /// ([HbO2, HHb, ...]).
    pub concentrations: Vec<f64>,
    /// Tissue oxygen saturation in percent.
    pub sto2: f64,
    /// The scaled absorption spectrum the concentrations were solved from.
    pub k_mua: Vec<f64>,
}

/// Solve SRS concentrations and StO2 from an attenuation-slope spectrum.
///
/// `extinction_pinv` is the pseudo-inverse of the extinction matrix with
/// HbO2 in the first row and HHb in the second.
pub fn srs_values(
    slope: &[f64],
    wavelengths: &[f64],
    extinction_pinv: &DMatrix<f64>,
    min_distance: f64,
    max_distance: f64,
) -> Result<SrsResult, NirsError> {
    let k = k_mua(slope, wavelengths, min_distance, max_distance)?;

    if extinction_pinv.ncols() != k.len() || extinction_pinv.nrows() < 2 {
        return Err(NirsError::Input {
            message: format!(
                "Extinction pseudo-inverse is {}x{} but {} wavelengths and at least 2 species are required.",
                extinction_pinv.nrows(),
                extinction_pinv.ncols(),
                k.len()
            ),
        });
    }

    let conc = extinction_pinv * DVector::from_row_slice(&k);
    let (oxy, deoxy) = (conc[0], conc[1]);

    Ok(SrsResult {
        concentrations: conc.iter().copied().collect(),
        sto2: oxy / (oxy + deoxy) * 100.0,
        k_mua: k,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn k_mua_matches_hand_computation() {
        // ln10*1 - 2*ln(2)/10, over 3*(1 - 6.3e-4*800)
        let k = k_mua(&[1.0], &[800.0], 10.0, 20.0).unwrap();
        assert!((k[0] - 1.4542712747863284).abs() < 1e-12, "k = {}", k[0]);
    }

    #[test]
    fn sto2_follows_concentration_ratio() {
        // pinv rows scale k_mua by 2 (HbO2) and 4 (HHb): StO2 = 1/3.
        let pinv = DMatrix::from_row_slice(2, 1, &[2.0, 4.0]);
        let result = srs_values(&[1.0], &[800.0], &pinv, 10.0, 20.0).unwrap();
        assert!((result.sto2 - 100.0 / 3.0).abs() < 1e-9);
        assert!((result.concentrations[0] - 2.0 * result.k_mua[0]).abs() < 1e-12);
        assert!((result.concentrations[1] - 4.0 * result.k_mua[0]).abs() < 1e-12);
    }

    #[test]
    fn mismatched_arrays_are_rejected() {
        assert!(k_mua(&[1.0, 2.0], &[800.0], 10.0, 20.0).is_err());
        let pinv = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        assert!(srs_values(&[1.0], &[800.0], &pinv, 10.0, 20.0).is_err());
    }
}
