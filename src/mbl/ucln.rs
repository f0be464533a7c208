//! Modified Beer-Lambert concentration changes.
//!
//! Given a time series of intensity spectra, the change in attenuation
//! relative to the first sample is
//!
//! ```text
//! dA_i(lambda) = log10(I_0(lambda) / I_i(lambda))
//! ```
//!
//! Each attenuation spectrum is re-sampled onto an integer wavelength grid
//! with a cubic spline, scaled by the wavelength dependency of pathlength,
//! and multiplied by the pseudo-inverse of the extinction matrix to yield
//! concentration changes:
//!
//! ```text
//! dC = pinv(E) * (dA / wl_dep) / (d * DPF)
//! ```
//!
//! The pseudo-inverse is not unique under rank deficiency, so results can
//! differ in the null space between linear-algebra backends.

use nalgebra::DMatrix;

use crate::error::NirsError;
use crate::math::CubicSpline;

/// Measurement site for the differential pathlength factor (Duncan 1994).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathlengthSite {
    BabyHead,
    AdultHead,
    AdultArm,
    AdultLeg,
}

impl PathlengthSite {
    /// Differential pathlength factor for the site.
    pub fn dpf(self) -> f64 {
        match self {
            PathlengthSite::BabyHead => 4.99,
            PathlengthSite::AdultHead => 6.26,
            PathlengthSite::AdultArm => 4.16,
            PathlengthSite::AdultLeg => 5.51,
        }
    }
}

/// Fixed inputs for the Beer-Lambert solve.
#[derive(Debug, Clone)]
pub struct UclnConstants {
    /// Extinction coefficients on the interpolation grid, one row per
    /// wavelength, one column per species.
    extinction: DMatrix<f64>,
    /// Wavelength dependency of pathlength on the interpolation grid.
    wavelength_dependency: Vec<f64>,
    /// Source-detector distance, mm.
    optode_distance: f64,
    /// Differential pathlength factor for the measurement site.
    dpf: f64,
    /// Integer wavelength grid the attenuation spectra are re-sampled onto.
    interp_wavelengths: Vec<f64>,
}

impl UclnConstants {
    /// Assemble the constants for a `(min_wavelength, max_wavelength)`
    /// interpolation range (inclusive, 1 nm steps).
    pub fn new(
        extinction: DMatrix<f64>,
        wavelength_dependency: Vec<f64>,
        optode_distance: f64,
        site: PathlengthSite,
        wavelength_range: (f64, f64),
    ) -> Result<Self, NirsError> {
        let (min_wl, max_wl) = wavelength_range;
        if !(min_wl.is_finite() && max_wl.is_finite()) || max_wl < min_wl {
            return Err(NirsError::Input {
                message: format!("Invalid interpolation range: {min_wl}..{max_wl} nm."),
            });
        }

        let steps = (max_wl - min_wl) as usize + 1;
        let interp_wavelengths: Vec<f64> = (0..steps).map(|i| min_wl + i as f64).collect();

        if extinction.nrows() != steps || wavelength_dependency.len() != steps {
            return Err(NirsError::Input {
                message: format!(
                    "Extinction rows ({}) and wavelength dependency ({}) must match the {steps}-sample interpolation grid.",
                    extinction.nrows(),
                    wavelength_dependency.len()
                ),
            });
        }

        Ok(Self {
            extinction,
            wavelength_dependency,
            optode_distance,
            dpf: site.dpf(),
            interp_wavelengths,
        })
    }

    pub fn interp_wavelengths(&self) -> &[f64] {
        &self.interp_wavelengths
    }
}

/// Concentration changes per sample, relative to the first spectrum.
///
/// `spectra` holds one intensity spectrum per sample on the
/// `spectra_wavelengths` grid. Returns a matrix with one row per sample and
/// one column per extinction-table species.
pub fn concentrations(
    spectra: &[Vec<f64>],
    spectra_wavelengths: &[f64],
    constants: &UclnConstants,
) -> Result<DMatrix<f64>, NirsError> {
    let Some(reference) = spectra.first() else {
        return Err(NirsError::Input {
            message: "Concentration solve needs at least one spectrum.".to_string(),
        });
    };

    let n_wavelengths = spectra_wavelengths.len();
    let n_interp = constants.interp_wavelengths.len();
    let n_samples = spectra.len();

    // Attenuation change per sample, re-sampled and scaled: one column per
    // sample.
    let mut attenuation = DMatrix::<f64>::zeros(n_interp, n_samples);
    for (i, spectrum) in spectra.iter().enumerate() {
        if spectrum.len() != n_wavelengths {
            return Err(NirsError::Input {
                message: format!(
                    "Spectrum {i} has {} samples but the wavelength grid has {n_wavelengths}.",
                    spectrum.len()
                ),
            });
        }

        let change: Vec<f64> = reference
            .iter()
            .zip(spectrum.iter())
            .map(|(r, s)| (r / s).log10())
            .collect();
        let spline = CubicSpline::new(spectra_wavelengths.to_vec(), change)?;
        let interpolated = spline.evaluate_grid(&constants.interp_wavelengths);

        for (row, (value, dep)) in interpolated
            .iter()
            .zip(constants.wavelength_dependency.iter())
            .enumerate()
        {
            attenuation[(row, i)] = value / dep;
        }
    }

    let extinction_pinv = constants
        .extinction
        .clone()
        .pseudo_inverse(1e-10)
        .map_err(|e| NirsError::Input {
            message: format!("Extinction matrix pseudo-inverse failed: {e}"),
        })?;

    let scale = 1.0 / (constants.optode_distance * constants.dpf);
    let conc = extinction_pinv * attenuation * scale;
    Ok(conc.transpose())
}
