//! The derivative objective evaluated at every optimizer iteration.
//!
//! A candidate parameter vector is expanded into absorption and scattering
//! spectra, pushed through the selected attenuation-slope model, and
//! first-differenced along wavelength. The objective is the sum of squared
//! deviations from the measured slope difference, restricted to a
//! wavelength window whose edges must exist in the grid exactly.

use crate::domain::{BoundaryType, Coefficients, ExtinctionTable, QuantityType};
use crate::error::NirsError;
use crate::math::{exact_index, first_difference};
use crate::models::{scattering_spectrum, select};

/// Borrowed inputs for one fit's objective. Everything here is read-only
/// during the search; each `evaluate` call allocates its own work arrays.
#[derive(Debug, Clone)]
pub struct SlopeObjective<'a> {
    pub boundary: BoundaryType,
    pub quantity: QuantityType,
    /// First difference of the (smoothed) measured slope, one shorter than
    /// the wavelength grid.
    pub slope_diff: &'a [f64],
    pub extinction: &'a ExtinctionTable,
    /// Source-detector separation (near distance for long-separation
    /// geometries), mm.
    pub distance: f64,
    /// Far detector distance; selects the long-separation slope model.
    pub distance_max: Option<f64>,
    /// Inclusive fitting window edges, nm. Must match grid samples exactly.
    pub wave_start: f64,
    pub wave_end: f64,
}

impl SlopeObjective<'_> {
    /// Sum of squared differences between the modeled and measured slope
    /// differences over the fitting window.
    pub fn evaluate(&self, param: &[f64]) -> Result<f64, NirsError> {
        let wavelengths = self.extinction.wavelengths();
        let start_idx = exact_index(wavelengths, self.wave_start)?;
        let end_idx = exact_index(wavelengths, self.wave_end)?;

        if self.slope_diff.len() + 1 != wavelengths.len() {
            return Err(NirsError::Input {
                message: format!(
                    "Slope difference length {} does not match the {}-sample wavelength grid.",
                    self.slope_diff.len(),
                    wavelengths.len()
                ),
            });
        }

        let c = Coefficients::from_slice(param)?;
        let mu_a = self
            .extinction
            .absorption(c.water_fraction, c.hhb, c.hbo2);
        let mu_s = scattering_spectrum(wavelengths, c.scatter_amplitude, c.scatter_power);

        let model = select(self.boundary, self.quantity, self.distance_max);
        let spectrum =
            model.evaluate_spectrum(&mu_s, &mu_a, self.distance, self.distance_max)?;
        let model_diff = first_difference(&spectrum);

        // The window is inclusive; a window ending on the last grid sample
        // ends on the last difference instead.
        let hi = end_idx.min(model_diff.len().saturating_sub(1));
        let mut sum = 0.0;
        for i in start_idx..=hi {
            let d = model_diff[i] - self.slope_diff[i];
            sum += d * d;
        }
        Ok(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Deterministic 5 nm grid covering all window wavelengths. Reference
    // objective values were computed independently from the closed forms.
    fn synthetic_table() -> ExtinctionTable {
        let n = 41;
        let wavelengths: Vec<f64> = (0..n).map(|i| 700.0 + 5.0 * i as f64).collect();
        let hhb: Vec<f64> = (0..n).map(|i| 0.001 * (i + 1) as f64).collect();
        let hbo2: Vec<f64> = (0..n).map(|i| 0.002 * (n - i) as f64).collect();
        let water: Vec<f64> = (0..n).map(|i| 0.0005 * (i + 1) as f64).collect();
        ExtinctionTable::new(wavelengths, hhb, hbo2, water).unwrap()
    }

    fn objective<'a>(
        table: &'a ExtinctionTable,
        slope_diff: &'a [f64],
        boundary: BoundaryType,
        distance_max: Option<f64>,
    ) -> SlopeObjective<'a> {
        SlopeObjective {
            boundary,
            quantity: QuantityType::AttenuationSlope,
            slope_diff,
            extinction: table,
            distance: 22.5,
            distance_max,
            wave_start: 710.0,
            wave_end: 900.0,
        }
    }

    const PARAM: [f64; 5] = [1.0, 20.0, 20.0, 1.0, 3.0];

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            ((actual - expected) / expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn zbc_short_separation_reference_value() {
        let table = synthetic_table();
        let slope_diff = vec![0.01; 40];
        let obj = objective(&table, &slope_diff, BoundaryType::Zero, None);
        assert_close(obj.evaluate(&PARAM).unwrap(), 6.506174199297753e-2);
    }

    #[test]
    fn zbc_long_separation_reference_value() {
        let table = synthetic_table();
        let slope_diff = vec![0.01; 40];
        let obj = objective(&table, &slope_diff, BoundaryType::Zero, Some(45.0));
        assert_close(obj.evaluate(&PARAM).unwrap(), 6.506174199297760e-2);
    }

    #[test]
    fn ebc_short_separation_reference_value() {
        let table = synthetic_table();
        let slope_diff = vec![0.01; 40];
        let obj = objective(&table, &slope_diff, BoundaryType::Extrapolated, None);
        assert_close(obj.evaluate(&PARAM).unwrap(), 6.517364354978518e-2);
    }

    #[test]
    fn ebc_long_separation_reference_value() {
        let table = synthetic_table();
        let slope_diff = vec![0.01; 40];
        let obj = objective(&table, &slope_diff, BoundaryType::Extrapolated, Some(45.0));
        assert_close(obj.evaluate(&PARAM).unwrap(), 6.511834918069306e-2);
    }

    #[test]
    fn duplicate_window_wavelength_is_a_lookup_error() {
        let n = 41;
        let mut wavelengths: Vec<f64> = (0..n).map(|i| 700.0 + 5.0 * i as f64).collect();
        // Repeat the 710 nm sample.
        wavelengths[3] = wavelengths[2];
        let col = vec![0.001; n];
        let table =
            ExtinctionTable::new(wavelengths, col.clone(), col.clone(), col).unwrap();
        let slope_diff = vec![0.01; 40];
        let obj = objective(&table, &slope_diff, BoundaryType::Zero, None);

        let err = obj.evaluate(&PARAM).unwrap_err();
        assert_eq!(
            err,
            NirsError::WavelengthLookup {
                wavelength: 710.0,
                matches: 2
            }
        );
    }

    #[test]
    fn missing_window_wavelength_is_a_lookup_error() {
        // Shift the window end off-grid: 901 nm has no exact sample.
        let table = synthetic_table();
        let slope_diff = vec![0.01; 40];
        let mut obj = objective(&table, &slope_diff, BoundaryType::Zero, None);
        obj.wave_end = 901.0;
        let err = obj.evaluate(&PARAM).unwrap_err();
        assert!(matches!(err, NirsError::WavelengthLookup { matches: 0, .. }));
    }

    #[test]
    fn mismatched_slope_length_is_rejected() {
        let table = synthetic_table();
        let slope_diff = vec![0.01; 12];
        let obj = objective(&table, &slope_diff, BoundaryType::Zero, None);
        assert!(matches!(
            obj.evaluate(&PARAM).unwrap_err(),
            NirsError::Input { .. }
        ));
    }
}
