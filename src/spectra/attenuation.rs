//! Attenuation spectra and their slope across detector distances.

use nalgebra::DMatrix;

use crate::error::NirsError;
use crate::math::regression_slope;

/// Attenuation spectra from intensity spectra: `log10(reference / intensity)`
/// per sample.
pub fn attenuation_spectra(
    intensity: &[Vec<f64>],
    reference: &[f64],
) -> Result<Vec<Vec<f64>>, NirsError> {
    intensity
        .iter()
        .enumerate()
        .map(|(i, spectrum)| {
            if spectrum.len() != reference.len() {
                return Err(NirsError::Input {
                    message: format!(
                        "Intensity spectrum {i} has {} samples but the reference has {}.",
                        spectrum.len(),
                        reference.len()
                    ),
                });
            }
            Ok(spectrum
                .iter()
                .zip(reference.iter())
                .map(|(s, r)| (r / s).log10())
                .collect())
        })
        .collect()
}

/// Attenuation slope against detector distance.
///
/// `attenuation_by_distance` holds one `time x wavelength` matrix per
/// detector distance; the slope at each `(time, wavelength)` cell is the
/// least-squares line through the per-distance attenuations.
pub fn attenuation_slope(
    attenuation_by_distance: &[DMatrix<f64>],
    distances: &[f64],
) -> Result<DMatrix<f64>, NirsError> {
    let k = attenuation_by_distance.len();
    if k != distances.len() {
        return Err(NirsError::Input {
            message: format!(
                "Mismatch between number of distances and attenuation layers: got {} and {k} respectively.",
                distances.len()
            ),
        });
    }
    let Some(first) = attenuation_by_distance.first() else {
        return Err(NirsError::Input {
            message: "Attenuation slope needs at least one layer.".to_string(),
        });
    };

    let (n_times, n_wavelengths) = first.shape();
    if attenuation_by_distance
        .iter()
        .any(|m| m.shape() != (n_times, n_wavelengths))
    {
        return Err(NirsError::Input {
            message: "Attenuation layers disagree in shape.".to_string(),
        });
    }

    let mut slopes = DMatrix::<f64>::zeros(n_times, n_wavelengths);
    let mut values = vec![0.0; k];
    for t in 0..n_times {
        for w in 0..n_wavelengths {
            for (layer, matrix) in attenuation_by_distance.iter().enumerate() {
                values[layer] = matrix[(t, w)];
            }
            slopes[(t, w)] = regression_slope(distances, &values)?;
        }
    }
    Ok(slopes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_spectrum_attenuation() {
        let spectra = attenuation_spectra(&[vec![10.0, 20.0, 30.0, 40.0]], &[1.0, 2.0, 3.0, 4.0])
            .unwrap();
        for v in &spectra[0] {
            assert!((v + 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn multiple_spectra_attenuation() {
        let spectra = attenuation_spectra(
            &[vec![10.0, 20.0], vec![20.0, 40.0]],
            &[1.0, 2.0],
        )
        .unwrap();
        assert!((spectra[0][0] + 1.0).abs() < 1e-12);
        assert!((spectra[1][0] + 1.30103).abs() < 1e-5);
    }

    #[test]
    fn slope_recovers_linear_attenuation_growth() {
        // Layer i (1-based) holds attenuation 2i in the first time row and
        // 4i in the second: slopes of 2 and 4 against distances [1,2,3,4].
        let layers: Vec<DMatrix<f64>> = (1..=4)
            .map(|i| {
                DMatrix::from_row_slice(
                    2,
                    3,
                    &[
                        2.0 * i as f64,
                        2.0 * i as f64,
                        2.0 * i as f64,
                        4.0 * i as f64,
                        4.0 * i as f64,
                        4.0 * i as f64,
                    ],
                )
            })
            .collect();
        let distances = [1.0, 2.0, 3.0, 4.0];

        let slopes = attenuation_slope(&layers, &distances).unwrap();
        for w in 0..3 {
            assert!((slopes[(0, w)] - 2.0).abs() < 1e-10);
            assert!((slopes[(1, w)] - 4.0).abs() < 1e-10);
        }
    }

    #[test]
    fn layer_count_mismatch_is_rejected() {
        let layers = vec![DMatrix::zeros(2, 3); 4];
        assert!(attenuation_slope(&layers, &[1.0, 2.0, 3.0]).is_err());
    }
}
