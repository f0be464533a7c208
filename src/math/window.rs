//! Exact wavelength lookup for windowing.
//!
//! Fitting and scoring windows are defined by wavelengths that must be
//! present in the sampled grid exactly once. Approximating a missing window
//! edge would silently change which samples enter the objective, so absence
//! (or duplication) is a hard error.

use crate::error::NirsError;

/// Index of the unique exact match of `target` in `wavelengths`.
///
/// Comparison is bitwise-exact (`==`), mirroring how window edges are
/// specified against the sampled grid.
pub fn exact_index(wavelengths: &[f64], target: f64) -> Result<usize, NirsError> {
    let mut found = None;
    let mut matches = 0usize;
    for (i, &wl) in wavelengths.iter().enumerate() {
        if wl == target {
            matches += 1;
            found.get_or_insert(i);
        }
    }
    match (found, matches) {
        (Some(i), 1) => Ok(i),
        _ => Err(NirsError::WavelengthLookup {
            wavelength: target,
            matches,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_unique_sample() {
        let wl = [700.0, 705.0, 710.0, 715.0];
        assert_eq!(exact_index(&wl, 710.0).unwrap(), 2);
    }

    #[test]
    fn missing_sample_is_an_error() {
        let wl = [700.0, 705.0, 715.0];
        let err = exact_index(&wl, 710.0).unwrap_err();
        assert_eq!(
            err,
            NirsError::WavelengthLookup {
                wavelength: 710.0,
                matches: 0
            }
        );
    }

    #[test]
    fn duplicate_sample_is_an_error() {
        let wl = [700.0, 710.0, 710.0, 715.0];
        let err = exact_index(&wl, 710.0).unwrap_err();
        assert_eq!(
            err,
            NirsError::WavelengthLookup {
                wavelength: 710.0,
                matches: 2
            }
        );
    }
}
