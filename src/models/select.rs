//! Model selection for the `(boundary, quantity, separation)` grid.
//!
//! `select` is a pure dispatch: it maps a boundary-condition family and a
//! quantity to a concrete model function. A non-null far distance selects
//! the long-separation variant when the quantity is an attenuation slope and
//! is ignored otherwise.
//!
//! The grid itself is total over the two enums (the exhaustive matches below
//! are checked at compile time); what remains runtime-checkable is geometry,
//! so evaluating a long-separation model without a far distance fails with
//! `NirsError::InvalidModel`.

use crate::domain::{BoundaryType, QuantityType};
use crate::error::NirsError;
use crate::models::diffusion::{
    ebc_attenuation, ebc_attenuation_slope_long, ebc_attenuation_slope_short, ebc_reflectance,
    zbc_attenuation, zbc_attenuation_slope_long, zbc_attenuation_slope_short, zbc_reflectance,
};

/// A resolved model choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFunction {
    ZbcReflectance,
    ZbcAttenuation,
    ZbcSlopeShort,
    ZbcSlopeLong,
    EbcReflectance,
    EbcAttenuation,
    EbcSlopeShort,
    EbcSlopeLong,
}

/// Resolve a model from the selection grid.
///
/// `distance_max` only influences the choice for `AttenuationSlope`, where
/// its presence selects the long-separation (secant) form.
pub fn select(
    boundary: BoundaryType,
    quantity: QuantityType,
    distance_max: Option<f64>,
) -> ModelFunction {
    let long = distance_max.is_some();
    match (boundary, quantity) {
        (BoundaryType::Zero, QuantityType::Reflectance) => ModelFunction::ZbcReflectance,
        (BoundaryType::Zero, QuantityType::Attenuation) => ModelFunction::ZbcAttenuation,
        (BoundaryType::Zero, QuantityType::AttenuationSlope) => {
            if long {
                ModelFunction::ZbcSlopeLong
            } else {
                ModelFunction::ZbcSlopeShort
            }
        }
        (BoundaryType::Extrapolated, QuantityType::Reflectance) => ModelFunction::EbcReflectance,
        (BoundaryType::Extrapolated, QuantityType::Attenuation) => ModelFunction::EbcAttenuation,
        (BoundaryType::Extrapolated, QuantityType::AttenuationSlope) => {
            if long {
                ModelFunction::EbcSlopeLong
            } else {
                ModelFunction::EbcSlopeShort
            }
        }
    }
}

impl ModelFunction {
    /// Whether this model needs a far detector distance.
    pub fn is_long_separation(self) -> bool {
        matches!(self, ModelFunction::ZbcSlopeLong | ModelFunction::EbcSlopeLong)
    }

    /// Evaluate at a single wavelength sample.
    ///
    /// `distance` is the (near) source-detector distance; `distance_max` is
    /// the far distance, required by long-separation slope models.
    pub fn evaluate(
        self,
        mu_s: f64,
        mu_a: f64,
        distance: f64,
        distance_max: Option<f64>,
    ) -> Result<f64, NirsError> {
        match self {
            ModelFunction::ZbcReflectance => Ok(zbc_reflectance(mu_s, mu_a, distance)),
            ModelFunction::ZbcAttenuation => Ok(zbc_attenuation(mu_s, mu_a, distance)),
            ModelFunction::ZbcSlopeShort => {
                Ok(zbc_attenuation_slope_short(mu_s, mu_a, distance))
            }
            ModelFunction::ZbcSlopeLong => {
                let far = require_far(self, distance_max)?;
                Ok(zbc_attenuation_slope_long(mu_s, mu_a, distance, far))
            }
            ModelFunction::EbcReflectance => Ok(ebc_reflectance(mu_s, mu_a, distance)),
            ModelFunction::EbcAttenuation => Ok(ebc_attenuation(mu_s, mu_a, distance)),
            ModelFunction::EbcSlopeShort => {
                Ok(ebc_attenuation_slope_short(mu_s, mu_a, distance))
            }
            ModelFunction::EbcSlopeLong => {
                let far = require_far(self, distance_max)?;
                Ok(ebc_attenuation_slope_long(mu_s, mu_a, distance, far))
            }
        }
    }

    /// Evaluate over a spectrum. Geometry is validated once, then the scalar
    /// form is mapped across the grid.
    pub fn evaluate_spectrum(
        self,
        mu_s: &[f64],
        mu_a: &[f64],
        distance: f64,
        distance_max: Option<f64>,
    ) -> Result<Vec<f64>, NirsError> {
        if mu_s.len() != mu_a.len() {
            return Err(NirsError::Input {
                message: format!(
                    "Scattering and absorption spectra disagree in length: {} vs {}.",
                    mu_s.len(),
                    mu_a.len()
                ),
            });
        }
        if self.is_long_separation() {
            require_far(self, distance_max)?;
        }

        mu_s.iter()
            .zip(mu_a.iter())
            .map(|(&s, &a)| self.evaluate(s, a, distance, distance_max))
            .collect()
    }
}

fn require_far(model: ModelFunction, distance_max: Option<f64>) -> Result<f64, NirsError> {
    distance_max.ok_or_else(|| NirsError::InvalidModel {
        detail: format!("{model:?} requires a far detector distance (distance_max)."),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slope_selection_depends_on_far_distance() {
        let short = select(BoundaryType::Zero, QuantityType::AttenuationSlope, None);
        let long = select(
            BoundaryType::Zero,
            QuantityType::AttenuationSlope,
            Some(45.0),
        );
        assert_eq!(short, ModelFunction::ZbcSlopeShort);
        assert_eq!(long, ModelFunction::ZbcSlopeLong);
    }

    #[test]
    fn far_distance_is_ignored_for_other_quantities() {
        let m = select(
            BoundaryType::Extrapolated,
            QuantityType::Reflectance,
            Some(45.0),
        );
        assert_eq!(m, ModelFunction::EbcReflectance);
    }

    #[test]
    fn long_model_without_far_distance_is_invalid() {
        let m = ModelFunction::EbcSlopeLong;
        let err = m.evaluate(1.0, 0.01, 22.5, None).unwrap_err();
        assert!(matches!(err, NirsError::InvalidModel { .. }));
    }

    #[test]
    fn spectrum_evaluation_matches_scalar() {
        let mu_s = [2.0, 3.0, 4.0];
        let mu_a = [1.0, 2.0, 3.0];
        let m = select(BoundaryType::Zero, QuantityType::Attenuation, None);
        let spectrum = m.evaluate_spectrum(&mu_s, &mu_a, 3.0, None).unwrap();
        for i in 0..3 {
            let scalar = m.evaluate(mu_s[i], mu_a[i], 3.0, None).unwrap();
            assert!((spectrum[i] - scalar).abs() < 1e-15);
        }
    }

    #[test]
    fn ragged_spectra_are_rejected() {
        let m = ModelFunction::ZbcSlopeShort;
        let err = m
            .evaluate_spectrum(&[1.0, 2.0], &[0.1], 22.5, None)
            .unwrap_err();
        assert!(matches!(err, NirsError::Input { .. }));
    }
}
