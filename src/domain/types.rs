//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they
//! can be:
//!
//! - used in-memory during fitting
//! - exported to JSON for downstream plotting or comparisons

use serde::{Deserialize, Serialize};

use crate::error::NirsError;

/// Number of parameters in the fitted vector:
/// `[water_fraction, HHb, HbO2, scatter_amplitude, scatter_power]`.
pub const PARAM_COUNT: usize = 5;

/// Boundary condition family for the photon-diffusion model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryType {
    /// Zero boundary condition: fluence vanishes at the tissue surface.
    Zero,
    /// Extrapolated boundary condition: fluence vanishes at an extrapolated
    /// plane above the surface (Kienle 1997, valid for biological tissue).
    Extrapolated,
}

/// Which optical quantity a model evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityType {
    Reflectance,
    Attenuation,
    AttenuationSlope,
}

/// Fitted parameter vector with named components.
///
/// Scattering follows the power law `mu_s' = a * lambda_um^(-b)` with the
/// wavelength in micrometers; concentrations are in the units of the
/// extinction table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    pub water_fraction: f64,
    pub hhb: f64,
    pub hbo2: f64,
    pub scatter_amplitude: f64,
    pub scatter_power: f64,
}

impl Coefficients {
    /// Interpret a raw parameter vector.
    pub fn from_slice(param: &[f64]) -> Result<Self, NirsError> {
        if param.len() != PARAM_COUNT {
            return Err(NirsError::Input {
                message: format!(
                    "Expected a parameter vector of length {PARAM_COUNT}, got {}.",
                    param.len()
                ),
            });
        }
        Ok(Self {
            water_fraction: param[0],
            hhb: param[1],
            hbo2: param[2],
            scatter_amplitude: param[3],
            scatter_power: param[4],
        })
    }

    pub fn to_array(self) -> [f64; PARAM_COUNT] {
        [
            self.water_fraction,
            self.hhb,
            self.hbo2,
            self.scatter_amplitude,
            self.scatter_power,
        ]
    }

    /// Tissue oxygen saturation in percent: `HbO2 / (HHb + HbO2) * 100`.
    pub fn sto2(self) -> f64 {
        self.hbo2 / (self.hhb + self.hbo2) * 100.0
    }
}

/// Search box for the fitted parameters: a start row plus componentwise
/// lower and upper bounds.
///
/// The rows are ordered like `Coefficients`. A start outside its bounds is
/// treated as infeasible per-variable by the optimizer (pinned to the
/// nearest bound), and `lower == upper` fixes that variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boundaries {
    pub start: [f64; PARAM_COUNT],
    pub lower: [f64; PARAM_COUNT],
    pub upper: [f64; PARAM_COUNT],
}

impl Default for Boundaries {
    /// Calibration defaults for adult tissue.
    fn default() -> Self {
        Self {
            start: [1.0, 20.0, 20.0, 1.0, 3.0],
            lower: [0.97, 0.0, 0.0, 0.0, 0.0],
            upper: [1.0, 40.0, 40.0, 2.0, 4.0],
        }
    }
}

/// Wavelength-indexed extinction coefficients for the chromophores the
/// derivative fit resolves.
///
/// Columns are read-only during a fit. Hemoglobin columns are in
/// base-10 extinction units (the absorption synthesis multiplies them by
/// `ln 10`); the water column is already an absorption coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtinctionTable {
    wavelengths: Vec<f64>,
    hhb: Vec<f64>,
    hbo2: Vec<f64>,
    water: Vec<f64>,
}

impl ExtinctionTable {
    pub fn new(
        wavelengths: Vec<f64>,
        hhb: Vec<f64>,
        hbo2: Vec<f64>,
        water: Vec<f64>,
    ) -> Result<Self, NirsError> {
        let n = wavelengths.len();
        if hhb.len() != n || hbo2.len() != n || water.len() != n {
            return Err(NirsError::Input {
                message: format!(
                    "Extinction columns disagree in length: wavelengths={n}, HHb={}, HbO2={}, water={}.",
                    hhb.len(),
                    hbo2.len(),
                    water.len()
                ),
            });
        }
        Ok(Self {
            wavelengths,
            hhb,
            hbo2,
            water,
        })
    }

    pub fn len(&self) -> usize {
        self.wavelengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths.is_empty()
    }

    /// Ascending wavelength grid in nanometers.
    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    /// Absorption spectrum for a candidate tissue composition:
    ///
    /// `mu_a = water_frac * ext_water + ln10 * (hhb * ext_hhb + hbo2 * ext_hbo2)`
    pub fn absorption(&self, water_fraction: f64, hhb: f64, hbo2: f64) -> Vec<f64> {
        let ln10 = std::f64::consts::LN_10;
        (0..self.len())
            .map(|i| {
                water_fraction * self.water[i]
                    + ln10 * (hhb * self.hhb[i] + hbo2 * self.hbo2[i])
            })
            .collect()
    }
}

/// Output of a single tissue fit. Produced once per fit call; immutable
/// thereafter.
///
/// `residual` and `residual_norm` are per-sample squared deviations over the
/// differenced spectrum; `score` is unitless and window-dependent, so scores
/// are only comparable between fits that used the same wavelength windows.
/// Lower is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TissueFit {
    pub sto2: f64,
    pub coefficients: Coefficients,
    pub residual: Vec<f64>,
    pub residual_norm: Vec<f64>,
    pub sum_residual: f64,
    pub score: f64,
}
