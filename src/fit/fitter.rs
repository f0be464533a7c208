//! Fit orchestration: from a measured attenuation-slope spectrum to StO2
//! and fit-quality diagnostics.
//!
//! The pipeline per sample:
//!
//! 1. smooth the raw slope (centered moving average, span 5)
//! 2. first-difference it to form the objective's target
//! 3. run the bounded simplex search over the parameter box
//! 4. re-evaluate the model at the fitted coefficients and score the fit
//!
//! Non-convergence is fatal for the fit (no silent fallback, no retry). The
//! one tolerated degenerate case is a fully fixed parameter box, which
//! skips the search and scores the fixed point under a warning.

use rayon::prelude::*;

use crate::domain::{Boundaries, BoundaryType, Coefficients, ExtinctionTable, QuantityType, TissueFit};
use crate::error::NirsError;
use crate::fit::bounded::{minimize_bounded, SimplexOptions};
use crate::fit::objective::SlopeObjective;
use crate::math::{exact_index, first_difference, smooth};
use crate::models::{scattering_spectrum, select};

/// Smoothing span for the measured slope (odd, symmetric edges).
const SMOOTH_SPAN: usize = 5;

/// Fitting window, nm. Scores from different windows are not comparable.
const WAVE_START: f64 = 710.0;
const WAVE_END: f64 = 900.0;

/// Scoring bands, nm: the HHb feature and the water feature. Fixed
/// regardless of separation geometry.
const HHB_BAND: (f64, f64) = (750.0, 770.0);
const WATER_BAND: (f64, f64) = (825.0, 840.0);

/// Per-fit configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSettings {
    pub boundary: BoundaryType,
    /// Source-detector separation, mm (near distance when `distance_max`
    /// is set).
    pub distance: f64,
    /// Far detector distance, mm; selects the long-separation slope model.
    pub distance_max: Option<f64>,
    pub simplex: SimplexOptions,
}

impl FitSettings {
    pub fn new(boundary: BoundaryType, distance: f64) -> Self {
        Self {
            boundary,
            distance,
            distance_max: None,
            simplex: SimplexOptions::default(),
        }
    }
}

/// Fit one attenuation-slope spectrum.
///
/// `slope` is the measured attenuation slope per wavelength (same grid as
/// `extinction`). Returns the fitted coefficients, StO2 and fit-quality
/// diagnostics, or fails with `FitConvergence` if the search exhausts its
/// budget.
pub fn fit_tissue(
    slope: &[f64],
    extinction: &ExtinctionTable,
    boundaries: &Boundaries,
    settings: &FitSettings,
) -> Result<TissueFit, NirsError> {
    if slope.len() != extinction.len() {
        return Err(NirsError::Input {
            message: format!(
                "Slope spectrum has {} samples but the extinction table has {}.",
                slope.len(),
                extinction.len()
            ),
        });
    }

    let target = first_difference(&smooth(slope, SMOOTH_SPAN));

    let objective = SlopeObjective {
        boundary: settings.boundary,
        quantity: QuantityType::AttenuationSlope,
        slope_diff: &target,
        extinction,
        distance: settings.distance,
        distance_max: settings.distance_max,
        wave_start: WAVE_START,
        wave_end: WAVE_END,
    };

    let solution = minimize_bounded(
        |param| objective.evaluate(param),
        &boundaries.start,
        &boundaries.lower,
        &boundaries.upper,
        &settings.simplex,
    )?;

    if solution.all_fixed {
        log::warn!(
            "all fit parameters are bound-fixed; scoring the fixed point without optimization"
        );
    } else if !solution.converged {
        return Err(NirsError::FitConvergence {
            detail: format!(
                "simplex search did not meet tolerance within {} iterations",
                solution.iterations
            ),
        });
    }

    let coefficients = Coefficients::from_slice(&solution.x)?;
    let wavelengths = extinction.wavelengths();
    let mu_a = extinction.absorption(
        coefficients.water_fraction,
        coefficients.hhb,
        coefficients.hbo2,
    );
    let mu_s = scattering_spectrum(
        wavelengths,
        coefficients.scatter_amplitude,
        coefficients.scatter_power,
    );

    let model = select(
        settings.boundary,
        QuantityType::AttenuationSlope,
        settings.distance_max,
    );
    let spectrum =
        model.evaluate_spectrum(&mu_s, &mu_a, settings.distance, settings.distance_max)?;
    let model_diff = first_difference(&spectrum);

    let quality = diagnostics(&model_diff, &target, wavelengths)?;

    Ok(TissueFit {
        sto2: coefficients.sto2(),
        coefficients,
        residual: quality.residual,
        residual_norm: quality.residual_norm,
        sum_residual: quality.sum_residual,
        score: quality.score,
    })
}

/// Fit a series of slope spectra (one per time sample) in parallel.
///
/// Each fit is independent and stateless, so samples are distributed across
/// the rayon pool; per-sample failures do not abort the rest of the series.
pub fn fit_tissue_series(
    slopes: &[Vec<f64>],
    extinction: &ExtinctionTable,
    boundaries: &Boundaries,
    settings: &FitSettings,
) -> Vec<Result<TissueFit, NirsError>> {
    slopes
        .par_iter()
        .map(|slope| fit_tissue(slope, extinction, boundaries, settings))
        .collect()
}

struct Diagnostics {
    residual: Vec<f64>,
    residual_norm: Vec<f64>,
    sum_residual: f64,
    score: f64,
}

/// Fit-quality scoring over the differenced spectra.
///
/// `residual_norm` is normalized by the peak of the model difference; the
/// score multiplies the normalized residual mass in the HHb and water bands
/// and divides by the dynamic range of the window-normalized model
/// difference, so flat model curves are penalized.
fn diagnostics(
    model_diff: &[f64],
    target: &[f64],
    wavelengths: &[f64],
) -> Result<Diagnostics, NirsError> {
    if model_diff.len() != target.len() {
        return Err(NirsError::Input {
            message: format!(
                "Model and target differences disagree in length: {} vs {}.",
                model_diff.len(),
                target.len()
            ),
        });
    }

    let peak = model_diff.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let residual: Vec<f64> = model_diff
        .iter()
        .zip(target.iter())
        .map(|(m, t)| (m - t) * (m - t))
        .collect();
    let residual_norm: Vec<f64> = model_diff
        .iter()
        .zip(target.iter())
        .map(|(m, t)| {
            let d = m / peak - t / peak;
            d * d
        })
        .collect();
    let sum_residual = residual.iter().sum();

    let last = residual_norm.len().saturating_sub(1);
    let band_sum = |band: (f64, f64)| -> Result<f64, NirsError> {
        let lo = exact_index(wavelengths, band.0)?;
        let hi = exact_index(wavelengths, band.1)?.min(last);
        Ok(residual_norm[lo..=hi].iter().sum())
    };
    let hhb_sum = band_sum(HHB_BAND)?;
    let water_sum = band_sum(WATER_BAND)?;

    let lo = exact_index(wavelengths, WAVE_START)?;
    let hi = exact_index(wavelengths, WAVE_END)?.min(last);
    let window = &model_diff[lo..=hi];
    let window_peak = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let normalized: Vec<f64> = window.iter().map(|v| v / window_peak).collect();
    let range = normalized.iter().copied().fold(f64::NEG_INFINITY, f64::max)
        - normalized.iter().copied().fold(f64::INFINITY, f64::min);

    Ok(Diagnostics {
        residual,
        residual_norm,
        sum_residual,
        score: hhb_sum * water_sum / range,
    })
}
