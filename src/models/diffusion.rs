//! Closed-form diffusion-theory models.
//!
//! Two boundary-condition families are supported, each exposing reflectance,
//! attenuation and attenuation-slope at a source-detector distance `rho`:
//!
//! - **Zero boundary condition (ZBC)**: the fluence vanishes at the tissue
//!   surface. Attenuation has a fully explicit logarithmic form.
//! - **Extrapolated boundary condition (EBC)**: an image source mirrored
//!   about an extrapolated plane at `2*zb` above the surface
//!   (Kienle 1997, J. Opt. Soc. Am. A 14:1, valid for biological tissue).
//!
//! Slopes come in two geometries: the *short-separation* form is the
//! analytic derivative of attenuation with respect to `rho`; the
//! *long-separation* form is the attenuation secant between a near and a far
//! detector divided by their spacing.
//!
//! The EBC short-separation slope was derived symbolically offline and is
//! embedded here as a closed form; there is no runtime symbolic algebra.
//!
//! Units: `mu_s` (reduced scattering) and `mu_a` (absorption) in 1/mm,
//! distances in mm. All functions are pure; spectrum evaluation maps the
//! scalar forms over a grid (see `select::ModelFunction::evaluate_spectrum`).

use std::f64::consts::{LN_10, PI};

/// Effective attenuation coefficient `sqrt(3 * mu_a * mu_s)`.
#[inline]
fn mu_eff(mu_s: f64, mu_a: f64) -> f64 {
    (3.0 * mu_a * mu_s).sqrt()
}

/// Extrapolation distance `zb` for the EBC family.
///
/// `(1 + R_eff) / (1 - R_eff) * 2 * D` with `R_eff = 0.493` and the
/// diffusion constant `D = 1 / (3 * (mu_a + mu_s))`.
#[inline]
fn zb(mu_s: f64, mu_a: f64) -> f64 {
    let d = 1.0 / (3.0 * (mu_a + mu_s));
    (1.0 + 0.493) / (1.0 - 0.493) * 2.0 * d
}

/// ZBC diffuse reflectance at distance `rho`.
pub fn zbc_reflectance(mu_s: f64, mu_a: f64, rho: f64) -> f64 {
    let z0 = 1.0 / mu_s;
    let mueff = mu_eff(mu_s, mu_a);
    z0 * mueff * (-mueff * rho).exp() / (2.0 * PI * rho * rho)
}

/// ZBC attenuation (`-log10` of reflectance, in explicit form).
pub fn zbc_attenuation(mu_s: f64, mu_a: f64, rho: f64) -> f64 {
    let z0 = 1.0 / mu_s;
    let mueff = mu_eff(mu_s, mu_a);
    (mueff * rho + 2.0 * rho.ln() - (z0 * mueff / (2.0 * PI)).ln()) / LN_10
}

/// ZBC attenuation slope `d(attenuation)/d(rho)` at a single distance.
pub fn zbc_attenuation_slope_short(mu_s: f64, mu_a: f64, rho: f64) -> f64 {
    (mu_eff(mu_s, mu_a) + 2.0 / rho) / LN_10
}

/// ZBC attenuation secant between a near detector `d_s` and a far detector
/// `d_l`, divided by the spacing.
pub fn zbc_attenuation_slope_long(mu_s: f64, mu_a: f64, d_s: f64, d_l: f64) -> f64 {
    (mu_eff(mu_s, mu_a) + 2.0 * (d_l / d_s).ln() / (d_l - d_s)) / LN_10
}

/// Radial source/image-source contribution to the EBC reflectance.
///
/// `T(r) = (mueff / r^2 + 1 / r^3) * exp(-mueff * r)`
#[inline]
fn ebc_term(mueff: f64, r: f64) -> f64 {
    (mueff / (r * r) + 1.0 / (r * r * r)) * (-mueff * r).exp()
}

/// Derivative of `ebc_term` with respect to `r`:
///
/// `T'(r) = -(mueff^2 / r^2 + 3 mueff / r^3 + 3 / r^4) * exp(-mueff * r)`
#[inline]
fn ebc_term_deriv(mueff: f64, r: f64) -> f64 {
    let r2 = r * r;
    -(mueff * mueff / r2 + 3.0 * mueff / (r2 * r) + 3.0 / (r2 * r2)) * (-mueff * r).exp()
}

/// EBC diffuse reflectance at distance `rho`.
///
/// `r1^2 = z0^2 + rho^2` is approximated by `rho^2` (`z0^2` is negligible at
/// the separations used here); the image source sits at `z0 + 2*zb`.
pub fn ebc_reflectance(mu_s: f64, mu_a: f64, rho: f64) -> f64 {
    let z0 = 1.0 / mu_s;
    let mueff = mu_eff(mu_s, mu_a);
    let z_img = z0 + 2.0 * zb(mu_s, mu_a);
    let r1 = rho;
    let r2 = (z_img * z_img + rho * rho).sqrt();
    (z0 * ebc_term(mueff, r1) + z_img * ebc_term(mueff, r2)) / (4.0 * PI)
}

/// EBC attenuation: `-log10(reflectance)`.
pub fn ebc_attenuation(mu_s: f64, mu_a: f64, rho: f64) -> f64 {
    -ebc_reflectance(mu_s, mu_a, rho).log10()
}

/// EBC attenuation slope `d(attenuation)/d(rho)` at a single distance.
///
/// Closed form of `-(dR/drho) / (R * ln10)`, expanded through the two
/// radial terms (`dr1/drho = 1`, `dr2/drho = rho / r2`).
pub fn ebc_attenuation_slope_short(mu_s: f64, mu_a: f64, rho: f64) -> f64 {
    let z0 = 1.0 / mu_s;
    let mueff = mu_eff(mu_s, mu_a);
    let z_img = z0 + 2.0 * zb(mu_s, mu_a);
    let r1 = rho;
    let r2 = (z_img * z_img + rho * rho).sqrt();

    let refl = z0 * ebc_term(mueff, r1) + z_img * ebc_term(mueff, r2);
    let refl_deriv =
        z0 * ebc_term_deriv(mueff, r1) + z_img * ebc_term_deriv(mueff, r2) * (rho / r2);

    -refl_deriv / (refl * LN_10)
}

/// EBC attenuation secant between `d_s` and `d_l`, divided by the spacing.
pub fn ebc_attenuation_slope_long(mu_s: f64, mu_a: f64, d_s: f64, d_l: f64) -> f64 {
    (ebc_attenuation(mu_s, mu_a, d_l) - ebc_attenuation(mu_s, mu_a, d_s)) / (d_l - d_s)
}

/// Reduced scattering spectrum from the power-law model
/// `mu_s' = a * (lambda_nm / 1000)^(-b)` (wavelength converted to um).
pub fn scattering_spectrum(wavelengths: &[f64], amplitude: f64, power: f64) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&wl| amplitude * (wl * 0.001).powf(-power))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Spot checks at fixed calibration points: mu_s = [2,3,4],
    // mu_a = [1,2,3], rho = 3, d_s = 15, d_l = 30.
    const MU_S: [f64; 3] = [2.0, 3.0, 4.0];
    const MU_A: [f64; 3] = [1.0, 2.0, 3.0];
    const RHO: f64 = 3.0;
    const D_S: f64 = 15.0;
    const D_L: f64 = 30.0;

    fn assert_close(actual: f64, expected: f64, rel: f64) {
        let scale = expected.abs().max(1e-300);
        assert!(
            ((actual - expected) / scale).abs() < rel,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn zbc_reflectance_matches_calibration() {
        let expected = [1.393874e-5, 7.420383e-8, 4.039878e-10];
        for i in 0..3 {
            assert_close(zbc_reflectance(MU_S[i], MU_A[i], RHO), expected[i], 1e-5);
        }
    }

    #[test]
    fn zbc_attenuation_matches_calibration() {
        let expected = [4.855776, 7.129574, 9.393632];
        for i in 0..3 {
            assert_close(zbc_attenuation(MU_S[i], MU_A[i], RHO), expected[i], 1e-5);
        }
    }

    #[test]
    fn zbc_slopes_match_calibration() {
        let short = [1.353330, 2.132085, 2.895297];
        let long = [1.103937, 1.882693, 2.645904];
        for i in 0..3 {
            assert_close(
                zbc_attenuation_slope_short(MU_S[i], MU_A[i], RHO),
                short[i],
                1e-5,
            );
            assert_close(
                zbc_attenuation_slope_long(MU_S[i], MU_A[i], D_S, D_L),
                long[i],
                1e-5,
            );
        }
    }

    #[test]
    fn ebc_reflectance_matches_calibration() {
        let expected = [1.393817e-5, 8.987674e-8, 5.504152e-10];
        for i in 0..3 {
            assert_close(ebc_reflectance(MU_S[i], MU_A[i], RHO), expected[i], 1e-5);
        }
    }

    #[test]
    fn ebc_attenuation_matches_calibration() {
        let expected = [4.855794, 7.046353, 9.259310];
        for i in 0..3 {
            assert_close(ebc_attenuation(MU_S[i], MU_A[i], RHO), expected[i], 1e-5);
        }
    }

    #[test]
    fn ebc_slopes_match_calibration() {
        let short = [1.268635, 2.057596, 2.835072];
        let long = [1.101220, 1.880922, 2.644598];
        for i in 0..3 {
            assert_close(
                ebc_attenuation_slope_short(MU_S[i], MU_A[i], RHO),
                short[i],
                1e-5,
            );
            assert_close(
                ebc_attenuation_slope_long(MU_S[i], MU_A[i], D_S, D_L),
                long[i],
                1e-5,
            );
        }
    }

    #[test]
    fn ebc_short_slope_agrees_with_secant_limit() {
        // The analytic derivative should match a tight secant around rho.
        let (mu_s, mu_a, rho) = (1.2, 0.015, 22.5);
        let h = 1e-6;
        let secant =
            (ebc_attenuation(mu_s, mu_a, rho + h) - ebc_attenuation(mu_s, mu_a, rho - h))
                / (2.0 * h);
        assert_close(ebc_attenuation_slope_short(mu_s, mu_a, rho), secant, 1e-6);
    }

    #[test]
    fn scattering_spectrum_follows_power_law() {
        let mu_s = scattering_spectrum(&[500.0, 1000.0, 2000.0], 2.0, 1.0);
        assert_close(mu_s[0], 4.0, 1e-12);
        assert_close(mu_s[1], 2.0, 1e-12);
        assert_close(mu_s[2], 1.0, 1e-12);
    }
}
