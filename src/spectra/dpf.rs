//! Differential pathlength factor from diffusion theory.

/// DPF at one wavelength sample:
///
/// `0.5 * sqrt(3*mu_s/mu_a) * (1 - 1/(1 + sqrt(d * 3*mu_a*mu_s)))`
///
/// (Scholkmann & Wolf, J. Biomed. Opt. 18(10), 105004.)
pub fn differential_pathlength_factor(mu_s: f64, mu_a: f64, distance: f64) -> f64 {
    0.5 * (3.0 * mu_s / mu_a).sqrt()
        * (1.0 - 1.0 / (1.0 + (distance * 3.0 * mu_a * mu_s).sqrt()))
}

/// DPF over a spectrum of optical coefficients.
pub fn differential_pathlength_spectrum(
    mu_s: &[f64],
    mu_a: &[f64],
    distance: f64,
) -> Vec<f64> {
    mu_s.iter()
        .zip(mu_a.iter())
        .map(|(&s, &a)| differential_pathlength_factor(s, a, distance))
        .collect()
}
