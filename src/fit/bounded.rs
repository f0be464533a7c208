//! Box-constrained Nelder-Mead minimization.
//!
//! The simplex method is inherently unconstrained, so box constraints are
//! handled by a change of variables (the classic `fminsearchbnd` technique):
//! each bounded variable is mapped to an unconstrained surrogate, the
//! simplex runs in surrogate space, and every objective evaluation first
//! maps the candidate back into the box. The transform depends only on
//! which bounds are finite:
//!
//! - no bounds: passthrough
//! - lower bound only: `x = lower + u^2`
//! - upper bound only: `x = upper - u^2`
//! - both bounds: `x = lower + (upper - lower) * (sin(u) + 1) / 2`, clamped
//! - `lower == upper`: the variable is fixed and dropped from the search
//!   vector entirely
//!
//! The classification is derived once per call and immutable for that run.
//! Everything here is call-scoped (iteration counts are returned in the
//! solution rather than accumulated in shared state), so concurrent fits
//! are safe.

use argmin::core::{CostFunction, Executor};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin::solver::neldermead::NelderMead;

use crate::error::NirsError;

/// How a single variable is constrained, derived from its `(lower, upper)`
/// pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundClass {
    /// Both bounds infinite.
    Unconstrained,
    /// Finite lower bound only.
    LowerOnly,
    /// Finite upper bound only.
    UpperOnly,
    /// Both bounds finite with `lower < upper`.
    Bounded,
    /// `lower == upper`: the variable does not participate in the search.
    Fixed,
}

/// Classify one variable's bounds.
pub fn classify_bound(lower: f64, upper: f64) -> BoundClass {
    match (lower.is_finite(), upper.is_finite()) {
        (false, false) => BoundClass::Unconstrained,
        (true, false) => BoundClass::LowerOnly,
        (false, true) => BoundClass::UpperOnly,
        (true, true) => {
            if lower == upper {
                BoundClass::Fixed
            } else {
                BoundClass::Bounded
            }
        }
    }
}

/// The forward/inverse variable transform for one optimizer run.
#[derive(Debug, Clone)]
pub struct BoundTransform {
    lower: Vec<f64>,
    upper: Vec<f64>,
    classes: Vec<BoundClass>,
}

impl BoundTransform {
    /// Build the transform from resolved (possibly infinite) bound vectors.
    ///
    /// `lower` and `upper` must have equal length; a finite pair with
    /// `lower > upper` is rejected.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, NirsError> {
        debug_assert_eq!(lower.len(), upper.len());
        for (i, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if lo.is_finite() && hi.is_finite() && lo > hi {
                return Err(NirsError::Input {
                    message: format!(
                        "Lower bound exceeds upper bound for variable {i}: {lo} > {hi}."
                    ),
                });
            }
        }
        let classes = lower
            .iter()
            .zip(upper.iter())
            .map(|(&lo, &hi)| classify_bound(lo, hi))
            .collect();
        Ok(Self {
            lower,
            upper,
            classes,
        })
    }

    pub fn classes(&self) -> &[BoundClass] {
        &self.classes
    }

    /// Number of variables that actually enter the search.
    pub fn free_len(&self) -> usize {
        self.classes
            .iter()
            .filter(|c| **c != BoundClass::Fixed)
            .count()
    }

    /// Map a constrained starting point into surrogate space.
    ///
    /// Infeasible starts are pinned per-variable: at or below a lower bound
    /// the surrogate is 0 (or -pi/2 for two-sided bounds), at or above an
    /// upper bound 0 (or +pi/2). Fixed variables are dropped.
    pub fn to_unconstrained(&self, x: &[f64]) -> Vec<f64> {
        use std::f64::consts::{FRAC_PI_2, PI};

        let mut out = Vec::with_capacity(self.free_len());
        for (i, class) in self.classes.iter().enumerate() {
            match class {
                BoundClass::Unconstrained => out.push(x[i]),
                BoundClass::LowerOnly => out.push(if x[i] <= self.lower[i] {
                    0.0
                } else {
                    (x[i] - self.lower[i]).sqrt()
                }),
                BoundClass::UpperOnly => out.push(if x[i] >= self.upper[i] {
                    0.0
                } else {
                    (self.upper[i] - x[i]).sqrt()
                }),
                BoundClass::Bounded => {
                    let u = if x[i] <= self.lower[i] {
                        -FRAC_PI_2
                    } else if x[i] >= self.upper[i] {
                        FRAC_PI_2
                    } else {
                        let t = 2.0 * (x[i] - self.lower[i]) / (self.upper[i] - self.lower[i])
                            - 1.0;
                        // Shifted by 2*pi: a surrogate at exactly zero would
                        // seed a vanishingly small initial simplex.
                        2.0 * PI + t.clamp(-1.0, 1.0).asin()
                    };
                    out.push(u);
                }
                BoundClass::Fixed => {}
            }
        }
        out
    }

    /// Map a surrogate vector back into the constrained box.
    pub fn to_constrained(&self, u: &[f64]) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.classes.len());
        let mut k = 0;
        for (i, class) in self.classes.iter().enumerate() {
            match class {
                BoundClass::Unconstrained => {
                    out.push(u[k]);
                    k += 1;
                }
                BoundClass::LowerOnly => {
                    out.push(self.lower[i] + u[k] * u[k]);
                    k += 1;
                }
                BoundClass::UpperOnly => {
                    out.push(self.upper[i] - u[k] * u[k]);
                    k += 1;
                }
                BoundClass::Bounded => {
                    let span = self.upper[i] - self.lower[i];
                    let x = self.lower[i] + span * (u[k].sin() + 1.0) / 2.0;
                    // sin keeps x inside the box up to rounding; the clamp
                    // removes the rounding.
                    out.push(x.clamp(self.lower[i], self.upper[i]));
                    k += 1;
                }
                BoundClass::Fixed => out.push(self.lower[i]),
            }
        }
        out
    }
}

/// Simplex search options.
///
/// `sd_tolerance` is the convergence threshold on the standard deviation of
/// the objective across simplex vertices. The iteration cap and the
/// optional wall-clock deadline are the only interruption mechanisms; both
/// surface as non-convergence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplexOptions {
    pub max_iters: u64,
    pub sd_tolerance: f64,
    pub deadline: Option<std::time::Duration>,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            max_iters: 200_000,
            sd_tolerance: 1e-10,
            deadline: None,
        }
    }
}

/// Result of a bounded minimization.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedSolution {
    /// Solution in constrained space, same length as the start vector.
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub value: f64,
    /// Whether the simplex met tolerance within the iteration budget. False
    /// when every variable was fixed (no search was attempted).
    pub converged: bool,
    /// Simplex iterations consumed (call-scoped, never shared).
    pub iterations: u64,
    /// Every variable was bound-fixed; `x` is the fixed point.
    pub all_fixed: bool,
}

struct TransformedCost<'a, F> {
    transform: &'a BoundTransform,
    objective: &'a F,
}

impl<F> CostFunction for TransformedCost<'_, F>
where
    F: Fn(&[f64]) -> Result<f64, NirsError>,
{
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, u: &Self::Param) -> Result<f64, argmin::core::Error> {
        let x = self.transform.to_constrained(u);
        (self.objective)(&x).map_err(argmin::core::Error::from)
    }
}

/// Minimize `objective` over the box `[lower, upper]` starting from `start`.
///
/// Empty bound slices mean "unbounded on that side". Objective errors abort
/// the search and surface unchanged, so a bad wavelength grid is caught on
/// the first evaluation rather than after a full search.
///
/// Non-convergence is reported through `BoundedSolution::converged`, not an
/// error: escalation is the caller's decision (the fit orchestrator treats
/// it as fatal).
pub fn minimize_bounded<F>(
    objective: F,
    start: &[f64],
    lower: &[f64],
    upper: &[f64],
    options: &SimplexOptions,
) -> Result<BoundedSolution, NirsError>
where
    F: Fn(&[f64]) -> Result<f64, NirsError>,
{
    let n = start.len();
    if (!lower.is_empty() && lower.len() != n) || (!upper.is_empty() && upper.len() != n) {
        return Err(NirsError::BoundsShape {
            start: n,
            lower: lower.len(),
            upper: upper.len(),
        });
    }

    let lower = resolve_bounds(lower, n, f64::NEG_INFINITY);
    let upper = resolve_bounds(upper, n, f64::INFINITY);
    let transform = BoundTransform::new(lower, upper)?;

    let start_u = transform.to_unconstrained(start);
    if start_u.is_empty() {
        // All variables fixed: nothing to search. Callers decide how loudly
        // to surface the degenerate case.
        let value = objective(start)?;
        log::debug!("all {n} variables are bound-fixed; returning the fixed point unsearched");
        return Ok(BoundedSolution {
            x: start.to_vec(),
            value,
            converged: false,
            iterations: 0,
            all_fixed: true,
        });
    }

    let solver: NelderMead<Vec<f64>, f64> = NelderMead::new(initial_simplex(&start_u))
        .with_sd_tolerance(options.sd_tolerance)
        .map_err(into_nirs_error)?;

    let cost = TransformedCost {
        transform: &transform,
        objective: &objective,
    };

    let mut executor =
        Executor::new(cost, solver).configure(|state| state.max_iters(options.max_iters));
    if let Some(deadline) = options.deadline {
        executor = executor.timeout(deadline);
    }
    let result = executor.run().map_err(into_nirs_error)?;

    let state = result.state;
    let best_u = state.best_param.ok_or_else(|| NirsError::FitConvergence {
        detail: "simplex search produced no candidate".to_string(),
    })?;

    let converged = matches!(
        state.termination_status,
        TerminationStatus::Terminated(TerminationReason::SolverConverged)
    );
    log::debug!(
        "simplex search finished after {} iterations (converged: {converged})",
        state.iter
    );

    Ok(BoundedSolution {
        x: transform.to_constrained(&best_u),
        value: state.best_cost,
        converged,
        iterations: state.iter,
        all_fixed: false,
    })
}

/// Expand an optional bound slice to length `n`, filling with `fill` when
/// the caller passed no bounds at all.
fn resolve_bounds(bounds: &[f64], n: usize, fill: f64) -> Vec<f64> {
    if bounds.is_empty() {
        vec![fill; n]
    } else {
        bounds.to_vec()
    }
}

/// Initial simplex: the start plus one vertex per coordinate, perturbed by
/// 5% (0.001 where the coordinate is zero).
fn initial_simplex(start: &[f64]) -> Vec<Vec<f64>> {
    let mut vertices = Vec::with_capacity(start.len() + 1);
    vertices.push(start.to_vec());
    for i in 0..start.len() {
        let step = if start[i] == 0.0 {
            0.001
        } else {
            0.05 * start[i].abs()
        };
        let mut vertex = start.to_vec();
        vertex[i] += step;
        vertices.push(vertex);
    }
    vertices
}

fn into_nirs_error(e: argmin::core::Error) -> NirsError {
    match e.downcast::<NirsError>() {
        Ok(nirs) => nirs,
        Err(other) => NirsError::FitConvergence {
            detail: other.to_string(),
        },
    }
}
