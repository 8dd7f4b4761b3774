//! Newton-Raphson driver.
//!
//! The nonlinear problem is described by two callbacks that receive the
//! solver state by explicit mutable reference:
//!
//! - `residual(u, state)` evaluates `R(u)`
//! - `correction(u, r, state)` returns `δu` solving `J(u) δu = −r`
//!
//! The driver iterates `u ← u + δu` until the residual norm meets the
//! absolute or relative tolerance, or the iteration limit is reached.
//! The reported residual is always the one at the final iterate.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use grove_types::GroveResult;

/// Newton iteration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewtonConfig {
    /// Maximum number of corrections per solve.
    pub max_iterations: u32,
    /// Converged when `‖R‖ ≤ abs_tolerance`.
    pub abs_tolerance: f64,
    /// Converged when `‖R‖ ≤ rel_tolerance · ‖R₀‖`.
    pub rel_tolerance: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: grove_types::constants::DEFAULT_NEWTON_ITERATIONS,
            abs_tolerance: 1e-10,
            rel_tolerance: 1e-8,
        }
    }
}

/// Result of a Newton solve.
#[derive(Debug, Clone)]
pub struct NewtonReport {
    /// Number of corrections applied.
    pub iterations: u32,
    /// Residual norm at the initial guess.
    pub initial_residual: f64,
    /// Residual norm at the final iterate.
    pub residual: f64,
    /// Whether a tolerance was met.
    pub converged: bool,
    /// Residual norm after each evaluation, starting with the initial one.
    pub history: Vec<f64>,
}

impl NewtonConfig {
    fn is_converged(&self, norm: f64, initial: f64) -> bool {
        norm <= self.abs_tolerance || (initial > 0.0 && norm <= self.rel_tolerance * initial)
    }
}

/// Runs Newton-Raphson on `u` in place.
///
/// Errors raised by either callback abort the solve and are propagated.
/// Running out of iterations is not an error; inspect
/// [`NewtonReport::converged`].
pub fn newton_solve<S, R, C>(
    u: &mut DVector<f64>,
    state: &mut S,
    mut residual: R,
    mut correction: C,
    config: &NewtonConfig,
) -> GroveResult<NewtonReport>
where
    R: FnMut(&DVector<f64>, &mut S) -> GroveResult<DVector<f64>>,
    C: FnMut(&DVector<f64>, &DVector<f64>, &mut S) -> GroveResult<DVector<f64>>,
{
    let mut r = residual(u, state)?;
    let initial = r.norm();
    let mut norm = initial;
    let mut history = vec![initial];
    let mut iterations = 0;

    loop {
        let converged = config.is_converged(norm, initial);
        if converged || iterations >= config.max_iterations || !norm.is_finite() {
            return Ok(NewtonReport {
                iterations,
                initial_residual: initial,
                residual: norm,
                converged,
                history,
            });
        }

        let du = correction(u, &r, state)?;
        *u += du;
        iterations += 1;

        r = residual(u, state)?;
        norm = r.norm();
        history.push(norm);
        tracing::debug!(iteration = iterations, residual = norm, "newton iteration");
    }
}
