//! Explicit solver state for one implicit step.
//!
//! Everything the residual and Jacobian need is gathered here and
//! passed by mutable reference into plain functions, so no closure
//! captures hidden context.

use nalgebra::DVector;

use grove_grid::{DofMap, Grid};
use grove_interp::MpValues;
use grove_material::ConstitutiveModel;
use grove_math::faer_solver::FaerLuSolver;
use grove_math::krylov::GmresConfig;
use grove_math::tensor::{self, Matrix, Tangent, Vector};

use crate::config::InversionPolicy;
use crate::particles::ParticleSet;

/// How the residual is scaled, which fixes the Jacobian it pairs with.
#[derive(Debug, Clone)]
pub enum ResidualForm {
    /// `R = m a − f`, paired with the assembled tangent.
    Assembled,
    /// `R = βΔt² (a − f/m)`, paired with the matrix-free product.
    MassScaled { gmres: GmresConfig },
}

/// Newmark-β state for one step.
pub struct NewmarkState<'a, const D: usize> {
    pub grid: &'a mut Grid<D>,
    pub particles: &'a ParticleSet<D>,
    pub mpvalues: &'a MpValues<D>,
    pub model: &'a dyn ConstitutiveModel<D>,
    pub dofmap: DofMap<D>,
    pub dt: f64,
    pub beta: f64,
    pub gamma: f64,
    pub gravity: Vector<D>,
    pub inversion: InversionPolicy,
    pub form: ResidualForm,

    // ─── Per-particle trial quantities at the current iterate ───
    pub displacement_gradient: Vec<Matrix<D>>,
    pub kirchhoff: Vec<Matrix<D>>,
    pub tangent: Vec<Tangent<D>>,

    // ─── Scratch ───
    pub lu: FaerLuSolver,
    pub(crate) increment: Vec<Vector<D>>,
    pub(crate) increment_force: Vec<Vector<D>>,
    /// Linear iterations spent by the last correction.
    pub linear_iterations: usize,
}

impl<'a, const D: usize> NewmarkState<'a, D> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        grid: &'a mut Grid<D>,
        particles: &'a ParticleSet<D>,
        mpvalues: &'a MpValues<D>,
        model: &'a dyn ConstitutiveModel<D>,
        dt: f64,
        beta: f64,
        gamma: f64,
        gravity: Vector<D>,
        inversion: InversionPolicy,
        form: ResidualForm,
    ) -> Self {
        let dofmap = DofMap::from_grid(grid);
        let n = particles.len();
        let nodes = grid.len();
        Self {
            grid,
            particles,
            mpvalues,
            model,
            dofmap,
            dt,
            beta,
            gamma,
            gravity,
            inversion,
            form,
            displacement_gradient: vec![Matrix::<D>::zeros(); n],
            kirchhoff: vec![Matrix::<D>::zeros(); n],
            tangent: vec![tensor::zero_tangent::<D>(); n],
            lu: FaerLuSolver::new(),
            increment: vec![Vector::<D>::zeros(); nodes],
            increment_force: vec![Vector::<D>::zeros(); nodes],
            linear_iterations: 0,
        }
    }

    /// Number of unknowns.
    pub fn ndofs(&self) -> usize {
        self.dofmap.ndofs()
    }

    /// `1 / (β Δt²)`.
    #[inline]
    pub fn mass_coefficient(&self) -> f64 {
        1.0 / (self.beta * self.dt * self.dt)
    }

    /// Consumes the state, returning the per-particle `(∇u, τ, c)` at the
    /// last evaluated iterate.
    pub fn into_trial(self) -> (Vec<Matrix<D>>, Vec<Matrix<D>>, Vec<Tangent<D>>) {
        (self.displacement_gradient, self.kirchhoff, self.tangent)
    }

    /// Zero initial guess for the displacement unknowns.
    pub fn initial_guess(&self) -> DVector<f64> {
        DVector::zeros(self.ndofs())
    }
}
