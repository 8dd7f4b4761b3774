//! Multi-dimensional interpolation strategies.

use serde::{Deserialize, Serialize};

use grove_grid::Grid;
use grove_math::Vector;
use grove_types::{GroveError, GroveResult, ParticleId};

use crate::correction::KernelCorrection;
use crate::kernel::{Kernel, LinearBSpline, QuadraticBSpline};
use crate::mpvalue::{MpValue, Weight};

/// Computes a particle's node weights.
///
/// Implementations must fill `out` with every node inside the support,
/// or fail with [`GroveError::EmptySupport`] when there is none.
pub trait Interpolation<const D: usize>: Send + Sync {
    /// Human-readable name.
    fn name(&self) -> &str;

    /// Support half-width in cells.
    fn support_radius(&self) -> f64;

    /// Factor `k` of the APIC inertia tensor `D = k h² I`, if defined.
    fn affine_inertia_factor(&self) -> Option<f64>;

    /// Evaluates particle `particle` at `x` against `grid`.
    fn evaluate(
        &self,
        particle: usize,
        x: &Vector<D>,
        grid: &Grid<D>,
        out: &mut MpValue<D>,
    ) -> GroveResult<()>;
}

/// Tensor-product evaluation shared by the B-spline families.
pub(crate) fn evaluate_separable<K: Kernel, const D: usize>(
    kernel: &K,
    particle: usize,
    x: &Vector<D>,
    grid: &Grid<D>,
    out: &mut MpValue<D>,
) -> GroveResult<()> {
    out.clear();
    let range = grid.neighbors_of(x, kernel.support_radius());
    if range.is_empty() {
        return Err(GroveError::EmptySupport {
            particle: ParticleId::from(particle),
        });
    }
    out.set_truncated(range.is_truncated());

    let h = grid.spacing();
    let inv_h = 1.0 / h;
    let mut values = [0.0; D];
    let mut slopes = [0.0; D];

    for (node, _) in range.iter() {
        let xi = &grid.position[node];
        for a in 0..D {
            let q = (x[a] - xi[a]) * inv_h;
            values[a] = kernel.value(q);
            slopes[a] = kernel.derivative(q) * inv_h;
        }

        let n: f64 = values.iter().product();
        let mut grad = Vector::<D>::zeros();
        for a in 0..D {
            let mut g = slopes[a];
            for (b, v) in values.iter().enumerate() {
                if b != a {
                    g *= v;
                }
            }
            grad[a] = g;
        }
        out.push(Weight { node, n, grad });
    }

    if out.weight_sum() <= grove_types::constants::WEIGHT_EPSILON {
        return Err(GroveError::EmptySupport {
            particle: ParticleId::from(particle),
        });
    }
    Ok(())
}

impl<const D: usize> Interpolation<D> for LinearBSpline {
    fn name(&self) -> &str {
        "LinearBSpline"
    }

    fn support_radius(&self) -> f64 {
        Kernel::support_radius(self)
    }

    fn affine_inertia_factor(&self) -> Option<f64> {
        Kernel::affine_inertia_factor(self)
    }

    fn evaluate(&self, particle: usize, x: &Vector<D>, grid: &Grid<D>, out: &mut MpValue<D>) -> GroveResult<()> {
        evaluate_separable(self, particle, x, grid, out)
    }
}

impl<const D: usize> Interpolation<D> for QuadraticBSpline {
    fn name(&self) -> &str {
        "QuadraticBSpline"
    }

    fn support_radius(&self) -> f64 {
        Kernel::support_radius(self)
    }

    fn affine_inertia_factor(&self) -> Option<f64> {
        Kernel::affine_inertia_factor(self)
    }

    fn evaluate(&self, particle: usize, x: &Vector<D>, grid: &Grid<D>, out: &mut MpValue<D>) -> GroveResult<()> {
        evaluate_separable(self, particle, x, grid, out)
    }
}

/// Serializable choice of interpolation, for configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationKind {
    Linear,
    Quadratic,
    CorrectedLinear,
    CorrectedQuadratic,
}

impl InterpolationKind {
    /// Instantiates the interpolation for dimension `D`.
    pub fn build<const D: usize>(self) -> Box<dyn Interpolation<D>> {
        match self {
            Self::Linear => Box::new(LinearBSpline),
            Self::Quadratic => Box::new(QuadraticBSpline),
            Self::CorrectedLinear => Box::new(KernelCorrection::new(LinearBSpline)),
            Self::CorrectedQuadratic => Box::new(KernelCorrection::new(QuadraticBSpline)),
        }
    }
}
