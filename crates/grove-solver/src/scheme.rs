//! Explicit velocity-transfer schemes.
//!
//! Each scheme defines two operations: how particle momentum is
//! scattered to the grid, and how the solved grid velocity is gathered
//! back and used to advect the particle.
//!
//! | scheme | P2G momentum                       | G2P velocity                           | advection   |
//! |--------|------------------------------------|----------------------------------------|-------------|
//! | FLIP α | `N m v_p`                          | `(1−α) Σ N v_i + α (v_p + Σ N Δv_i)`   | `Σ N v_i`   |
//! | APIC   | `N m (v_p + B D⁻¹ (x_i − x_p))`    | `Σ N v_i`, `B = Σ N v_i ⊗ (x_i − x_p)` | new `v_p`   |
//! | TPIC   | `N m (v_p + ∇v_p (x_i − x_p))`     | `Σ N v_i`                              | new `v_p`   |

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use grove_grid::Grid;
use grove_interp::MpValues;
use grove_math::tensor::{Matrix, Vector};
use grove_types::{GroveError, GroveResult};

use crate::particles::ParticleSet;
use crate::transfer::{ensure_support, gather, gather_gradient, gather_increment};

/// Particle–grid velocity transfer, selected once per run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferScheme {
    /// PIC/FLIP blend; `alpha = 1` is pure FLIP, `alpha = 0` pure PIC.
    Flip { alpha: f64 },
    /// Affine particle-in-cell.
    Apic,
    /// Taylor particle-in-cell.
    Tpic,
}

impl Default for TransferScheme {
    fn default() -> Self {
        Self::Flip { alpha: 1.0 }
    }
}

impl TransferScheme {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Flip { .. } => "flip",
            Self::Apic => "apic",
            Self::Tpic => "tpic",
        }
    }

    /// Checks the blend factor and, for APIC, that the kernel defines an
    /// inertia tensor.
    pub fn validate(&self, inertia_factor: Option<f64>) -> GroveResult<()> {
        match *self {
            Self::Flip { alpha } if !(0.0..=1.0).contains(&alpha) => Err(GroveError::InvalidConfig(
                format!("FLIP blend factor must lie in [0, 1], got {alpha}"),
            )),
            Self::Apic if inertia_factor.is_none() => Err(GroveError::InvalidConfig(
                "APIC requires a kernel with an affine inertia tensor (e.g. quadratic B-spline)".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Scatters mass and momentum. The grid must be cleared beforehand.
    pub fn scatter_momentum<const D: usize>(
        &self,
        grid: &mut Grid<D>,
        particles: &ParticleSet<D>,
        mpvalues: &MpValues<D>,
        inertia_factor: Option<f64>,
    ) -> GroveResult<()> {
        let d_inv = match (self, inertia_factor) {
            (Self::Apic, Some(k)) => 1.0 / (k * grid.spacing() * grid.spacing()),
            (Self::Apic, None) => {
                self.validate(inertia_factor)?;
                0.0
            }
            _ => 0.0,
        };

        for (p, mp) in mpvalues.iter().enumerate() {
            ensure_support(p, mp)?;
            let m = particles.mass[p];
            let xp = particles.position[p];
            let vp = particles.velocity[p];
            let affine: Option<Matrix<D>> = match self {
                Self::Flip { .. } => None,
                Self::Apic => Some(particles.affine[p] * d_inv),
                Self::Tpic => Some(particles.velocity_gradient[p]),
            };

            for w in mp {
                let v = match affine {
                    Some(c) => vp + c * (grid.position[w.node] - xp),
                    None => vp,
                };
                grid.mass[w.node] += w.n * m;
                grid.momentum[w.node] += v * (w.n * m);
            }
        }
        Ok(())
    }

    /// Gathers the solved grid velocity into the particles and advects them.
    ///
    /// Expects `grid.velocity` (new) and `grid.velocity_prev` (start of step).
    /// Also refreshes `∇v_p = Σ v_i ⊗ ∇N`.
    pub fn gather_velocity_and_advect<const D: usize>(
        &self,
        grid: &Grid<D>,
        particles: &mut ParticleSet<D>,
        mpvalues: &MpValues<D>,
        dt: f64,
    ) -> GroveResult<()> {
        let scheme = *self;
        let ParticleSet {
            position,
            velocity,
            velocity_gradient,
            affine,
            ..
        } = particles;

        position
            .par_iter_mut()
            .zip(velocity.par_iter_mut())
            .zip(velocity_gradient.par_iter_mut())
            .zip(affine.par_iter_mut())
            .zip(mpvalues.as_slice().par_iter())
            .enumerate()
            .try_for_each(|(p, ((((x, v), l), b), mp))| {
                ensure_support(p, mp)?;
                let v_grid = gather(&grid.velocity, mp);
                *l = gather_gradient(&grid.velocity, mp);

                match scheme {
                    TransferScheme::Flip { alpha } => {
                        let dv = gather_increment(&grid.velocity, &grid.velocity_prev, mp);
                        let wsum = mp.weight_sum();
                        *v = v_grid * (1.0 - alpha) + (*v * wsum + dv) * alpha;
                        *x += v_grid * dt;
                    }
                    TransferScheme::Apic => {
                        *b = mp.iter().fold(Matrix::<D>::zeros(), |acc, w| {
                            let offset: Vector<D> = grid.position[w.node] - *x;
                            acc + grid.velocity[w.node] * offset.transpose() * w.n
                        });
                        *v = v_grid;
                        *x += *v * dt;
                    }
                    TransferScheme::Tpic => {
                        *v = v_grid;
                        *x += *v * dt;
                    }
                }
                Ok(())
            })
    }
}
