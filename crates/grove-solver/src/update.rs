//! Per-particle constitutive updates.
//!
//! Particles are independent here, so the loops run on the rayon pool.

use rayon::prelude::*;

use grove_material::ConstitutiveModel;
use grove_math::tensor::{self, Matrix};
use grove_types::{GroveError, GroveResult, ParticleId};

use crate::config::InversionPolicy;
use crate::particles::{ParticleSet, StressMeasure};

/// Updated-Lagrangian update: `F ← (I + Δt ∇v) F`, `V = J V⁰`,
/// `σ = σ(F)`.
pub fn update_cauchy_stress<const D: usize>(
    particles: &mut ParticleSet<D>,
    model: &dyn ConstitutiveModel<D>,
    dt: f64,
    inversion: InversionPolicy,
) -> GroveResult<()> {
    let ParticleSet {
        velocity_gradient,
        deformation_gradient,
        initial_volume,
        volume,
        stress,
        out_of_plane_stress,
        ..
    } = particles;

    deformation_gradient
        .par_iter_mut()
        .zip(volume.par_iter_mut())
        .zip(stress.par_iter_mut())
        .zip(out_of_plane_stress.par_iter_mut())
        .zip(velocity_gradient.par_iter())
        .zip(initial_volume.par_iter())
        .enumerate()
        .try_for_each(|(p, (((((f, vol), sigma), sigma_zz), l), v0))| {
            *f = (Matrix::<D>::identity() + *l * dt) * *f;
            let j = tensor::det(f);
            inversion.check(p, j)?;
            *vol = j * v0;
            *sigma = model.cauchy_stress(f);
            *sigma_zz = model.out_of_plane_kirchhoff(f) / j;
            Ok::<(), GroveError>(())
        })?;

    particles.stress_measure = StressMeasure::Cauchy;
    Ok(())
}

/// Total-Lagrangian stress update from an already-advanced `F`:
/// `V = J V⁰`, `P = P(F)`.
pub fn update_first_piola<const D: usize>(
    particles: &mut ParticleSet<D>,
    model: &dyn ConstitutiveModel<D>,
    inversion: InversionPolicy,
) -> GroveResult<()> {
    let ParticleSet {
        deformation_gradient,
        initial_volume,
        volume,
        stress,
        out_of_plane_stress,
        ..
    } = particles;

    deformation_gradient
        .par_iter()
        .zip(volume.par_iter_mut())
        .zip(stress.par_iter_mut())
        .zip(out_of_plane_stress.par_iter_mut())
        .zip(initial_volume.par_iter())
        .enumerate()
        .try_for_each(|(p, ((((f, vol), pk1), sigma_zz), v0))| {
            let j = tensor::det(f);
            inversion.check(p, j)?;
            *vol = j * v0;
            *sigma_zz = model.out_of_plane_kirchhoff(f) / j;
            *pk1 = match model.first_piola_kirchhoff(f) {
                Some(stress) => stress,
                None if inversion == InversionPolicy::Ignore => Matrix::<D>::zeros(),
                None => {
                    return Err(GroveError::InvertedDeformation {
                        particle: ParticleId::from(p),
                        jacobian: j,
                    })
                }
            };
            Ok::<(), GroveError>(())
        })?;

    particles.stress_measure = StressMeasure::FirstPiola;
    Ok(())
}
