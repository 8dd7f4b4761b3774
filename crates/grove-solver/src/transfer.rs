//! P2G / G2P transfer primitives.
//!
//! Every P2G routine is a serial scatter-add into fields the caller has
//! cleared beforehand; several particles may write to the same node.
//! The G2P helpers gather for one particle at a time so callers can run
//! them in parallel.

use grove_grid::Grid;
use grove_interp::{MpValue, MpValues};
use grove_math::tensor::{Matrix, Vector};
use grove_types::{GroveError, GroveResult, ParticleId};

use crate::particles::ParticleSet;

#[inline]
pub(crate) fn ensure_support<const D: usize>(p: usize, mp: &MpValue<D>) -> GroveResult<()> {
    if mp.is_empty() {
        return Err(GroveError::EmptySupport {
            particle: ParticleId::from(p),
        });
    }
    Ok(())
}

/// `m_i += N m_p` and `mv_i += N m_p v_p`.
pub fn p2g_mass_momentum<const D: usize>(
    grid: &mut Grid<D>,
    particles: &ParticleSet<D>,
    mpvalues: &MpValues<D>,
) -> GroveResult<()> {
    for (p, mp) in mpvalues.iter().enumerate() {
        ensure_support(p, mp)?;
        let m = particles.mass[p];
        let mv = particles.velocity[p] * m;
        for w in mp {
            grid.mass[w.node] += w.n * m;
            grid.momentum[w.node] += mv * w.n;
        }
    }
    Ok(())
}

/// `f_i += −V_p s_p ∇N` for the given per-particle volumes and stresses.
///
/// The pairing selects the formulation: current volume with Cauchy
/// stress, or reference volume with Kirchhoff / first Piola stress.
pub fn p2g_internal_force<const D: usize>(
    grid: &mut Grid<D>,
    mpvalues: &MpValues<D>,
    volumes: &[f64],
    stresses: &[Matrix<D>],
) -> GroveResult<()> {
    for (p, mp) in mpvalues.iter().enumerate() {
        ensure_support(p, mp)?;
        let vs = stresses[p] * volumes[p];
        for w in mp {
            grid.force[w.node] -= vs * w.grad;
        }
    }
    Ok(())
}

/// `f_ext,i += N m_p (b_p + g)`.
pub fn p2g_body_force<const D: usize>(
    grid: &mut Grid<D>,
    particles: &ParticleSet<D>,
    mpvalues: &MpValues<D>,
    gravity: &Vector<D>,
) -> GroveResult<()> {
    for (p, mp) in mpvalues.iter().enumerate() {
        ensure_support(p, mp)?;
        let fm = (particles.body_acceleration[p] + gravity) * particles.mass[p];
        for w in mp {
            grid.force_ext[w.node] += fm * w.n;
        }
    }
    Ok(())
}

/// `Σ N field_i`.
#[inline]
pub fn gather<const D: usize>(field: &[Vector<D>], mp: &MpValue<D>) -> Vector<D> {
    mp.iter()
        .fold(Vector::<D>::zeros(), |acc, w| acc + field[w.node] * w.n)
}

/// `Σ N (field_i − prev_i)`, the increment gather used by FLIP.
#[inline]
pub fn gather_increment<const D: usize>(field: &[Vector<D>], prev: &[Vector<D>], mp: &MpValue<D>) -> Vector<D> {
    mp.iter().fold(Vector::<D>::zeros(), |acc, w| {
        acc + (field[w.node] - prev[w.node]) * w.n
    })
}

/// `Σ field_i ⊗ ∇N`.
#[inline]
pub fn gather_gradient<const D: usize>(field: &[Vector<D>], mp: &MpValue<D>) -> Matrix<D> {
    mp.iter().fold(Matrix::<D>::zeros(), |acc, w| {
        acc + field[w.node] * w.grad.transpose()
    })
}
