//! Timestep selection.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use grove_material::ConstitutiveModel;
use grove_types::{GroveError, GroveResult};

use crate::particles::ParticleSet;

/// How the explicit solvers pick `Δt`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeStepping {
    Fixed { dt: f64 },
    /// `Δt = courant · h / max_p (c_p + |v_p|)`.
    Cfl { courant: f64 },
}

impl TimeStepping {
    pub fn validate(&self) -> GroveResult<()> {
        match *self {
            Self::Fixed { dt } if dt <= 0.0 || !dt.is_finite() => Err(GroveError::InvalidConfig(
                format!("Timestep must be positive, got {dt}"),
            )),
            Self::Cfl { courant } if courant <= 0.0 || courant > 1.0 => Err(GroveError::InvalidConfig(
                format!("Courant number must lie in (0, 1], got {courant}"),
            )),
            _ => Ok(()),
        }
    }

    /// Resolves the timestep for the current particle state.
    pub fn resolve<const D: usize>(
        &self,
        particles: &ParticleSet<D>,
        volumes: &[f64],
        model: &dyn ConstitutiveModel<D>,
        spacing: f64,
    ) -> GroveResult<f64> {
        match *self {
            Self::Fixed { dt } => Ok(dt),
            Self::Cfl { courant } => cfl_timestep(particles, volumes, model, spacing, courant),
        }
    }
}

/// CFL-limited timestep from the elastic wave speed at each particle's
/// density `m / V` plus its speed.
pub fn cfl_timestep<const D: usize>(
    particles: &ParticleSet<D>,
    volumes: &[f64],
    model: &dyn ConstitutiveModel<D>,
    spacing: f64,
    courant: f64,
) -> GroveResult<f64> {
    let max_speed = particles
        .mass
        .par_iter()
        .zip(volumes.par_iter())
        .zip(particles.velocity.par_iter())
        .map(|((m, vol), v)| model.wave_speed(m / vol) + v.norm())
        .reduce(|| 0.0, f64::max);

    if max_speed <= 0.0 || !max_speed.is_finite() {
        return Err(GroveError::InvalidConfig(format!(
            "Cannot derive a CFL timestep from signal speed {max_speed}"
        )));
    }
    Ok(courant * spacing / max_speed)
}
